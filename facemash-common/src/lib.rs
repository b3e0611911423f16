//! # Facemash Common Library
//!
//! Shared code for the Facemash client crates including:
//! - Person model and the tagged photo payload
//! - API response envelope types
//! - Configuration loading
//! - Preference flag storage with change subscription

pub mod api;
pub mod config;
pub mod error;
pub mod person;
pub mod photo;
pub mod preferences;

pub use error::{Error, Result};
pub use person::{Gender, Person, PersonId};
pub use photo::PhotoPayload;
