//! Test helper modules for facemash-client integration tests
//!
//! Provides reusable test infrastructure components:
//! - ScriptedApi: `PersonsApi` fake with queued responses and hold gates
//! - ScriptedTransport: `Transport` fake recording every request
//! - fixtures: person builders

#![allow(dead_code)]

pub mod fixtures;
pub mod scripted_api;
pub mod scripted_transport;

pub use fixtures::{numbered_roster, person, with_photo, REAL_PHOTO, STOCK_PHOTO};
pub use scripted_api::{Gate, ScriptedApi};
pub use scripted_transport::ScriptedTransport;
