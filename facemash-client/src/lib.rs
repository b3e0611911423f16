//! Facemash client core
//!
//! Data management behind the leaderboard and duel screens:
//! - request gateway with uniform error classification
//! - persons repository over the gateway (or a fixed roster)
//! - lazy per-identity photo cache and loader for the visible page
//! - filter/sort/rank pipeline and pagination
//! - duo voting state machine with cooldown and refill
//!
//! Screens publish [`events::ScreenEvent`]s so a renderer only redraws on change.

pub mod api;
pub mod duo;
pub mod error;
pub mod events;
pub mod filter;
pub mod gateway;
pub mod imaging;
pub mod leaderboard;
pub mod pagination;
pub mod photo_cache;
pub mod photo_loader;
pub mod roster;

pub use api::{HttpPersonsApi, PersonsApi, StaticPersonsApi};
pub use duo::{DuoPair, DuoScope, DuoState, DuoVotingSession, PickOutcome, ReloadOutcome};
pub use error::{DuoError, ErrorKind, GatewayError};
pub use events::{EventBus, ScreenEvent};
pub use gateway::RequestGateway;
pub use leaderboard::{LeaderboardScreen, LeaderboardView};
