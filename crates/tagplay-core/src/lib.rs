//! `tagplay` Core Library
//!
//! Everything about a rental session that does not touch the network or a
//! terminal:
//! - The session record and its transition functions
//! - Derivation of the single screen a session shows
//! - JSON types for the rental backend
//! - Playback surface requirements
//! - Common error types

pub mod error;
pub mod playback;
pub mod screen;
pub mod session;
pub mod tracing_init;
pub mod wire;

pub use error::{Error, Result};
pub use playback::{CrossOrigin, PlaybackRequest};
pub use screen::{Affordance, Screen};
pub use session::{DEFAULT_RENTAL_HOURS, Session, TickOutcome};
