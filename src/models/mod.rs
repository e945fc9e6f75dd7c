//! Domain models for the Sports Central service.
//!
//! Events are the tracked fixtures; user records hold the dashboard role of
//! each signed-in identity.

pub mod event;
pub mod user;

// Re-export all models for convenient access
pub use event::{Event, EventDraft, EventPatch, EventStatus, NewEvent, ScoreField, Sport};
pub use user::{Identity, Role, UserRecord};
