//! Core domain types for autojoin.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the workspace.

mod errors;
mod key;
mod value_map;

pub use errors::{OrchestrationError, PeerError, PeerLookupError, TaskFailure};
pub use key::TaskKey;
pub use value_map::ValueMap;
