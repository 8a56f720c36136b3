//! Data layer module
//!
//! Holds the volatile session state:
//! - User records copied from verified identity claims
//! - Session store (in-memory, cleared on restart)

mod models;
mod session_store;

pub use models::*;
pub use session_store::{MemorySessionStore, SessionStore};

#[cfg(test)]
pub use session_store::MockSessionStore;
