//! Infrastructure layer for dockhand
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the in-memory session store, the concrete
//! containerization tool handlers, and configuration file loading.

pub mod config;
pub mod session;
pub mod tools;

// Re-export commonly used types
pub use config::{ConfigLoader, FileConfig};
pub use session::InMemorySessionStore;
pub use tools::default_registry;
