//! Port definitions (interfaces to the infrastructure layer)

pub mod session_store;
pub mod tool_handler;
