//! Application layer for dockhand
//!
//! This crate contains the tool routing engine and the port definitions it
//! consumes. It depends only on the domain layer; concrete session stores
//! and tool handlers live in the infrastructure layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    session_store::{SessionPatch, SessionStoreError, SessionStorePort},
    tool_handler::{HandlerRegistry, ToolContext, ToolHandler},
};
pub use use_cases::route_tool::{RouteError, RouteOutcome, RouteRequest, ToolRouter};
