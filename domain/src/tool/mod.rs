//! Tool domain types

pub mod value_objects;

pub use value_objects::{ToolError, ToolOutput};
