//! Application use cases

pub mod route_tool;
