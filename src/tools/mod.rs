//! Pantry Tools module
//!
//! Tool implementations behind the MCP server. Each returns a serializable
//! response or a message describing why the request was rejected.

pub mod inventory;
pub mod meals;
pub mod recipes;
pub mod status;
pub mod units;
