//! MCP server module
//!
//! Exposes the Pantry tools over the Model Context Protocol.

mod server;

pub use server::PantryService;
