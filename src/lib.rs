//! Pantry Library
//!
//! Food inventory, recipe nutrition and meal logging, built around a
//! serving-unit conversion and nutrition-scaling engine.

pub mod build_info;
pub mod config;
pub mod db;
pub mod mcp;
pub mod models;
pub mod nutrition;
pub mod tools;
