//! Pantry Status Tool
//!
//! Provides runtime status information about the Pantry service.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::BuildInfo;
use crate::db::Database;
use crate::models::{InventoryItem, Recipe};

/// Usage notes for MCP clients, returned with the server info
pub const SERVER_INSTRUCTIONS: &str = "Pantry - food inventory, recipe nutrition and meal logging. \
Units: validate_unit, convert_volume, scale_nutrition. \
Inventory: add/get/list/search/update/delete_inventory_item. Label nutrition is per declared serving \
(serving_quantity serving_unit = serving_size grams, e.g. 0.25 cup = 45 g). \
Recipes: create/get/list/update/delete_recipe, add/update/remove_recipe_ingredient, \
recalculate_recipe_nutrition, preview_recipe_nutrition. Recipe nutrition is per serving. \
Meals: log_meal (recipe servings or item quantity+unit), get_meal_log, list_meals, delete_meal_log. \
Dates use ISO format: YYYY-MM-DD.";

/// Runtime status of the Pantry service
#[derive(Debug, Clone, Serialize)]
pub struct PantryStatus {
    pub build: String,
    pub build_number: u64,
    pub build_timestamp: &'static str,
    pub version: &'static str,

    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub inventory_items: Option<i64>,
    pub recipes: Option<i64>,

    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    database_path: PathBuf,
}

impl StatusTracker {
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            database_path,
        }
    }

    /// Get the current status
    ///
    /// Row counts are left empty when the database cannot be read.
    pub fn get_status(&self, db: &Database) -> PantryStatus {
        let build_info = BuildInfo::current();

        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let counts = db.with_conn(|conn| {
            Ok((InventoryItem::count(conn)?, Recipe::count(conn, None)?))
        });
        let (inventory_items, recipes) = match counts {
            Ok((items, recipes)) => (Some(items), Some(recipes)),
            Err(e) => {
                tracing::warn!(error = %e, "Could not count database rows");
                (None, None)
            }
        };

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        PantryStatus {
            build: build_info.label(),
            build_number: build_info.build_number,
            build_timestamp: build_info.build_timestamp,
            version: build_info.version,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            inventory_items,
            recipes,
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    #[test]
    fn test_status_counts_rows() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| run_migrations(conn)).unwrap();

        let tracker = StatusTracker::new(PathBuf::from(":memory:"));
        let status = tracker.get_status(&db);
        assert_eq!(status.inventory_items, Some(0));
        assert_eq!(status.recipes, Some(0));
        assert_eq!(status.database_size_bytes, None);
        assert_eq!(status.process_id, std::process::id());
    }

    #[test]
    fn test_status_without_schema() {
        let db = Database::in_memory().unwrap();
        let status = StatusTracker::new(PathBuf::from(":memory:")).get_status(&db);
        assert_eq!(status.inventory_items, None);
    }
}
