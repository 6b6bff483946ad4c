//! Database migrations
//!
//! Schema creation and migration logic.

use rusqlite::Connection;

use super::connection::DbResult;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Run all migrations to bring the database up to the current schema version
pub fn run_migrations(conn: &Connection) -> DbResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        tracing::info!("Applying schema migration v1");
        migrate_v1(conn)?;
        conn.execute("INSERT INTO schema_migrations (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Migration v1: Initial schema
fn migrate_v1(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        r#"
        -- ============================================
        -- INVENTORY ITEMS
        -- Pantry contents with label nutrition
        -- ============================================
        CREATE TABLE inventory_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            brand TEXT,

            -- Label nutrition per declared serving (null = not on the label)
            calories REAL,
            protein REAL,                        -- grams
            carbs REAL,                          -- grams
            fat REAL,                            -- grams

            -- Declared serving, e.g. 0.25 cup = 45 g
            serving_size REAL,                   -- grams per serving
            serving_quantity REAL,
            serving_unit TEXT,
            serving_unit_type TEXT CHECK(serving_unit_type IN ('volume', 'weight', 'package')),

            -- On hand
            quantity REAL NOT NULL DEFAULT 0,
            unit TEXT NOT NULL DEFAULT 'piece',
            expiration_date TEXT,                -- ISO date: "2026-01-09"

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_inventory_items_name ON inventory_items(name);
        CREATE INDEX idx_inventory_items_expiration ON inventory_items(expiration_date);

        -- ============================================
        -- RECIPES
        -- ============================================
        CREATE TABLE recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            servings REAL NOT NULL DEFAULT 1.0,
            instructions TEXT,

            -- Cached nutrition (per serving) - recalculated when ingredients change
            cached_calories REAL NOT NULL DEFAULT 0,
            cached_protein REAL NOT NULL DEFAULT 0,
            cached_carbs REAL NOT NULL DEFAULT 0,
            cached_fat REAL NOT NULL DEFAULT 0,

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX idx_recipes_name ON recipes(name);

        -- ============================================
        -- RECIPE INGREDIENTS
        -- ============================================
        CREATE TABLE recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
            item_id INTEGER NOT NULL REFERENCES inventory_items(id) ON DELETE RESTRICT,
            quantity REAL NOT NULL,
            unit TEXT NOT NULL,                  -- may differ from the item's serving unit

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),

            UNIQUE(recipe_id, item_id)
        );

        CREATE INDEX idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);
        CREATE INDEX idx_recipe_ingredients_item ON recipe_ingredients(item_id);

        -- ============================================
        -- MEAL LOGS
        -- Nutrition snapshot of what was eaten
        -- ============================================
        CREATE TABLE meal_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,                  -- ISO date
            meal_type TEXT NOT NULL CHECK(meal_type IN ('breakfast', 'lunch', 'dinner', 'snack', 'unspecified')),

            recipe_id INTEGER REFERENCES recipes(id) ON DELETE RESTRICT,
            item_id INTEGER REFERENCES inventory_items(id) ON DELETE RESTRICT,

            servings REAL NOT NULL DEFAULT 1.0,
            quantity REAL,                       -- direct item amount
            unit TEXT,

            calories REAL NOT NULL DEFAULT 0,
            protein REAL NOT NULL DEFAULT 0,
            carbs REAL NOT NULL DEFAULT 0,
            fat REAL NOT NULL DEFAULT 0,

            notes TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),

            CHECK ((recipe_id IS NOT NULL AND item_id IS NULL) OR
                   (recipe_id IS NULL AND item_id IS NOT NULL))
        );

        CREATE INDEX idx_meal_logs_date ON meal_logs(date);
        CREATE INDEX idx_meal_logs_recipe ON meal_logs(recipe_id);
        CREATE INDEX idx_meal_logs_item ON meal_logs(item_id);
        "#,
    )?;

    Ok(())
}

/// Get the current schema version
pub fn get_schema_version(conn: &Connection) -> DbResult<i32> {
    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);
    Ok(version)
}

/// Check if the database needs migration
pub fn needs_migration(conn: &Connection) -> DbResult<bool> {
    let current = get_schema_version(conn)?;
    Ok(current < SCHEMA_VERSION)
}
