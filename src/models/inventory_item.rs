//! Inventory Item model
//!
//! A pantry item with its declared serving basis and label nutrition.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::PartialNutrition;
use crate::db::{DbError, DbResult};
use crate::nutrition::{classify_unit, UnitFamily};

/// Gram basis assumed when an item declares no serving size
pub const DEFAULT_SERVING_GRAMS: f64 = 100.0;

/// A pantry item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    /// Label nutrition per declared serving
    pub nutrition: PartialNutrition,
    /// Grams in one declared serving
    pub serving_size: Option<f64>,
    /// Declared serving amount, e.g. 0.25 for "0.25 cup = 45g"
    pub serving_quantity: Option<f64>,
    pub serving_unit: Option<String>,
    pub serving_unit_type: Option<UnitFamily>,
    /// Amount on hand
    pub quantity: f64,
    pub unit: String,
    pub expiration_date: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new inventory item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryItemCreate {
    pub name: String,
    pub brand: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub serving_size: Option<f64>,
    pub serving_quantity: Option<f64>,
    pub serving_unit: Option<String>,
    pub serving_unit_type: Option<UnitFamily>,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub expiration_date: Option<String>,
    pub notes: Option<String>,
}

fn default_unit() -> String {
    "piece".to_string()
}

/// Data for updating an inventory item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryItemUpdate {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub serving_size: Option<f64>,
    pub serving_quantity: Option<f64>,
    pub serving_unit: Option<String>,
    pub serving_unit_type: Option<UnitFamily>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub expiration_date: Option<String>,
    pub notes: Option<String>,
}

impl InventoryItem {
    /// Grams in one declared serving, [`DEFAULT_SERVING_GRAMS`] when unset or not positive
    pub fn declared_serving_grams(&self) -> f64 {
        match self.serving_size {
            Some(grams) if grams > 0.0 => grams,
            _ => DEFAULT_SERVING_GRAMS,
        }
    }

    /// Family of the declared serving unit, preferring the stored type
    pub fn serving_family(&self) -> Option<UnitFamily> {
        self.serving_unit_type
            .or_else(|| self.serving_unit.as_deref().and_then(classify_unit))
    }

    /// Create an InventoryItem from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let unit_type: Option<String> = row.get("serving_unit_type")?;
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            brand: row.get("brand")?,
            nutrition: PartialNutrition {
                calories: row.get("calories")?,
                protein: row.get("protein")?,
                carbs: row.get("carbs")?,
                fat: row.get("fat")?,
            },
            serving_size: row.get("serving_size")?,
            serving_quantity: row.get("serving_quantity")?,
            serving_unit: row.get("serving_unit")?,
            serving_unit_type: unit_type.as_deref().and_then(UnitFamily::from_str),
            quantity: row.get("quantity")?,
            unit: row.get("unit")?,
            expiration_date: row.get("expiration_date")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Insert a new inventory item into the database
    pub fn create(conn: &Connection, data: &InventoryItemCreate) -> DbResult<Self> {
        let unit_type = data
            .serving_unit_type
            .or_else(|| data.serving_unit.as_deref().and_then(classify_unit));

        conn.execute(
            r#"
            INSERT INTO inventory_items (
                name, brand, calories, protein, carbs, fat,
                serving_size, serving_quantity, serving_unit, serving_unit_type,
                quantity, unit, expiration_date, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                data.name.trim(),
                data.brand,
                data.calories,
                data.protein,
                data.carbs,
                data.fat,
                data.serving_size,
                data.serving_quantity,
                data.serving_unit,
                unit_type.map(|t| t.as_str()),
                data.quantity,
                data.unit,
                data.expiration_date,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("inventory item", id))
    }

    /// Get an inventory item by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM inventory_items WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get every inventory item whose ID is in `ids` (missing IDs are skipped)
    pub fn get_many(conn: &Connection, ids: &[i64]) -> DbResult<Vec<Self>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids_str = ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!("SELECT * FROM inventory_items WHERE id IN ({})", ids_str);

        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Search inventory items by name or brand
    pub fn search(conn: &Connection, query: &str, limit: i64) -> DbResult<Vec<Self>> {
        let search_pattern = format!("%{}%", query);
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM inventory_items
            WHERE name LIKE ?1 OR brand LIKE ?1
            ORDER BY name ASC
            LIMIT ?2
            "#,
        )?;

        let items = stmt
            .query_map(params![search_pattern, limit], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// List inventory items with sorting and pagination
    pub fn list(
        conn: &Connection,
        sort_by: &str,
        sort_order: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let order = if sort_order.to_lowercase() == "desc" { "DESC" } else { "ASC" };
        let sort_col = match sort_by.to_lowercase().as_str() {
            "created_at" => "created_at",
            // Items without a date sort last either way
            "expiration_date" => "expiration_date IS NULL, expiration_date",
            _ => "name",
        };

        let sql = format!(
            "SELECT * FROM inventory_items ORDER BY {} {} LIMIT ?1 OFFSET ?2",
            sort_col, order
        );

        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params![limit, offset], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Count inventory items
    pub fn count(conn: &Connection) -> DbResult<i64> {
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM inventory_items", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Update an inventory item
    pub fn update(conn: &Connection, id: i64, data: &InventoryItemUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        macro_rules! add_update {
            ($field:ident, $col:expr) => {
                if let Some(ref val) = data.$field {
                    updates.push(format!("{} = ?{}", $col, params_vec.len() + 1));
                    params_vec.push(Box::new(val.clone()));
                }
            };
        }

        add_update!(name, "name");
        add_update!(brand, "brand");
        add_update!(calories, "calories");
        add_update!(protein, "protein");
        add_update!(carbs, "carbs");
        add_update!(fat, "fat");
        add_update!(serving_size, "serving_size");
        add_update!(serving_quantity, "serving_quantity");
        add_update!(serving_unit, "serving_unit");
        add_update!(quantity, "quantity");
        add_update!(unit, "unit");
        add_update!(expiration_date, "expiration_date");
        add_update!(notes, "notes");

        // A new serving unit without an explicit type re-derives the type
        let unit_type = data.serving_unit_type.or_else(|| {
            data.serving_unit.as_deref().and_then(classify_unit)
        });
        if let Some(unit_type) = unit_type {
            updates.push(format!("serving_unit_type = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(unit_type.as_str().to_string()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE inventory_items SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Get recipe names that use this item
    pub fn get_used_in_recipes(conn: &Connection, id: i64) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT r.name FROM recipes r
            INNER JOIN recipe_ingredients ri ON r.id = ri.recipe_id
            WHERE ri.item_id = ?1
            ORDER BY r.name
            "#,
        )?;

        let names = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    }

    /// Get recipe IDs that use this item (for recalculation)
    pub fn get_recipe_ids_using_item(conn: &Connection, id: i64) -> DbResult<Vec<i64>> {
        let mut stmt =
            conn.prepare("SELECT DISTINCT recipe_id FROM recipe_ingredients WHERE item_id = ?1")?;

        let ids = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;

        Ok(ids)
    }

    /// Count meal logs recorded directly against this item
    pub fn get_meal_log_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM meal_logs WHERE item_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete an inventory item
    /// Returns Ok(true) if deleted, Ok(false) if not found
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        // Fails on the foreign keys while recipes or meal logs reference it
        let rows = conn.execute("DELETE FROM inventory_items WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn rice() -> InventoryItemCreate {
        InventoryItemCreate {
            name: "Jasmine Rice".to_string(),
            calories: Some(160.0),
            protein: Some(3.0),
            carbs: Some(36.0),
            serving_size: Some(45.0),
            serving_quantity: Some(0.25),
            serving_unit: Some("cup".to_string()),
            quantity: 2.0,
            unit: "lb".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_derives_unit_type() {
        let conn = setup();
        let item = InventoryItem::create(&conn, &rice()).unwrap();
        assert_eq!(item.name, "Jasmine Rice");
        assert_eq!(item.serving_unit_type, Some(UnitFamily::Volume));
        assert_eq!(item.nutrition.fat, None);
        assert_eq!(item.nutrition.calories, Some(160.0));
    }

    #[test]
    fn test_declared_serving_grams_default() {
        let conn = setup();
        let mut data = rice();
        data.serving_size = None;
        let item = InventoryItem::create(&conn, &data).unwrap();
        assert_eq!(item.declared_serving_grams(), DEFAULT_SERVING_GRAMS);
    }

    #[test]
    fn test_update_rederives_unit_type() {
        let conn = setup();
        let item = InventoryItem::create(&conn, &rice()).unwrap();
        let update = InventoryItemUpdate {
            serving_unit: Some("g".to_string()),
            serving_quantity: Some(45.0),
            ..Default::default()
        };
        let updated = InventoryItem::update(&conn, item.id, &update).unwrap().unwrap();
        assert_eq!(updated.serving_unit.as_deref(), Some("g"));
        assert_eq!(updated.serving_unit_type, Some(UnitFamily::Weight));
    }

    #[test]
    fn test_search_and_get_many() {
        let conn = setup();
        let a = InventoryItem::create(&conn, &rice()).unwrap();
        let mut oats = rice();
        oats.name = "Rolled Oats".to_string();
        let b = InventoryItem::create(&conn, &oats).unwrap();

        let found = InventoryItem::search(&conn, "oat", 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, b.id);

        let many = InventoryItem::get_many(&conn, &[a.id, b.id, 999]).unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(InventoryItem::count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_list_by_expiration() {
        let conn = setup();
        for (name, date) in [("Milk", Some("2026-01-05")), ("Salt", None), ("Eggs", Some("2026-01-02"))] {
            let mut data = rice();
            data.name = name.to_string();
            data.expiration_date = date.map(String::from);
            InventoryItem::create(&conn, &data).unwrap();
        }
        let items = InventoryItem::list(&conn, "expiration_date", "asc", 10, 0).unwrap();
        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Eggs", "Milk", "Salt"]);
    }

    #[test]
    fn test_delete() {
        let conn = setup();
        let item = InventoryItem::create(&conn, &rice()).unwrap();
        assert!(InventoryItem::delete(&conn, item.id).unwrap());
        assert!(!InventoryItem::delete(&conn, item.id).unwrap());
        assert!(InventoryItem::get_by_id(&conn, item.id).unwrap().is_none());
    }
}
