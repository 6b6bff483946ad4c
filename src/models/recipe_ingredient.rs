//! Recipe Ingredient model
//!
//! Links inventory items to recipes with a quantity and unit, and keeps the
//! recipe's cached nutrition in step with its ingredients.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{InventoryItem, Nutrition, Recipe};
use crate::db::{DbError, DbResult};
use crate::nutrition::{aggregate_recipe_nutrition, IngredientUsage};

/// A recipe ingredient linking an inventory item to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub item_id: i64,
    pub quantity: f64,
    pub unit: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Recipe ingredient with item details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientDetail {
    pub id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub quantity: f64,
    pub unit: String,
    pub notes: Option<String>,
}

/// Data for adding an ingredient to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientCreate {
    pub recipe_id: i64,
    pub item_id: i64,
    pub quantity: f64,
    pub unit: String,
    pub notes: Option<String>,
}

/// Data for updating a recipe ingredient
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeIngredientUpdate {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

impl RecipeIngredient {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            recipe_id: row.get("recipe_id")?,
            item_id: row.get("item_id")?,
            quantity: row.get("quantity")?,
            unit: row.get("unit")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// The engine's view of this line
    pub fn usage(&self) -> IngredientUsage {
        IngredientUsage {
            item_id: self.item_id,
            quantity: self.quantity,
            unit: self.unit.clone(),
        }
    }

    /// Add an ingredient to a recipe
    pub fn create(conn: &Connection, data: &RecipeIngredientCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, item_id, quantity, unit, notes)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.recipe_id,
                data.item_id,
                data.quantity,
                data.unit.trim(),
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("recipe ingredient", id))
    }

    /// Get an ingredient by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipe_ingredients WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get all ingredients for a recipe
    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM recipe_ingredients WHERE recipe_id = ?1 ORDER BY id")?;

        let ingredients = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ingredients)
    }

    /// Get ingredients with item details for a recipe
    pub fn get_details_for_recipe(
        conn: &Connection,
        recipe_id: i64,
    ) -> DbResult<Vec<RecipeIngredientDetail>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT ri.id, ri.item_id, ii.name as item_name,
                   ri.quantity, ri.unit, ri.notes
            FROM recipe_ingredients ri
            INNER JOIN inventory_items ii ON ri.item_id = ii.id
            WHERE ri.recipe_id = ?1
            ORDER BY ri.id
            "#,
        )?;

        let details = stmt
            .query_map([recipe_id], |row| {
                Ok(RecipeIngredientDetail {
                    id: row.get("id")?,
                    item_id: row.get("item_id")?,
                    item_name: row.get("item_name")?,
                    quantity: row.get("quantity")?,
                    unit: row.get("unit")?,
                    notes: row.get("notes")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(details)
    }

    /// Update an ingredient
    pub fn update(conn: &Connection, id: i64, data: &RecipeIngredientUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(qty) = data.quantity {
            updates.push(format!("quantity = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(qty));
        }
        if let Some(ref unit) = data.unit {
            updates.push(format!("unit = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(unit.trim().to_string()));
        }
        if let Some(ref notes) = data.notes {
            updates.push(format!("notes = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(notes.clone()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE recipe_ingredients SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    /// Delete an ingredient
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipe_ingredients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

/// Calculate per-serving nutrition for a recipe from its ingredients
pub fn calculate_recipe_nutrition(conn: &Connection, recipe_id: i64) -> DbResult<Nutrition> {
    let recipe =
        Recipe::get_by_id(conn, recipe_id)?.ok_or(DbError::NotFound("recipe", recipe_id))?;

    let usages: Vec<IngredientUsage> = RecipeIngredient::get_for_recipe(conn, recipe_id)?
        .iter()
        .map(RecipeIngredient::usage)
        .collect();
    let item_ids: Vec<i64> = usages.iter().map(|u| u.item_id).collect();
    let items = InventoryItem::get_many(conn, &item_ids)?;

    Ok(aggregate_recipe_nutrition(&usages, &items, recipe.servings))
}

/// Recalculate and update cached nutrition for a recipe
pub fn recalculate_recipe_nutrition(conn: &Connection, recipe_id: i64) -> DbResult<Nutrition> {
    let nutrition = calculate_recipe_nutrition(conn, recipe_id)?;
    Recipe::update_cached_nutrition(conn, recipe_id, &nutrition)?;
    tracing::debug!(recipe_id, calories = nutrition.calories, "Recalculated recipe nutrition");
    Ok(nutrition)
}

/// Recalculate every recipe that uses an inventory item
///
/// Returns the IDs of the recipes that were recalculated.
pub fn cascade_recalculate_from_item(conn: &Connection, item_id: i64) -> DbResult<Vec<i64>> {
    let recipe_ids = InventoryItem::get_recipe_ids_using_item(conn, item_id)?;
    for recipe_id in &recipe_ids {
        recalculate_recipe_nutrition(conn, *recipe_id)?;
    }
    Ok(recipe_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{InventoryItemCreate, InventoryItemUpdate, RecipeCreate};

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn add_rice(conn: &Connection) -> InventoryItem {
        let data = InventoryItemCreate {
            name: "Rice".to_string(),
            calories: Some(160.0),
            protein: Some(3.0),
            carbs: Some(36.0),
            fat: Some(0.0),
            serving_size: Some(45.0),
            serving_quantity: Some(0.25),
            serving_unit: Some("cup".to_string()),
            unit: "lb".to_string(),
            ..Default::default()
        };
        InventoryItem::create(conn, &data).unwrap()
    }

    fn add_recipe(conn: &Connection, servings: f64) -> Recipe {
        let data = RecipeCreate {
            name: "Rice Bowl".to_string(),
            servings,
            instructions: None,
            notes: None,
        };
        Recipe::create(conn, &data).unwrap()
    }

    fn add_line(conn: &Connection, recipe_id: i64, item_id: i64, quantity: f64, unit: &str) -> RecipeIngredient {
        let data = RecipeIngredientCreate {
            recipe_id,
            item_id,
            quantity,
            unit: unit.to_string(),
            notes: None,
        };
        RecipeIngredient::create(conn, &data).unwrap()
    }

    #[test]
    fn test_recalculate_recipe_nutrition() {
        let conn = setup();
        let rice = add_rice(&conn);
        let recipe = add_recipe(&conn, 4.0);
        add_line(&conn, recipe.id, rice.id, 2.0, "cup");

        let nutrition = recalculate_recipe_nutrition(&conn, recipe.id).unwrap();
        assert_eq!(nutrition.calories, 320.0);
        assert_eq!(nutrition.carbs, 72.0);

        let cached = Recipe::get_by_id(&conn, recipe.id).unwrap().unwrap();
        assert_eq!(cached.cached_nutrition, nutrition);
    }

    #[test]
    fn test_details_include_item_name() {
        let conn = setup();
        let rice = add_rice(&conn);
        let recipe = add_recipe(&conn, 1.0);
        add_line(&conn, recipe.id, rice.id, 100.0, "g");

        let details = RecipeIngredient::get_details_for_recipe(&conn, recipe.id).unwrap();
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].item_name, "Rice");
        assert_eq!(details[0].unit, "g");
    }

    #[test]
    fn test_cascade_from_item_update() {
        let conn = setup();
        let rice = add_rice(&conn);
        let recipe = add_recipe(&conn, 1.0);
        add_line(&conn, recipe.id, rice.id, 0.25, "cup");
        recalculate_recipe_nutrition(&conn, recipe.id).unwrap();

        let update = InventoryItemUpdate { calories: Some(200.0), ..Default::default() };
        InventoryItem::update(&conn, rice.id, &update).unwrap();
        let recalculated = cascade_recalculate_from_item(&conn, rice.id).unwrap();
        assert_eq!(recalculated, vec![recipe.id]);

        let cached = Recipe::get_by_id(&conn, recipe.id).unwrap().unwrap();
        assert_eq!(cached.cached_nutrition.calories, 200.0);
    }

    #[test]
    fn test_item_in_use_cannot_be_deleted() {
        let conn = setup();
        let rice = add_rice(&conn);
        let recipe = add_recipe(&conn, 1.0);
        add_line(&conn, recipe.id, rice.id, 1.0, "cup");

        assert!(InventoryItem::delete(&conn, rice.id).is_err());
        assert!(Recipe::delete(&conn, recipe.id).unwrap());
        assert!(InventoryItem::delete(&conn, rice.id).unwrap());
    }

    #[test]
    fn test_update_and_delete_ingredient() {
        let conn = setup();
        let rice = add_rice(&conn);
        let recipe = add_recipe(&conn, 1.0);
        let line = add_line(&conn, recipe.id, rice.id, 1.0, "cup");

        let update = RecipeIngredientUpdate { quantity: Some(0.5), ..Default::default() };
        let updated = RecipeIngredient::update(&conn, line.id, &update).unwrap().unwrap();
        assert_eq!(updated.quantity, 0.5);

        assert!(RecipeIngredient::delete(&conn, line.id).unwrap());
        assert!(RecipeIngredient::get_for_recipe(&conn, recipe.id).unwrap().is_empty());
    }
}
