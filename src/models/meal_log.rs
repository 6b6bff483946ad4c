//! Meal Log model
//!
//! A record of food eaten, either servings of a recipe or a direct amount of
//! an inventory item. Nutrition is a snapshot taken when the meal is logged.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{InventoryItem, Nutrition, Recipe};
use crate::db::{DbError, DbResult};
use crate::nutrition::line_nutrition;

/// Meal type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
    Unspecified,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
            MealType::Unspecified => "unspecified",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => MealType::Breakfast,
            "lunch" => MealType::Lunch,
            "dinner" => MealType::Dinner,
            "snack" => MealType::Snack,
            _ => MealType::Unspecified,
        }
    }
}

/// What was eaten
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum MealSource {
    /// Servings of a recipe's cached per-serving nutrition
    Recipe { recipe_id: i64, servings: f64 },
    /// An amount of an inventory item in any supported unit
    Item { item_id: i64, quantity: f64, unit: String },
}

/// A logged meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealLog {
    pub id: i64,
    pub date: String,
    pub meal_type: MealType,
    pub recipe_id: Option<i64>,
    pub item_id: Option<i64>,
    pub servings: f64,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub nutrition: Nutrition,
    pub notes: Option<String>,
    pub created_at: String,
}

/// Meal log with the name of what was eaten
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealLogDetail {
    #[serde(flatten)]
    pub log: MealLog,
    pub source_type: String,
    pub source_name: String,
}

/// Data for logging a meal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealLogCreate {
    pub date: String,
    pub meal_type: MealType,
    pub source: MealSource,
    pub notes: Option<String>,
}

impl MealLog {
    /// Create from a database row
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let meal_type: String = row.get("meal_type")?;
        Ok(Self {
            id: row.get("id")?,
            date: row.get("date")?,
            meal_type: MealType::from_str(&meal_type),
            recipe_id: row.get("recipe_id")?,
            item_id: row.get("item_id")?,
            servings: row.get("servings")?,
            quantity: row.get("quantity")?,
            unit: row.get("unit")?,
            nutrition: Nutrition {
                calories: row.get("calories")?,
                protein: row.get("protein")?,
                carbs: row.get("carbs")?,
                fat: row.get("fat")?,
            },
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Log a meal, snapshotting its nutrition
    pub fn create(conn: &Connection, data: &MealLogCreate) -> DbResult<Self> {
        let (recipe_id, item_id, servings, quantity, unit, nutrition) = match &data.source {
            MealSource::Recipe { recipe_id, servings } => {
                if !(*servings > 0.0) {
                    return Err(DbError::Invalid(format!(
                        "servings must be greater than 0 (got {})",
                        servings
                    )));
                }
                let recipe = Recipe::get_by_id(conn, *recipe_id)?
                    .ok_or(DbError::NotFound("recipe", *recipe_id))?;
                let nutrition = recipe.cached_nutrition.scale(*servings).rounded(1);
                (Some(*recipe_id), None, *servings, None, None, nutrition)
            }
            MealSource::Item { item_id, quantity, unit } => {
                if !(*quantity > 0.0) {
                    return Err(DbError::Invalid(format!(
                        "quantity must be greater than 0 (got {})",
                        quantity
                    )));
                }
                let item = InventoryItem::get_by_id(conn, *item_id)?
                    .ok_or(DbError::NotFound("inventory item", *item_id))?;
                let nutrition = line_nutrition(*quantity, unit, &item).rounded(1);
                (None, Some(*item_id), 1.0, Some(*quantity), Some(unit.trim()), nutrition)
            }
        };

        conn.execute(
            r#"
            INSERT INTO meal_logs (
                date, meal_type, recipe_id, item_id, servings, quantity, unit,
                calories, protein, carbs, fat, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                data.date,
                data.meal_type.as_str(),
                recipe_id,
                item_id,
                servings,
                quantity,
                unit,
                nutrition.calories,
                nutrition.protein,
                nutrition.carbs,
                nutrition.fat,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::NotFound("meal log", id))
    }

    /// Get a meal log by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM meal_logs WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a meal log with its source name
    pub fn get_detail(conn: &Connection, id: i64) -> DbResult<Option<MealLogDetail>> {
        match Self::get_by_id(conn, id)? {
            Some(log) => Ok(Some(Self::with_source(conn, log)?)),
            None => Ok(None),
        }
    }

    /// Get all meal logs for a date
    pub fn get_for_date(conn: &Connection, date: &str) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM meal_logs WHERE date = ?1
            ORDER BY CASE meal_type
                WHEN 'breakfast' THEN 0
                WHEN 'lunch' THEN 1
                WHEN 'dinner' THEN 2
                WHEN 'snack' THEN 3
                ELSE 4
            END, id
            "#,
        )?;

        let logs = stmt
            .query_map([date], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(logs)
    }

    /// Get detailed meal logs for a date
    pub fn get_details_for_date(conn: &Connection, date: &str) -> DbResult<Vec<MealLogDetail>> {
        Self::get_for_date(conn, date)?
            .into_iter()
            .map(|log| Self::with_source(conn, log))
            .collect()
    }

    fn with_source(conn: &Connection, log: MealLog) -> DbResult<MealLogDetail> {
        let (source_type, source_name) = match (log.recipe_id, log.item_id) {
            (Some(recipe_id), _) => {
                let name = Recipe::get_by_id(conn, recipe_id)?
                    .map(|r| r.name)
                    .unwrap_or_default();
                ("recipe", name)
            }
            (None, Some(item_id)) => {
                let name = InventoryItem::get_by_id(conn, item_id)?
                    .map(|i| i.name)
                    .unwrap_or_default();
                ("item", name)
            }
            (None, None) => ("unknown", String::new()),
        };

        Ok(MealLogDetail {
            log,
            source_type: source_type.to_string(),
            source_name,
        })
    }

    /// Delete a meal log
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM meal_logs WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

/// Total nutrition logged on a date
pub fn calculate_daily_totals(conn: &Connection, date: &str) -> DbResult<Nutrition> {
    let total: Nutrition = MealLog::get_for_date(conn, date)?
        .iter()
        .map(|log| log.nutrition)
        .sum();

    Ok(total.rounded(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{InventoryItemCreate, RecipeCreate};

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn add_bar(conn: &Connection) -> InventoryItem {
        let data = InventoryItemCreate {
            name: "Protein Bar".to_string(),
            calories: Some(200.0),
            protein: Some(20.0),
            carbs: Some(22.0),
            fat: Some(7.0),
            serving_size: Some(60.0),
            serving_quantity: Some(1.0),
            serving_unit: Some("bar".to_string()),
            ..Default::default()
        };
        InventoryItem::create(conn, &data).unwrap()
    }

    fn add_recipe(conn: &Connection) -> Recipe {
        let data = RecipeCreate {
            name: "Oatmeal".to_string(),
            servings: 2.0,
            instructions: None,
            notes: None,
        };
        let recipe = Recipe::create(conn, &data).unwrap();
        let nutrition = Nutrition { calories: 150.0, protein: 5.0, carbs: 27.0, fat: 2.5 };
        Recipe::update_cached_nutrition(conn, recipe.id, &nutrition).unwrap();
        recipe
    }

    fn log(conn: &Connection, meal_type: MealType, source: MealSource) -> DbResult<MealLog> {
        let data = MealLogCreate {
            date: "2026-03-14".to_string(),
            meal_type,
            source,
            notes: None,
        };
        MealLog::create(conn, &data)
    }

    #[test]
    fn test_log_recipe_servings() {
        let conn = setup();
        let recipe = add_recipe(&conn);
        let entry = log(
            &conn,
            MealType::Breakfast,
            MealSource::Recipe { recipe_id: recipe.id, servings: 1.5 },
        )
        .unwrap();

        assert_eq!(entry.recipe_id, Some(recipe.id));
        assert_eq!(entry.nutrition.calories, 225.0);
        assert_eq!(entry.nutrition.fat, 3.8);
        assert_eq!(Recipe::get_times_logged(&conn, recipe.id).unwrap(), 1);
    }

    #[test]
    fn test_log_item_quantity() {
        let conn = setup();
        let bar = add_bar(&conn);
        let entry = log(
            &conn,
            MealType::Snack,
            MealSource::Item { item_id: bar.id, quantity: 2.0, unit: "bars".to_string() },
        )
        .unwrap();

        assert_eq!(entry.nutrition.calories, 400.0);
        assert_eq!(entry.unit.as_deref(), Some("bars"));
        assert_eq!(InventoryItem::get_meal_log_count(&conn, bar.id).unwrap(), 1);
    }

    #[test]
    fn test_snapshot_survives_recipe_change() {
        let conn = setup();
        let recipe = add_recipe(&conn);
        let entry = log(
            &conn,
            MealType::Lunch,
            MealSource::Recipe { recipe_id: recipe.id, servings: 1.0 },
        )
        .unwrap();

        Recipe::update_cached_nutrition(&conn, recipe.id, &Nutrition::zero()).unwrap();
        let reloaded = MealLog::get_by_id(&conn, entry.id).unwrap().unwrap();
        assert_eq!(reloaded.nutrition.calories, 150.0);
    }

    #[test]
    fn test_daily_totals_and_order() {
        let conn = setup();
        let recipe = add_recipe(&conn);
        let bar = add_bar(&conn);
        log(&conn, MealType::Snack, MealSource::Item { item_id: bar.id, quantity: 60.0, unit: "g".to_string() }).unwrap();
        log(&conn, MealType::Breakfast, MealSource::Recipe { recipe_id: recipe.id, servings: 1.0 }).unwrap();

        let details = MealLog::get_details_for_date(&conn, "2026-03-14").unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].log.meal_type, MealType::Breakfast);
        assert_eq!(details[0].source_name, "Oatmeal");
        assert_eq!(details[1].source_type, "item");

        let totals = calculate_daily_totals(&conn, "2026-03-14").unwrap();
        assert_eq!(totals.calories, 350.0);
        assert_eq!(totals.protein, 25.0);
        assert_eq!(calculate_daily_totals(&conn, "2026-03-15").unwrap(), Nutrition::zero());
    }

    #[test]
    fn test_rejects_bad_input() {
        let conn = setup();
        let recipe = add_recipe(&conn);
        assert!(matches!(
            log(&conn, MealType::Dinner, MealSource::Recipe { recipe_id: recipe.id, servings: 0.0 }),
            Err(DbError::Invalid(_))
        ));
        assert!(matches!(
            log(&conn, MealType::Dinner, MealSource::Recipe { recipe_id: 77, servings: 1.0 }),
            Err(DbError::NotFound("recipe", 77))
        ));
    }

    #[test]
    fn test_logged_recipe_cannot_be_deleted() {
        let conn = setup();
        let recipe = add_recipe(&conn);
        let entry = log(
            &conn,
            MealType::Dinner,
            MealSource::Recipe { recipe_id: recipe.id, servings: 1.0 },
        )
        .unwrap();

        assert!(Recipe::delete(&conn, recipe.id).is_err());
        assert!(MealLog::delete(&conn, entry.id).unwrap());
        assert!(Recipe::delete(&conn, recipe.id).unwrap());
    }

    #[test]
    fn test_meal_type_parsing() {
        assert_eq!(MealType::from_str(" Dinner "), MealType::Dinner);
        assert_eq!(MealType::from_str("brunch"), MealType::Unspecified);
    }
}
