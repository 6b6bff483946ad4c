//! Meal Log MCP Tools
//!
//! Tools for logging what was eaten and reviewing daily totals.

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::{Database, DbError};
use crate::models::{
    calculate_daily_totals, MealLog, MealLogCreate, MealLogDetail, MealSource, MealType, Nutrition,
};
use crate::nutrition::validate_unit;

/// Response for log_meal
#[derive(Debug, Serialize)]
pub struct LogMealResponse {
    pub id: i64,
    pub date: String,
    pub meal_type: MealType,
    pub nutrition: Nutrition,
    pub daily_totals: Nutrition,
}

/// Response for list_meals
#[derive(Debug, Serialize)]
pub struct ListMealsResponse {
    pub date: String,
    pub meals: Vec<MealLogDetail>,
    pub count: usize,
    pub daily_totals: Nutrition,
}

/// Response for delete_meal_log
#[derive(Debug, Serialize)]
pub struct DeleteMealLogResponse {
    pub success: bool,
    pub deleted_id: i64,
    pub daily_totals: Nutrition,
}

fn check_date(date: &str) -> Result<(), String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| format!("Invalid date '{}': expected YYYY-MM-DD", date))
}

/// Log a meal from a recipe or directly from an inventory item
pub fn log_meal(db: &Database, data: MealLogCreate) -> Result<LogMealResponse, String> {
    check_date(&data.date)?;
    if let MealSource::Item { ref unit, .. } = data.source {
        let validation = validate_unit(unit);
        if !validation.is_valid {
            return Err(validation.error.unwrap_or_else(|| format!("Unsupported unit '{}'", unit)));
        }
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let log = MealLog::create(&conn, &data).map_err(|e| match e {
        DbError::NotFound(..) | DbError::Invalid(_) => e.to_string(),
        other => format!("Failed to log meal: {}", other),
    })?;

    let daily_totals = calculate_daily_totals(&conn, &log.date)
        .map_err(|e| format!("Failed to total day: {}", e))?;

    tracing::info!(id = log.id, date = %log.date, calories = log.nutrition.calories, "Logged meal");

    Ok(LogMealResponse {
        id: log.id,
        date: log.date,
        meal_type: log.meal_type,
        nutrition: log.nutrition,
        daily_totals,
    })
}

/// Get a meal log by ID
pub fn get_meal_log(db: &Database, id: i64) -> Result<Option<MealLogDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    MealLog::get_detail(&conn, id).map_err(|e| format!("Failed to get meal log: {}", e))
}

/// List meals logged on a date with the day's totals
pub fn list_meals(db: &Database, date: &str) -> Result<ListMealsResponse, String> {
    check_date(date)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let meals = MealLog::get_details_for_date(&conn, date)
        .map_err(|e| format!("Failed to list meals: {}", e))?;
    let daily_totals = calculate_daily_totals(&conn, date)
        .map_err(|e| format!("Failed to total day: {}", e))?;

    let count = meals.len();

    Ok(ListMealsResponse {
        date: date.to_string(),
        meals,
        count,
        daily_totals,
    })
}

/// Delete a meal log
pub fn delete_meal_log(db: &Database, id: i64) -> Result<DeleteMealLogResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let log = MealLog::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Meal log not found with id: {}", id))?;

    MealLog::delete(&conn, id).map_err(|e| format!("Failed to delete meal log: {}", e))?;

    let daily_totals = calculate_daily_totals(&conn, &log.date)
        .map_err(|e| format!("Failed to total day: {}", e))?;

    Ok(DeleteMealLogResponse {
        success: true,
        deleted_id: id,
        daily_totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{InventoryItem, InventoryItemCreate};

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| run_migrations(conn)).unwrap();
        let milk = InventoryItemCreate {
            name: "Whole Milk".to_string(),
            calories: Some(150.0),
            protein: Some(8.0),
            carbs: Some(12.0),
            fat: Some(8.0),
            serving_size: Some(240.0),
            serving_quantity: Some(1.0),
            serving_unit: Some("cup".to_string()),
            ..Default::default()
        };
        let id = db.with_conn(|conn| InventoryItem::create(conn, &milk)).unwrap().id;
        (db, id)
    }

    fn milk_log(item_id: i64, quantity: f64, unit: &str) -> MealLogCreate {
        MealLogCreate {
            date: "2026-04-02".to_string(),
            meal_type: MealType::Breakfast,
            source: MealSource::Item { item_id, quantity, unit: unit.to_string() },
            notes: None,
        }
    }

    #[test]
    fn test_log_and_list() {
        let (db, milk) = setup();
        let first = log_meal(&db, milk_log(milk, 120.0, "ml")).unwrap();
        assert_eq!(first.nutrition.calories, 75.0);

        let second = log_meal(&db, milk_log(milk, 4.0, "fl oz")).unwrap();
        assert_eq!(second.daily_totals.calories, 150.0);
        assert_eq!(second.daily_totals.protein, 8.0);

        let listed = list_meals(&db, "2026-04-02").unwrap();
        assert_eq!(listed.count, 2);
        assert_eq!(listed.meals[0].source_name, "Whole Milk");
    }

    #[test]
    fn test_log_rejects_bad_input() {
        let (db, milk) = setup();
        let mut data = milk_log(milk, 1.0, "cup");
        data.date = "April 2".to_string();
        assert!(log_meal(&db, data).is_err());

        assert!(log_meal(&db, milk_log(milk, 1.0, "splash")).unwrap_err().contains("splash"));
        assert!(log_meal(&db, milk_log(milk, -1.0, "cup")).is_err());
        assert_eq!(
            log_meal(&db, milk_log(31, 1.0, "cup")).unwrap_err(),
            "inventory item 31 not found"
        );
    }

    #[test]
    fn test_delete_updates_totals() {
        let (db, milk) = setup();
        let kept = log_meal(&db, milk_log(milk, 1.0, "cup")).unwrap();
        let dropped = log_meal(&db, milk_log(milk, 0.5, "cup")).unwrap();
        assert_eq!(dropped.daily_totals.calories, 225.0);

        let response = delete_meal_log(&db, dropped.id).unwrap();
        assert_eq!(response.daily_totals.calories, 150.0);
        assert!(get_meal_log(&db, dropped.id).unwrap().is_none());
        assert!(get_meal_log(&db, kept.id).unwrap().is_some());
        assert!(delete_meal_log(&db, dropped.id).is_err());
    }
}
