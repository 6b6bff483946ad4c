//! Inventory MCP Tools
//!
//! Tools for managing pantry items.

use chrono::NaiveDate;
use serde::Serialize;

use crate::db::Database;
use crate::models::{
    cascade_recalculate_from_item, InventoryItem, InventoryItemCreate, InventoryItemUpdate,
    PartialNutrition,
};
use crate::nutrition::{classify_unit, grams_per_unit, validate_unit, UnitFamily};

/// Response for add_inventory_item
#[derive(Debug, Serialize)]
pub struct AddInventoryItemResponse {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub serving_unit_type: Option<UnitFamily>,
    pub created_at: String,
}

/// Summary of an inventory item for list/search results
#[derive(Debug, Serialize)]
pub struct InventoryItemSummary {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub quantity: f64,
    pub unit: String,
    pub calories: Option<f64>,
    pub serving: Option<String>,
    pub expiration_date: Option<String>,
}

impl From<&InventoryItem> for InventoryItemSummary {
    fn from(item: &InventoryItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            brand: item.brand.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            calories: item.nutrition.calories,
            serving: describe_serving(item),
            expiration_date: item.expiration_date.clone(),
        }
    }
}

/// "0.25 cup (45g)" style label for the declared serving
fn describe_serving(item: &InventoryItem) -> Option<String> {
    let unit = item.serving_unit.as_deref()?;
    let quantity = item.serving_quantity.unwrap_or(1.0);
    Some(match item.serving_size {
        Some(grams) => format!("{} {} ({}g)", quantity, unit, grams),
        None => format!("{} {}", quantity, unit),
    })
}

/// Full inventory item detail response
#[derive(Debug, Serialize)]
pub struct InventoryItemDetail {
    #[serde(flatten)]
    pub item: InventoryItem,
    /// Grams in one serving unit, when the serving basis allows it
    pub grams_per_serving_unit: Option<f64>,
    pub used_in_recipes: Vec<String>,
    pub meal_log_count: i64,
}

/// Response for list_inventory_items
#[derive(Debug, Serialize)]
pub struct ListInventoryItemsResponse {
    pub items: Vec<InventoryItemSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for search_inventory_items
#[derive(Debug, Serialize)]
pub struct SearchInventoryItemsResponse {
    pub items: Vec<InventoryItemSummary>,
    pub total: usize,
}

/// Response for update_inventory_item
#[derive(Debug, Serialize)]
pub struct UpdateInventoryItemResponse {
    pub success: bool,
    pub updated_at: String,
    /// Recipe IDs that had nutrition recalculated
    pub recipes_updated: Vec<i64>,
}

/// Response for delete_inventory_item blocked
#[derive(Debug, Serialize)]
pub struct DeleteInventoryItemBlockedResponse {
    pub error: String,
    pub used_in_recipes: Vec<String>,
    pub meal_log_count: i64,
}

/// Response for successful delete_inventory_item
#[derive(Debug, Serialize)]
pub struct DeleteInventoryItemSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn check_unit(field: &str, unit: &str) -> Result<(), String> {
    let validation = validate_unit(unit);
    match validation.error {
        Some(error) if !validation.is_valid => Err(format!("{}: {}", field, error)),
        _ => Ok(()),
    }
}

fn check_positive(field: &str, value: Option<f64>) -> Result<(), String> {
    match value {
        Some(v) if !(v > 0.0) => Err(format!("{} must be greater than 0", field)),
        _ => Ok(()),
    }
}

fn check_nutrition(nutrition: &PartialNutrition) -> Result<(), String> {
    let fields = [
        ("calories", nutrition.calories),
        ("protein", nutrition.protein),
        ("carbs", nutrition.carbs),
        ("fat", nutrition.fat),
    ];
    for (name, value) in fields {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(format!("{} cannot be negative", name));
            }
        }
    }
    Ok(())
}

fn check_date(date: &str) -> Result<(), String> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| format!("Invalid expiration_date '{}': expected YYYY-MM-DD", date))
}

fn check_unit_type(serving_unit: Option<&str>, unit_type: Option<UnitFamily>) -> Result<(), String> {
    if let (Some(unit), Some(declared)) = (serving_unit, unit_type) {
        if let Some(actual) = classify_unit(unit) {
            if actual != declared {
                return Err(format!(
                    "serving_unit_type '{}' does not match serving_unit '{}' ({})",
                    declared, unit, actual
                ));
            }
        }
    }
    Ok(())
}

/// Add a new inventory item
pub fn add_inventory_item(db: &Database, data: InventoryItemCreate) -> Result<AddInventoryItemResponse, String> {
    if data.name.trim().is_empty() {
        return Err("Inventory item name cannot be empty".to_string());
    }

    check_nutrition(&PartialNutrition {
        calories: data.calories,
        protein: data.protein,
        carbs: data.carbs,
        fat: data.fat,
    })?;
    check_positive("serving_size", data.serving_size)?;
    check_positive("serving_quantity", data.serving_quantity)?;
    if let Some(ref unit) = data.serving_unit {
        check_unit("serving_unit", unit)?;
    }
    check_unit_type(data.serving_unit.as_deref(), data.serving_unit_type)?;
    check_unit("unit", &data.unit)?;
    if data.quantity < 0.0 {
        return Err("quantity cannot be negative".to_string());
    }
    if let Some(ref date) = data.expiration_date {
        check_date(date)?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let item = InventoryItem::create(&conn, &data)
        .map_err(|e| format!("Failed to create inventory item: {}", e))?;

    tracing::info!(id = item.id, name = %item.name, "Added inventory item");

    Ok(AddInventoryItemResponse {
        id: item.id,
        name: item.name,
        brand: item.brand,
        serving_unit_type: item.serving_unit_type,
        created_at: item.created_at,
    })
}

/// Get an inventory item by ID with usage information
pub fn get_inventory_item(db: &Database, id: i64) -> Result<Option<InventoryItemDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let item = InventoryItem::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get inventory item: {}", e))?;

    match item {
        Some(item) => {
            let used_in_recipes = InventoryItem::get_used_in_recipes(&conn, id)
                .map_err(|e| format!("Failed to get recipe usage: {}", e))?;
            let meal_log_count = InventoryItem::get_meal_log_count(&conn, id)
                .map_err(|e| format!("Failed to count meal logs: {}", e))?;
            let grams_per_serving_unit = match (item.serving_quantity, item.serving_size) {
                (Some(quantity), Some(grams)) => grams_per_unit(quantity, grams).ok(),
                _ => None,
            };

            Ok(Some(InventoryItemDetail {
                item,
                grams_per_serving_unit,
                used_in_recipes,
                meal_log_count,
            }))
        }
        None => Ok(None),
    }
}

/// List inventory items with sorting and pagination
pub fn list_inventory_items(
    db: &Database,
    sort_by: &str,
    sort_order: &str,
    limit: i64,
    offset: i64,
) -> Result<ListInventoryItemsResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items = InventoryItem::list(&conn, sort_by, sort_order, limit, offset)
        .map_err(|e| format!("Failed to list inventory items: {}", e))?;

    let total = InventoryItem::count(&conn)
        .map_err(|e| format!("Failed to count inventory items: {}", e))?;

    Ok(ListInventoryItemsResponse {
        items: items.iter().map(InventoryItemSummary::from).collect(),
        total,
        limit,
        offset,
    })
}

/// Search inventory items by name or brand
pub fn search_inventory_items(db: &Database, query: &str, limit: i64) -> Result<SearchInventoryItemsResponse, String> {
    let limit = limit.clamp(1, 100);
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items = InventoryItem::search(&conn, query.trim(), limit)
        .map_err(|e| format!("Search failed: {}", e))?;

    let summaries: Vec<InventoryItemSummary> = items.iter().map(InventoryItemSummary::from).collect();
    let total = summaries.len();

    Ok(SearchInventoryItemsResponse {
        items: summaries,
        total,
    })
}

/// Update an inventory item and recalculate every recipe that uses it
pub fn update_inventory_item(
    db: &Database,
    id: i64,
    data: InventoryItemUpdate,
) -> Result<UpdateInventoryItemResponse, String> {
    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            return Err("Inventory item name cannot be empty".to_string());
        }
    }
    check_nutrition(&PartialNutrition {
        calories: data.calories,
        protein: data.protein,
        carbs: data.carbs,
        fat: data.fat,
    })?;
    check_positive("serving_size", data.serving_size)?;
    check_positive("serving_quantity", data.serving_quantity)?;
    if let Some(ref unit) = data.serving_unit {
        check_unit("serving_unit", unit)?;
    }
    if let Some(ref unit) = data.unit {
        check_unit("unit", unit)?;
    }
    if let Some(quantity) = data.quantity {
        if quantity < 0.0 {
            return Err("quantity cannot be negative".to_string());
        }
    }
    if let Some(ref date) = data.expiration_date {
        check_date(date)?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let existing = InventoryItem::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Inventory item not found with id: {}", id))?;
    let serving_unit = data.serving_unit.as_deref().or(existing.serving_unit.as_deref());
    check_unit_type(serving_unit, data.serving_unit_type)?;

    let item = InventoryItem::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update inventory item: {}", e))?
        .ok_or_else(|| format!("Inventory item not found with id: {}", id))?;

    let recipes_updated = cascade_recalculate_from_item(&conn, id)
        .map_err(|e| format!("Failed to recalculate recipes: {}", e))?;

    if !recipes_updated.is_empty() {
        tracing::info!(id, recipes = recipes_updated.len(), "Recalculated recipes after item update");
    }

    Ok(UpdateInventoryItemResponse {
        success: true,
        updated_at: item.updated_at,
        recipes_updated,
    })
}

/// Delete an inventory item (blocked if any recipe or meal log references it)
pub fn delete_inventory_item(
    db: &Database,
    id: i64,
) -> Result<Result<DeleteInventoryItemSuccessResponse, DeleteInventoryItemBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let item = InventoryItem::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?;
    if item.is_none() {
        return Err(format!("Inventory item not found with id: {}", id));
    }

    let used_in_recipes = InventoryItem::get_used_in_recipes(&conn, id)
        .map_err(|e| format!("Failed to get recipe usage: {}", e))?;
    let meal_log_count = InventoryItem::get_meal_log_count(&conn, id)
        .map_err(|e| format!("Failed to count meal logs: {}", e))?;

    if !used_in_recipes.is_empty() || meal_log_count > 0 {
        return Ok(Err(DeleteInventoryItemBlockedResponse {
            error: format!(
                "Cannot delete inventory item: used in {} recipe(s) and {} meal log(s)",
                used_in_recipes.len(),
                meal_log_count
            ),
            used_in_recipes,
            meal_log_count,
        }));
    }

    InventoryItem::delete(&conn, id)
        .map_err(|e| format!("Failed to delete inventory item: {}", e))?;

    Ok(Ok(DeleteInventoryItemSuccessResponse {
        success: true,
        deleted_id: id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn setup() -> Database {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| run_migrations(conn)).unwrap();
        db
    }

    fn oil() -> InventoryItemCreate {
        InventoryItemCreate {
            name: "Olive Oil".to_string(),
            calories: Some(120.0),
            fat: Some(14.0),
            serving_size: Some(14.0),
            serving_quantity: Some(1.0),
            serving_unit: Some("tbsp".to_string()),
            quantity: 1.0,
            unit: "bottle".to_string(),
            expiration_date: Some("2027-02-01".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_add_and_get() {
        let db = setup();
        let added = add_inventory_item(&db, oil()).unwrap();
        assert_eq!(added.serving_unit_type, Some(UnitFamily::Volume));

        let detail = get_inventory_item(&db, added.id).unwrap().unwrap();
        assert_eq!(detail.item.name, "Olive Oil");
        assert_eq!(detail.grams_per_serving_unit, Some(14.0));
        assert!(detail.used_in_recipes.is_empty());
        assert!(get_inventory_item(&db, 999).unwrap().is_none());
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let db = setup();

        let mut data = oil();
        data.serving_unit = Some("glug".to_string());
        assert!(add_inventory_item(&db, data).unwrap_err().contains("glug"));

        let mut data = oil();
        data.expiration_date = Some("02/01/2027".to_string());
        assert!(add_inventory_item(&db, data).is_err());

        let mut data = oil();
        data.serving_size = Some(0.0);
        assert!(add_inventory_item(&db, data).is_err());

        let mut data = oil();
        data.fat = Some(-1.0);
        assert!(add_inventory_item(&db, data).is_err());

        let mut data = oil();
        data.serving_unit_type = Some(UnitFamily::Weight);
        assert!(add_inventory_item(&db, data).unwrap_err().contains("does not match"));
    }

    #[test]
    fn test_list_and_search() {
        let db = setup();
        add_inventory_item(&db, oil()).unwrap();
        let mut vinegar = oil();
        vinegar.name = "Balsamic Vinegar".to_string();
        add_inventory_item(&db, vinegar).unwrap();

        let list = list_inventory_items(&db, "name", "asc", 500, -5).unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.limit, 200);
        assert_eq!(list.offset, 0);
        assert_eq!(list.items[0].name, "Balsamic Vinegar");
        assert_eq!(list.items[0].serving.as_deref(), Some("1 tbsp (14g)"));

        let found = search_inventory_items(&db, " oil ", 10).unwrap();
        assert_eq!(found.total, 1);
    }

    #[test]
    fn test_update_missing_item() {
        let db = setup();
        let err = update_inventory_item(&db, 5, InventoryItemUpdate::default()).unwrap_err();
        assert!(err.contains("not found"));
    }

    #[test]
    fn test_delete() {
        let db = setup();
        let added = add_inventory_item(&db, oil()).unwrap();
        let deleted = delete_inventory_item(&db, added.id).unwrap();
        assert!(deleted.is_ok());
        assert!(delete_inventory_item(&db, added.id).is_err());
    }
}
