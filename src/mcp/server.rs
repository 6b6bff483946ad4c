//! Pantry MCP Server Implementation
//!
//! Implements the MCP server with all Pantry tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::{
    InventoryItemCreate, InventoryItemUpdate, MealLogCreate, MealSource, MealType,
    PartialNutrition, RecipeCreate, RecipeIngredientCreate, RecipeIngredientUpdate, RecipeUpdate,
};
use crate::nutrition::{IngredientUsage, UnitFamily};
use crate::tools::status::{StatusTracker, SERVER_INSTRUCTIONS};
use crate::tools::{inventory, meals, recipes, units};

/// Pantry MCP Service
#[derive(Clone)]
pub struct PantryService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<PantryService>,
}

impl PantryService {
    pub fn new(database_path: PathBuf, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

/// Serialize a tool response as pretty JSON text content
fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn not_found(kind: &str, id: i64) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(format!(
        r#"{{"error": "{} not found", "id": {}}}"#,
        kind, id
    ))]))
}

fn parse_unit_type(value: Option<&str>) -> Result<Option<UnitFamily>, McpError> {
    match value {
        None => Ok(None),
        Some(s) => UnitFamily::from_str(s).map(Some).ok_or_else(|| {
            McpError::invalid_params(
                format!("serving_unit_type must be volume, weight or package (got '{}')", s),
                None,
            )
        }),
    }
}

// ============================================================================
// Unit Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ValidateUnitParams {
    /// Unit to check, e.g. "tbsp", "fl oz", "lbs"
    pub unit: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ConvertVolumeParams {
    pub quantity: f64,
    pub from_unit: String,
    pub to_unit: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ScaleNutritionParams {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    /// Grams actually eaten or used
    pub actual_grams: f64,
    /// Grams the nutrition values are declared for
    #[serde(default = "default_base_grams")]
    pub base_serving_grams: f64,
}

fn default_base_grams() -> f64 { 100.0 }

// ============================================================================
// Inventory Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddInventoryItemParams {
    pub name: String,
    pub brand: Option<String>,
    /// Label nutrition per declared serving; omit values not on the label
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    /// Grams in one declared serving
    pub serving_size: Option<f64>,
    /// Declared serving amount, e.g. 0.25 for "1/4 cup (45g)"
    pub serving_quantity: Option<f64>,
    pub serving_unit: Option<String>,
    /// volume, weight or package; derived from serving_unit when omitted
    pub serving_unit_type: Option<String>,
    /// Amount on hand
    #[serde(default)]
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    /// ISO date: YYYY-MM-DD
    pub expiration_date: Option<String>,
    pub notes: Option<String>,
}

fn default_unit() -> String { "piece".to_string() }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct InventoryItemIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListInventoryItemsParams {
    /// name, created_at or expiration_date
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_sort_by() -> String { "name".to_string() }
fn default_sort_order() -> String { "asc".to_string() }
fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchInventoryItemsParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateInventoryItemParams {
    pub id: i64,
    pub name: Option<String>,
    pub brand: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub serving_size: Option<f64>,
    pub serving_quantity: Option<f64>,
    pub serving_unit: Option<String>,
    pub serving_unit_type: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub expiration_date: Option<String>,
    pub notes: Option<String>,
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    pub name: String,
    /// Number of servings the recipe makes
    #[serde(default = "default_servings")]
    pub servings: f64,
    pub instructions: Option<String>,
    pub notes: Option<String>,
}

fn default_servings() -> f64 { 1.0 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecipeIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecipesParams {
    /// Optional name search
    pub query: Option<String>,
    /// name, created_at or calories
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecipeParams {
    pub id: i64,
    pub name: Option<String>,
    pub servings: Option<f64>,
    pub instructions: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddRecipeIngredientParams {
    pub recipe_id: i64,
    pub item_id: i64,
    pub quantity: f64,
    /// Any supported unit: volume (cup, tbsp), weight (g, lb) or package (bar, scoop)
    pub unit: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecipeIngredientParams {
    /// Recipe ingredient ID
    pub id: i64,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecipeIngredientIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PreviewIngredientParam {
    pub item_id: i64,
    pub quantity: f64,
    pub unit: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PreviewRecipeNutritionParams {
    pub ingredients: Vec<PreviewIngredientParam>,
    #[serde(default = "default_servings")]
    pub servings: f64,
}

// ============================================================================
// Meal Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogMealParams {
    /// ISO date: YYYY-MM-DD
    pub date: String,
    /// breakfast, lunch, dinner, snack or unspecified
    #[serde(default = "default_meal_type")]
    pub meal_type: String,
    /// Log servings of a recipe (use with servings)
    pub recipe_id: Option<i64>,
    #[serde(default = "default_servings")]
    pub servings: f64,
    /// Log an inventory item directly (use with quantity and unit)
    pub item_id: Option<i64>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

fn default_meal_type() -> String { "unspecified".to_string() }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MealLogIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListMealsParams {
    /// ISO date: YYYY-MM-DD
    pub date: String,
}

impl LogMealParams {
    fn source(&self) -> Result<MealSource, McpError> {
        match (self.recipe_id, self.item_id) {
            (Some(recipe_id), None) => Ok(MealSource::Recipe {
                recipe_id,
                servings: self.servings,
            }),
            (None, Some(item_id)) => {
                let quantity = self.quantity.ok_or_else(|| {
                    McpError::invalid_params("quantity is required when logging an item", None)
                })?;
                let unit = self.unit.clone().ok_or_else(|| {
                    McpError::invalid_params("unit is required when logging an item", None)
                })?;
                Ok(MealSource::Item { item_id, quantity, unit })
            }
            (Some(_), Some(_)) => Err(McpError::invalid_params(
                "Only one of recipe_id or item_id can be provided",
                None,
            )),
            (None, None) => Err(McpError::invalid_params(
                "Either recipe_id or item_id must be provided",
                None,
            )),
        }
    }
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl PantryService {
    // --- Status ---

    #[tool(description = "Get the current status of the Pantry service including build info, database size and row counts, and process information")]
    async fn pantry_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        json_result(&tracker.get_status(&self.database))
    }

    // --- Units ---

    #[tool(description = "Check whether a unit is supported and report its family (volume, weight or package)")]
    fn validate_unit(&self, Parameters(p): Parameters<ValidateUnitParams>) -> Result<CallToolResult, McpError> {
        json_result(&units::validate_unit(&p.unit))
    }

    #[tool(description = "Convert a quantity between volume units (tsp, tbsp, cup, fl oz, ml, l) using cups as the pivot")]
    fn convert_volume(&self, Parameters(p): Parameters<ConvertVolumeParams>) -> Result<CallToolResult, McpError> {
        let result = units::convert_volume(p.quantity, &p.from_unit, &p.to_unit)
            .map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Scale nutrition declared for base_serving_grams to actual_grams. Calories round to whole numbers, macros to 2 decimals.")]
    fn scale_nutrition(&self, Parameters(p): Parameters<ScaleNutritionParams>) -> Result<CallToolResult, McpError> {
        let base = PartialNutrition {
            calories: p.calories,
            protein: p.protein,
            carbs: p.carbs,
            fat: p.fat,
        };
        let result = units::scale_nutrition(base, p.actual_grams, p.base_serving_grams)
            .map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&result)
    }

    // --- Inventory ---

    #[tool(description = "Add a pantry item with label nutrition per declared serving (serving_quantity serving_unit = serving_size grams)")]
    fn add_inventory_item(&self, Parameters(p): Parameters<AddInventoryItemParams>) -> Result<CallToolResult, McpError> {
        let data = InventoryItemCreate {
            serving_unit_type: parse_unit_type(p.serving_unit_type.as_deref())?,
            name: p.name, brand: p.brand,
            calories: p.calories, protein: p.protein, carbs: p.carbs, fat: p.fat,
            serving_size: p.serving_size, serving_quantity: p.serving_quantity,
            serving_unit: p.serving_unit,
            quantity: p.quantity, unit: p.unit,
            expiration_date: p.expiration_date, notes: p.notes,
        };
        let result = inventory::add_inventory_item(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get full details for a pantry item including its serving basis and recipe usage")]
    fn get_inventory_item(&self, Parameters(p): Parameters<InventoryItemIdParams>) -> Result<CallToolResult, McpError> {
        let result = inventory::get_inventory_item(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(item) => json_result(&item),
            None => not_found("Inventory item", p.id),
        }
    }

    #[tool(description = "List pantry items sorted by name, created_at or expiration_date, with pagination")]
    fn list_inventory_items(&self, Parameters(p): Parameters<ListInventoryItemsParams>) -> Result<CallToolResult, McpError> {
        let result = inventory::list_inventory_items(&self.database, &p.sort_by, &p.sort_order, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Search pantry items by name or brand")]
    fn search_inventory_items(&self, Parameters(p): Parameters<SearchInventoryItemsParams>) -> Result<CallToolResult, McpError> {
        let result = inventory::search_inventory_items(&self.database, &p.query, p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a pantry item. Recipes using the item have their nutrition recalculated.")]
    fn update_inventory_item(&self, Parameters(p): Parameters<UpdateInventoryItemParams>) -> Result<CallToolResult, McpError> {
        let data = InventoryItemUpdate {
            serving_unit_type: parse_unit_type(p.serving_unit_type.as_deref())?,
            name: p.name, brand: p.brand,
            calories: p.calories, protein: p.protein, carbs: p.carbs, fat: p.fat,
            serving_size: p.serving_size, serving_quantity: p.serving_quantity,
            serving_unit: p.serving_unit,
            quantity: p.quantity, unit: p.unit,
            expiration_date: p.expiration_date, notes: p.notes,
        };
        let result = inventory::update_inventory_item(&self.database, p.id, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a pantry item. Blocked while any recipe or meal log references it.")]
    fn delete_inventory_item(&self, Parameters(p): Parameters<InventoryItemIdParams>) -> Result<CallToolResult, McpError> {
        let result = inventory::delete_inventory_item(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Ok(success) => json_result(&success),
            Err(blocked) => json_result(&blocked),
        }
    }

    // --- Recipes ---

    #[tool(description = "Create a recipe. Add ingredients with add_recipe_ingredient; nutrition is kept per serving.")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeCreate {
            name: p.name,
            servings: p.servings,
            instructions: p.instructions,
            notes: p.notes,
        };
        let result = recipes::create_recipe(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a recipe with its ingredients and per-serving nutrition")]
    fn get_recipe(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::get_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(recipe) => json_result(&recipe),
            None => not_found("Recipe", p.id),
        }
    }

    #[tool(description = "List recipes with optional name search, sorted by name, created_at or calories")]
    fn list_recipes(&self, Parameters(p): Parameters<ListRecipesParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::list_recipes(
            &self.database,
            p.query.as_deref(),
            &p.sort_by,
            &p.sort_order,
            p.limit,
            p.offset,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update recipe name, servings, instructions or notes. Changing servings recalculates per-serving nutrition.")]
    fn update_recipe(&self, Parameters(p): Parameters<UpdateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeUpdate {
            name: p.name,
            servings: p.servings,
            instructions: p.instructions,
            notes: p.notes,
        };
        let result = recipes::update_recipe(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a recipe and its ingredients. Blocked while meal logs reference it.")]
    fn delete_recipe(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::delete_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Ok(success) => json_result(&success),
            Err(blocked) => json_result(&blocked),
        }
    }

    #[tool(description = "Add an inventory item to a recipe in any supported unit. Recalculates recipe nutrition.")]
    fn add_recipe_ingredient(&self, Parameters(p): Parameters<AddRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeIngredientCreate {
            recipe_id: p.recipe_id,
            item_id: p.item_id,
            quantity: p.quantity,
            unit: p.unit,
            notes: p.notes,
        };
        let result = recipes::add_recipe_ingredient(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a recipe ingredient's quantity, unit or notes. Recalculates recipe nutrition.")]
    fn update_recipe_ingredient(&self, Parameters(p): Parameters<UpdateRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeIngredientUpdate {
            quantity: p.quantity,
            unit: p.unit,
            notes: p.notes,
        };
        let result = recipes::update_recipe_ingredient(&self.database, p.id, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Remove an ingredient from a recipe. Recalculates recipe nutrition.")]
    fn remove_recipe_ingredient(&self, Parameters(p): Parameters<RecipeIngredientIdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::remove_recipe_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Force recalculation of a recipe's cached per-serving nutrition from current inventory data")]
    fn recalculate_recipe_nutrition(&self, Parameters(p): Parameters<RecipeIdParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::recalculate_nutrition(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Compute per-serving nutrition for an ingredient list without saving anything")]
    fn preview_recipe_nutrition(&self, Parameters(p): Parameters<PreviewRecipeNutritionParams>) -> Result<CallToolResult, McpError> {
        let usages = p
            .ingredients
            .into_iter()
            .map(|i| IngredientUsage {
                item_id: i.item_id,
                quantity: i.quantity,
                unit: i.unit,
            })
            .collect();
        let result = recipes::preview_nutrition(&self.database, usages, p.servings)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    // --- Meals ---

    #[tool(description = "Log a meal: either recipe_id with servings, or item_id with quantity and unit. Nutrition is snapshotted at log time.")]
    fn log_meal(&self, Parameters(p): Parameters<LogMealParams>) -> Result<CallToolResult, McpError> {
        let data = MealLogCreate {
            source: p.source()?,
            meal_type: MealType::from_str(&p.meal_type),
            date: p.date,
            notes: p.notes,
        };
        let result = meals::log_meal(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a meal log with the name of the recipe or item eaten")]
    fn get_meal_log(&self, Parameters(p): Parameters<MealLogIdParams>) -> Result<CallToolResult, McpError> {
        let result = meals::get_meal_log(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(log) => json_result(&log),
            None => not_found("Meal log", p.id),
        }
    }

    #[tool(description = "List meals logged on a date with the day's nutrition totals")]
    fn list_meals(&self, Parameters(p): Parameters<ListMealsParams>) -> Result<CallToolResult, McpError> {
        let result = meals::list_meals(&self.database, &p.date).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a meal log")]
    fn delete_meal_log(&self, Parameters(p): Parameters<MealLogIdParams>) -> Result<CallToolResult, McpError> {
        let result = meals::delete_meal_log(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for PantryService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "pantry".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Pantry".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(SERVER_INSTRUCTIONS.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_params(recipe_id: Option<i64>, item_id: Option<i64>) -> LogMealParams {
        LogMealParams {
            date: "2026-06-01".to_string(),
            meal_type: "lunch".to_string(),
            recipe_id,
            servings: 2.0,
            item_id,
            quantity: Some(150.0),
            unit: Some("g".to_string()),
            notes: None,
        }
    }

    #[test]
    fn test_log_meal_source() {
        assert_eq!(
            log_params(Some(3), None).source().unwrap(),
            MealSource::Recipe { recipe_id: 3, servings: 2.0 }
        );
        assert_eq!(
            log_params(None, Some(4)).source().unwrap(),
            MealSource::Item { item_id: 4, quantity: 150.0, unit: "g".to_string() }
        );
        assert!(log_params(Some(3), Some(4)).source().is_err());
        assert!(log_params(None, None).source().is_err());
    }

    #[test]
    fn test_parse_unit_type() {
        assert_eq!(parse_unit_type(Some("Weight")).unwrap(), Some(UnitFamily::Weight));
        assert_eq!(parse_unit_type(None).unwrap(), None);
        assert!(parse_unit_type(Some("bulk")).is_err());
    }
}
