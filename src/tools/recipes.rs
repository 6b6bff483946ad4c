//! Recipe MCP Tools
//!
//! Tools for managing recipes and their ingredients.

use std::collections::HashSet;

use serde::Serialize;

use crate::db::Database;
use crate::models::{
    recalculate_recipe_nutrition, InventoryItem, Nutrition, Recipe, RecipeCreate,
    RecipeIngredient, RecipeIngredientCreate, RecipeIngredientDetail, RecipeIngredientUpdate,
    RecipeUpdate,
};
use crate::nutrition::{
    aggregate_recipe_nutrition, ingredient_grams, line_nutrition, validate_unit, IngredientUsage,
};

/// Response for create_recipe
#[derive(Debug, Serialize)]
pub struct CreateRecipeResponse {
    pub id: i64,
    pub name: String,
    pub servings: f64,
    pub created_at: String,
}

/// Full recipe detail with ingredients
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub name: String,
    pub servings: f64,
    pub instructions: Option<String>,
    pub ingredients: Vec<RecipeIngredientDetail>,
    pub nutrition_per_serving: Nutrition,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub times_logged: i64,
}

/// Recipe summary for listing
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub servings: f64,
    pub calories_per_serving: f64,
    pub ingredient_count: usize,
}

/// Response for list_recipes
#[derive(Debug, Serialize)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for update_recipe
#[derive(Debug, Serialize)]
pub struct UpdateRecipeResponse {
    pub success: bool,
    pub updated_at: String,
    pub nutrition_per_serving: Nutrition,
}

/// Response for delete blocked
#[derive(Debug, Serialize)]
pub struct RecipeDeleteBlockedResponse {
    pub error: String,
    pub times_logged: i64,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct RecipeDeleteSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Response for add/update_recipe_ingredient
#[derive(Debug, Serialize)]
pub struct IngredientChangeResponse {
    pub id: i64,
    pub recipe_id: i64,
    pub item_id: i64,
    pub quantity: f64,
    pub unit: String,
    pub nutrition_per_serving: Nutrition,
}

/// Response for remove_recipe_ingredient
#[derive(Debug, Serialize)]
pub struct RemoveIngredientResponse {
    pub success: bool,
    pub recipe_id: i64,
    pub nutrition_per_serving: Nutrition,
}

/// Response for recipe nutrition recalculation
#[derive(Debug, Serialize)]
pub struct RecalculateNutritionResponse {
    pub recipe_id: i64,
    pub previous: Nutrition,
    pub nutrition_per_serving: Nutrition,
}

/// One line of a nutrition preview
#[derive(Debug, Serialize)]
pub struct PreviewLine {
    pub item_id: i64,
    pub item_name: String,
    pub quantity: f64,
    pub unit: String,
    /// `None` when the amount could not be converted and an estimate was used
    pub grams: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub nutrition: Nutrition,
}

/// Response for preview_recipe_nutrition
#[derive(Debug, Serialize)]
pub struct PreviewNutritionResponse {
    pub servings: f64,
    pub lines: Vec<PreviewLine>,
    pub missing_item_ids: Vec<i64>,
    pub nutrition_per_serving: Nutrition,
}

fn check_servings(servings: f64) -> Result<(), String> {
    if !(servings > 0.0) || !servings.is_finite() {
        return Err(format!("servings must be greater than 0 (got {})", servings));
    }
    Ok(())
}

fn check_ingredient(quantity: f64, unit: &str) -> Result<(), String> {
    if !(quantity > 0.0) || !quantity.is_finite() {
        return Err(format!("quantity must be greater than 0 (got {})", quantity));
    }
    let validation = validate_unit(unit);
    if !validation.is_valid {
        return Err(validation.error.unwrap_or_else(|| format!("Unsupported unit '{}'", unit)));
    }
    Ok(())
}

// ============================================================================
// Recipe Tools
// ============================================================================

/// Create a new recipe
pub fn create_recipe(db: &Database, data: RecipeCreate) -> Result<CreateRecipeResponse, String> {
    if data.name.trim().is_empty() {
        return Err("Recipe name cannot be empty".to_string());
    }
    check_servings(data.servings)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::create(&conn, &data)
        .map_err(|e| format!("Failed to create recipe: {}", e))?;

    tracing::info!(id = recipe.id, name = %recipe.name, "Created recipe");

    Ok(CreateRecipeResponse {
        id: recipe.id,
        name: recipe.name,
        servings: recipe.servings,
        created_at: recipe.created_at,
    })
}

/// Get a recipe with full details
pub fn get_recipe(db: &Database, id: i64) -> Result<Option<RecipeDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?;

    match recipe {
        Some(recipe) => {
            let ingredients = RecipeIngredient::get_details_for_recipe(&conn, id)
                .map_err(|e| format!("Failed to get ingredients: {}", e))?;

            let times_logged = Recipe::get_times_logged(&conn, id)
                .map_err(|e| format!("Failed to get times logged: {}", e))?;

            Ok(Some(RecipeDetail {
                id: recipe.id,
                name: recipe.name,
                servings: recipe.servings,
                instructions: recipe.instructions,
                ingredients,
                nutrition_per_serving: recipe.cached_nutrition,
                notes: recipe.notes,
                created_at: recipe.created_at,
                updated_at: recipe.updated_at,
                times_logged,
            }))
        }
        None => Ok(None),
    }
}

/// List recipes with optional name search
pub fn list_recipes(
    db: &Database,
    query: Option<&str>,
    sort_by: &str,
    sort_order: &str,
    limit: i64,
    offset: i64,
) -> Result<ListRecipesResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);
    let query = query.map(str::trim).filter(|q| !q.is_empty());

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipes = Recipe::list(&conn, query, sort_by, sort_order, limit, offset)
        .map_err(|e| format!("Failed to list recipes: {}", e))?;

    let total = Recipe::count(&conn, query)
        .map_err(|e| format!("Failed to count recipes: {}", e))?;

    let mut summaries = Vec::new();
    for recipe in recipes {
        let ingredients = RecipeIngredient::get_for_recipe(&conn, recipe.id)
            .map_err(|e| format!("Failed to get ingredients: {}", e))?;

        summaries.push(RecipeSummary {
            id: recipe.id,
            name: recipe.name,
            servings: recipe.servings,
            calories_per_serving: recipe.cached_nutrition.calories,
            ingredient_count: ingredients.len(),
        });
    }

    Ok(ListRecipesResponse {
        recipes: summaries,
        total,
        limit,
        offset,
    })
}

/// Update recipe metadata (a servings change recalculates nutrition)
///
/// Meal logs keep their snapshots, so logged recipes stay editable.
pub fn update_recipe(db: &Database, id: i64, data: RecipeUpdate) -> Result<UpdateRecipeResponse, String> {
    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            return Err("Recipe name cannot be empty".to_string());
        }
    }
    if let Some(servings) = data.servings {
        check_servings(servings)?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update recipe: {}", e))?
        .ok_or_else(|| format!("Recipe not found with id: {}", id))?;

    let nutrition_per_serving = if data.servings.is_some() {
        recalculate_recipe_nutrition(&conn, id)
            .map_err(|e| format!("Failed to recalculate nutrition: {}", e))?
    } else {
        recipe.cached_nutrition
    };

    Ok(UpdateRecipeResponse {
        success: true,
        updated_at: recipe.updated_at,
        nutrition_per_serving,
    })
}

/// Delete a recipe (blocked if logged in meals)
pub fn delete_recipe(
    db: &Database,
    id: i64,
) -> Result<Result<RecipeDeleteSuccessResponse, RecipeDeleteBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?;
    if recipe.is_none() {
        return Err(format!("Recipe not found with id: {}", id));
    }

    let times_logged = Recipe::get_times_logged(&conn, id)
        .map_err(|e| format!("Failed to check meal usage: {}", e))?;

    if times_logged > 0 {
        return Ok(Err(RecipeDeleteBlockedResponse {
            error: format!("Cannot delete recipe: logged {} times in meal logs", times_logged),
            times_logged,
        }));
    }

    // Ingredients cascade
    Recipe::delete(&conn, id)
        .map_err(|e| format!("Failed to delete recipe: {}", e))?;

    Ok(Ok(RecipeDeleteSuccessResponse {
        success: true,
        deleted_id: id,
    }))
}

// ============================================================================
// Recipe Ingredient Tools
// ============================================================================

/// Add an ingredient to a recipe
pub fn add_recipe_ingredient(
    db: &Database,
    data: RecipeIngredientCreate,
) -> Result<IngredientChangeResponse, String> {
    check_ingredient(data.quantity, &data.unit)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, data.recipe_id)
        .map_err(|e| format!("Database error checking recipe: {}", e))?;
    if recipe.is_none() {
        return Err(format!("Recipe not found with id: {}", data.recipe_id));
    }

    let item = InventoryItem::get_by_id(&conn, data.item_id)
        .map_err(|e| format!("Database error checking inventory item: {}", e))?;
    if item.is_none() {
        return Err(format!("Inventory item not found with id: {}", data.item_id));
    }

    let existing = RecipeIngredient::get_for_recipe(&conn, data.recipe_id)
        .map_err(|e| format!("Database error checking existing ingredients: {}", e))?;
    if existing.iter().any(|i| i.item_id == data.item_id) {
        return Err(format!(
            "Inventory item {} is already an ingredient in recipe {}. Use update_recipe_ingredient to modify quantity.",
            data.item_id, data.recipe_id
        ));
    }

    let ingredient = RecipeIngredient::create(&conn, &data)
        .map_err(|e| format!("Failed to add ingredient: {}", e))?;

    let nutrition_per_serving = recalculate_recipe_nutrition(&conn, data.recipe_id)
        .map_err(|e| format!("Failed to recalculate nutrition: {}", e))?;

    Ok(IngredientChangeResponse {
        id: ingredient.id,
        recipe_id: ingredient.recipe_id,
        item_id: ingredient.item_id,
        quantity: ingredient.quantity,
        unit: ingredient.unit,
        nutrition_per_serving,
    })
}

/// Update a recipe ingredient's quantity, unit or notes
pub fn update_recipe_ingredient(
    db: &Database,
    id: i64,
    data: RecipeIngredientUpdate,
) -> Result<IngredientChangeResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let current = RecipeIngredient::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?
        .ok_or_else(|| format!("Recipe ingredient not found with id: {}", id))?;

    check_ingredient(
        data.quantity.unwrap_or(current.quantity),
        data.unit.as_deref().unwrap_or(&current.unit),
    )?;

    let ingredient = RecipeIngredient::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update ingredient: {}", e))?
        .ok_or_else(|| format!("Recipe ingredient not found with id: {}", id))?;

    let nutrition_per_serving = recalculate_recipe_nutrition(&conn, ingredient.recipe_id)
        .map_err(|e| format!("Failed to recalculate nutrition: {}", e))?;

    Ok(IngredientChangeResponse {
        id: ingredient.id,
        recipe_id: ingredient.recipe_id,
        item_id: ingredient.item_id,
        quantity: ingredient.quantity,
        unit: ingredient.unit,
        nutrition_per_serving,
    })
}

/// Remove an ingredient from a recipe
pub fn remove_recipe_ingredient(db: &Database, id: i64) -> Result<RemoveIngredientResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ingredient = RecipeIngredient::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?
        .ok_or_else(|| format!("Recipe ingredient not found with id: {}", id))?;

    RecipeIngredient::delete(&conn, id)
        .map_err(|e| format!("Failed to remove ingredient: {}", e))?;

    let nutrition_per_serving = recalculate_recipe_nutrition(&conn, ingredient.recipe_id)
        .map_err(|e| format!("Failed to recalculate nutrition: {}", e))?;

    Ok(RemoveIngredientResponse {
        success: true,
        recipe_id: ingredient.recipe_id,
        nutrition_per_serving,
    })
}

/// Force recalculate recipe nutrition
pub fn recalculate_nutrition(db: &Database, recipe_id: i64) -> Result<RecalculateNutritionResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, recipe_id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?
        .ok_or_else(|| format!("Recipe not found with id: {}", recipe_id))?;

    let nutrition = recalculate_recipe_nutrition(&conn, recipe_id)
        .map_err(|e| format!("Failed to recalculate nutrition: {}", e))?;

    Ok(RecalculateNutritionResponse {
        recipe_id,
        previous: recipe.cached_nutrition,
        nutrition_per_serving: nutrition,
    })
}

/// Compute per-serving nutrition for an unsaved ingredient list
///
/// Nothing is written. Lines whose item does not exist are reported in
/// `missing_item_ids` and left out of the totals.
pub fn preview_nutrition(
    db: &Database,
    ingredients: Vec<IngredientUsage>,
    servings: f64,
) -> Result<PreviewNutritionResponse, String> {
    check_servings(servings)?;
    for usage in &ingredients {
        check_ingredient(usage.quantity, &usage.unit)?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let ids: Vec<i64> = ingredients.iter().map(|u| u.item_id).collect();
    let items = InventoryItem::get_many(&conn, &ids)
        .map_err(|e| format!("Failed to load inventory items: {}", e))?;

    let found: HashSet<i64> = items.iter().map(|i| i.id).collect();
    let mut missing_item_ids: Vec<i64> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
    missing_item_ids.dedup();

    let lines = ingredients
        .iter()
        .filter_map(|usage| {
            let item = items.iter().find(|i| i.id == usage.item_id)?;
            let (grams, warning) = match ingredient_grams(usage.quantity, &usage.unit, item) {
                Ok(grams) => (Some(grams), None),
                Err(e) => (None, Some(format!("{}; estimated from the serving size", e))),
            };
            Some(PreviewLine {
                item_id: item.id,
                item_name: item.name.clone(),
                quantity: usage.quantity,
                unit: usage.unit.clone(),
                grams,
                warning,
                nutrition: line_nutrition(usage.quantity, &usage.unit, item),
            })
        })
        .collect();

    Ok(PreviewNutritionResponse {
        servings,
        lines,
        missing_item_ids,
        nutrition_per_serving: aggregate_recipe_nutrition(&ingredients, &items, servings),
    })
}
