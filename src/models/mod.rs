//! Data models
//!
//! Rust structs representing database entities.

mod inventory_item;
mod meal_log;
mod nutrition;
mod recipe;
mod recipe_ingredient;

pub use inventory_item::{
    InventoryItem, InventoryItemCreate, InventoryItemUpdate, DEFAULT_SERVING_GRAMS,
};
pub use meal_log::{
    calculate_daily_totals, MealLog, MealLogCreate, MealLogDetail, MealSource, MealType,
};
pub use nutrition::{round_to, Nutrition, PartialNutrition};
pub use recipe::{Recipe, RecipeCreate, RecipeUpdate};
pub use recipe_ingredient::{
    calculate_recipe_nutrition, cascade_recalculate_from_item, recalculate_recipe_nutrition,
    RecipeIngredient, RecipeIngredientCreate, RecipeIngredientDetail, RecipeIngredientUpdate,
};
