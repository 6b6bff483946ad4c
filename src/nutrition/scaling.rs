//! Nutrition scaling
//!
//! Scales label nutrition from its declared serving weight to the weight
//! actually used.

use crate::models::{round_to, Nutrition, PartialNutrition};

/// Scale `base` nutrition, declared per `base_serving_grams`, to `actual_grams`
///
/// Calories round to whole numbers; protein, carbs and fat round to two
/// decimals. Missing fields count as 0. The ratio is not bounds-checked, and a
/// zero `base_serving_grams` yields non-finite values.
pub fn scale_nutrition(
    base: &PartialNutrition,
    actual_grams: f64,
    base_serving_grams: f64,
) -> Nutrition {
    let ratio = actual_grams / base_serving_grams;
    let base = base.resolve();

    Nutrition {
        calories: (base.calories * ratio).round(),
        protein: round_to(base.protein * ratio, 2),
        carbs: round_to(base.carbs * ratio, 2),
        fat: round_to(base.fat * ratio, 2),
    }
}
