//! Unit MCP Tools
//!
//! Stateless tools over the conversion engine.

use serde::Serialize;

use crate::models::{Nutrition, PartialNutrition};
use crate::nutrition::{self, from_cup, normalize_unit, to_cup, UnitValidation};

/// Response for convert_volume
#[derive(Debug, Serialize)]
pub struct ConvertVolumeResponse {
    pub quantity: f64,
    pub from_unit: String,
    pub to_unit: String,
    pub cups: f64,
    pub result: f64,
}

/// Response for scale_nutrition
#[derive(Debug, Serialize)]
pub struct ScaleNutritionResponse {
    pub actual_grams: f64,
    pub base_serving_grams: f64,
    pub nutrition: Nutrition,
}

/// Check whether a unit string is recognized
pub fn validate_unit(unit: &str) -> UnitValidation {
    nutrition::validate_unit(unit)
}

/// Convert between volume units through cups
pub fn convert_volume(quantity: f64, from_unit: &str, to_unit: &str) -> Result<ConvertVolumeResponse, String> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(format!("quantity must be a non-negative number (got {})", quantity));
    }

    let cups = to_cup(quantity, from_unit).map_err(|e| e.to_string())?;
    let result = from_cup(cups, to_unit).map_err(|e| e.to_string())?;

    Ok(ConvertVolumeResponse {
        quantity,
        from_unit: normalize_unit(from_unit),
        to_unit: normalize_unit(to_unit),
        cups,
        result,
    })
}

/// Scale label nutrition from its serving weight to the weight eaten
pub fn scale_nutrition(
    base: PartialNutrition,
    actual_grams: f64,
    base_serving_grams: f64,
) -> Result<ScaleNutritionResponse, String> {
    if actual_grams < 0.0 {
        return Err("actual_grams cannot be negative".to_string());
    }
    if !(base_serving_grams > 0.0) {
        return Err("base_serving_grams must be greater than 0".to_string());
    }

    Ok(ScaleNutritionResponse {
        actual_grams,
        base_serving_grams,
        nutrition: nutrition::scale_nutrition(&base, actual_grams, base_serving_grams),
    })
}
