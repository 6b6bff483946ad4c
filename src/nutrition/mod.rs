//! Serving-unit conversion and nutrition scaling engine
//!
//! Pure functions only: callers pass in snapshots of inventory items and
//! recipe lines, nothing here touches the database.

pub mod aggregate;
pub mod converter;
pub mod scaling;
pub mod units;

pub use aggregate::{aggregate_recipe_nutrition, ingredient_grams, line_nutrition, IngredientUsage};
pub use converter::{
    from_cup, grams_per_unit, to_cup, volume_to_grams, weight_to_grams, ConversionError,
    ConversionResult,
};
pub use scaling::scale_nutrition;
pub use units::{
    classify_unit, normalize_unit, parse_unit, validate_unit, PackageUnit, Unit, UnitFamily,
    UnitValidation, VolumeUnit, WeightUnit,
};
