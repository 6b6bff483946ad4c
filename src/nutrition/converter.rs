//! Unit conversion functions
//!
//! Volume quantities convert through the cup pivot; weight quantities convert
//! straight to grams. Conversions reject units outside their family with a
//! [`ConversionError`].

use thiserror::Error;

use super::units::{
    parse_unit, Unit, UnitFamily, VolumeUnit, WeightUnit, CUPS_PER_LITER, FL_OZ_PER_CUP,
    G_PER_KG, G_PER_LB, G_PER_OZ, ML_PER_CUP, TBSP_PER_CUP, TSP_PER_CUP,
};

/// Conversion error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("unsupported volume unit: {0}")]
    UnsupportedVolumeUnit(String),

    #[error("unsupported weight unit: {0}")]
    UnsupportedWeightUnit(String),

    #[error("both recipe and item units must be volume units (got '{recipe_unit}' and '{item_unit}')")]
    NonVolumeUnits {
        recipe_unit: String,
        item_unit: String,
    },

    #[error("serving quantity must be greater than 0 (got {0})")]
    InvalidServingQuantity(f64),

    #[error("serving size in grams must be greater than 0 (got {0})")]
    InvalidServingGrams(f64),
}

/// Result type for conversions
pub type ConversionResult<T> = Result<T, ConversionError>;

fn volume_unit(unit: &str) -> ConversionResult<VolumeUnit> {
    match parse_unit(unit) {
        Some(Unit::Volume(v)) => Ok(v),
        _ => Err(ConversionError::UnsupportedVolumeUnit(unit.trim().to_string())),
    }
}

fn weight_unit(unit: &str) -> ConversionResult<WeightUnit> {
    match parse_unit(unit) {
        Some(Unit::Weight(w)) => Ok(w),
        _ => Err(ConversionError::UnsupportedWeightUnit(unit.trim().to_string())),
    }
}

/// Convert a volume quantity to cups
pub fn to_cup(quantity: f64, unit: &str) -> ConversionResult<f64> {
    let cups = match volume_unit(unit)? {
        VolumeUnit::Cup => quantity,
        VolumeUnit::Tablespoon => quantity / TBSP_PER_CUP,
        VolumeUnit::Teaspoon => quantity / TSP_PER_CUP,
        VolumeUnit::Milliliter => quantity / ML_PER_CUP,
        VolumeUnit::FluidOunce => quantity / FL_OZ_PER_CUP,
        VolumeUnit::Liter => quantity * CUPS_PER_LITER,
    };
    Ok(cups)
}

/// Convert cups to the given volume unit
pub fn from_cup(cups: f64, unit: &str) -> ConversionResult<f64> {
    let quantity = match volume_unit(unit)? {
        VolumeUnit::Cup => cups,
        VolumeUnit::Tablespoon => cups * TBSP_PER_CUP,
        VolumeUnit::Teaspoon => cups * TSP_PER_CUP,
        VolumeUnit::Milliliter => cups * ML_PER_CUP,
        VolumeUnit::FluidOunce => cups * FL_OZ_PER_CUP,
        VolumeUnit::Liter => cups / CUPS_PER_LITER,
    };
    Ok(quantity)
}

/// Convert a weight quantity to grams
pub fn weight_to_grams(quantity: f64, unit: &str) -> ConversionResult<f64> {
    let grams = match weight_unit(unit)? {
        WeightUnit::Gram => quantity,
        WeightUnit::Kilogram => quantity * G_PER_KG,
        WeightUnit::Ounce => quantity * G_PER_OZ,
        WeightUnit::Pound => quantity * G_PER_LB,
    };
    Ok(grams)
}

/// Grams in one unit of a declared serving (`serving_grams / serving_quantity`)
///
/// Both inputs come from nutrition-label data and must be strictly positive.
pub fn grams_per_unit(serving_quantity: f64, serving_grams: f64) -> ConversionResult<f64> {
    // Negated comparisons also reject NaN
    if !(serving_quantity > 0.0) {
        return Err(ConversionError::InvalidServingQuantity(serving_quantity));
    }
    if !(serving_grams > 0.0) {
        return Err(ConversionError::InvalidServingGrams(serving_grams));
    }
    Ok(serving_grams / serving_quantity)
}

/// Convert a recipe volume into grams using the item's declared volume serving
///
/// # Arguments
/// * `recipe_quantity` / `recipe_unit` - amount the recipe asks for (e.g. 2 cup)
/// * `item_serving_quantity` / `item_serving_unit` - declared serving (e.g. 0.25 cup)
/// * `item_serving_grams` - grams in that declared serving (e.g. 45)
///
/// # Returns
/// Grams of the item used by the recipe (360 for the example above)
pub fn volume_to_grams(
    recipe_quantity: f64,
    recipe_unit: &str,
    item_serving_quantity: f64,
    item_serving_unit: &str,
    item_serving_grams: f64,
) -> ConversionResult<f64> {
    let recipe_family = parse_unit(recipe_unit).map(|u| u.family());
    let item_family = parse_unit(item_serving_unit).map(|u| u.family());
    if recipe_family != Some(UnitFamily::Volume) || item_family != Some(UnitFamily::Volume) {
        return Err(ConversionError::NonVolumeUnits {
            recipe_unit: recipe_unit.trim().to_string(),
            item_unit: item_serving_unit.trim().to_string(),
        });
    }

    let recipe_cups = to_cup(recipe_quantity, recipe_unit)?;
    let item_cups = to_cup(item_serving_quantity, item_serving_unit)?;
    let grams_per_cup = grams_per_unit(item_cups, item_serving_grams)?;

    Ok(recipe_cups * grams_per_cup)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_to_cup_pivot() {
        assert_eq!(to_cup(16.0, "tbsp").unwrap(), 1.0);
        assert_eq!(to_cup(48.0, "tsp").unwrap(), 1.0);
        assert_eq!(to_cup(240.0, "ml").unwrap(), 1.0);
        assert_eq!(to_cup(8.0, "fl_oz").unwrap(), 1.0);
        assert_eq!(to_cup(8.0, "fl oz").unwrap(), 1.0);
        assert_eq!(to_cup(3.0, "Cups").unwrap(), 3.0);
    }

    #[test]
    fn test_liter_factor_is_pinned() {
        assert_eq!(to_cup(1.0, "liter").unwrap(), 4.227);
        assert_eq!(from_cup(4.227, "l").unwrap(), 1.0);
    }

    #[test]
    fn test_round_trip_non_liter() {
        for unit in ["tbsp", "tsp", "ml", "fl oz"] {
            for qty in [0.1, 1.0, 3.5, 17.0, 250.0] {
                let back = from_cup(to_cup(qty, unit).unwrap(), unit).unwrap();
                assert!(approx(back, qty), "{} {} -> {}", qty, unit, back);
            }
        }
    }

    #[test]
    fn test_liter_round_trip_is_approximate() {
        let back = from_cup(to_cup(2.5, "l").unwrap(), "l").unwrap();
        assert!((back - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_unsupported_volume_unit() {
        let err = to_cup(1.0, "gallon").unwrap_err();
        assert_eq!(err, ConversionError::UnsupportedVolumeUnit("gallon".to_string()));
        assert_eq!(err.to_string(), "unsupported volume unit: gallon");

        assert!(from_cup(1.0, "gallon").is_err());
        // weight and package units are not volume
        assert!(to_cup(1.0, "g").is_err());
        assert!(from_cup(1.0, "piece").is_err());
    }

    #[test]
    fn test_weight_to_grams() {
        assert_eq!(weight_to_grams(2.0, "kg").unwrap(), 2000.0);
        assert_eq!(weight_to_grams(1.0, "oz").unwrap(), 28.35);
        assert_eq!(weight_to_grams(1.0, "lb").unwrap(), 453.592);
        assert_eq!(weight_to_grams(42.0, "grams").unwrap(), 42.0);
        assert!(matches!(
            weight_to_grams(1.0, "cup"),
            Err(ConversionError::UnsupportedWeightUnit(_))
        ));
    }

    #[test]
    fn test_grams_per_unit() {
        assert_eq!(grams_per_unit(0.25, 45.0).unwrap(), 180.0);
        assert_eq!(grams_per_unit(2.0, 30.0).unwrap(), 15.0);
    }

    #[test]
    fn test_grams_per_unit_zero_guard() {
        assert!(matches!(
            grams_per_unit(0.0, 45.0),
            Err(ConversionError::InvalidServingQuantity(_))
        ));
        assert!(matches!(
            grams_per_unit(0.25, 0.0),
            Err(ConversionError::InvalidServingGrams(_))
        ));
        assert!(grams_per_unit(-1.0, 45.0).is_err());
        assert!(grams_per_unit(f64::NAN, 45.0).is_err());

        let msg = grams_per_unit(0.0, 45.0).unwrap_err().to_string();
        assert!(msg.starts_with("serving quantity must be greater than 0"));
        let msg = grams_per_unit(1.0, 0.0).unwrap_err().to_string();
        assert!(msg.starts_with("serving size in grams must be greater than 0"));
    }

    #[test]
    fn test_volume_to_grams_rice() {
        // 0.25 cup of rice weighs 45g, recipe needs 2 cups
        assert_eq!(volume_to_grams(2.0, "cup", 0.25, "cup", 45.0).unwrap(), 360.0);
    }

    #[test]
    fn test_volume_to_grams_cross_unit() {
        // 1 tbsp = 14g, recipe needs 1 cup = 16 tbsp
        assert_eq!(volume_to_grams(1.0, "cup", 1.0, "tbsp", 14.0).unwrap(), 224.0);
    }

    #[test]
    fn test_volume_to_grams_rejects_non_volume() {
        let err = volume_to_grams(2.0, "piece", 0.25, "cup", 45.0).unwrap_err();
        assert!(matches!(err, ConversionError::NonVolumeUnits { .. }));
        let msg = err.to_string();
        assert!(msg.contains("both recipe and item units must be volume units"));
        assert!(msg.contains("piece"));

        assert!(volume_to_grams(2.0, "cup", 1.0, "scoop", 30.0).is_err());
    }

    #[test]
    fn test_volume_to_grams_zero_serving() {
        assert!(matches!(
            volume_to_grams(1.0, "cup", 0.0, "cup", 45.0),
            Err(ConversionError::InvalidServingQuantity(_))
        ));
    }
}
