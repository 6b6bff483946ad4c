//! Unit types and conversion constants
//!
//! Every recognised unit string maps to exactly one [`Unit`], and every unit
//! belongs to exactly one [`UnitFamily`]. Lookups always go through
//! [`normalize_unit`] first.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Family of a measurement unit, deciding which conversion path applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitFamily {
    /// Convertible through the cup pivot (tsp, tbsp, cup, fl oz, ml, l)
    Volume,
    /// Convertible straight to grams (g, kg, oz, lb)
    Weight,
    /// Discrete, non-convertible units (piece, slice, can, ...)
    Package,
}

impl UnitFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitFamily::Volume => "volume",
            UnitFamily::Weight => "weight",
            UnitFamily::Package => "package",
        }
    }

    /// Parse from the database/tool string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "volume" => Some(UnitFamily::Volume),
            "weight" => Some(UnitFamily::Weight),
            "package" => Some(UnitFamily::Package),
            _ => None,
        }
    }
}

impl fmt::Display for UnitFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeUnit {
    Teaspoon,
    Tablespoon,
    Cup,
    FluidOunce,
    Milliliter,
    Liter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightUnit {
    Gram,
    Kilogram,
    Ounce,
    Pound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageUnit {
    Pouch,
    Bar,
    Bottle,
    Pack,
    Piece,
    Scoop,
    Slice,
    Can,
    Serving,
}

/// A recognised unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Volume(VolumeUnit),
    Weight(WeightUnit),
    Package(PackageUnit),
}

impl Unit {
    pub fn family(&self) -> UnitFamily {
        match self {
            Unit::Volume(_) => UnitFamily::Volume,
            Unit::Weight(_) => UnitFamily::Weight,
            Unit::Package(_) => UnitFamily::Package,
        }
    }

    /// Canonical spelling, as stored and displayed
    pub fn canonical(&self) -> &'static str {
        match self {
            Unit::Volume(VolumeUnit::Teaspoon) => "tsp",
            Unit::Volume(VolumeUnit::Tablespoon) => "tbsp",
            Unit::Volume(VolumeUnit::Cup) => "cup",
            Unit::Volume(VolumeUnit::FluidOunce) => "fl oz",
            Unit::Volume(VolumeUnit::Milliliter) => "ml",
            Unit::Volume(VolumeUnit::Liter) => "l",
            Unit::Weight(WeightUnit::Gram) => "g",
            Unit::Weight(WeightUnit::Kilogram) => "kg",
            Unit::Weight(WeightUnit::Ounce) => "oz",
            Unit::Weight(WeightUnit::Pound) => "lb",
            Unit::Package(PackageUnit::Pouch) => "pouch",
            Unit::Package(PackageUnit::Bar) => "bar",
            Unit::Package(PackageUnit::Bottle) => "bottle",
            Unit::Package(PackageUnit::Pack) => "pack",
            Unit::Package(PackageUnit::Piece) => "piece",
            Unit::Package(PackageUnit::Scoop) => "scoop",
            Unit::Package(PackageUnit::Slice) => "slice",
            Unit::Package(PackageUnit::Can) => "can",
            Unit::Package(PackageUnit::Serving) => "serving",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

// ============================================================================
// Volume Conversion Constants (relative to the cup pivot)
// ============================================================================

/// Tablespoons per cup
pub const TBSP_PER_CUP: f64 = 16.0;
/// Teaspoons per cup
pub const TSP_PER_CUP: f64 = 48.0;
/// Milliliters per cup
pub const ML_PER_CUP: f64 = 240.0;
/// Fluid ounces per cup
pub const FL_OZ_PER_CUP: f64 = 8.0;
/// Cups per liter. Fixed approximation, so liter round trips are inexact.
pub const CUPS_PER_LITER: f64 = 4.227;

// ============================================================================
// Weight Conversion Constants (to grams)
// ============================================================================

/// Grams per kilogram
pub const G_PER_KG: f64 = 1000.0;
/// Grams per ounce
pub const G_PER_OZ: f64 = 28.35;
/// Grams per pound
pub const G_PER_LB: f64 = 453.592;

// ============================================================================
// Unit Recognition
// ============================================================================

use PackageUnit::*;
use VolumeUnit::*;
use WeightUnit::*;

/// Normalized alias -> unit
const UNIT_TABLE: &[(&str, Unit)] = &[
    // volume
    ("tsp", Unit::Volume(Teaspoon)),
    ("tsps", Unit::Volume(Teaspoon)),
    ("teaspoon", Unit::Volume(Teaspoon)),
    ("teaspoons", Unit::Volume(Teaspoon)),
    ("tbsp", Unit::Volume(Tablespoon)),
    ("tbsps", Unit::Volume(Tablespoon)),
    ("tablespoon", Unit::Volume(Tablespoon)),
    ("tablespoons", Unit::Volume(Tablespoon)),
    ("cup", Unit::Volume(Cup)),
    ("cups", Unit::Volume(Cup)),
    ("fl oz", Unit::Volume(FluidOunce)),
    ("floz", Unit::Volume(FluidOunce)),
    ("fluid ounce", Unit::Volume(FluidOunce)),
    ("fluid ounces", Unit::Volume(FluidOunce)),
    ("ml", Unit::Volume(Milliliter)),
    ("milliliter", Unit::Volume(Milliliter)),
    ("milliliters", Unit::Volume(Milliliter)),
    ("millilitre", Unit::Volume(Milliliter)),
    ("millilitres", Unit::Volume(Milliliter)),
    ("l", Unit::Volume(Liter)),
    ("liter", Unit::Volume(Liter)),
    ("liters", Unit::Volume(Liter)),
    ("litre", Unit::Volume(Liter)),
    ("litres", Unit::Volume(Liter)),
    // weight
    ("g", Unit::Weight(Gram)),
    ("gram", Unit::Weight(Gram)),
    ("grams", Unit::Weight(Gram)),
    ("kg", Unit::Weight(Kilogram)),
    ("kilogram", Unit::Weight(Kilogram)),
    ("kilograms", Unit::Weight(Kilogram)),
    ("oz", Unit::Weight(Ounce)),
    ("ounce", Unit::Weight(Ounce)),
    ("ounces", Unit::Weight(Ounce)),
    ("lb", Unit::Weight(Pound)),
    ("lbs", Unit::Weight(Pound)),
    ("pound", Unit::Weight(Pound)),
    ("pounds", Unit::Weight(Pound)),
    // package
    ("pouch", Unit::Package(Pouch)),
    ("pouches", Unit::Package(Pouch)),
    ("bar", Unit::Package(Bar)),
    ("bars", Unit::Package(Bar)),
    ("bottle", Unit::Package(Bottle)),
    ("bottles", Unit::Package(Bottle)),
    ("pack", Unit::Package(Pack)),
    ("packs", Unit::Package(Pack)),
    ("piece", Unit::Package(Piece)),
    ("pieces", Unit::Package(Piece)),
    ("scoop", Unit::Package(Scoop)),
    ("scoops", Unit::Package(Scoop)),
    ("slice", Unit::Package(Slice)),
    ("slices", Unit::Package(Slice)),
    ("can", Unit::Package(Can)),
    ("cans", Unit::Package(Can)),
    ("serving", Unit::Package(Serving)),
    ("servings", Unit::Package(Serving)),
];

/// Normalize a unit string into its lookup key
///
/// Lowercases, trims, and collapses runs of whitespace or underscores into a
/// single space, so "fl_oz", "FL  OZ " and "fl oz" share one key.
pub fn normalize_unit(unit: &str) -> String {
    unit.split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Look up a unit string in the unit table
pub fn parse_unit(unit: &str) -> Option<Unit> {
    let key = normalize_unit(unit);
    UNIT_TABLE
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, unit)| *unit)
}

/// Determine the family of a unit string, `None` when unrecognised
pub fn classify_unit(unit: &str) -> Option<UnitFamily> {
    parse_unit(unit).map(|u| u.family())
}

/// Result of validating a user-supplied unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitValidation {
    pub is_valid: bool,
    pub family: Option<UnitFamily>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Validate a unit string for form input. Never fails; reports instead.
pub fn validate_unit(unit: &str) -> UnitValidation {
    if unit.trim().is_empty() {
        return UnitValidation {
            is_valid: false,
            family: None,
            error: Some("Unit is required".to_string()),
        };
    }

    match classify_unit(unit) {
        Some(family) => UnitValidation {
            is_valid: true,
            family: Some(family),
            error: None,
        },
        None => UnitValidation {
            is_valid: false,
            family: None,
            error: Some(format!(
                "Unsupported unit '{}'. Supported units include cup, tbsp, tsp, ml, fl oz, \
                 g, kg, oz, lb, piece, slice, scoop and serving.",
                unit.trim()
            )),
        },
    }
}
