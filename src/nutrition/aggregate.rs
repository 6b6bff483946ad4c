//! Recipe nutrition aggregation
//!
//! Turns recipe lines into grams of each inventory item, scales the item's
//! label nutrition to that weight, and sums the lines into per-serving totals.
//! A line that fails to convert never aborts the recipe: it falls back to a
//! proportional estimate and logs a warning.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::converter::{volume_to_grams, weight_to_grams, ConversionResult};
use super::scaling::scale_nutrition;
use super::units::{classify_unit, UnitFamily};
use crate::models::{round_to, InventoryItem, Nutrition};

/// One recipe line: an amount of an inventory item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientUsage {
    pub item_id: i64,
    pub quantity: f64,
    pub unit: String,
}

/// Convert a requested quantity of `item` into grams
///
/// Dispatches on the family of the requested unit:
/// - volume, when the item declares a volume serving: through the cup pivot
/// - weight: fixed factors to grams
/// - package: `quantity` times the item's declared serving grams
/// - anything else: the quantity is taken as grams already
pub fn ingredient_grams(quantity: f64, unit: &str, item: &InventoryItem) -> ConversionResult<f64> {
    match classify_unit(unit) {
        Some(UnitFamily::Volume) if item.serving_family() == Some(UnitFamily::Volume) => {
            let serving_unit = item
                .serving_unit
                .as_deref()
                .filter(|u| !u.trim().is_empty());
            match (item.serving_quantity, serving_unit) {
                (Some(serving_quantity), Some(serving_unit)) => volume_to_grams(
                    quantity,
                    unit,
                    serving_quantity,
                    serving_unit,
                    item.declared_serving_grams(),
                ),
                _ => Ok(quantity),
            }
        }
        Some(UnitFamily::Weight) => weight_to_grams(quantity, unit),
        Some(UnitFamily::Package) => Ok(quantity * item.declared_serving_grams()),
        _ => Ok(quantity),
    }
}

/// Nutrition contributed by `quantity` `unit` of `item`
///
/// Falls back to `raw nutrition * quantity / serving grams` (unrounded) when
/// the quantity cannot be converted to grams.
pub fn line_nutrition(quantity: f64, unit: &str, item: &InventoryItem) -> Nutrition {
    let serving_grams = item.declared_serving_grams();

    ingredient_grams(quantity, unit, item)
        .map(|grams| scale_nutrition(&item.nutrition, grams, serving_grams))
        .unwrap_or_else(|e| {
            tracing::warn!(
                item = %item.name,
                item_id = item.id,
                error = %e,
                "Unit conversion failed for '{}', using proportional estimate",
                item.name
            );
            item.nutrition.resolve().scale(quantity / serving_grams)
        })
}

/// Per-serving nutrition for a recipe
///
/// `items` is the catalog the lines refer to; lines whose item is missing are
/// skipped. Totals are divided by `servings` and rounded to one decimal.
/// Non-positive `servings` are treated as 1.
pub fn aggregate_recipe_nutrition(
    ingredients: &[IngredientUsage],
    items: &[InventoryItem],
    servings: f64,
) -> Nutrition {
    let catalog: HashMap<i64, &InventoryItem> = items.iter().map(|i| (i.id, i)).collect();

    let total: Nutrition = ingredients
        .iter()
        .filter_map(|usage| match catalog.get(&usage.item_id) {
            Some(item) => Some(line_nutrition(usage.quantity, &usage.unit, item)),
            None => {
                tracing::warn!(item_id = usage.item_id, "Skipping ingredient with unknown item");
                None
            }
        })
        .sum();

    let servings = if servings > 0.0 {
        servings
    } else {
        tracing::warn!(servings, "Non-positive servings, reporting whole-recipe totals");
        1.0
    };

    Nutrition {
        calories: round_to(total.calories / servings, 1),
        protein: round_to(total.protein / servings, 1),
        carbs: round_to(total.carbs / servings, 1),
        fat: round_to(total.fat / servings, 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PartialNutrition;

    fn item(id: i64, name: &str, nutrition: [f64; 4]) -> InventoryItem {
        InventoryItem {
            id,
            name: name.to_string(),
            brand: None,
            nutrition: PartialNutrition {
                calories: Some(nutrition[0]),
                protein: Some(nutrition[1]),
                carbs: Some(nutrition[2]),
                fat: Some(nutrition[3]),
            },
            serving_size: None,
            serving_quantity: None,
            serving_unit: None,
            serving_unit_type: None,
            quantity: 0.0,
            unit: "piece".to_string(),
            expiration_date: None,
            notes: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn serving(mut item: InventoryItem, grams: f64, quantity: f64, unit: &str) -> InventoryItem {
        item.serving_size = Some(grams);
        item.serving_quantity = Some(quantity);
        item.serving_unit = Some(unit.to_string());
        item
    }

    fn usage(item_id: i64, quantity: f64, unit: &str) -> IngredientUsage {
        IngredientUsage { item_id, quantity, unit: unit.to_string() }
    }

    fn rice() -> InventoryItem {
        serving(item(1, "Rice", [160.0, 3.0, 36.0, 0.0]), 45.0, 0.25, "cup")
    }

    #[test]
    fn test_volume_path() {
        assert_eq!(ingredient_grams(2.0, "cup", &rice()).unwrap(), 360.0);

        let result = aggregate_recipe_nutrition(&[usage(1, 2.0, "cup")], &[rice()], 4.0);
        assert_eq!(
            result,
            Nutrition { calories: 320.0, protein: 6.0, carbs: 72.0, fat: 0.0 }
        );
    }

    #[test]
    fn test_volume_path_without_gram_basis_uses_default() {
        let mut oil = serving(item(2, "Olive Oil", [120.0, 0.0, 0.0, 14.0]), 0.0, 1.0, "tbsp");
        oil.serving_size = None;
        // 1 tbsp = 100g by default, so 2 tbsp = 200g
        assert_eq!(ingredient_grams(2.0, "tbsp", &oil).unwrap(), 200.0);
    }

    #[test]
    fn test_weight_path() {
        let chicken = serving(item(3, "Chicken", [165.0, 31.0, 0.0, 3.6]), 100.0, 100.0, "g");
        assert_eq!(ingredient_grams(1.0, "lb", &chicken).unwrap(), 453.592);

        let result = aggregate_recipe_nutrition(&[usage(3, 1.0, "lb")], &[chicken], 1.0);
        assert_eq!(result.calories, 748.0);
        assert_eq!(result.protein, 140.6);
        assert_eq!(result.fat, 16.3);
    }

    #[test]
    fn test_package_path() {
        let bar = serving(item(4, "Protein Bar", [200.0, 20.0, 22.0, 7.0]), 60.0, 1.0, "bar");
        assert_eq!(ingredient_grams(2.0, "bars", &bar).unwrap(), 120.0);

        let result = aggregate_recipe_nutrition(&[usage(4, 2.0, "bar")], &[bar], 1.0);
        assert_eq!(
            result,
            Nutrition { calories: 400.0, protein: 40.0, carbs: 44.0, fat: 14.0 }
        );
    }

    #[test]
    fn test_volume_request_on_weight_item_passes_through() {
        let flour = serving(item(5, "Flour", [100.0, 10.0, 70.0, 1.0]), 100.0, 100.0, "g");
        assert_eq!(ingredient_grams(1.0, "cup", &flour).unwrap(), 1.0);

        let result = aggregate_recipe_nutrition(&[usage(5, 1.0, "cup")], &[flour], 1.0);
        assert_eq!(result.calories, 1.0);
        assert_eq!(result.protein, 0.1);
    }

    #[test]
    fn test_unknown_unit_passes_through() {
        let salt = serving(item(6, "Salt", [0.0, 0.0, 0.0, 0.0]), 6.0, 1.0, "tsp");
        assert_eq!(ingredient_grams(3.0, "pinch", &salt).unwrap(), 3.0);
    }

    #[test]
    fn test_mismatched_units_recover() {
        // Declared as volume, but the serving unit is a package unit
        let mut whey = serving(item(7, "Whey", [120.0, 24.0, 3.0, 1.5]), 30.0, 1.0, "scoop");
        whey.serving_unit_type = Some(UnitFamily::Volume);
        assert!(ingredient_grams(2.0, "cup", &whey).is_err());

        let line = line_nutrition(2.0, "cup", &whey);
        // factor = 2 / 30
        assert!((line.calories - 8.0).abs() < 1e-9);
        assert!((line.protein - 1.6).abs() < 1e-9);

        let result = aggregate_recipe_nutrition(&[usage(7, 2.0, "cup")], &[whey], 1.0);
        assert!(result.is_well_formed());
        assert_eq!(result.calories, 8.0);
        assert_eq!(result.protein, 1.6);
    }

    #[test]
    fn test_zero_serving_quantity_recovers() {
        let broken = serving(item(8, "Broth", [10.0, 1.0, 1.0, 0.0]), 240.0, 0.0, "cup");
        assert!(ingredient_grams(1.0, "cup", &broken).is_err());

        let result = aggregate_recipe_nutrition(&[usage(8, 480.0, "ml")], &[broken], 1.0);
        assert!(result.is_well_formed());
        assert_eq!(result.calories, 20.0);
    }

    #[test]
    fn test_missing_item_is_skipped() {
        let result = aggregate_recipe_nutrition(
            &[usage(1, 2.0, "cup"), usage(99, 5.0, "g")],
            &[rice()],
            1.0,
        );
        assert_eq!(result.calories, 1280.0);
    }

    #[test]
    fn test_line_order_does_not_matter() {
        let items = vec![
            rice(),
            serving(item(3, "Chicken", [165.0, 31.0, 0.0, 3.6]), 100.0, 100.0, "g"),
            serving(item(4, "Protein Bar", [200.0, 20.0, 22.0, 7.0]), 60.0, 1.0, "bar"),
        ];
        let mut lines = vec![usage(1, 1.5, "cup"), usage(3, 250.0, "g"), usage(4, 1.0, "bar")];
        let forward = aggregate_recipe_nutrition(&lines, &items, 3.0);
        lines.reverse();
        let backward = aggregate_recipe_nutrition(&lines, &items, 3.0);

        assert!((forward.calories - backward.calories).abs() < 0.11);
        assert!((forward.protein - backward.protein).abs() < 0.11);
        assert!((forward.carbs - backward.carbs).abs() < 0.11);
        assert!((forward.fat - backward.fat).abs() < 0.11);
    }

    #[test]
    fn test_non_positive_servings() {
        let result = aggregate_recipe_nutrition(&[usage(1, 2.0, "cup")], &[rice()], 0.0);
        assert_eq!(result.calories, 1280.0);
    }

    #[test]
    fn test_empty_recipe() {
        assert_eq!(aggregate_recipe_nutrition(&[], &[], 2.0), Nutrition::zero());
    }
}
