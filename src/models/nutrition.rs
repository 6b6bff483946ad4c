//! Shared nutrition data structures
//!
//! Used across inventory items, recipes, and meal logs.

use serde::{Deserialize, Serialize};

/// Macronutrients for one serving or one computed quantity
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64, // grams
    pub carbs: f64,   // grams
    pub fat: f64,     // grams
}

impl Nutrition {
    /// Create a new Nutrition with all zeros
    pub fn zero() -> Self {
        Self::default()
    }

    /// Scale nutrition values by a multiplier
    pub fn scale(&self, multiplier: f64) -> Self {
        Self {
            calories: self.calories * multiplier,
            protein: self.protein * multiplier,
            carbs: self.carbs * multiplier,
            fat: self.fat * multiplier,
        }
    }

    /// Add another nutrition to this one
    pub fn add(&self, other: &Nutrition) -> Self {
        Self {
            calories: self.calories + other.calories,
            protein: self.protein + other.protein,
            carbs: self.carbs + other.carbs,
            fat: self.fat + other.fat,
        }
    }

    /// Round every field to `decimals` places
    pub fn rounded(&self, decimals: i32) -> Self {
        Self {
            calories: round_to(self.calories, decimals),
            protein: round_to(self.protein, decimals),
            carbs: round_to(self.carbs, decimals),
            fat: round_to(self.fat, decimals),
        }
    }

    /// True when every field is finite and non-negative
    pub fn is_well_formed(&self) -> bool {
        [self.calories, self.protein, self.carbs, self.fat]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }
}

impl std::ops::Add for Nutrition {
    type Output = Nutrition;

    fn add(self, other: Nutrition) -> Nutrition {
        Nutrition::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for Nutrition {
    type Output = Nutrition;

    fn mul(self, multiplier: f64) -> Nutrition {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for Nutrition {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Nutrition::zero(), |acc, n| acc + n)
    }
}

/// Nutrition as declared on a label, where any field may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialNutrition {
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub protein: Option<f64>,
    #[serde(default)]
    pub carbs: Option<f64>,
    #[serde(default)]
    pub fat: Option<f64>,
}

impl PartialNutrition {
    /// Fill missing fields with 0
    pub fn resolve(&self) -> Nutrition {
        Nutrition {
            calories: self.calories.unwrap_or(0.0),
            protein: self.protein.unwrap_or(0.0),
            carbs: self.carbs.unwrap_or(0.0),
            fat: self.fat.unwrap_or(0.0),
        }
    }
}

impl From<Nutrition> for PartialNutrition {
    fn from(n: Nutrition) -> Self {
        Self {
            calories: Some(n.calories),
            protein: Some(n.protein),
            carbs: Some(n.carbs),
            fat: Some(n.fat),
        }
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_and_scale() {
        let a = Nutrition { calories: 100.0, protein: 10.0, carbs: 20.0, fat: 5.0 };
        let b = Nutrition { calories: 50.0, protein: 1.0, carbs: 2.0, fat: 0.5 };
        let total: Nutrition = vec![a, b].into_iter().sum();
        assert_eq!(total, Nutrition { calories: 150.0, protein: 11.0, carbs: 22.0, fat: 5.5 });
        assert_eq!((a * 2.0).calories, 200.0);
    }

    #[test]
    fn test_resolve_missing_fields() {
        let partial = PartialNutrition { calories: Some(90.0), ..Default::default() };
        assert_eq!(
            partial.resolve(),
            Nutrition { calories: 90.0, protein: 0.0, carbs: 0.0, fat: 0.0 }
        );
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(2.345, 1), 2.3);
        assert_eq!(round_to(12.5, 0), 13.0);
        assert_eq!(round_to(0.126, 2), 0.13);
    }

    #[test]
    fn test_is_well_formed() {
        assert!(Nutrition::zero().is_well_formed());
        assert!(!Nutrition { calories: f64::NAN, ..Default::default() }.is_well_formed());
        assert!(!Nutrition { fat: -1.0, ..Default::default() }.is_well_formed());
    }
}
