//! # Recipe Data Model
//!
//! This module defines the canonical recipe record shared by every source,
//! together with its provenance tag, dietary flags, the optional detail
//! payload and the search filters a caller can request.
//!
//! ## Core Concepts
//!
//! - **CanonicalRecipe**: one recipe as seen downstream, whatever source produced it
//! - **Provenance**: which resolution step produced the record
//! - **RecipeDetail**: ingredients, steps and nutrition, only filled for detail views
//! - **FilterKind**: a named search constraint ("quick", "vegan", ...)

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::ingredient_line::{format_amount, round_amount};
use crate::match_scorer::MatchScore;

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/312x231?text=Recipe+Image";
pub const DEFAULT_TITLE: &str = "Delicious Recipe";
pub const DEFAULT_SUMMARY: &str = "A delicious recipe you'll love!";
pub const DEFAULT_CREDITS: &str = "Pantry Recipes";
pub const DEFAULT_READY_IN_MINUTES: u32 = 30;
pub const DEFAULT_SERVINGS: u32 = 4;
/// Width of each range of ids handed to records that carry no provider id
pub const DERIVED_ID_SPAN: i64 = 99_999;

/// Stable id in `base + 1 ..= base + DERIVED_ID_SPAN` derived from a record's content
///
/// The same parts always give the same id within a build, so repeated
/// searches return identical records while different records in one range
/// stay apart.
pub fn derived_recipe_id(base: i64, parts: &[&str]) -> i64 {
    let mut hasher = DefaultHasher::new();
    parts.hash(&mut hasher);
    base + 1 + (hasher.finish() % DERIVED_ID_SPAN as u64) as i64
}

/// Which resolution step produced a recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Live,
    Curated,
    Generated,
    Emergency,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provenance::Live => "live",
            Provenance::Curated => "curated",
            Provenance::Generated => "generated",
            Provenance::Emergency => "emergency",
        };
        f.write_str(name)
    }
}

/// Dietary and characteristic flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietaryFlags {
    pub cheap: bool,
    pub dairy_free: bool,
    pub gluten_free: bool,
    pub vegan: bool,
    pub vegetarian: bool,
    pub very_healthy: bool,
    pub very_popular: bool,
}

impl DietaryFlags {
    /// Flags for a plant-only dish
    pub fn vegan() -> Self {
        Self {
            vegan: true,
            vegetarian: true,
            dairy_free: true,
            ..Default::default()
        }
    }

    pub fn vegetarian() -> Self {
        Self {
            vegetarian: true,
            ..Default::default()
        }
    }
}

/// One ingredient of a detailed recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailIngredient {
    pub id: Option<i64>,
    pub name: String,
    pub original: String,
    pub amount: f64,
    pub unit: String,
}

impl DetailIngredient {
    /// Render "amount unit name", skipping an empty unit
    pub fn describe(amount: f64, unit: &str, name: &str) -> String {
        if unit.is_empty() {
            format!("{} {}", format_amount(amount), name)
        } else {
            format!("{} {} {}", format_amount(amount), unit, name)
        }
    }
}

/// One nutrition fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrient {
    pub title: String,
    pub amount: f64,
    pub unit: String,
}

impl Nutrient {
    pub fn new(title: &str, amount: f64, unit: &str) -> Self {
        Self {
            title: title.to_string(),
            amount,
            unit: unit.to_string(),
        }
    }

    /// Zeroed calories and macros, used when a source reports no nutrition
    pub fn unknown_defaults() -> Vec<Nutrient> {
        vec![
            Nutrient::new("Calories", 0.0, "kcal"),
            Nutrient::new("Protein", 0.0, "g"),
            Nutrient::new("Carbohydrates", 0.0, "g"),
            Nutrient::new("Fat", 0.0, "g"),
        ]
    }
}

/// Ingredients, steps and nutrition for a detail view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDetail {
    pub ingredients: Vec<DetailIngredient>,
    pub instructions: Vec<String>,
    pub nutrition: Vec<Nutrient>,
    pub diets: Vec<String>,
    pub dish_types: Vec<String>,
    pub credits_text: String,
    pub source_url: Option<String>,
}

impl RecipeDetail {
    /// Detail built from plain ingredient names and steps
    pub fn from_names(names: &[String], instructions: Vec<String>) -> Self {
        let ingredients = names
            .iter()
            .enumerate()
            .map(|(idx, name)| DetailIngredient {
                id: Some(idx as i64 + 1),
                name: name.clone(),
                original: name.clone(),
                amount: 1.0,
                unit: String::new(),
            })
            .collect();

        Self {
            ingredients,
            instructions,
            nutrition: Nutrient::unknown_defaults(),
            diets: Vec::new(),
            dish_types: Vec::new(),
            credits_text: DEFAULT_CREDITS.to_string(),
            source_url: None,
        }
    }

    /// Ingredients with every amount multiplied by `factor`
    pub fn scaled_ingredients(&self, factor: f64) -> Vec<DetailIngredient> {
        self.ingredients
            .iter()
            .map(|ingredient| {
                let amount = round_amount(ingredient.amount * factor);
                DetailIngredient {
                    amount,
                    original: DetailIngredient::describe(amount, &ingredient.unit, &ingredient.name),
                    ..ingredient.clone()
                }
            })
            .collect()
    }
}

/// The unified recipe record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecipe {
    pub id: i64,
    pub title: String,
    pub image: String,
    pub ready_in_minutes: u32,
    pub servings: u32,
    #[serde(rename = "matchPercentage")]
    pub match_score: MatchScore,
    #[serde(flatten)]
    pub flags: DietaryFlags,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<RecipeDetail>,
}

impl CanonicalRecipe {
    /// Scale this recipe's detail ingredients to a new serving count
    pub fn scale_servings(&self, new_servings: u32) -> ServingAdjustment {
        let original_servings = if self.servings == 0 {
            DEFAULT_SERVINGS
        } else {
            self.servings
        };
        let scale_factor = f64::from(new_servings) / f64::from(original_servings);
        let scaled_ingredients = self
            .detail
            .as_ref()
            .map(|detail| detail.scaled_ingredients(scale_factor))
            .unwrap_or_default();

        ServingAdjustment {
            recipe_id: self.id,
            original_servings,
            new_servings,
            scale_factor,
            scaled_ingredients,
        }
    }
}

/// Result of rescaling a recipe to a different number of servings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServingAdjustment {
    pub recipe_id: i64,
    pub original_servings: u32,
    pub new_servings: u32,
    pub scale_factor: f64,
    pub scaled_ingredients: Vec<DetailIngredient>,
}

/// Named search constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Quick,
    Healthy,
    Vegetarian,
    Vegan,
    GlutenFree,
    Sweet,
    Comfort,
    Spicy,
}

impl FilterKind {
    /// Parse a filter name case-insensitively; unknown names yield `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let name: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();

        match name.as_str() {
            "quick" => Some(FilterKind::Quick),
            "healthy" => Some(FilterKind::Healthy),
            "vegetarian" => Some(FilterKind::Vegetarian),
            "vegan" => Some(FilterKind::Vegan),
            "glutenfree" => Some(FilterKind::GlutenFree),
            "sweet" => Some(FilterKind::Sweet),
            "comfort" => Some(FilterKind::Comfort),
            "spicy" => Some(FilterKind::Spicy),
            _ => None,
        }
    }

    /// Short style description handed to the generative service
    pub fn style_hint(self) -> &'static str {
        match self {
            FilterKind::Quick => "quick, ready in 30 minutes or less",
            FilterKind::Healthy => "healthy and light, under 500 calories per serving",
            FilterKind::Vegetarian => "vegetarian",
            FilterKind::Vegan => "vegan",
            FilterKind::GlutenFree => "gluten-free",
            FilterKind::Sweet => "a sweet dessert",
            FilterKind::Comfort => "hearty comfort food",
            FilterKind::Spicy => "spicy",
        }
    }
}
