//! # Match Scorer Module
//!
//! Computes how much of a recipe's ingredient list is covered by the
//! ingredients a user has on hand.
//!
//! Each recipe ingredient counts 1.0 when the user has the same token and
//! 0.5 when the user has a related token (one contains the other). The sum is
//! divided by the number of distinct recipe ingredients and rounded to a
//! whole percentage.
//!
//! ```rust
//! use pantry_recipes::match_scorer::score;
//!
//! let user = ["chicken", "rice", "onion"];
//! let recipe = ["Chicken", "rice", "red onion", "ginger"];
//! // 1.0 + 1.0 + 0.5 + 0.0 over 4 ingredients
//! assert_eq!(score(&user, &recipe).value(), 63);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ingredient_normalizer::IngredientSet;

/// An integer match percentage in `[0, 100]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchScore(u8);

impl MatchScore {
    pub const ZERO: MatchScore = MatchScore(0);
    pub const FULL: MatchScore = MatchScore(100);

    pub fn new(value: u8) -> Self {
        MatchScore(value.min(100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for MatchScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Score raw user ingredients against raw recipe ingredients
pub fn score<U, R>(user_ingredients: &[U], recipe_ingredients: &[R]) -> MatchScore
where
    U: AsRef<str>,
    R: AsRef<str>,
{
    let user = IngredientSet::from_raw(user_ingredients);
    let recipe = IngredientSet::from_raw(recipe_ingredients);
    score_sets(&user, &recipe)
}

/// Score two already-normalized sets
pub fn score_sets(user: &IngredientSet, recipe: &IngredientSet) -> MatchScore {
    if recipe.is_empty() {
        return MatchScore::ZERO;
    }

    // Counted in half points so exact and related hits stay integral
    let half_points: usize = recipe
        .iter()
        .map(|token| {
            if user.contains(token) {
                2
            } else if user.first_related(token).is_some() {
                1
            } else {
                0
            }
        })
        .sum();

    let matches = half_points as f64 / 2.0;
    let percentage = (100.0 * matches / recipe.len() as f64).round();
    MatchScore::new(percentage.clamp(0.0, 100.0) as u8)
}
