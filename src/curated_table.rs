//! # Curated Recipe Table
//!
//! A small in-process table of well-known recipes keyed by the sorted,
//! normalized combination of their defining ingredients. Always available and
//! free of latency, it backs the live search when that fails.

use std::sync::LazyLock;

use crate::generative_source::title_case;
use crate::ingredient_normalizer::IngredientSet;
use crate::recipe_model::{derived_recipe_id, DietaryFlags};
use crate::recipe_normalizer::LiteralRecipe;

pub const CURATED_ID_BASE: i64 = 9_000_000;
pub const PLACEHOLDER_ID_BASE: i64 = 9_100_000;

/// One table row: the ingredient combination and the recipe it yields
#[derive(Debug, Clone)]
pub struct CuratedEntry {
    pub key: IngredientSet,
    pub recipe: LiteralRecipe,
}

fn entry(key: &[&str], recipe: LiteralRecipe) -> CuratedEntry {
    CuratedEntry {
        key: IngredientSet::from_raw(key),
        recipe,
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn steps(list: &[&str]) -> Vec<String> {
    names(list)
}

static CURATED_TABLE: LazyLock<Vec<CuratedEntry>> = LazyLock::new(|| {
    vec![
        entry(
            &["egg", "pasta"],
            LiteralRecipe::new(
                CURATED_ID_BASE + 1,
                "Spaghetti Carbonara",
                names(&["pasta", "egg", "parmesan", "black pepper", "bacon"]),
            )
            .with_timing(25, 2)
            .with_instructions(steps(&[
                "Cook the pasta in salted water until al dente.",
                "Crisp the bacon in a large pan.",
                "Whisk the eggs with grated parmesan and plenty of black pepper.",
                "Toss the hot drained pasta with the bacon, then the egg mixture, off the heat.",
            ]))
            .with_summary("Silky Roman pasta bound with egg and cheese."),
        ),
        entry(
            &["chicken", "rice"],
            LiteralRecipe::new(
                CURATED_ID_BASE + 2,
                "Chicken Fried Rice",
                names(&["chicken", "rice", "egg", "soy sauce", "green onion"]),
            )
            .with_timing(20, 3)
            .with_instructions(steps(&[
                "Stir fry diced chicken until golden and set aside.",
                "Scramble the egg in the same pan.",
                "Add cold cooked rice, soy sauce and the chicken, and fry until hot.",
                "Finish with sliced green onion.",
            ]))
            .with_flags(DietaryFlags {
                dairy_free: true,
                cheap: true,
                ..Default::default()
            }),
        ),
        entry(
            &["pasta", "tomato"],
            LiteralRecipe::new(
                CURATED_ID_BASE + 3,
                "Pasta al Pomodoro",
                names(&["pasta", "tomato", "garlic", "olive oil", "basil"]),
            )
            .with_timing(30, 4)
            .with_instructions(steps(&[
                "Soften sliced garlic in olive oil.",
                "Add chopped tomatoes and simmer for 15 minutes.",
                "Toss with cooked pasta and torn basil.",
            ]))
            .with_flags(DietaryFlags::vegan()),
        ),
        entry(
            &["bread", "cheese"],
            LiteralRecipe::new(
                CURATED_ID_BASE + 4,
                "Grilled Cheese Sandwich",
                names(&["bread", "cheese", "butter"]),
            )
            .with_timing(10, 1)
            .with_instructions(steps(&[
                "Butter the outside of two bread slices.",
                "Fill with cheese and toast in a pan until golden on both sides.",
            ]))
            .with_flags(DietaryFlags {
                cheap: true,
                ..DietaryFlags::vegetarian()
            }),
        ),
        entry(
            &["egg", "potato"],
            LiteralRecipe::new(
                CURATED_ID_BASE + 5,
                "Spanish Tortilla",
                names(&["potato", "egg", "onion", "olive oil"]),
            )
            .with_timing(40, 4)
            .with_instructions(steps(&[
                "Gently fry thinly sliced potato and onion in olive oil until tender.",
                "Drain and fold into beaten eggs.",
                "Cook in a pan over low heat, flip, and cook until set.",
            ]))
            .with_flags(DietaryFlags {
                gluten_free: true,
                dairy_free: true,
                ..DietaryFlags::vegetarian()
            }),
        ),
        entry(
            &["beef", "potato"],
            LiteralRecipe::new(
                CURATED_ID_BASE + 6,
                "Cottage Pie",
                names(&["beef", "potato", "onion", "carrot", "butter"]),
            )
            .with_timing(60, 6)
            .with_instructions(steps(&[
                "Brown the beef with diced onion and carrot.",
                "Boil and mash the potatoes with butter.",
                "Spread the mash over the beef and bake until golden.",
            ])),
        ),
        entry(
            &["beans", "rice"],
            LiteralRecipe::new(
                CURATED_ID_BASE + 7,
                "Rice and Beans",
                names(&["rice", "beans", "onion", "garlic", "cumin"]),
            )
            .with_timing(35, 4)
            .with_instructions(steps(&[
                "Sauté onion, garlic and cumin.",
                "Add rice, beans and water, then simmer covered until the rice is tender.",
            ]))
            .with_flags(DietaryFlags {
                cheap: true,
                gluten_free: true,
                very_healthy: true,
                ..DietaryFlags::vegan()
            }),
        ),
        entry(
            &["banana", "egg"],
            LiteralRecipe::new(
                CURATED_ID_BASE + 8,
                "Two-Ingredient Banana Pancakes",
                names(&["banana", "egg"]),
            )
            .with_timing(15, 1)
            .with_instructions(steps(&[
                "Mash the banana and whisk in the eggs.",
                "Cook small pancakes in a buttered pan, flipping once.",
            ]))
            .with_flags(DietaryFlags {
                gluten_free: true,
                dairy_free: true,
                ..DietaryFlags::vegetarian()
            }),
        ),
        entry(
            &["chicken", "onion", "tomato"],
            LiteralRecipe::new(
                CURATED_ID_BASE + 9,
                "Chicken Cacciatore",
                names(&["chicken", "tomato", "onion", "bell pepper", "garlic"]),
            )
            .with_timing(50, 4)
            .with_instructions(steps(&[
                "Brown the chicken pieces and set aside.",
                "Soften onion, pepper and garlic, then add the tomatoes.",
                "Return the chicken and simmer for 30 minutes.",
            ]))
            .with_flags(DietaryFlags {
                gluten_free: true,
                dairy_free: true,
                ..Default::default()
            }),
        ),
        entry(
            &["broccoli", "tofu"],
            LiteralRecipe::new(
                CURATED_ID_BASE + 10,
                "Tofu and Broccoli Stir Fry",
                names(&["tofu", "broccoli", "soy sauce", "garlic", "ginger"]),
            )
            .with_timing(20, 2)
            .with_instructions(steps(&[
                "Fry cubed tofu until crisp.",
                "Stir fry broccoli with garlic and ginger.",
                "Toss everything with soy sauce.",
            ]))
            .with_flags(DietaryFlags {
                very_healthy: true,
                ..DietaryFlags::vegan()
            }),
        ),
    ]
});

/// All curated entries in table order
pub fn entries() -> &'static [CuratedEntry] {
    &CURATED_TABLE
}

/// Number of shared tokens a key needs to count as a partial match
pub fn partial_overlap_threshold(user_len: usize, key_len: usize) -> usize {
    user_len.min(key_len).saturating_sub(1).max(1)
}

/// Curated recipes for a user's ingredients
///
/// Exact key matches win; otherwise every entry with enough overlap is
/// returned, in table order and without duplicates.
pub fn lookup(user: &IngredientSet) -> Vec<LiteralRecipe> {
    if user.is_empty() {
        return Vec::new();
    }

    let exact: Vec<LiteralRecipe> = entries()
        .iter()
        .filter(|entry| entry.key == *user)
        .map(|entry| entry.recipe.clone())
        .collect();
    if !exact.is_empty() {
        return exact;
    }

    let mut matches: Vec<LiteralRecipe> = Vec::new();
    for entry in entries() {
        let needed = partial_overlap_threshold(user.len(), entry.key.len());
        if entry.key.overlap(user) >= needed && !matches.iter().any(|r| r.id == entry.recipe.id) {
            matches.push(entry.recipe.clone());
        }
    }
    matches
}

pub fn find_by_id(id: i64) -> Option<LiteralRecipe> {
    entries()
        .iter()
        .find(|entry| entry.recipe.id == id)
        .map(|entry| entry.recipe.clone())
}

/// Id of the placeholder recipe for one ingredient
pub fn placeholder_id(ingredient: &str) -> i64 {
    derived_recipe_id(PLACEHOLDER_ID_BASE, &["placeholder", ingredient])
}

/// One trivial recipe per user ingredient, used when the table has nothing
pub fn placeholder_recipes(ingredients: &[String]) -> Vec<LiteralRecipe> {
    ingredients
        .iter()
        .map(|name| {
            LiteralRecipe::new(
                placeholder_id(name),
                format!("Simple Sautéed {}", title_case(name)),
                vec![name.clone()],
            )
            .with_timing(15, 2)
            .with_instructions(steps(&[
                "Heat a little oil in a pan over medium heat.",
                "Add the ingredient, season with salt and pepper, and cook until done.",
            ]))
        })
        .collect()
}
