//! # Recipe Normalizer Module
//!
//! Maps the differently-shaped payloads of each recipe source onto one
//! `CanonicalRecipe`. Every missing field falls back to a default so that
//! downstream code never sees a hole; only a payload that is not an object at
//! all is rejected.

use serde_json::{Map, Value};
use tracing::debug;

use crate::ingredient_line::parse_ingredient_line;
use crate::ingredient_normalizer::IngredientSet;
use crate::match_scorer::score_sets;
use crate::recipe_model::{
    CanonicalRecipe, DEFAULT_CREDITS, DEFAULT_READY_IN_MINUTES, DEFAULT_SERVINGS, DEFAULT_SUMMARY,
    DEFAULT_TITLE, DetailIngredient, DietaryFlags, Nutrient, PLACEHOLDER_IMAGE, Provenance,
    RecipeDetail,
};
use crate::search_errors::SourceError;

/// A recipe written out in code: curated entries and every synthesized placeholder
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralRecipe {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    pub ready_in_minutes: Option<u32>,
    pub servings: Option<u32>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub flags: DietaryFlags,
    pub summary: Option<String>,
}

impl LiteralRecipe {
    pub fn new(id: i64, title: impl Into<String>, ingredients: Vec<String>) -> Self {
        Self {
            id,
            title: title.into(),
            image: None,
            ready_in_minutes: None,
            servings: None,
            ingredients,
            instructions: Vec::new(),
            flags: DietaryFlags::default(),
            summary: None,
        }
    }

    pub fn with_timing(mut self, ready_in_minutes: u32, servings: u32) -> Self {
        self.ready_in_minutes = Some(ready_in_minutes);
        self.servings = Some(servings);
        self
    }

    pub fn with_instructions(mut self, instructions: Vec<String>) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn with_flags(mut self, flags: DietaryFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// Source payloads, one variant per shape
#[derive(Debug, Clone)]
pub enum ProviderPayload {
    /// A live search result or detail document (Spoonacular-style JSON)
    Live(Value),
    /// A recipe literal from the curated table or a synthesizer
    Literal(LiteralRecipe),
    /// One recipe object parsed from a generative completion
    Generated(Value),
}

/// What the normalizer needs besides the payload
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    pub user_ingredients: &'a IngredientSet,
    pub provenance: Provenance,
    /// Identifier used when the payload carries none
    pub fallback_id: i64,
    /// Whether to build the ingredient/instruction payload for a detail view
    pub include_detail: bool,
}

impl<'a> NormalizeContext<'a> {
    pub fn new(user_ingredients: &'a IngredientSet, provenance: Provenance) -> Self {
        Self {
            user_ingredients,
            provenance,
            fallback_id: 0,
            include_detail: false,
        }
    }

    pub fn with_fallback_id(mut self, id: i64) -> Self {
        self.fallback_id = id;
        self
    }

    pub fn with_detail(mut self, include_detail: bool) -> Self {
        self.include_detail = include_detail;
        self
    }
}

/// Convert one provider payload into the canonical record
pub fn to_canonical(
    payload: &ProviderPayload,
    context: &NormalizeContext<'_>,
) -> Result<CanonicalRecipe, SourceError> {
    match payload {
        ProviderPayload::Live(value) => normalize_live(as_object(value)?, context),
        ProviderPayload::Literal(literal) => Ok(normalize_literal(literal, context)),
        ProviderPayload::Generated(value) => normalize_generated(as_object(value)?, context),
    }
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, SourceError> {
    value.as_object().ok_or_else(|| {
        SourceError::MalformedResponse(format!("expected a recipe object, got {}", kind_of(value)))
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Ingredient names of a live payload, by precedence:
/// full list, then used + missed sub-lists, then a flat list, then nothing
pub fn extract_live_ingredients(object: &Map<String, Value>) -> Vec<String> {
    if let Some(extended) = object.get("extendedIngredients").and_then(Value::as_array) {
        return names_of(extended);
    }

    let used = object.get("usedIngredients").and_then(Value::as_array);
    let missed = object.get("missedIngredients").and_then(Value::as_array);
    if used.is_some() || missed.is_some() {
        let mut names = used.map(|list| names_of(list)).unwrap_or_default();
        names.extend(missed.map(|list| names_of(list)).unwrap_or_default());
        return names;
    }

    object
        .get("ingredients")
        .and_then(Value::as_array)
        .map(|list| names_of(list))
        .unwrap_or_default()
}

/// Names from a list of either plain strings or objects with a `name` field
fn names_of(list: &[Value]) -> Vec<String> {
    list.iter()
        .filter_map(|item| match item {
            Value::String(name) => Some(name.clone()),
            Value::Object(fields) => fields.get("name").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .filter(|name| !name.trim().is_empty())
        .collect()
}

fn normalize_live(
    object: &Map<String, Value>,
    context: &NormalizeContext<'_>,
) -> Result<CanonicalRecipe, SourceError> {
    let ingredients = extract_live_ingredients(object);
    let recipe_set = IngredientSet::from_raw(&ingredients);
    let match_score = score_sets(context.user_ingredients, &recipe_set);

    let id = int_field(object, "id").unwrap_or(context.fallback_id);
    debug!(recipe_id = id, match_score = match_score.value(), "Normalized live recipe");

    let detail = context.include_detail.then(|| live_detail(object, &ingredients));
    let summary = string_field(object, "summary")
        .or_else(|| context.include_detail.then(|| DEFAULT_SUMMARY.to_string()));

    Ok(CanonicalRecipe {
        id,
        title: string_field(object, "title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        image: string_field(object, "image").unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        ready_in_minutes: positive_u32(object, "readyInMinutes").unwrap_or(DEFAULT_READY_IN_MINUTES),
        servings: positive_u32(object, "servings").unwrap_or(DEFAULT_SERVINGS),
        match_score,
        flags: DietaryFlags {
            cheap: bool_field(object, "cheap"),
            dairy_free: bool_field(object, "dairyFree"),
            gluten_free: bool_field(object, "glutenFree"),
            vegan: bool_field(object, "vegan"),
            vegetarian: bool_field(object, "vegetarian"),
            very_healthy: bool_field(object, "veryHealthy"),
            very_popular: bool_field(object, "veryPopular"),
        },
        provenance: context.provenance,
        summary,
        detail,
    })
}

fn live_detail(object: &Map<String, Value>, ingredient_names: &[String]) -> RecipeDetail {
    let ingredients = match object.get("extendedIngredients").and_then(Value::as_array) {
        Some(extended) => extended
            .iter()
            .filter_map(Value::as_object)
            .map(|fields| {
                let name = string_field(fields, "name").unwrap_or_default();
                let amount = fields.get("amount").and_then(Value::as_f64).unwrap_or(1.0);
                let unit = string_field(fields, "unit").unwrap_or_default();
                DetailIngredient {
                    id: int_field(fields, "id"),
                    original: string_field(fields, "original")
                        .unwrap_or_else(|| DetailIngredient::describe(amount, &unit, &name)),
                    name,
                    amount,
                    unit,
                }
            })
            .collect(),
        None => RecipeDetail::from_names(ingredient_names, Vec::new()).ingredients,
    };

    let instructions = object
        .get("analyzedInstructions")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|block| block.get("steps").and_then(Value::as_array))
                .flatten()
                .filter_map(|step| step.get("step").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let nutrition: Vec<Nutrient> = object
        .get("nutrition")
        .and_then(|n| n.get("nutrients"))
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_object)
                .filter_map(|fields| {
                    Some(Nutrient {
                        title: string_field(fields, "title").or_else(|| string_field(fields, "name"))?,
                        amount: fields.get("amount").and_then(Value::as_f64).unwrap_or(0.0),
                        unit: string_field(fields, "unit").unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    RecipeDetail {
        ingredients,
        instructions,
        nutrition: if nutrition.is_empty() {
            Nutrient::unknown_defaults()
        } else {
            nutrition
        },
        diets: string_list(object, "diets"),
        dish_types: string_list(object, "dishTypes"),
        credits_text: string_field(object, "creditsText").unwrap_or_else(|| DEFAULT_CREDITS.to_string()),
        source_url: string_field(object, "sourceUrl"),
    }
}

fn normalize_literal(literal: &LiteralRecipe, context: &NormalizeContext<'_>) -> CanonicalRecipe {
    let match_score = score_sets(
        context.user_ingredients,
        &IngredientSet::from_raw(&literal.ingredients),
    );

    let detail = context
        .include_detail
        .then(|| RecipeDetail::from_names(&literal.ingredients, literal.instructions.clone()));
    let summary = literal
        .summary
        .clone()
        .or_else(|| context.include_detail.then(|| DEFAULT_SUMMARY.to_string()));

    CanonicalRecipe {
        id: literal.id,
        title: if literal.title.trim().is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            literal.title.clone()
        },
        image: literal.image.clone().unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        ready_in_minutes: literal
            .ready_in_minutes
            .filter(|&m| m > 0)
            .unwrap_or(DEFAULT_READY_IN_MINUTES),
        servings: literal.servings.filter(|&s| s > 0).unwrap_or(DEFAULT_SERVINGS),
        match_score,
        flags: literal.flags,
        provenance: context.provenance,
        summary,
        detail,
    }
}

fn normalize_generated(
    object: &Map<String, Value>,
    context: &NormalizeContext<'_>,
) -> Result<CanonicalRecipe, SourceError> {
    let lines = extract_live_ingredients(object);
    let parsed: Vec<_> = lines.iter().map(|line| parse_ingredient_line(line)).collect();
    let names: Vec<String> = parsed.iter().map(|line| line.name.clone()).collect();
    let match_score = score_sets(context.user_ingredients, &IngredientSet::from_raw(&names));

    let detail = context.include_detail.then(|| {
        let ingredients = parsed
            .iter()
            .zip(&lines)
            .enumerate()
            .map(|(idx, (line, original))| DetailIngredient {
                id: Some(idx as i64 + 1),
                name: line.name.clone(),
                original: original.clone(),
                amount: line.amount.unwrap_or(1.0),
                unit: line.unit.clone(),
            })
            .collect();
        RecipeDetail {
            ingredients,
            instructions: string_list(object, "instructions"),
            nutrition: Nutrient::unknown_defaults(),
            diets: Vec::new(),
            dish_types: string_list(object, "dishTypes"),
            credits_text: DEFAULT_CREDITS.to_string(),
            source_url: None,
        }
    });

    let summary = string_field(object, "summary")
        .or_else(|| string_field(object, "description"))
        .or_else(|| context.include_detail.then(|| DEFAULT_SUMMARY.to_string()));

    Ok(CanonicalRecipe {
        id: context.fallback_id,
        title: string_field(object, "title")
            .or_else(|| string_field(object, "name"))
            .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        image: string_field(object, "image").unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        ready_in_minutes: positive_u32(object, "readyInMinutes")
            .or_else(|| positive_u32(object, "cookingTime"))
            .unwrap_or(DEFAULT_READY_IN_MINUTES),
        servings: positive_u32(object, "servings").unwrap_or(DEFAULT_SERVINGS),
        match_score,
        flags: DietaryFlags {
            vegan: bool_field(object, "vegan"),
            vegetarian: bool_field(object, "vegetarian"),
            gluten_free: bool_field(object, "glutenFree"),
            dairy_free: bool_field(object, "dairyFree"),
            ..Default::default()
        },
        provenance: context.provenance,
        summary,
        detail,
    })
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn int_field(object: &Map<String, Value>, key: &str) -> Option<i64> {
    object.get(key).and_then(Value::as_i64)
}

/// Accepts integers, floats and numeric strings ("25", "25 minutes")
fn positive_u32(object: &Map<String, Value>, key: &str) -> Option<u32> {
    let value = object.get(key)?;
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.split_whitespace().next()?.parse::<f64>().ok()?,
        _ => return None,
    };
    (number >= 1.0 && number <= f64::from(u32::MAX)).then(|| number.round() as u32)
}

fn bool_field(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn string_list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(names: &[&str]) -> IngredientSet {
        IngredientSet::from_raw(names)
    }

    #[test]
    fn test_extract_prefers_full_list() {
        let payload = json!({
            "extendedIngredients": [{ "name": "rice" }, { "name": "egg" }],
            "usedIngredients": [{ "name": "ignored" }],
            "ingredients": ["also ignored"]
        });
        let names = extract_live_ingredients(payload.as_object().unwrap());
        assert_eq!(names, vec!["rice", "egg"]);
    }

    #[test]
    fn test_extract_unions_used_and_missed() {
        let payload = json!({
            "usedIngredients": [{ "name": "chicken" }],
            "missedIngredients": [{ "name": "soy sauce" }, { "name": "ginger" }]
        });
        let names = extract_live_ingredients(payload.as_object().unwrap());
        assert_eq!(names, vec!["chicken", "soy sauce", "ginger"]);
    }

    #[test]
    fn test_extract_flat_list_and_empty() {
        let flat = json!({ "ingredients": ["basil", { "name": "tomato" }, 3] });
        assert_eq!(
            extract_live_ingredients(flat.as_object().unwrap()),
            vec!["basil", "tomato"]
        );
        assert!(extract_live_ingredients(json!({}).as_object().unwrap()).is_empty());
    }

    #[test]
    fn test_live_defaults_fill_every_field() {
        let set = user(&["rice"]);
        let context = NormalizeContext::new(&set, Provenance::Live).with_fallback_id(99);
        let recipe = to_canonical(&ProviderPayload::Live(json!({})), &context).unwrap();

        assert_eq!(recipe.id, 99);
        assert_eq!(recipe.title, DEFAULT_TITLE);
        assert_eq!(recipe.image, PLACEHOLDER_IMAGE);
        assert_eq!(recipe.ready_in_minutes, 30);
        assert_eq!(recipe.servings, 4);
        assert_eq!(recipe.match_score.value(), 0);
        assert_eq!(recipe.flags, DietaryFlags::default());
        assert!(recipe.summary.is_none());
        assert!(recipe.detail.is_none());
    }

    #[test]
    fn test_live_fields_and_score() {
        let set = user(&["chicken", "rice"]);
        let payload = json!({
            "id": 716429,
            "title": "Chicken Rice Bowl",
            "image": "https://img.example/716429.jpg",
            "readyInMinutes": 25,
            "servings": 2,
            "vegan": false,
            "glutenFree": true,
            "usedIngredients": [{ "name": "chicken" }, { "name": "rice" }],
            "missedIngredients": [{ "name": "scallion" }, { "name": "sesame oil" }]
        });
        let context = NormalizeContext::new(&set, Provenance::Live);
        let recipe = to_canonical(&ProviderPayload::Live(payload), &context).unwrap();

        assert_eq!(recipe.id, 716429);
        assert_eq!(recipe.ready_in_minutes, 25);
        assert_eq!(recipe.servings, 2);
        assert!(recipe.flags.gluten_free);
        assert_eq!(recipe.match_score.value(), 50);
        assert_eq!(recipe.provenance, Provenance::Live);
    }

    #[test]
    fn test_provenance_comes_from_context() {
        let set = user(&["egg"]);
        let payload = ProviderPayload::Live(json!({ "id": 1, "ingredients": ["egg"] }));
        let context = NormalizeContext::new(&set, Provenance::Curated);
        assert_eq!(to_canonical(&payload, &context).unwrap().provenance, Provenance::Curated);
    }

    #[test]
    fn test_non_object_payload_is_malformed() {
        let set = user(&["egg"]);
        let context = NormalizeContext::new(&set, Provenance::Live);

        for value in [json!(null), json!("recipe"), json!([1, 2]), json!(3)] {
            let result = to_canonical(&ProviderPayload::Live(value), &context);
            assert!(matches!(result, Err(SourceError::MalformedResponse(_))));
        }
    }

    #[test]
    fn test_live_detail_payload() {
        let set = user(&["pasta"]);
        let payload = json!({
            "id": 5,
            "title": "Pasta",
            "extendedIngredients": [
                { "id": 11, "name": "pasta", "amount": 200.0, "unit": "g", "original": "200 g pasta" },
                { "name": "salt" }
            ],
            "analyzedInstructions": [{ "steps": [{ "step": "Boil water" }, { "step": "Cook pasta" }] }],
            "nutrition": { "nutrients": [{ "title": "Calories", "amount": 420.0, "unit": "kcal" }] },
            "diets": ["vegetarian"],
            "dishTypes": ["main course"]
        });
        let context = NormalizeContext::new(&set, Provenance::Live).with_detail(true);
        let recipe = to_canonical(&ProviderPayload::Live(payload), &context).unwrap();
        let detail = recipe.detail.unwrap();

        assert_eq!(recipe.summary.as_deref(), Some(DEFAULT_SUMMARY));
        assert_eq!(detail.ingredients.len(), 2);
        assert_eq!(detail.ingredients[0].original, "200 g pasta");
        assert_eq!(detail.ingredients[1].original, "1 salt");
        assert_eq!(detail.instructions, vec!["Boil water", "Cook pasta"]);
        assert_eq!(detail.nutrition[0].amount, 420.0);
        assert_eq!(detail.diets, vec!["vegetarian"]);
        assert_eq!(detail.credits_text, DEFAULT_CREDITS);
    }

    #[test]
    fn test_literal_scoring_and_defaults() {
        let set = user(&["pasta", "egg"]);
        let literal = LiteralRecipe::new(
            900_001,
            "Carbonara",
            vec!["pasta".into(), "egg".into(), "parmesan".into(), "black pepper".into()],
        );
        let context = NormalizeContext::new(&set, Provenance::Curated);
        let recipe = to_canonical(&ProviderPayload::Literal(literal), &context).unwrap();

        assert_eq!(recipe.id, 900_001);
        assert_eq!(recipe.match_score.value(), 50);
        assert_eq!(recipe.servings, DEFAULT_SERVINGS);
    }

    #[test]
    fn test_generated_lines_are_parsed_before_scoring() {
        let set = user(&["rice", "egg"]);
        let payload = json!({
            "title": "Egg Fried Rice",
            "readyInMinutes": "20 minutes",
            "ingredients": ["2 cups cooked rice", "2 eggs", "1 tbsp soy sauce"],
            "instructions": ["Scramble the eggs", "Fry the rice"]
        });
        let context = NormalizeContext::new(&set, Provenance::Generated)
            .with_fallback_id(800_001)
            .with_detail(true);
        let recipe = to_canonical(&ProviderPayload::Generated(payload), &context).unwrap();

        // "cooked rice" ~ rice, "eggs" ~ egg, soy sauce unmatched: (0.5 + 0.5) / 3
        assert_eq!(recipe.match_score.value(), 33);
        assert_eq!(recipe.ready_in_minutes, 20);
        assert_eq!(recipe.id, 800_001);
        let detail = recipe.detail.unwrap();
        assert_eq!(detail.ingredients[0].amount, 2.0);
        assert_eq!(detail.ingredients[0].unit, "cups");
        assert_eq!(detail.instructions.len(), 2);
    }
}
