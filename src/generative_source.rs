//! # Generative Recipe Source Module
//!
//! Prompt building, response parsing and HTTP client for the generative text
//! service used as a last real fallback. The service is untrusted: its answer
//! may be wrapped in markdown fences, carry prose around the JSON or not be
//! JSON at all.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

use crate::recipe_model::{derived_recipe_id, FilterKind};
use crate::recipe_normalizer::LiteralRecipe;
use crate::search_config::ProviderConfig;
use crate::search_errors::SourceError;

/// A prompt-completion service
#[async_trait]
pub trait GenerativeTextService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, SourceError>;
}

/// Structured prompt asking for recipes that use exactly the given ingredients
pub fn build_recipe_prompt(ingredients: &[String], count: usize, filter: Option<FilterKind>) -> String {
    let style = filter
        .map(|f| format!("\nThe recipes should be {}.", f.style_hint()))
        .unwrap_or_default();

    format!(
        r#"Suggest {count} recipes that can be cooked with exactly these ingredients: {ingredients}.
Common pantry staples (salt, pepper, oil, water) may be assumed.{style}

Respond with only a JSON array. Each element must be an object with these fields:
- "title": string
- "summary": one sentence
- "readyInMinutes": integer
- "servings": integer
- "ingredients": array of strings, each like "2 cups rice"
- "instructions": array of strings, one step each
- "vegetarian": boolean
- "vegan": boolean"#,
        ingredients = ingredients.join(", "),
    )
}

/// Parse a completion into recipe objects
///
/// Accepts a bare array, an object with a `recipes` array, or a single recipe
/// object, optionally surrounded by code fences or prose.
pub fn parse_generated_recipes(text: &str) -> Result<Vec<Value>, SourceError> {
    let cleaned = strip_code_fences(text);

    let parsed = serde_json::from_str::<Value>(cleaned)
        .ok()
        .or_else(|| outermost_json(cleaned).and_then(|span| serde_json::from_str(span).ok()))
        .ok_or_else(|| SourceError::MalformedResponse("generated text is not JSON".to_string()))?;

    let recipes = match parsed {
        Value::Array(items) => items,
        Value::Object(mut fields) => match fields.remove("recipes") {
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(SourceError::MalformedResponse(
                    "`recipes` is not an array".to_string(),
                ))
            }
            None => vec![Value::Object(fields)],
        },
        _ => {
            return Err(SourceError::MalformedResponse(
                "generated JSON is neither an array nor an object".to_string(),
            ))
        }
    };

    let recipes: Vec<Value> = recipes.into_iter().filter(Value::is_object).collect();
    if recipes.is_empty() {
        return Err(SourceError::MalformedResponse(
            "generated JSON contains no recipe objects".to_string(),
        ));
    }
    Ok(recipes)
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// The widest `[...]` or `{...}` span in the text
fn outermost_json(text: &str) -> Option<&str> {
    let start = text.find(|c| c == '[' || c == '{')?;
    let end = text.rfind(|c| c == ']' || c == '}')?;
    (end > start).then(|| &text[start..=end])
}

/// Minimal single-step recipes built from the ingredient list alone
///
/// Ids fall in the range above `id_base` and depend only on the ingredients
/// and the title.
pub fn synthesize_minimal_recipes(ingredients: &[String], id_base: i64) -> Vec<LiteralRecipe> {
    let lead = ingredients
        .first()
        .map(|name| title_case(name))
        .unwrap_or_else(|| "Pantry".to_string());
    let listed = ingredients.join(", ");
    let key = ingredients.join(",");
    let skillet = format!("{lead} Skillet");
    let soup = format!("{lead} Soup");

    vec![
        LiteralRecipe::new(derived_recipe_id(id_base, &[&key, &skillet]), skillet, ingredients.to_vec())
            .with_timing(20, 2)
            .with_instructions(vec![format!(
                "Sauté {listed} in a hot pan with a little oil until cooked through, then season to taste."
            )])
            .with_summary(format!("A quick one-pan dish built from {listed}.")),
        LiteralRecipe::new(derived_recipe_id(id_base, &[&key, &soup]), soup, ingredients.to_vec())
            .with_timing(30, 4)
            .with_instructions(vec![format!(
                "Simmer {listed} in 4 cups of salted water for 20 minutes and serve warm."
            )])
            .with_summary(format!("A simple soup made with {listed}.")),
    ]
}

pub(crate) fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// reqwest-backed client for a Gemini-compatible `generateContent` endpoint
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    /// Build a client, or `None` when no API key is configured
    pub fn from_config(config: &ProviderConfig, timeout: Duration) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = config.gemini_api_key.clone() else {
            info!("GEMINI_API_KEY not set, generative fallback disabled");
            return Ok(None);
        };

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the generative API")?;

        Ok(Some(Self {
            http,
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.gemini_base_url.trim_end_matches('/'),
                config.gemini_model
            ),
            api_key,
        }))
    }
}

#[async_trait]
impl GenerativeTextService for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, SourceError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!(
                "generative API answered {status}"
            )));
        }

        let payload: Value = response.json().await?;
        let text = payload
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SourceError::MalformedResponse("completion has no candidate text".to_string())
            })?;

        debug!(chars = text.len(), "Generative completion received");
        Ok(text.to_string())
    }
}
