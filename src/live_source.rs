//! # Live Recipe Source Module
//!
//! Query building and HTTP client for the external recipe database.
//! The `LiveRecipeSource` trait is the seam the resolution pipeline talks to,
//! so tests can substitute a scripted source.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::recipe_model::FilterKind;
use crate::search_config::ProviderConfig;
use crate::search_errors::SourceError;

/// Maximise used ingredients
const RANKING_MAX_USED: u8 = 2;

/// Parameters of one ingredient-based search
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LiveQuery {
    pub ingredients: Vec<String>,
    pub number: usize,
    pub ranking: u8,
    pub ignore_pantry: bool,
    pub max_ready_time: Option<u32>,
    pub max_calories: Option<u32>,
    pub diet: Option<String>,
    pub intolerances: Option<String>,
    pub dish_type: Option<String>,
    pub sort: Option<String>,
    pub query: Option<String>,
}

impl LiveQuery {
    pub fn new(ingredients: Vec<String>, number: usize) -> Self {
        Self {
            ingredients,
            number,
            ranking: RANKING_MAX_USED,
            ignore_pantry: true,
            ..Default::default()
        }
    }

    /// Apply the provider-specific constraints for a filter
    pub fn with_filter(mut self, filter: Option<FilterKind>) -> Self {
        let Some(filter) = filter else {
            return self;
        };

        match filter {
            FilterKind::Quick => self.max_ready_time = Some(30),
            FilterKind::Healthy => {
                self.max_calories = Some(500);
                self.diet = Some("vegetarian".to_string());
            }
            FilterKind::Vegetarian => self.diet = Some("vegetarian".to_string()),
            FilterKind::Vegan => self.diet = Some("vegan".to_string()),
            FilterKind::GlutenFree => self.intolerances = Some("gluten".to_string()),
            FilterKind::Sweet => self.dish_type = Some("dessert".to_string()),
            FilterKind::Comfort => {
                self.sort = Some("popularity".to_string());
                self.max_calories = Some(800);
            }
            FilterKind::Spicy => self.query = Some("spicy".to_string()),
        }
        self
    }

    /// Query-string pairs for the search endpoint (API key excluded)
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("includeIngredients", self.ingredients.join(",")),
            ("number", self.number.to_string()),
            ("ranking", self.ranking.to_string()),
            ("ignorePantry", self.ignore_pantry.to_string()),
            ("fillIngredients", "true".to_string()),
            ("addRecipeInformation", "true".to_string()),
        ];

        params.push((
            "sort",
            self.sort
                .clone()
                .unwrap_or_else(|| "max-used-ingredients".to_string()),
        ));

        let optional = [
            ("maxReadyTime", self.max_ready_time.map(|v| v.to_string())),
            ("maxCalories", self.max_calories.map(|v| v.to_string())),
            ("diet", self.diet.clone()),
            ("intolerances", self.intolerances.clone()),
            ("type", self.dish_type.clone()),
            ("query", self.query.clone()),
        ];
        params.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key, v))),
        );
        params
    }
}

/// The external recipe database
#[async_trait]
pub trait LiveRecipeSource: Send + Sync {
    /// Candidate recipes for an ingredient search, as raw provider objects
    async fn search_by_ingredients(&self, query: &LiveQuery) -> Result<Vec<Value>, SourceError>;

    /// Full information for one recipe
    async fn recipe_information(&self, id: i64) -> Result<Value, SourceError>;
}

/// reqwest-backed client for a Spoonacular-compatible API
pub struct SpoonacularClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SpoonacularClient {
    /// Build a client, or `None` when no API key is configured
    pub fn from_config(config: &ProviderConfig, timeout: Duration) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = config.spoonacular_api_key.clone() else {
            info!("SPOONACULAR_API_KEY not set, live recipe search disabled");
            return Ok(None);
        };

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for the recipe API")?;

        Ok(Some(Self {
            http,
            base_url: config.spoonacular_base_url.trim_end_matches('/').to_string(),
            api_key,
        }))
    }

    async fn get_json(&self, url: &str, params: &[(&str, String)]) -> Result<Value, SourceError> {
        let response = self
            .http
            .get(url)
            .query(&[("apiKey", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!(
                "recipe API answered {status} for {url}"
            )));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl LiveRecipeSource for SpoonacularClient {
    async fn search_by_ingredients(&self, query: &LiveQuery) -> Result<Vec<Value>, SourceError> {
        let url = format!("{}/recipes/complexSearch", self.base_url);
        debug!(ingredients = ?query.ingredients, number = query.number, "Searching live recipes");

        let body = self.get_json(&url, &query.to_params()).await?;
        match body {
            Value::Array(results) => Ok(results),
            Value::Object(mut fields) => match fields.remove("results") {
                Some(Value::Array(results)) => Ok(results),
                _ => Err(SourceError::MalformedResponse(
                    "search response has no results array".to_string(),
                )),
            },
            _ => Err(SourceError::MalformedResponse(
                "search response is not a JSON object".to_string(),
            )),
        }
    }

    async fn recipe_information(&self, id: i64) -> Result<Value, SourceError> {
        let url = format!("{}/recipes/{id}/information", self.base_url);
        self.get_json(&url, &[("includeNutrition", "true".to_string())])
            .await
    }
}
