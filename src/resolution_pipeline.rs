//! # Source Resolution Pipeline
//!
//! Resolves a user's ingredients into a ranked recipe list by walking an
//! ordered list of strategies (live search, curated table, generative
//! service) until one yields at least one record. A built-in emergency step
//! guarantees that a well-formed request always gets an answer.
//!
//! ## Control flow
//!
//! - Every strategy shares the `(request) -> Result<records, SourceError>` contract
//! - A `SourceError` or an empty result moves on to the next strategy
//! - Only an empty ingredient list is reported to the caller
//! - Results are stable-sorted by match score and truncated to the requested count

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::curated_table;
use crate::generative_source::{
    build_recipe_prompt, parse_generated_recipes, synthesize_minimal_recipes, GenerativeTextService,
};
use crate::ingredient_normalizer::{IngredientSet, IngredientToken};
use crate::live_source::{LiveQuery, LiveRecipeSource};
use crate::match_scorer::MatchScore;
use crate::recipe_model::{derived_recipe_id, CanonicalRecipe, FilterKind, Provenance};
use crate::recipe_normalizer::{to_canonical, LiteralRecipe, NormalizeContext, ProviderPayload};
use crate::search_config::{SearchConfig, MAX_RESULTS};
use crate::search_errors::{ResolutionError, SourceError};

pub const LIVE_FALLBACK_ID_BASE: i64 = 7_000_000;
pub const GENERATED_ID_BASE: i64 = 8_000_000;
pub const EMERGENCY_ID_BASE: i64 = 9_900_000;

/// A canonicalized resolution request
///
/// Ingredients are deduplicated by token and kept in token order, so two raw
/// inputs with the same normalized set build identical requests.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionRequest {
    pub ingredients: Vec<String>,
    pub user_set: IngredientSet,
    pub filter: Option<FilterKind>,
    pub desired_count: usize,
}

impl ResolutionRequest {
    pub fn new<S: AsRef<str>>(
        raw_ingredients: &[S],
        filter: Option<FilterKind>,
        desired_count: usize,
    ) -> Result<Self, ResolutionError> {
        let user_set = IngredientSet::from_raw(raw_ingredients);
        if user_set.is_empty() {
            return Err(ResolutionError::InvalidRequest(
                "no ingredients supplied".to_string(),
            ));
        }

        Ok(Self {
            ingredients: user_set.iter().map(IngredientToken::to_string).collect(),
            user_set,
            filter,
            desired_count: desired_count.max(1),
        })
    }
}

/// Ranked result of one resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionOutcome {
    pub recipes: Vec<CanonicalRecipe>,
    pub provenance: Provenance,
    pub used_fallback: bool,
    pub success: bool,
}

/// One step of the fallback chain
#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    fn provenance(&self) -> Provenance;

    async fn resolve(&self, request: &ResolutionRequest) -> Result<Vec<CanonicalRecipe>, SourceError>;
}

/// Live ingredient search with per-candidate detail enrichment
pub struct LiveStrategy {
    source: Arc<dyn LiveRecipeSource>,
    breaker: Arc<CircuitBreaker>,
    acceptance_threshold: MatchScore,
    search_timeout: Duration,
    detail_timeout: Duration,
}

impl LiveStrategy {
    pub fn new(source: Arc<dyn LiveRecipeSource>, breaker: Arc<CircuitBreaker>, config: &SearchConfig) -> Self {
        Self {
            source,
            breaker,
            acceptance_threshold: MatchScore::new(config.acceptance_threshold),
            search_timeout: config.recovery.live_timeout(),
            detail_timeout: config.recovery.detail_timeout(),
        }
    }

    async fn search(&self, query: &LiveQuery) -> Result<Vec<Value>, SourceError> {
        if self.breaker.is_open() {
            return Err(SourceError::Unavailable(format!(
                "{} circuit is open",
                self.breaker.name()
            )));
        }

        let result = match timeout(self.search_timeout, self.source.search_by_ingredients(query)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::timeout(self.breaker.name())),
        };

        match &result {
            Ok(_) => self.breaker.record_success(),
            Err(_) => self.breaker.record_failure(),
        }
        result
    }

    /// Fill in the full ingredient list of a candidate that lacks one
    ///
    /// A failed or timed out detail call leaves the candidate untouched.
    async fn enrich(&self, mut candidate: Value) -> Value {
        let has_full_list = candidate
            .get("extendedIngredients")
            .is_some_and(Value::is_array);
        let Some(id) = candidate.get("id").and_then(Value::as_i64) else {
            return candidate;
        };
        if has_full_list {
            return candidate;
        }

        let detail = match timeout(self.detail_timeout, self.source.recipe_information(id)).await {
            Ok(Ok(Value::Object(detail))) => detail,
            Ok(Ok(_)) => {
                debug!(recipe_id = id, "Detail response is not an object, keeping basic fields");
                return candidate;
            }
            Ok(Err(e)) => {
                debug!(recipe_id = id, error = %e, "Detail enrichment failed, keeping basic fields");
                return candidate;
            }
            Err(_) => {
                debug!(recipe_id = id, "Detail enrichment timed out, keeping basic fields");
                return candidate;
            }
        };

        if let Value::Object(fields) = &mut candidate {
            for (key, value) in detail {
                fields.entry(key).or_insert(value);
            }
        }
        candidate
    }
}

#[async_trait]
impl ResolutionStrategy for LiveStrategy {
    fn provenance(&self) -> Provenance {
        Provenance::Live
    }

    async fn resolve(&self, request: &ResolutionRequest) -> Result<Vec<CanonicalRecipe>, SourceError> {
        let query = LiveQuery::new(request.ingredients.clone(), request.desired_count).with_filter(request.filter);
        let candidates = self.search(&query).await?;
        debug!(candidates = candidates.len(), "Live search returned candidates");

        let enriched = join_all(candidates.into_iter().map(|candidate| self.enrich(candidate))).await;

        let key = request.user_set.key();
        let mut accepted = Vec::new();
        for (idx, payload) in enriched.into_iter().enumerate() {
            let context = NormalizeContext::new(&request.user_set, Provenance::Live)
                .with_fallback_id(content_id(LIVE_FALLBACK_ID_BASE, &key, idx, &payload));
            match to_canonical(&ProviderPayload::Live(payload), &context) {
                Ok(recipe) if recipe.match_score >= self.acceptance_threshold => accepted.push(recipe),
                Ok(recipe) => debug!(
                    recipe_id = recipe.id,
                    match_score = recipe.match_score.value(),
                    "Live candidate below acceptance threshold"
                ),
                Err(e) => debug!(error = %e, "Skipping malformed live candidate"),
            }
        }
        Ok(accepted)
    }
}

/// Lookup in the curated table, with per-ingredient placeholders as a last resort
pub struct CuratedStrategy {
    synthesize_placeholders: bool,
}

impl CuratedStrategy {
    pub fn new(synthesize_placeholders: bool) -> Self {
        Self {
            synthesize_placeholders,
        }
    }
}

#[async_trait]
impl ResolutionStrategy for CuratedStrategy {
    fn provenance(&self) -> Provenance {
        Provenance::Curated
    }

    async fn resolve(&self, request: &ResolutionRequest) -> Result<Vec<CanonicalRecipe>, SourceError> {
        let mut literals = curated_table::lookup(&request.user_set);
        if literals.is_empty() && self.synthesize_placeholders {
            debug!("No curated entry matched, synthesizing placeholders");
            literals = curated_table::placeholder_recipes(&request.ingredients);
        }
        Ok(normalize_literals(literals, request, Provenance::Curated))
    }
}

/// Recipes written by the generative text service
pub struct GeneratedStrategy {
    service: Arc<dyn GenerativeTextService>,
    breaker: Arc<CircuitBreaker>,
    completion_timeout: Duration,
    recipe_count: usize,
}

impl GeneratedStrategy {
    pub fn new(
        service: Arc<dyn GenerativeTextService>,
        breaker: Arc<CircuitBreaker>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            service,
            breaker,
            completion_timeout: config.recovery.generative_timeout(),
            recipe_count: config.generated_recipe_count.max(1),
        }
    }
}

#[async_trait]
impl ResolutionStrategy for GeneratedStrategy {
    fn provenance(&self) -> Provenance {
        Provenance::Generated
    }

    async fn resolve(&self, request: &ResolutionRequest) -> Result<Vec<CanonicalRecipe>, SourceError> {
        if self.breaker.is_open() {
            return Err(SourceError::Unavailable(format!(
                "{} circuit is open",
                self.breaker.name()
            )));
        }

        let prompt = build_recipe_prompt(&request.ingredients, self.recipe_count, request.filter);
        let text = match timeout(self.completion_timeout, self.service.complete(&prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                self.breaker.record_failure();
                return Err(e);
            }
            Err(_) => {
                self.breaker.record_failure();
                return Err(SourceError::timeout(self.breaker.name()));
            }
        };
        self.breaker.record_success();

        let key = request.user_set.key();
        match parse_generated_recipes(&text) {
            Ok(values) => Ok(values
                .into_iter()
                .enumerate()
                .filter_map(|(idx, value)| {
                    let context = NormalizeContext::new(&request.user_set, Provenance::Generated)
                        .with_fallback_id(content_id(GENERATED_ID_BASE, &key, idx, &value))
                        .with_detail(true);
                    to_canonical(&ProviderPayload::Generated(value), &context).ok()
                })
                .collect()),
            Err(e) => {
                warn!(error = %e, "Could not parse generated recipes, synthesizing minimal ones");
                let literals = synthesize_minimal_recipes(&request.ingredients, GENERATED_ID_BASE);
                Ok(normalize_literals(literals, request, Provenance::Generated))
            }
        }
    }
}

/// Id for a payload without one, from the request key, its position and its title
fn content_id(base: i64, key: &str, idx: usize, payload: &Value) -> i64 {
    let title = payload.get("title").and_then(Value::as_str).unwrap_or_default();
    derived_recipe_id(base, &[key, &idx.to_string(), title])
}

/// Locally known recipes carry their full detail payload from the start
fn normalize_literals(
    literals: Vec<LiteralRecipe>,
    request: &ResolutionRequest,
    provenance: Provenance,
) -> Vec<CanonicalRecipe> {
    let context = NormalizeContext::new(&request.user_set, provenance).with_detail(true);
    literals
        .into_iter()
        .filter_map(|literal| to_canonical(&ProviderPayload::Literal(literal), &context).ok())
        .collect()
}

/// The two generic recipes returned when every strategy came up empty
pub fn emergency_recipes() -> Vec<LiteralRecipe> {
    vec![
        LiteralRecipe::new(
            EMERGENCY_ID_BASE + 1,
            "Simple Pantry Stir Fry",
            vec!["mixed vegetables".to_string(), "soy sauce".to_string(), "garlic".to_string()],
        )
        .with_timing(20, 2)
        .with_instructions(vec![
            "Stir fry whatever vegetables you have with garlic, then season with soy sauce.".to_string(),
        ])
        .with_summary("A flexible stir fry for whatever is in the fridge."),
        LiteralRecipe::new(
            EMERGENCY_ID_BASE + 2,
            "Easy Pantry Pasta",
            vec!["pasta".to_string(), "olive oil".to_string(), "garlic".to_string()],
        )
        .with_timing(15, 2)
        .with_instructions(vec![
            "Toss cooked pasta with garlic gently warmed in olive oil.".to_string(),
        ])
        .with_summary("A store-cupboard pasta that is always within reach."),
    ]
}

/// Ordered fallback chain plus ranking
pub struct ResolutionPipeline {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
    max_results: usize,
}

impl ResolutionPipeline {
    pub fn new(strategies: Vec<Box<dyn ResolutionStrategy>>) -> Self {
        Self {
            strategies,
            max_results: MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    /// Provenance of each configured strategy, in order
    pub fn strategy_order(&self) -> Vec<Provenance> {
        self.strategies.iter().map(|s| s.provenance()).collect()
    }

    /// Resolve raw ingredient names into a ranked outcome
    pub async fn resolve<S: AsRef<str>>(
        &self,
        raw_ingredients: &[S],
        filter: Option<FilterKind>,
        desired_count: usize,
    ) -> Result<ResolutionOutcome, ResolutionError> {
        let count = desired_count.clamp(1, self.max_results);
        let request = ResolutionRequest::new(raw_ingredients, filter, count)?;
        Ok(self.resolve_request(&request).await)
    }

    pub async fn resolve_request(&self, request: &ResolutionRequest) -> ResolutionOutcome {
        for strategy in &self.strategies {
            let provenance = strategy.provenance();
            match strategy.resolve(request).await {
                Ok(recipes) if !recipes.is_empty() => {
                    info!(provenance = %provenance, candidates = recipes.len(), "Resolution strategy produced recipes");
                    return Self::ranked(recipes, provenance, request.desired_count);
                }
                Ok(_) => info!(provenance = %provenance, "Resolution strategy produced no recipes"),
                Err(e) => warn!(provenance = %provenance, error = %e, "Resolution strategy failed, falling back"),
            }
        }

        warn!(ingredients = ?request.ingredients, "All strategies came up empty, using emergency recipes");
        let recipes = normalize_literals(emergency_recipes(), request, Provenance::Emergency);
        Self::ranked(recipes, Provenance::Emergency, request.desired_count)
    }

    fn ranked(mut recipes: Vec<CanonicalRecipe>, provenance: Provenance, count: usize) -> ResolutionOutcome {
        // sort_by is stable: equal scores keep source order
        recipes.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        recipes.truncate(count);

        ResolutionOutcome {
            recipes,
            provenance,
            used_fallback: provenance != Provenance::Live,
            success: true,
        }
    }
}
