//! # Recipe Service
//!
//! The context object built once per process. It owns the resolution
//! pipeline, the result cache, the registry of recently returned recipes,
//! the external sources and their circuit breakers, and exposes the
//! caller-facing operations.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::circuit_breaker::CircuitBreaker;
use crate::curated_table;
use crate::generative_source::{GeminiClient, GenerativeTextService};
use crate::ingredient_normalizer::{split_ingredient_input, IngredientSet};
use crate::live_source::{LiveRecipeSource, SpoonacularClient};
use crate::recipe_model::{CanonicalRecipe, FilterKind, Provenance, ServingAdjustment};
use crate::recipe_normalizer::{to_canonical, NormalizeContext, ProviderPayload};
use crate::recipe_registry::RecipeRegistry;
use crate::resolution_pipeline::{
    CuratedStrategy, GeneratedStrategy, LiveStrategy, ResolutionOutcome, ResolutionPipeline,
    ResolutionRequest, ResolutionStrategy,
};
use crate::result_cache::{CacheKey, Clock, ResultCache, SystemClock};
use crate::search_config::{ProviderConfig, SearchConfig};
use crate::search_errors::ResolutionError;

/// Which external sources are configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub live: bool,
    pub generative: bool,
}

/// Builder for [`RecipeService`], used to inject sources and clocks
pub struct RecipeServiceBuilder {
    config: SearchConfig,
    live: Option<Arc<dyn LiveRecipeSource>>,
    generative: Option<Arc<dyn GenerativeTextService>>,
    clock: Arc<dyn Clock>,
}

impl RecipeServiceBuilder {
    pub fn with_live_source(mut self, source: Arc<dyn LiveRecipeSource>) -> Self {
        self.live = Some(source);
        self
    }

    pub fn with_generative_service(mut self, service: Arc<dyn GenerativeTextService>) -> Self {
        self.generative = Some(service);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> RecipeService {
        let config = self.config;
        let live_breaker = Arc::new(CircuitBreaker::new("live search", &config.recovery));
        let generative_breaker = Arc::new(CircuitBreaker::new("generative service", &config.recovery));

        let mut strategies: Vec<Box<dyn ResolutionStrategy>> = Vec::new();
        if let Some(live) = &self.live {
            strategies.push(Box::new(LiveStrategy::new(
                Arc::clone(live),
                Arc::clone(&live_breaker),
                &config,
            )));
        }
        strategies.push(Box::new(CuratedStrategy::new(
            config.synthesize_curated_placeholders,
        )));
        if let Some(generative) = &self.generative {
            strategies.push(Box::new(GeneratedStrategy::new(
                Arc::clone(generative),
                generative_breaker,
                &config,
            )));
        }

        let pipeline = ResolutionPipeline::new(strategies).with_max_results(config.max_results);
        let cache = Arc::new(ResultCache::new(config.cache_ttl(), self.clock));
        let recent = RecipeRegistry::new(config.recent_recipe_capacity);
        info!(
            strategies = ?pipeline.strategy_order(),
            cache_enabled = cache.is_enabled(),
            "Recipe service ready"
        );

        RecipeService {
            status: SourceStatus {
                live: self.live.is_some(),
                generative: self.generative.is_some(),
            },
            config,
            pipeline,
            cache,
            recent,
            live: self.live,
            live_breaker,
        }
    }
}

/// Caller-facing recipe operations
pub struct RecipeService {
    config: SearchConfig,
    pipeline: ResolutionPipeline,
    cache: Arc<ResultCache>,
    recent: RecipeRegistry,
    live: Option<Arc<dyn LiveRecipeSource>>,
    live_breaker: Arc<CircuitBreaker>,
    status: SourceStatus,
}

impl RecipeService {
    pub fn builder(config: SearchConfig) -> RecipeServiceBuilder {
        RecipeServiceBuilder {
            config,
            live: None,
            generative: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Build the service with HTTP clients for every provider that has a key
    pub fn from_config(config: SearchConfig, providers: &ProviderConfig) -> Result<Self> {
        let mut builder = Self::builder(config.clone());

        if let Some(client) = SpoonacularClient::from_config(providers, config.recovery.live_timeout())? {
            builder = builder.with_live_source(Arc::new(client));
        }
        if let Some(client) = GeminiClient::from_config(providers, config.recovery.generative_timeout())? {
            builder = builder.with_generative_service(Arc::new(client));
        }

        Ok(builder.build())
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Search recipes for a comma-separated ingredient list
    ///
    /// Unknown filter names are ignored. The result count defaults to
    /// `default_results` and is clamped to `[1, max_results]`.
    pub async fn search(
        &self,
        ingredients: &str,
        filter: Option<&str>,
        number: Option<usize>,
    ) -> Result<ResolutionOutcome, ResolutionError> {
        let raw = split_ingredient_input(ingredients);
        let filter = parse_filter(filter);
        let count = self.config.clamp_count(number);
        let request = ResolutionRequest::new(&raw, filter, count)?;

        let key = CacheKey::new(&request.user_set, filter, count);
        let outcome = self
            .cache
            .get_or_compute(key, || async { Ok(self.pipeline.resolve_request(&request).await) })
            .await?;

        self.recent.record(&outcome.recipes);
        Ok(outcome)
    }

    /// Look a recipe up by id, with its detail payload
    ///
    /// Curated table first, then recipes returned by recent searches, then
    /// the live source's detail endpoint.
    pub async fn get_by_id(&self, id: i64) -> Result<CanonicalRecipe, ResolutionError> {
        let recent = self.recent.get(id);

        if let Some(literal) = curated_table::find_by_id(id) {
            let own_ingredients = IngredientSet::from_raw(&literal.ingredients);
            let context = NormalizeContext::new(&own_ingredients, Provenance::Curated).with_detail(true);
            if let Ok(mut recipe) = to_canonical(&ProviderPayload::Literal(literal), &context) {
                if let Some(recent) = &recent {
                    recipe.match_score = recent.match_score;
                }
                return Ok(recipe);
            }
        }

        if let Some(recipe) = recent.as_ref().filter(|recipe| recipe.detail.is_some()) {
            debug!(recipe_id = id, "Serving recipe detail from recent results");
            return Ok(recipe.clone());
        }

        if let Some(mut recipe) = self.live_detail(id).await {
            if let Some(recent) = &recent {
                recipe.match_score = recent.match_score;
            }
            return Ok(recipe);
        }

        recent.ok_or(ResolutionError::NotFound(id))
    }

    async fn live_detail(&self, id: i64) -> Option<CanonicalRecipe> {
        let live = self.live.as_ref()?;
        if self.live_breaker.is_open() {
            debug!(recipe_id = id, "Live circuit open, skipping detail call");
            return None;
        }

        let detail_timeout = self.config.recovery.detail_timeout();
        let payload = match timeout(detail_timeout, live.recipe_information(id)).await {
            Ok(Ok(payload)) => {
                self.live_breaker.record_success();
                payload
            }
            Ok(Err(e)) => {
                self.live_breaker.record_failure();
                warn!(recipe_id = id, error = %e, "Live detail lookup failed");
                return None;
            }
            Err(_) => {
                self.live_breaker.record_failure();
                warn!(recipe_id = id, timeout = ?detail_timeout, "Live detail lookup timed out");
                return None;
            }
        };

        let no_ingredients = IngredientSet::new();
        let context = NormalizeContext::new(&no_ingredients, Provenance::Live)
            .with_fallback_id(id)
            .with_detail(true);
        match to_canonical(&ProviderPayload::Live(payload), &context) {
            Ok(recipe) => Some(recipe),
            Err(e) => {
                warn!(recipe_id = id, error = %e, "Live detail payload could not be normalized");
                None
            }
        }
    }

    /// Rescale a recipe's ingredients to a new number of servings
    pub async fn customize_servings(&self, id: i64, servings: u32) -> Result<ServingAdjustment, ResolutionError> {
        if servings < 1 {
            return Err(ResolutionError::InvalidRequest(
                "servings must be at least 1".to_string(),
            ));
        }
        let recipe = self.get_by_id(id).await?;
        Ok(recipe.scale_servings(servings))
    }

    pub fn source_status(&self) -> SourceStatus {
        self.status
    }

    /// Periodically drop expired cache entries on the tokio runtime
    pub fn spawn_cache_sweeper(&self) -> JoinHandle<()> {
        let cache = Arc::clone(&self.cache);
        let every = Duration::from_secs(self.config.cache_sweep_interval_secs.max(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = cache.sweep_expired();
                if removed > 0 {
                    debug!(removed, remaining = cache.len(), "Swept expired cache entries");
                }
            }
        })
    }
}

fn parse_filter(raw: Option<&str>) -> Option<FilterKind> {
    let name = raw.map(str::trim).filter(|name| !name.is_empty())?;
    let filter = FilterKind::parse(name);
    if filter.is_none() {
        warn!(filter = name, "Ignoring unknown recipe filter");
    }
    filter
}
