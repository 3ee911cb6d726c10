//! # Search Configuration Module
//!
//! This module defines configuration structures for recipe resolution,
//! including acceptance thresholds, result limits, cache lifetime, external
//! call timeouts and provider credentials.

use std::env;
use std::time::Duration;

// Constants for recipe resolution
pub const ACCEPTANCE_THRESHOLD: u8 = 50;
pub const MAX_RESULTS: usize = 25;
pub const DEFAULT_RESULTS: usize = 15;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300; // 5 minutes
pub const CACHE_SWEEP_INTERVAL_SECS: u64 = 60;
pub const GENERATED_RECIPE_COUNT: usize = 3;
pub const RECENT_RECIPE_CAPACITY: usize = 512;

pub const DEFAULT_SPOONACULAR_BASE_URL: &str = "https://api.spoonacular.com";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Timeouts and circuit breaker settings for external sources
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Timeout for the live ingredient search in seconds
    pub live_timeout_secs: u64,
    /// Timeout for each per-recipe detail fetch in seconds
    pub detail_timeout_secs: u64,
    /// Timeout for a generative completion in seconds
    pub generative_timeout_secs: u64,
    /// Circuit breaker failure threshold
    pub circuit_breaker_threshold: u32,
    /// Circuit breaker reset timeout in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            live_timeout_secs: 8,
            detail_timeout_secs: 5,
            generative_timeout_secs: 20,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60, // 1 minute
        }
    }
}

impl RecoveryConfig {
    pub fn live_timeout(&self) -> Duration {
        Duration::from_secs(self.live_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs)
    }

    pub fn generative_timeout(&self) -> Duration {
        Duration::from_secs(self.generative_timeout_secs)
    }
}

/// Configuration structure for recipe resolution
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Minimum match score a live candidate needs to be kept
    pub acceptance_threshold: u8,
    /// Upper bound applied to any requested result count
    pub max_results: usize,
    /// Result count used when the caller does not ask for one
    pub default_results: usize,
    /// Cache entry lifetime in seconds (0 disables the cache)
    pub cache_ttl_secs: u64,
    /// Interval between background cache sweeps in seconds
    pub cache_sweep_interval_secs: u64,
    /// Number of recipes requested from the generative service
    pub generated_recipe_count: usize,
    /// How many recently returned recipes stay available to detail lookups
    pub recent_recipe_capacity: usize,
    /// Whether the curated step invents per-ingredient placeholders when the table has no match
    pub synthesize_curated_placeholders: bool,
    /// Timeouts and circuit breaker settings
    pub recovery: RecoveryConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: ACCEPTANCE_THRESHOLD,
            max_results: MAX_RESULTS,
            default_results: DEFAULT_RESULTS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_sweep_interval_secs: CACHE_SWEEP_INTERVAL_SECS,
            generated_recipe_count: GENERATED_RECIPE_COUNT,
            recent_recipe_capacity: RECENT_RECIPE_CAPACITY,
            synthesize_curated_placeholders: true,
            recovery: RecoveryConfig::default(),
        }
    }
}

impl SearchConfig {
    /// Clamp a requested result count into `[1, max_results]`
    pub fn clamp_count(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_results)
            .clamp(1, self.max_results.max(1))
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }

    /// Apply overrides from the environment on top of the defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ttl) = env::var("RECIPE_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
        {
            config.cache_ttl_secs = ttl;
        }
        config
    }
}

/// Credentials and endpoints for the external providers
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub spoonacular_api_key: Option<String>,
    pub spoonacular_base_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
}

impl ProviderConfig {
    /// Read provider settings from the environment
    ///
    /// A missing API key leaves the matching source unconfigured, it is not an error.
    pub fn from_env() -> Self {
        Self {
            spoonacular_api_key: non_empty_var("SPOONACULAR_API_KEY"),
            spoonacular_base_url: non_empty_var("SPOONACULAR_BASE_URL")
                .unwrap_or_else(|| DEFAULT_SPOONACULAR_BASE_URL.to_string()),
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_base_url: non_empty_var("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            gemini_model: non_empty_var("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_config_defaults() {
        let config = SearchConfig::default();

        assert_eq!(config.acceptance_threshold, 50);
        assert_eq!(config.max_results, 25);
        assert_eq!(config.default_results, 15);
        assert_eq!(config.cache_ttl_secs, 300);
        assert!(config.synthesize_curated_placeholders);
        assert_eq!(config.recovery.live_timeout_secs, 8);
        assert_eq!(config.recovery.circuit_breaker_threshold, 5);
    }

    #[test]
    fn test_clamp_count() {
        let config = SearchConfig::default();

        assert_eq!(config.clamp_count(None), 15);
        assert_eq!(config.clamp_count(Some(0)), 1);
        assert_eq!(config.clamp_count(Some(10)), 10);
        assert_eq!(config.clamp_count(Some(400)), 25);
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let config = SearchConfig {
            cache_ttl_secs: 0,
            ..Default::default()
        };
        assert!(config.cache_ttl().is_none());
        assert_eq!(
            SearchConfig::default().cache_ttl(),
            Some(Duration::from_secs(300))
        );
    }
}
