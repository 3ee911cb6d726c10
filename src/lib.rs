//! # Pantry Recipes
//!
//! Ingredient matching and recipe ranking over several recipe sources.
//! A live recipe database is consulted first, then a curated in-process table,
//! then a generative text service, and each returned recipe carries a match
//! percentage and the provenance of the source that produced it.

pub mod circuit_breaker;
pub mod curated_table;
pub mod generative_source;
pub mod ingredient_line;
pub mod ingredient_normalizer;
pub mod live_source;
pub mod match_scorer;
pub mod recipe_model;
pub mod recipe_normalizer;
pub mod recipe_registry;
pub mod recipe_service;
pub mod resolution_pipeline;
pub mod result_cache;
pub mod search_config;
pub mod search_errors;
