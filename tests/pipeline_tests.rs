//! # Resolution Pipeline Tests
//!
//! Exercises the live -> curated -> generated -> emergency chain against
//! scripted sources.

mod common;

use common::{live_detail, live_hit, MockGenerativeService, MockLiveSource};
use pantry_recipes::circuit_breaker::CircuitBreaker;
use pantry_recipes::recipe_model::{FilterKind, Provenance};
use pantry_recipes::resolution_pipeline::{
    CuratedStrategy, GeneratedStrategy, LiveStrategy, ResolutionPipeline, ResolutionStrategy,
};
use pantry_recipes::search_config::{RecoveryConfig, SearchConfig};
use pantry_recipes::search_errors::ResolutionError;
use std::sync::Arc;
use std::time::Duration;

fn config() -> SearchConfig {
    SearchConfig::default()
}

fn live_strategy(source: &Arc<MockLiveSource>, config: &SearchConfig) -> Box<dyn ResolutionStrategy> {
    let breaker = Arc::new(CircuitBreaker::new("live search", &config.recovery));
    Box::new(LiveStrategy::new(source.clone(), breaker, config))
}

fn generated_strategy(
    service: &Arc<MockGenerativeService>,
    config: &SearchConfig,
) -> Box<dyn ResolutionStrategy> {
    let breaker = Arc::new(CircuitBreaker::new("generative service", &config.recovery));
    Box::new(GeneratedStrategy::new(service.clone(), breaker, config))
}

const STEW_PANTRY: [&str; 9] = [
    "chicken", "rice", "onion", "garlic", "carrot", "celery", "thyme", "butter", "parsley",
];

/// Two live hits scoring 90 and 40: only the first clears the acceptance threshold
#[tokio::test]
async fn test_live_candidates_below_threshold_are_dropped() {
    let config = config();
    let live = Arc::new(MockLiveSource::returning(vec![
        live_hit(1, "Chicken and Rice Stew", &STEW_PANTRY, &["lemon"]),
        live_hit(2, "Chicken Curry", &["chicken", "rice"], &["coconut", "lime", "ginger"]),
    ]));
    let pipeline = ResolutionPipeline::new(vec![
        live_strategy(&live, &config),
        Box::new(CuratedStrategy::new(true)),
    ]);

    let outcome = pipeline.resolve(&STEW_PANTRY, None, 10).await.unwrap();

    assert_eq!(outcome.provenance, Provenance::Live);
    assert_eq!(outcome.recipes.len(), 1);
    assert_eq!(outcome.recipes[0].id, 1);
    assert_eq!(outcome.recipes[0].match_score.value(), 90);
    assert!(!outcome.used_fallback);
    assert!(outcome.success);
}

/// A failing live source falls back to the curated table
#[tokio::test]
async fn test_live_failure_falls_back_to_curated() {
    let config = config();
    let live = Arc::new(MockLiveSource::failing());
    let pipeline = ResolutionPipeline::new(vec![
        live_strategy(&live, &config),
        Box::new(CuratedStrategy::new(true)),
    ]);

    let outcome = pipeline.resolve(&["pasta", "egg"], None, 5).await.unwrap();

    assert_eq!(outcome.provenance, Provenance::Curated);
    assert!(!outcome.recipes.is_empty());
    assert_eq!(outcome.recipes[0].title, "Spaghetti Carbonara");
    assert!(outcome.used_fallback);
    assert!(outcome.success);
    assert_eq!(live.search_calls(), 1);
}

/// Zero accepted live candidates is a fallback, not an error
#[tokio::test]
async fn test_no_acceptable_live_candidates_falls_back() {
    let config = config();
    let live = Arc::new(MockLiveSource::returning(vec![live_hit(
        3,
        "Elaborate Stew",
        &["chicken"],
        &["carrot", "celery", "leek", "thyme"],
    )]));
    let pipeline = ResolutionPipeline::new(vec![
        live_strategy(&live, &config),
        Box::new(CuratedStrategy::new(true)),
    ]);

    let outcome = pipeline.resolve(&["chicken", "rice"], None, 5).await.unwrap();
    assert_eq!(outcome.provenance, Provenance::Curated);
    assert_eq!(outcome.recipes[0].title, "Chicken Fried Rice");
}

/// An empty ingredient list is the only caller-visible failure
#[tokio::test]
async fn test_empty_ingredients_are_invalid() {
    let pipeline = ResolutionPipeline::new(vec![Box::new(CuratedStrategy::new(true))]);
    let empty: [&str; 0] = [];

    let result = pipeline.resolve(&empty, None, 5).await;
    assert!(matches!(result, Err(ResolutionError::InvalidRequest(_))));

    let blank = pipeline.resolve(&["  ", "!?"], None, 5).await;
    assert!(matches!(blank, Err(ResolutionError::InvalidRequest(_))));
}

/// Candidates without a full ingredient list get one from the detail endpoint
#[tokio::test]
async fn test_enrichment_replaces_partial_ingredient_lists() {
    let config = config();
    let live = Arc::new(
        MockLiveSource::returning(vec![
            live_hit(10, "Rice Bowl", &["rice"], &["seaweed", "tuna", "cucumber"]),
            live_hit(11, "Plain Rice", &["rice"], &["butter", "salt", "chives"]),
        ])
        // Only the first recipe has a detail document; the second keeps its basic fields
        .with_detail(10, live_detail(10, "Rice Bowl", &[("rice", 2.0, "cups"), ("chicken", 1.0, "lb")])),
    );
    let pipeline = ResolutionPipeline::new(vec![live_strategy(&live, &config)]);

    let outcome = pipeline.resolve(&["chicken", "rice"], None, 5).await.unwrap();

    assert_eq!(live.detail_calls(), 2);
    assert_eq!(outcome.provenance, Provenance::Live);
    assert_eq!(outcome.recipes.len(), 1);
    assert_eq!(outcome.recipes[0].id, 10);
    assert_eq!(outcome.recipes[0].match_score.value(), 100);
    assert_eq!(outcome.recipes[0].title, "Rice Bowl");
}

/// A slow detail call only costs its own candidate the enrichment
#[tokio::test(start_paused = true)]
async fn test_slow_detail_keeps_basic_fields() {
    let config = config();
    let live = Arc::new(
        MockLiveSource::returning(vec![
            live_hit(50, "Chicken Rice", &["chicken", "rice"], &[]),
            live_hit(51, "Rice Bowl", &["rice"], &["seaweed", "tuna", "cucumber"]),
        ])
        // enriched, 50 would drop to 40 and be discarded
        .with_detail(
            50,
            live_detail(
                50,
                "Chicken Rice",
                &[
                    ("chicken", 1.0, "lb"),
                    ("rice", 2.0, "cups"),
                    ("leek", 1.0, ""),
                    ("fennel", 1.0, ""),
                    ("dill", 1.0, "tbsp"),
                ],
            ),
        )
        .with_slow_detail(50, Duration::from_secs(30))
        .with_detail(51, live_detail(51, "Rice Bowl", &[("rice", 2.0, "cups"), ("chicken", 1.0, "lb")])),
    );
    let pipeline = ResolutionPipeline::new(vec![live_strategy(&live, &config)]);

    let outcome = pipeline.resolve(&["chicken", "rice"], None, 5).await.unwrap();

    assert_eq!(live.detail_calls(), 2);
    assert_eq!(outcome.provenance, Provenance::Live);
    let ids: Vec<i64> = outcome.recipes.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![50, 51]);
    assert!(outcome.recipes.iter().all(|r| r.match_score.value() == 100));
}

/// Filters reach the live query as provider parameters
#[tokio::test]
async fn test_filter_is_forwarded_to_live_query() {
    let config = config();
    let live = Arc::new(MockLiveSource::returning(Vec::new()));
    let pipeline = ResolutionPipeline::new(vec![live_strategy(&live, &config)]);

    pipeline
        .resolve(&["Tofu", "spinach"], Some(FilterKind::Vegan), 7)
        .await
        .unwrap();

    let query = live.last_query().unwrap();
    assert_eq!(query.diet.as_deref(), Some("vegan"));
    assert_eq!(query.number, 7);
    assert_eq!(query.ingredients, vec!["spinach", "tofu"]);
}

/// Equal scores keep the order the source returned them in
#[tokio::test]
async fn test_equal_scores_keep_source_order() {
    let config = config();
    let live = Arc::new(MockLiveSource::returning(vec![
        live_hit(21, "First", &["egg"], &[]),
        live_hit(22, "Second", &["egg"], &[]),
        live_hit(23, "Third", &["egg"], &[]),
    ]));
    let pipeline = ResolutionPipeline::new(vec![live_strategy(&live, &config)]);

    let outcome = pipeline.resolve(&["egg"], None, 5).await.unwrap();
    let ids: Vec<i64> = outcome.recipes.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![21, 22, 23]);
}

/// Identical inputs against identical mocks give identical outcomes
#[tokio::test]
async fn test_resolution_is_deterministic() {
    let config = config();
    let live = Arc::new(MockLiveSource::returning(vec![
        live_hit(31, "Egg Fried Rice", &["egg", "rice"], &["soy sauce"]),
        live_hit(32, "Rice Pudding", &["rice"], &[]),
    ]));
    let pipeline = ResolutionPipeline::new(vec![live_strategy(&live, &config)]);

    let first = pipeline.resolve(&["rice", "egg"], None, 5).await.unwrap();
    let second = pipeline.resolve(&["EGG", " rice"], None, 5).await.unwrap();
    assert_eq!(first, second);
}

/// With placeholders disabled and no table match, the generative service is used
#[tokio::test]
async fn test_generated_recipes_from_fenced_json() {
    let config = config();
    let live = Arc::new(MockLiveSource::failing());
    let service = Arc::new(MockGenerativeService::replying(
        "```json\n[{\"title\": \"Saffron Quinoa Pilaf\", \"readyInMinutes\": 25, \"servings\": 2, \
         \"ingredients\": [\"1 cup quinoa\", \"1 pinch saffron\"], \"instructions\": [\"Simmer.\"]}]\n```",
    ));
    let pipeline = ResolutionPipeline::new(vec![
        live_strategy(&live, &config),
        Box::new(CuratedStrategy::new(false)),
        generated_strategy(&service, &config),
    ]);

    let outcome = pipeline
        .resolve(&["saffron", "quinoa"], Some(FilterKind::Quick), 5)
        .await
        .unwrap();

    assert_eq!(outcome.provenance, Provenance::Generated);
    assert!(outcome.used_fallback);
    assert_eq!(outcome.recipes.len(), 1);
    assert_eq!(outcome.recipes[0].title, "Saffron Quinoa Pilaf");
    assert_eq!(outcome.recipes[0].match_score.value(), 100);

    let prompt = service.last_prompt().unwrap();
    assert!(prompt.contains("quinoa, saffron"));
    assert!(prompt.contains("30 minutes or less"));
}

/// Unparseable generated text falls back to synthesized minimal recipes
#[tokio::test]
async fn test_unparseable_generation_is_synthesized() {
    let config = config();
    let service = Arc::new(MockGenerativeService::replying(
        "I'd suggest a nice saffron quinoa dish!",
    ));
    let pipeline = ResolutionPipeline::new(vec![
        Box::new(CuratedStrategy::new(false)),
        generated_strategy(&service, &config),
    ]);

    let outcome = pipeline.resolve(&["saffron", "quinoa"], None, 5).await.unwrap();

    assert_eq!(outcome.provenance, Provenance::Generated);
    assert_eq!(outcome.recipes.len(), 2);
    assert_eq!(outcome.recipes[0].title, "Quinoa Skillet");
    assert!(outcome.recipes.iter().all(|r| r.provenance == Provenance::Generated));
}

/// A failing generative service leaves only the emergency step
#[tokio::test]
async fn test_everything_failing_returns_emergency_recipes() {
    let config = config();
    let live = Arc::new(MockLiveSource::failing());
    let service = Arc::new(MockGenerativeService::failing());
    let pipeline = ResolutionPipeline::new(vec![
        live_strategy(&live, &config),
        Box::new(CuratedStrategy::new(false)),
        generated_strategy(&service, &config),
    ]);

    let outcome = pipeline.resolve(&["saffron"], None, 5).await.unwrap();

    assert_eq!(outcome.provenance, Provenance::Emergency);
    assert_eq!(outcome.recipes.len(), 2);
    assert!(outcome.success);
    assert!(outcome.used_fallback);
    assert_eq!(service.calls(), 1);
}

/// A generative call slower than its timeout yields no candidates
#[tokio::test(start_paused = true)]
async fn test_slow_generation_falls_through_to_emergency() {
    let config = config();
    let service = Arc::new(
        MockGenerativeService::replying(r#"[{"title": "Saffron Rice", "ingredients": ["saffron"]}]"#)
            .with_delay(Duration::from_secs(60)),
    );
    let pipeline = ResolutionPipeline::new(vec![
        Box::new(CuratedStrategy::new(false)),
        generated_strategy(&service, &config),
    ]);

    let outcome = pipeline.resolve(&["saffron"], None, 5).await.unwrap();

    assert_eq!(service.calls(), 1);
    assert_eq!(outcome.provenance, Provenance::Emergency);
    assert_eq!(outcome.recipes.len(), 2);
}

/// A live search slower than its timeout counts as unavailable
#[tokio::test(start_paused = true)]
async fn test_live_timeout_falls_back() {
    let config = SearchConfig {
        recovery: RecoveryConfig {
            live_timeout_secs: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let live = Arc::new(
        MockLiveSource::returning(vec![live_hit(41, "Too Late", &["egg"], &[])])
            .with_delay(Duration::from_secs(10)),
    );
    let pipeline = ResolutionPipeline::new(vec![
        live_strategy(&live, &config),
        Box::new(CuratedStrategy::new(true)),
    ]);

    let outcome = pipeline.resolve(&["egg", "pasta"], None, 5).await.unwrap();
    assert_eq!(outcome.provenance, Provenance::Curated);
}

/// Once the breaker opens the live source is no longer called
#[tokio::test]
async fn test_open_circuit_skips_live_source() {
    let config = SearchConfig {
        recovery: RecoveryConfig {
            circuit_breaker_threshold: 1,
            ..Default::default()
        },
        ..Default::default()
    };
    let live = Arc::new(MockLiveSource::failing());
    let pipeline = ResolutionPipeline::new(vec![
        live_strategy(&live, &config),
        Box::new(CuratedStrategy::new(true)),
    ]);

    pipeline.resolve(&["egg", "pasta"], None, 5).await.unwrap();
    let outcome = pipeline.resolve(&["egg", "pasta"], None, 5).await.unwrap();

    assert_eq!(outcome.provenance, Provenance::Curated);
    assert_eq!(live.search_calls(), 1);
}
