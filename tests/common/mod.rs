//! Scripted recipe sources shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use pantry_recipes::generative_source::GenerativeTextService;
use pantry_recipes::live_source::{LiveQuery, LiveRecipeSource};
use pantry_recipes::search_errors::SourceError;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Live source answering every search with the same result
pub struct MockLiveSource {
    search_result: Result<Vec<Value>, SourceError>,
    details: HashMap<i64, Value>,
    delay: Option<Duration>,
    detail_delays: HashMap<i64, Duration>,
    search_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    last_query: Mutex<Option<LiveQuery>>,
}

impl MockLiveSource {
    pub fn returning(results: Vec<Value>) -> Self {
        Self::with_result(Ok(results))
    }

    pub fn failing() -> Self {
        Self::with_result(Err(SourceError::Unavailable("connection refused".to_string())))
    }

    fn with_result(search_result: Result<Vec<Value>, SourceError>) -> Self {
        Self {
            search_result,
            details: HashMap::new(),
            delay: None,
            detail_delays: HashMap::new(),
            search_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn with_detail(mut self, id: i64, detail: Value) -> Self {
        self.details.insert(id, detail);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make the detail call for `id` take `delay` before answering
    pub fn with_slow_detail(mut self, id: i64, delay: Duration) -> Self {
        self.detail_delays.insert(id, delay);
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<LiveQuery> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl LiveRecipeSource for MockLiveSource {
    async fn search_by_ingredients(&self, query: &LiveQuery) -> Result<Vec<Value>, SourceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.search_result.clone()
    }

    async fn recipe_information(&self, id: i64) -> Result<Value, SourceError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.detail_delays.get(&id) {
            tokio::time::sleep(*delay).await;
        }
        self.details
            .get(&id)
            .cloned()
            .ok_or_else(|| SourceError::Unavailable(format!("recipe API answered 404 for {id}")))
    }
}

/// Generative service with a canned reply
pub struct MockGenerativeService {
    reply: Result<String, SourceError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockGenerativeService {
    pub fn replying(text: &str) -> Self {
        Self::with_reply(Ok(text.to_string()))
    }

    pub fn failing() -> Self {
        Self::with_reply(Err(SourceError::Unavailable("quota exceeded".to_string())))
    }

    fn with_reply(reply: Result<String, SourceError>) -> Self {
        Self {
            reply,
            delay: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeTextService for MockGenerativeService {
    async fn complete(&self, prompt: &str) -> Result<String, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }
}

/// A search hit in the used/missed shape of ingredient searches
pub fn live_hit(id: i64, title: &str, used: &[&str], missed: &[&str]) -> Value {
    let names = |list: &[&str]| list.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>();
    json!({
        "id": id,
        "title": title,
        "image": format!("https://img.example/{id}.jpg"),
        "readyInMinutes": 25,
        "servings": 2,
        "usedIngredients": names(used),
        "missedIngredients": names(missed),
    })
}

/// A full detail document with amounts and steps
pub fn live_detail(id: i64, title: &str, ingredients: &[(&str, f64, &str)]) -> Value {
    let extended: Vec<Value> = ingredients
        .iter()
        .enumerate()
        .map(|(idx, (name, amount, unit))| {
            json!({
                "id": idx + 1,
                "name": name,
                "amount": amount,
                "unit": unit,
                "original": format!("{amount} {unit} {name}"),
            })
        })
        .collect();

    json!({
        "id": id,
        "title": title,
        "readyInMinutes": 35,
        "servings": 4,
        "extendedIngredients": extended,
        "analyzedInstructions": [{ "steps": [{ "step": "Cook everything." }] }],
        "creditsText": "Test Kitchen",
    })
}
