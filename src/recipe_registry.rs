//! # Recent Recipe Registry
//!
//! Every recipe handed out by a search, keyed by id, so that detail lookups
//! can find records that exist nowhere else (placeholders, generated and
//! emergency recipes). Filled on every search whether or not the result cache
//! is enabled.
//!
//! A later insert under an id replaces the earlier record. Once the registry
//! is full the least recently recorded ids are evicted first.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

use crate::recipe_model::CanonicalRecipe;

#[derive(Debug, Default)]
struct Entries {
    recipes: HashMap<i64, CanonicalRecipe>,
    order: VecDeque<i64>,
}

/// Bounded id-keyed store of recently returned recipes
#[derive(Debug)]
pub struct RecipeRegistry {
    capacity: usize,
    entries: Mutex<Entries>,
}

impl RecipeRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(Entries::default()),
        }
    }

    // Records are whole values, so a panic elsewhere cannot leave one half written
    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Recipe registry lock poisoned, recovering");
            self.entries.clear_poison();
            poisoned.into_inner()
        })
    }

    /// Record the recipes of one search, newest last
    pub fn record(&self, recipes: &[CanonicalRecipe]) {
        let mut entries = self.lock();

        for recipe in recipes {
            if entries.recipes.insert(recipe.id, recipe.clone()).is_some() {
                entries.order.retain(|id| *id != recipe.id);
            }
            entries.order.push_back(recipe.id);
        }

        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.recipes.remove(&oldest);
            }
        }
    }

    pub fn get(&self, id: i64) -> Option<CanonicalRecipe> {
        self.lock().recipes.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
