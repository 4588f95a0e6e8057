use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::defaults::default_ingredients;
use crate::models::{INGREDIENTS_KEY, Ingredient, RECIPES_KEY, Recipe};
use crate::storage::KeyValueStore;

/// A record kept in a [`Catalog`]: identified by a string id and persisted as
/// one JSON array under a fixed storage key.
pub trait CatalogRecord: Clone + Serialize + DeserializeOwned {
    const KEY: &'static str;
    const KIND: &'static str;

    fn id(&self) -> &str;

    /// Records to start from when nothing is stored yet. `None` means start
    /// empty without writing anything.
    fn seed() -> Option<Vec<Self>>;
}

impl CatalogRecord for Ingredient {
    const KEY: &'static str = INGREDIENTS_KEY;
    const KIND: &'static str = "ingredient";

    fn id(&self) -> &str {
        &self.id
    }

    fn seed() -> Option<Vec<Self>> {
        Some(default_ingredients())
    }
}

impl CatalogRecord for Recipe {
    const KEY: &'static str = RECIPES_KEY;
    const KIND: &'static str = "recipe";

    fn id(&self) -> &str {
        &self.id
    }

    fn seed() -> Option<Vec<Self>> {
        None
    }
}

/// Where the records in a freshly loaded catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Parsed from storage.
    Stored,
    /// Nothing stored; defaults were written.
    Seeded,
    /// Nothing stored and no defaults; started empty.
    Empty,
    /// Stored data did not parse; fell back to defaults (or empty) in memory
    /// and left the stored value alone.
    Recovered,
}

/// Ordered, persisted list of records.
///
/// Every mutation serializes the whole list and writes it back. The in-memory
/// list only changes once that write succeeds.
pub struct Catalog<T> {
    storage: Arc<dyn KeyValueStore>,
    items: Vec<T>,
}

pub type IngredientStore = Catalog<Ingredient>;
pub type RecipeStore = Catalog<Recipe>;

impl<T: CatalogRecord> Catalog<T> {
    /// An empty, not yet loaded catalog.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            items: Vec::new(),
        }
    }

    pub fn load(&mut self) -> Result<LoadSource> {
        let Some(raw) = self.storage.read(T::KEY)? else {
            return match T::seed() {
                Some(seed) => {
                    self.persist(&seed)?;
                    tracing::debug!(kind = T::KIND, count = seed.len(), "seeded catalog");
                    self.items = seed;
                    Ok(LoadSource::Seeded)
                }
                None => {
                    self.items = Vec::new();
                    Ok(LoadSource::Empty)
                }
            };
        };

        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(items) => {
                tracing::debug!(kind = T::KIND, count = items.len(), "loaded catalog");
                self.items = items;
                Ok(LoadSource::Stored)
            }
            Err(e) => {
                let fallback = recovery_fallback::<T>();
                tracing::warn!(
                    kind = T::KIND,
                    key = T::KEY,
                    error = %e,
                    "stored catalog is unreadable, falling back to {fallback}"
                );
                self.items = T::seed().unwrap_or_default();
                Ok(LoadSource::Recovered)
            }
        }
    }

    #[must_use]
    pub fn list(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a record. Ids are not checked for uniqueness.
    pub fn add(&mut self, record: T) -> Result<()> {
        let mut next = self.items.clone();
        next.push(record);
        self.commit(next)
    }

    /// Replace the first record with the same id. Returns `false`, without
    /// writing, when no record matches.
    pub fn update(&mut self, record: T) -> Result<bool> {
        let Some(index) = self.items.iter().position(|item| item.id() == record.id()) else {
            return Ok(false);
        };
        let mut next = self.items.clone();
        next[index] = record;
        self.commit(next)?;
        Ok(true)
    }

    /// Remove every record with `id` and persist. Returns how many were removed.
    pub fn delete(&mut self, id: &str) -> Result<usize> {
        let next: Vec<T> = self
            .items
            .iter()
            .filter(|item| item.id() != id)
            .cloned()
            .collect();
        let removed = self.items.len() - next.len();
        self.commit(next)?;
        Ok(removed)
    }

    /// Swap in an entirely new list (used by import).
    pub fn replace_all(&mut self, records: Vec<T>) -> Result<()> {
        self.commit(records)
    }

    fn commit(&mut self, next: Vec<T>) -> Result<()> {
        self.persist(&next)?;
        self.items = next;
        Ok(())
    }

    fn persist(&self, items: &[T]) -> Result<()> {
        let json = serde_json::to_string(items)
            .with_context(|| format!("Failed to serialize {} list", T::KIND))?;
        self.storage
            .write(T::KEY, &json)
            .with_context(|| format!("Failed to save {} list", T::KIND))?;
        tracing::debug!(kind = T::KIND, count = items.len(), "saved catalog");
        Ok(())
    }
}

/// What an unreadable catalog of `T` is replaced with, for log messages.
fn recovery_fallback<T: CatalogRecord>() -> &'static str {
    if T::seed().is_some() {
        "defaults"
    } else {
        "an empty list"
    }
}
