use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::models::{Joke, JokeBatch};
use crate::store::KeyValueStore;

/// Key holding the last live joke.
pub const JOKE_KEY: &str = "joke";

/// Key holding the offline batch.
pub const BATCH_KEY: &str = "jokes";

/// Clone is cheap - the store is shared.
#[derive(Clone)]
pub struct JokeCache {
    store: Arc<dyn KeyValueStore>,
}

impl JokeCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let contents = self
            .store
            .get(key)
            .await
            .with_context(|| format!("Failed to read cached value: {}", key))?;

        let Some(contents) = contents else {
            return Ok(None);
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }

        let value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cached value: {}", key))?;
        Ok(Some(value))
    }

    async fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let contents = serde_json::to_string(value)?;
        self.store
            .set(key, &contents)
            .await
            .with_context(|| format!("Failed to write cached value: {}", key))?;
        Ok(())
    }

    // ===== Batch =====

    /// Load the offline batch. Missing, empty or `null` values load as an empty batch.
    pub async fn load_batch(&self) -> Result<JokeBatch> {
        let batch: Option<Option<JokeBatch>> = self.load(BATCH_KEY).await?;
        let batch = batch.flatten().unwrap_or_default();
        debug!(count = batch.len(), "Loaded cached batch");
        Ok(batch)
    }

    pub async fn save_batch(&self, batch: &JokeBatch) -> Result<()> {
        self.save(BATCH_KEY, batch).await
    }

    // ===== Single joke =====

    pub async fn load_joke(&self) -> Result<Option<Joke>> {
        self.load(JOKE_KEY).await
    }

    pub async fn save_joke(&self, joke: &Joke) -> Result<()> {
        self.save(JOKE_KEY, joke).await
    }

    /// Remove both cached values.
    pub async fn clear(&self) -> Result<()> {
        for key in [JOKE_KEY, BATCH_KEY] {
            self.store
                .remove(key)
                .await
                .with_context(|| format!("Failed to remove cached value: {}", key))?;
        }
        Ok(())
    }
}
