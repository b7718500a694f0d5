//! The `JokeSource` seam between the controller and the network.

use async_trait::async_trait;
use tracing::debug;

use crate::models::Joke;

use super::ApiError;

/// Anything that can hand out one random joke per call.
#[async_trait]
pub trait JokeSource: Send + Sync {
    async fn fetch_joke(&self) -> Result<Joke, ApiError>;
}

/// Result of a sequential batch fetch.
///
/// Fetching stops at the first failure; `jokes` holds what arrived before it.
#[derive(Debug)]
pub struct BatchOutcome {
    pub requested: usize,
    pub jokes: Vec<Joke>,
    pub error: Option<ApiError>,
}

impl BatchOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.jokes.len() == self.requested
    }

    /// All-or-nothing view of the outcome.
    pub fn into_result(self) -> Result<Vec<Joke>, ApiError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.jokes),
        }
    }
}

/// Fetch `count` jokes one request at a time, in call order.
pub async fn fetch_batch_from(source: &dyn JokeSource, count: usize) -> BatchOutcome {
    let mut jokes = Vec::with_capacity(count);
    for i in 0..count {
        match source.fetch_joke().await {
            Ok(joke) => jokes.push(joke),
            Err(e) => {
                debug!(index = i, error = %e, "Batch fetch stopped early");
                return BatchOutcome {
                    requested: count,
                    jokes,
                    error: Some(e),
                };
            }
        }
    }
    BatchOutcome {
        requested: count,
        jokes,
        error: None,
    }
}
