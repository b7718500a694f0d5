//! Joke and batch types shared by the API client, the store and the controller.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of jokes fetched for the offline batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// A joke as served by the API.
///
/// The API also sends `id` and `type`; those are ignored on decode and never
/// written back to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Joke {
    pub setup: String,
    pub punchline: String,
}

impl Joke {
    pub fn new(setup: impl Into<String>, punchline: impl Into<String>) -> Self {
        Self {
            setup: setup.into(),
            punchline: punchline.into(),
        }
    }
}

impl fmt::Display for Joke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.setup, self.punchline)
    }
}

/// Ordered jokes used as offline fallback content.
///
/// Serialized as a plain JSON array so the stored value stays a list of jokes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JokeBatch {
    jokes: Vec<Joke>,
}

impl JokeBatch {
    pub fn new(jokes: Vec<Joke>) -> Self {
        Self { jokes }
    }

    pub fn len(&self) -> usize {
        self.jokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jokes.is_empty()
    }

    /// The joke currently shown from the batch.
    pub fn head(&self) -> Option<&Joke> {
        self.jokes.first()
    }

    pub fn jokes(&self) -> &[Joke] {
        &self.jokes
    }

    /// Whether rotating would show a different joke.
    pub fn can_rotate(&self) -> bool {
        self.jokes.len() > 1
    }

    /// Move the head to the tail. No-op with fewer than two jokes.
    pub fn rotate(&mut self) {
        if self.can_rotate() {
            self.jokes.rotate_left(1);
        }
    }

    pub fn into_vec(self) -> Vec<Joke> {
        self.jokes
    }
}

impl From<Vec<Joke>> for JokeBatch {
    fn from(jokes: Vec<Joke>) -> Self {
        Self::new(jokes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch_of(n: usize) -> JokeBatch {
        (0..n)
            .map(|i| Joke::new(format!("setup {}", i), format!("punchline {}", i)))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_joke_ignores_extra_api_fields() {
        let body = r#"{"type":"general","setup":"Why?","punchline":"Because.","id":42}"#;
        let joke: Joke = serde_json::from_str(body).unwrap();
        assert_eq!(joke, Joke::new("Why?", "Because."));

        let stored = serde_json::to_string(&joke).unwrap();
        assert_eq!(stored, r#"{"setup":"Why?","punchline":"Because."}"#);
    }

    #[test]
    fn test_batch_serializes_as_array() {
        let batch = batch_of(2);
        let json = serde_json::to_string(&batch).unwrap();
        assert!(json.starts_with('['));

        let parsed: JokeBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, batch);
    }

    #[test]
    fn test_rotate_moves_head_to_tail() {
        let mut batch = batch_of(3);
        batch.rotate();
        assert_eq!(batch.head().unwrap().setup, "setup 1");
        assert_eq!(batch.jokes()[2].setup, "setup 0");
    }

    #[test]
    fn test_rotate_n_times_restores_order() {
        for n in [2, 3, 10] {
            let original = batch_of(n);
            let mut batch = original.clone();
            for _ in 0..n {
                batch.rotate();
            }
            assert_eq!(batch, original, "batch of {} did not cycle back", n);
        }
    }

    #[test]
    fn test_rotate_short_batch_is_noop() {
        let mut empty = JokeBatch::default();
        empty.rotate();
        assert!(empty.is_empty());
        assert!(!empty.can_rotate());

        let single = batch_of(1);
        let mut rotated = single.clone();
        rotated.rotate();
        rotated.rotate();
        assert_eq!(rotated, single);
        assert!(!rotated.can_rotate());
    }

    #[test]
    fn test_display_puts_punchline_on_second_line() {
        let joke = Joke::new("Knock knock.", "Who's there?");
        assert_eq!(joke.to_string(), "Knock knock.\nWho's there?");
    }
}
