//! Data models for jokes and the offline batch.
//!
//! - `Joke`: a single setup/punchline pair as returned by the joke API
//! - `JokeBatch`: the ordered set of jokes kept for offline display

pub mod joke;

pub use joke::{Joke, JokeBatch, DEFAULT_BATCH_SIZE};
