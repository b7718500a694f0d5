//! Typed joke cache on top of a `KeyValueStore`.
//!
//! Two values are kept, both as JSON text:
//! - `"joke"`: the most recent live joke
//! - `"jokes"`: the offline batch, a JSON array of jokes

pub mod manager;

pub use manager::{JokeCache, BATCH_KEY, JOKE_KEY};
