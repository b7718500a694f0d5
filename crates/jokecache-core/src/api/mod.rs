//! Remote joke source.
//!
//! This module provides the `JokeSource` trait the controller fetches through,
//! and `ApiClient`, the HTTP implementation backed by reqwest.

pub mod client;
pub mod error;
pub mod source;

pub use client::{ApiClient, DEFAULT_API_URL};
pub use error::ApiError;
pub use source::{fetch_batch_from, BatchOutcome, JokeSource};
