//! jokecache core library.
//!
//! Fetches jokes from a remote API and keeps a persisted batch around for
//! when the network is gone:
//!
//! - `api`: the `JokeSource` trait and the reqwest-backed `ApiClient`
//! - `store`: async key-value persistence (`FileStore`, `MemoryStore`)
//! - `cache`: typed access to the persisted joke and batch
//! - `connectivity`: reachability probing and change events
//! - `controller`: the fetch / fallback / rotation state machine
//! - `config`: user configuration

pub mod api;
pub mod cache;
pub mod config;
pub mod connectivity;
pub mod controller;
pub mod models;
pub mod store;

pub use api::{ApiClient, ApiError, JokeSource};
pub use cache::JokeCache;
pub use config::Config;
pub use connectivity::{ConnectivityEvent, ConnectivityMonitor, ConnectivitySubscription, TcpProbe};
pub use controller::{
    AdvanceAction, ControllerOptions, FetchStatus, FetchTicket, JokeController, JokeView,
    FETCH_ERROR_MESSAGE,
};
pub use models::{Joke, JokeBatch};
pub use store::{FileStore, KeyValueStore, MemoryStore};
