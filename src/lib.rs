pub mod adaptive;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use adaptive::AdaptiveEngine;
pub use error::{AdaptiveError, Result};
pub use store::{AdaptiveStore, SqliteStore};
