//! Favorites: a set of item names persisted as one JSON string.
//!
//! Persistence is injected through [`KeyValueStore`], implemented by
//! [`crate::storage::Database`] and by the in-process [`MemoryStore`].

mod ledger;
mod memory;
mod set;

use anyhow::Result;
use std::future::Future;

pub use ledger::{FavoritesLedger, LedgerError, FAVORITES_KEY};
pub use memory::MemoryStore;
pub use set::FavoritesSet;

/// Durable string storage keyed by name.
pub trait KeyValueStore {
    /// The value stored under `key`, or `None` if it was never set.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;
}
