use thiserror::Error;

use super::{FavoritesSet, KeyValueStore};

/// Durable key holding the JSON array of favorite names.
pub const FAVORITES_KEY: &str = "favorites";

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The new set was computed but could not be written.
    ///
    /// `set` is still the correct state for the current session; the stored
    /// copy is stale until the next successful write.
    #[error("Failed to persist favorites: {message}")]
    Persist { set: FavoritesSet, message: String },
}

impl LedgerError {
    /// The in-memory set the failed mutation produced.
    pub fn into_set(self) -> FavoritesSet {
        match self {
            LedgerError::Persist { set, .. } => set,
        }
    }
}

/// Favorites persisted through an injected [`KeyValueStore`].
///
/// Set arithmetic lives on [`FavoritesSet`]; the ledger writes each result
/// under [`FAVORITES_KEY`] before returning it.
pub struct FavoritesLedger<S> {
    store: S,
}

impl<S: KeyValueStore> FavoritesLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read the stored favorites.
    ///
    /// Fails open: a missing key, an unreadable store, or a value that is not
    /// a JSON array of strings all load as the empty set.
    pub async fn load(&self) -> FavoritesSet {
        let raw = match self.store.get(FAVORITES_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return FavoritesSet::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read favorites, treating as empty");
                return FavoritesSet::new();
            }
        };

        match FavoritesSet::from_json(&raw) {
            Ok(set) => {
                tracing::debug!(count = set.len(), "Loaded favorites");
                set
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored favorites are not a JSON string array, treating as empty");
                FavoritesSet::new()
            }
        }
    }

    /// Add `name` if absent, remove it if present, and persist the result.
    pub async fn toggle(
        &self,
        name: &str,
        current: &FavoritesSet,
    ) -> Result<FavoritesSet, LedgerError> {
        self.persist(current.toggled(name)).await
    }

    /// Remove `name` and persist the result.
    pub async fn remove_one(
        &self,
        name: &str,
        current: &FavoritesSet,
    ) -> Result<FavoritesSet, LedgerError> {
        self.persist(current.without(name)).await
    }

    /// Persist and return the empty set.
    pub async fn remove_all(&self) -> Result<FavoritesSet, LedgerError> {
        self.persist(FavoritesSet::new()).await
    }

    async fn persist(&self, set: FavoritesSet) -> Result<FavoritesSet, LedgerError> {
        match self.store.set(FAVORITES_KEY, &set.to_json()).await {
            Ok(()) => Ok(set),
            Err(e) => {
                tracing::warn!(error = %e, count = set.len(), "Failed to persist favorites");
                Err(LedgerError::Persist {
                    set,
                    message: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorites::MemoryStore;
    use pretty_assertions::assert_eq;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("disk on fire")
        }

        async fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk on fire")
        }
    }

    async fn stored(ledger: &FavoritesLedger<MemoryStore>) -> Option<String> {
        ledger.store().get(FAVORITES_KEY).await.unwrap()
    }

    #[tokio::test]
    async fn test_load_first_run_is_empty() {
        let ledger = FavoritesLedger::new(MemoryStore::new());
        assert!(ledger.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_unparsable_value_is_empty() {
        let store = MemoryStore::new();
        store.set(FAVORITES_KEY, "{broken").await.unwrap();
        let ledger = FavoritesLedger::new(store);
        assert!(ledger.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_store_failure_is_empty() {
        let ledger = FavoritesLedger::new(BrokenStore);
        assert!(ledger.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_toggle_adds_and_persists() {
        let ledger = FavoritesLedger::new(MemoryStore::new());
        let set = ledger.toggle("Rose", &FavoritesSet::new()).await.unwrap();

        assert_eq!(set, FavoritesSet::from_iter(["Rose"]));
        assert_eq!(stored(&ledger).await.as_deref(), Some(r#"["Rose"]"#));
    }

    #[tokio::test]
    async fn test_toggle_removes_and_persists() {
        let ledger = FavoritesLedger::new(MemoryStore::new());
        let current = FavoritesSet::from_iter(["Rose", "Lily"]);
        let set = ledger.toggle("Rose", &current).await.unwrap();

        assert_eq!(set, FavoritesSet::from_iter(["Lily"]));
        assert_eq!(stored(&ledger).await.as_deref(), Some(r#"["Lily"]"#));
    }

    #[tokio::test]
    async fn test_remove_one() {
        let ledger = FavoritesLedger::new(MemoryStore::new());
        let current = FavoritesSet::from_iter(["Rose", "Lily"]);
        let set = ledger.remove_one("Lily", &current).await.unwrap();

        assert_eq!(set, FavoritesSet::from_iter(["Rose"]));
        assert_eq!(ledger.load().await, set);
    }

    #[tokio::test]
    async fn test_remove_all_persists_empty_array() {
        let ledger = FavoritesLedger::new(MemoryStore::new());
        ledger
            .toggle("Rose", &FavoritesSet::new())
            .await
            .unwrap();

        let set = ledger.remove_all().await.unwrap();
        assert!(set.is_empty());
        assert_eq!(stored(&ledger).await.as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_persist_failure_carries_new_set() {
        let ledger = FavoritesLedger::new(BrokenStore);
        let err = ledger
            .toggle("Rose", &FavoritesSet::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("disk on fire"));
        assert_eq!(err.into_set(), FavoritesSet::from_iter(["Rose"]));
    }

    #[tokio::test]
    async fn test_load_sees_other_ledger_writes() {
        let store = MemoryStore::new();
        let writer = FavoritesLedger::new(store.clone());
        let reader = FavoritesLedger::new(store);

        writer
            .toggle("Iris", &FavoritesSet::new())
            .await
            .unwrap();
        assert_eq!(reader.load().await, FavoritesSet::from_iter(["Iris"]));
    }
}
