use crate::catalog::{
    self, fetch_categories, CatalogStore, Category, FetchError, Item, RefreshOutcome,
    RefreshTicket,
};
use crate::favorites::{FavoritesLedger, FavoritesSet, KeyValueStore, LedgerError};
use crate::storage::{CatalogSnapshot, Database};
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

// ============================================================================
// Session Settings
// ============================================================================

/// Network settings for a session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub api_url: Url,
    pub timeout: Duration,
    /// Skip the network entirely; only the seeded catalog is available.
    pub offline: bool,
}

/// An item selected for the detail view, with its favorite flag.
#[derive(Debug, Clone, Copy)]
pub struct ItemDetail<'a> {
    pub item: &'a Item,
    pub is_favorite: bool,
}

struct InFlightRefresh {
    ticket: RefreshTicket,
    handle: JoinHandle<Result<Vec<Category>, FetchError>>,
}

// ============================================================================
// Session
// ============================================================================

/// Catalog and favorites state for one browsing session.
///
/// Each screen event of the catalog app maps to a method here: focusing a
/// screen reloads favorites and refreshes the catalog together, pull-to-
/// refresh only touches the catalog, and the heart/remove buttons go through
/// the ledger. The favorites view is the join of the two, computed on demand.
///
/// Failed catalog refreshes keep the previous catalog. A failed favorites
/// write keeps the new in-memory set and reports the error.
pub struct Session<S> {
    client: reqwest::Client,
    settings: SessionSettings,
    catalog: CatalogStore,
    favorites: FavoritesSet,
    ledger: FavoritesLedger<S>,
    snapshots: Option<Database>,
    in_flight: Option<InFlightRefresh>,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(
        client: reqwest::Client,
        settings: SessionSettings,
        ledger: FavoritesLedger<S>,
    ) -> Self {
        Self {
            client,
            settings,
            catalog: CatalogStore::new(),
            favorites: FavoritesSet::new(),
            ledger,
            snapshots: None,
            in_flight: None,
        }
    }

    /// Start from a previously saved catalog instead of an empty one.
    pub fn with_snapshot(mut self, snapshot: CatalogSnapshot) -> Self {
        self.catalog = CatalogStore::from_snapshot(snapshot.categories, snapshot.fetched_at);
        self
    }

    /// Save every successfully fetched catalog to `db`.
    pub fn with_snapshot_store(mut self, db: Database) -> Self {
        self.snapshots = Some(db);
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn categories(&self) -> &[Category] {
        self.catalog.categories()
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn favorites(&self) -> &FavoritesSet {
        &self.favorites
    }

    pub fn ledger(&self) -> &FavoritesLedger<S> {
        &self.ledger
    }

    /// True until the first catalog refresh has completed.
    pub fn is_loading(&self) -> bool {
        !self.catalog.is_loaded()
    }

    /// Favorite items in catalog order.
    pub fn favorite_items(&self) -> Vec<&Item> {
        catalog::favorite_items(self.catalog.categories(), &self.favorites)
    }

    /// The first item named `name`, for the detail view.
    pub fn detail(&self, name: &str) -> Option<ItemDetail<'_>> {
        catalog::find_item(self.catalog.categories(), name).map(|item| ItemDetail {
            item,
            is_favorite: catalog::is_favorite(item, &self.favorites),
        })
    }

    // ========================================================================
    // Lifecycle Events
    // ========================================================================

    /// Screen focus: reload favorites and refresh the catalog concurrently.
    ///
    /// Neither side's failure affects the other.
    pub async fn on_focus(&mut self) -> RefreshOutcome {
        let ticket = self.catalog.begin_refresh();
        let (favorites, result) = tokio::join!(self.ledger.load(), self.fetch());
        self.favorites = favorites;
        self.finish(ticket, result).await
    }

    /// Pull-to-refresh: refresh the catalog only.
    pub async fn pull_to_refresh(&mut self) -> RefreshOutcome {
        let ticket = self.catalog.begin_refresh();
        let result = self.fetch().await;
        self.finish(ticket, result).await
    }

    /// Re-read favorites from the store.
    pub async fn reload_favorites(&mut self) {
        self.favorites = self.ledger.load().await;
    }

    /// Start a catalog refresh in the background, cancelling any refresh
    /// already in flight.
    pub fn start_refresh(&mut self) -> RefreshTicket {
        self.cancel_refresh();

        let ticket = self.catalog.begin_refresh();
        let client = self.client.clone();
        let settings = self.settings.clone();
        let handle = tokio::spawn(async move {
            if settings.offline {
                return Err(FetchError::Offline);
            }
            fetch_categories(&client, &settings.api_url, settings.timeout).await
        });

        self.in_flight = Some(InFlightRefresh { ticket, handle });
        ticket
    }

    /// Abort the in-flight background refresh. Returns `true` if one was running.
    pub fn cancel_refresh(&mut self) -> bool {
        match self.in_flight.take() {
            Some(previous) => {
                previous.handle.abort();
                tracing::debug!(ticket = ?previous.ticket, "Cancelled in-flight catalog refresh");
                true
            }
            None => false,
        }
    }

    /// Wait for the background refresh and apply its result.
    ///
    /// Returns `None` if no refresh was started (or it was cancelled).
    /// Dropping the returned future leaves the refresh in flight, so it can
    /// still be cancelled or completed later.
    pub async fn complete_refresh(&mut self) -> Option<RefreshOutcome> {
        let in_flight = self.in_flight.as_mut()?;
        let result = (&mut in_flight.handle)
            .await
            .unwrap_or_else(|e| Err(FetchError::Task(e.to_string())));
        let ticket = in_flight.ticket;
        self.in_flight = None;
        Some(self.finish(ticket, result).await)
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    /// Flip the favorite flag of `name`. Returns whether it is now a favorite.
    pub async fn toggle_favorite(&mut self, name: &str) -> Result<bool, LedgerError> {
        let result = self.ledger.toggle(name, &self.favorites).await;
        self.adopt(result)?;
        Ok(self.favorites.contains(name))
    }

    /// Remove `name` from favorites. Returns whether it was a favorite.
    pub async fn remove_favorite(&mut self, name: &str) -> Result<bool, LedgerError> {
        let was_favorite = self.favorites.contains(name);
        let result = self.ledger.remove_one(name, &self.favorites).await;
        self.adopt(result)?;
        Ok(was_favorite)
    }

    /// Remove every favorite. Returns how many were removed.
    pub async fn remove_all_favorites(&mut self) -> Result<usize, LedgerError> {
        let removed = self.favorites.len();
        let result = self.ledger.remove_all().await;
        self.adopt(result)?;
        Ok(removed)
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    async fn fetch(&self) -> Result<Vec<Category>, FetchError> {
        if self.settings.offline {
            return Err(FetchError::Offline);
        }
        fetch_categories(&self.client, &self.settings.api_url, self.settings.timeout).await
    }

    async fn finish(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<Category>, FetchError>,
    ) -> RefreshOutcome {
        let outcome = self.catalog.apply(ticket, result);

        if matches!(outcome, RefreshOutcome::Updated { .. }) {
            if let (Some(db), Some(fetched_at)) = (&self.snapshots, self.catalog.fetched_at()) {
                if let Err(e) = db
                    .save_catalog_snapshot(self.catalog.categories(), fetched_at)
                    .await
                {
                    tracing::warn!(error = %e, "Failed to save catalog snapshot");
                }
            }
        }

        outcome
    }

    /// Keep the mutation's set even when persisting it failed.
    fn adopt(&mut self, result: Result<FavoritesSet, LedgerError>) -> Result<(), LedgerError> {
        match result {
            Ok(set) => {
                self.favorites = set;
                Ok(())
            }
            Err(LedgerError::Persist { set, message }) => {
                self.favorites = set.clone();
                Err(LedgerError::Persist { set, message })
            }
        }
    }
}

impl<S> Drop for Session<S> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.handle.abort();
        }
    }
}
