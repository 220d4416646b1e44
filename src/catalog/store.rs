use chrono::{DateTime, Utc};

use super::fetcher::FetchError;
use super::Category;

/// Identifies one refresh attempt. Tickets are issued in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

/// What applying a refresh result did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The catalog was replaced with new contents.
    Updated { categories: usize },
    /// The result matched the current catalog; nothing changed.
    Unchanged,
    /// The fetch failed; the previous catalog was kept.
    Failed,
    /// A newer refresh had already been applied; the result was dropped.
    Stale,
}

/// In-memory holder for the last successfully fetched catalog.
///
/// Every refresh takes a ticket from [`begin_refresh`](Self::begin_refresh)
/// and hands its result back through [`apply`](Self::apply). Results are
/// fenced by ticket: once a ticket has been applied, results for older
/// tickets are discarded, so a slow response can never overwrite a newer
/// one. A failed fetch leaves the catalog untouched.
#[derive(Debug, Default)]
pub struct CatalogStore {
    categories: Vec<Category>,
    fetched_at: Option<DateTime<Utc>>,
    next_ticket: u64,
    applied_ticket: u64,
    loaded: bool,
    last_error: Option<String>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a previously saved catalog.
    ///
    /// The seed counts as prior state, not as a completed refresh, so
    /// [`is_loaded`](Self::is_loaded) stays false until the first refresh
    /// finishes.
    pub fn from_snapshot(categories: Vec<Category>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            categories,
            fetched_at: Some(fetched_at),
            ..Self::default()
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// When the current catalog was fetched, if it ever was.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// True once at least one refresh has completed, successfully or not.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Error message from the most recent applied refresh, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.next_ticket += 1;
        RefreshTicket(self.next_ticket)
    }

    /// Apply the result of the refresh identified by `ticket`.
    pub fn apply(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Vec<Category>, FetchError>,
    ) -> RefreshOutcome {
        if ticket.0 <= self.applied_ticket {
            tracing::debug!(
                ticket = ticket.0,
                applied = self.applied_ticket,
                "Dropping stale catalog refresh"
            );
            return RefreshOutcome::Stale;
        }

        self.applied_ticket = ticket.0;
        self.loaded = true;

        match result {
            Ok(categories) => {
                self.fetched_at = Some(Utc::now());
                self.last_error = None;
                if categories == self.categories {
                    return RefreshOutcome::Unchanged;
                }
                let count = categories.len();
                self.categories = categories;
                RefreshOutcome::Updated { categories: count }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kept = self.categories.len(),
                    "Catalog refresh failed, keeping previous catalog"
                );
                self.last_error = Some(e.to_string());
                RefreshOutcome::Failed
            }
        }
    }
}
