//! Remote flower catalog: wire types, fetching, and in-memory state.
//!
//! - [`types`] - `Category` and `Item` as served by the mock API
//! - [`fetcher`] - `GET /category` with a fixed timeout and size limit
//! - [`store`] - last-good catalog with ticket-fenced refresh results
//! - [`view`] - joins the catalog against the favorites set

mod fetcher;
mod store;
mod types;
mod view;

pub use fetcher::{build_client, category_url, fetch_categories, FetchError, DEFAULT_TIMEOUT};
pub use store::{CatalogStore, RefreshOutcome, RefreshTicket};
pub use types::{Category, Item};
pub use view::{favorite_items, find_item, is_favorite};
