mod key_value;
mod schema;
mod snapshot;
mod types;

pub use schema::Database;
pub use snapshot::{CatalogSnapshot, SNAPSHOT_KEY};
pub use types::DatabaseError;
