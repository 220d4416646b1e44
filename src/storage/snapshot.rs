use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schema::Database;
use crate::catalog::Category;

/// Key holding the last successfully fetched catalog.
pub const SNAPSHOT_KEY: &str = "catalog.snapshot";

/// Last-good catalog saved for offline use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub categories: Vec<Category>,
}

impl Database {
    // ========================================================================
    // Catalog Snapshot Operations
    // ========================================================================

    /// Save the catalog as the offline snapshot, replacing any previous one.
    pub async fn save_catalog_snapshot(
        &self,
        categories: &[Category],
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        #[derive(Serialize)]
        struct SnapshotRef<'a> {
            fetched_at: DateTime<Utc>,
            categories: &'a [Category],
        }

        let json = serde_json::to_string(&SnapshotRef {
            fetched_at,
            categories,
        })?;
        self.set_value(SNAPSHOT_KEY, &json).await
    }

    /// Load the offline snapshot.
    ///
    /// Returns `None` if none was saved or the stored JSON no longer
    /// deserializes (e.g. after an `Item` schema change).
    pub async fn load_catalog_snapshot(&self) -> Result<Option<CatalogSnapshot>> {
        let Some(raw) = self.get_value(SNAPSHOT_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<CatalogSnapshot>(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable catalog snapshot");
                Ok(None)
            }
        }
    }

    /// Drop the offline snapshot. Returns `true` if one existed.
    pub async fn clear_catalog_snapshot(&self) -> Result<bool> {
        self.delete_value(SNAPSHOT_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Item;
    use pretty_assertions::assert_eq;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    fn catalog() -> Vec<Category> {
        let rose: Item = serde_json::from_value(serde_json::json!({
            "name": "Rose",
            "price": 4.5,
            "isTopOfTheWeek": true
        }))
        .unwrap();
        vec![Category {
            name: "Garden".to_string(),
            items: vec![rose],
        }]
    }

    #[tokio::test]
    async fn test_no_snapshot() {
        let db = test_db().await;
        assert_eq!(db.load_catalog_snapshot().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_and_load_snapshot() {
        let db = test_db().await;
        let fetched_at = Utc::now();
        db.save_catalog_snapshot(&catalog(), fetched_at)
            .await
            .unwrap();

        let snapshot = db.load_catalog_snapshot().await.unwrap().unwrap();
        assert_eq!(snapshot.categories, catalog());
        assert_eq!(snapshot.fetched_at, fetched_at);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_ignored() {
        let db = test_db().await;
        db.set_value(SNAPSHOT_KEY, "[oops").await.unwrap();
        assert_eq!(db.load_catalog_snapshot().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_snapshot() {
        let db = test_db().await;
        db.save_catalog_snapshot(&catalog(), Utc::now())
            .await
            .unwrap();

        assert!(db.clear_catalog_snapshot().await.unwrap());
        assert_eq!(db.load_catalog_snapshot().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_snapshot_does_not_touch_favorites() {
        let db = test_db().await;
        db.set_value("favorites", r#"["Rose"]"#).await.unwrap();
        db.save_catalog_snapshot(&catalog(), Utc::now())
            .await
            .unwrap();

        assert_eq!(
            db.get_value("favorites").await.unwrap().as_deref(),
            Some(r#"["Rose"]"#)
        );
    }
}
