//! # Jewelry Item Repository
//!
//! Catalog operations. Items are read-only as far as the ledger is
//! concerned: committed lines carry their own snapshot, so deactivating
//! or re-weighing an item never changes past consumption.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use karat_core::{JewelryItem, Weight};

use super::parse_stored_purity;
use crate::error::{DbError, DbResult};

#[derive(Debug, sqlx::FromRow)]
struct ItemRecord {
    id: String,
    item_code: String,
    name: String,
    metal_type: String,
    purity: String,
    net_weight_mg: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ItemRecord> for JewelryItem {
    type Error = DbError;

    fn try_from(record: ItemRecord) -> DbResult<Self> {
        let purity = parse_stored_purity("JewelryItem", &record.id, &record.purity)?;
        Ok(JewelryItem {
            id: record.id,
            item_code: record.item_code,
            name: record.name,
            metal_type: record.metal_type,
            purity,
            net_weight: Weight::from_milligrams(record.net_weight_mg),
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

const SELECT_ITEM: &str = r#"
    SELECT id, item_code, name, metal_type, purity, net_weight_mg,
           is_active, created_at, updated_at
    FROM jewelry_items
"#;

/// Repository for jewelry item (catalog) operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.items();
/// let ring = repo.get_by_code("RING-A").await?;
/// let catalog = repo.list_active().await?;
/// ```
#[derive(Debug, Clone)]
pub struct JewelryItemRepository {
    pool: SqlitePool,
}

impl JewelryItemRepository {
    /// Creates a new JewelryItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        JewelryItemRepository { pool }
    }

    /// Inserts a catalog item.
    pub async fn insert(&self, item: &JewelryItem) -> DbResult<()> {
        debug!(id = %item.id, item_code = %item.item_code, "Inserting jewelry item");

        sqlx::query(
            r#"
            INSERT INTO jewelry_items (
                id, item_code, name, metal_type, purity, net_weight_mg,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.id)
        .bind(&item.item_code)
        .bind(&item.name)
        .bind(&item.metal_type)
        .bind(item.purity.to_string())
        .bind(item.net_weight.milligrams())
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, item.item_code.clone()),
            other => other,
        })?;

        Ok(())
    }

    /// Gets an item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<JewelryItem>> {
        let record: Option<ItemRecord> = sqlx::query_as(&format!("{} WHERE id = ?1", SELECT_ITEM))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        record.map(JewelryItem::try_from).transpose()
    }

    /// Gets an item by its catalog code.
    pub async fn get_by_code(&self, item_code: &str) -> DbResult<Option<JewelryItem>> {
        let record: Option<ItemRecord> =
            sqlx::query_as(&format!("{} WHERE item_code = ?1", SELECT_ITEM))
                .bind(item_code)
                .fetch_optional(&self.pool)
                .await?;

        record.map(JewelryItem::try_from).transpose()
    }

    /// Lists active items ordered by code.
    pub async fn list_active(&self) -> DbResult<Vec<JewelryItem>> {
        let records: Vec<ItemRecord> = sqlx::query_as(&format!(
            "{} WHERE is_active = 1 ORDER BY item_code",
            SELECT_ITEM
        ))
        .fetch_all(&self.pool)
        .await?;

        records.into_iter().map(JewelryItem::try_from).collect()
    }

    /// Hides an item from pickers. Existing entry lines are untouched.
    pub async fn deactivate(&self, item_code: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE jewelry_items SET is_active = 0, updated_at = ?2 WHERE item_code = ?1",
        )
        .bind(item_code)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("JewelryItem", item_code));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_insert_get_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.items();

        let ring = JewelryItem::new("RING-A", "Plain band", "Gold", dec!(22), Weight::from_grams(5));
        let chain = JewelryItem::new("CHAIN-B", "Rope chain", "Gold", dec!(18.0), Weight::from_grams(12));
        repo.insert(&ring).await.unwrap();
        repo.insert(&chain).await.unwrap();

        let loaded = repo.get_by_code("RING-A").await.unwrap().unwrap();
        assert_eq!(loaded.id, ring.id);
        assert_eq!(loaded.net_weight, Weight::from_grams(5));
        assert_eq!(loaded.key(), ring.key());

        let by_id = repo.get_by_id(&chain.id).await.unwrap().unwrap();
        assert_eq!(by_id.item_code, "CHAIN-B");

        let codes: Vec<String> = repo
            .list_active()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.item_code)
            .collect();
        assert_eq!(codes, vec!["CHAIN-B", "RING-A"]);
    }

    #[tokio::test]
    async fn test_deactivate_hides_item() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.items();
        let ring = JewelryItem::new("RING-A", "Plain band", "Gold", dec!(22), Weight::from_grams(5));
        repo.insert(&ring).await.unwrap();

        repo.deactivate("RING-A").await.unwrap();
        assert!(repo.list_active().await.unwrap().is_empty());
        assert!(!repo.get_by_code("RING-A").await.unwrap().unwrap().is_active);

        assert!(matches!(
            repo.deactivate("NOPE").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_item_code() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.items();
        repo.insert(&JewelryItem::new("RING-A", "Band", "Gold", dec!(22), Weight::from_grams(5)))
            .await
            .unwrap();

        let err = repo
            .insert(&JewelryItem::new("RING-A", "Other", "Gold", dec!(22), Weight::from_grams(6)))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("jewelry_items.item_code"));
    }
}
