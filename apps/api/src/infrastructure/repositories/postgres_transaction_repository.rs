use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::inventory::{InventoryTransaction, TransactionType};
use crate::domain::repositories::{RepositoryResult, TransactionQuery, TransactionRepository};

const TRANSACTION_COLUMNS: &str = "id, product_id, sku, transaction_type, quantity, user_id, \
                                   delivery_id, notes, timestamp";

#[derive(sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    product_id: Uuid,
    sku: String,
    transaction_type: TransactionType,
    quantity: i32,
    user_id: Uuid,
    delivery_id: Option<Uuid>,
    notes: Option<String>,
    timestamp: DateTime<Utc>,
}

impl From<TransactionRow> for InventoryTransaction {
    fn from(r: TransactionRow) -> Self {
        InventoryTransaction {
            id: r.id,
            product_id: r.product_id,
            sku: r.sku,
            kind: r.transaction_type,
            quantity: r.quantity,
            user_id: r.user_id,
            delivery_id: r.delivery_id,
            notes: r.notes,
            timestamp: r.timestamp,
        }
    }
}

pub(super) async fn insert(
    conn: &mut PgConnection,
    tx: &InventoryTransaction,
) -> RepositoryResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory_transactions (
            id, product_id, sku, transaction_type, quantity, user_id,
            delivery_id, notes, timestamp
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(tx.id)
    .bind(tx.product_id)
    .bind(&tx.sku)
    .bind(tx.kind)
    .bind(tx.quantity)
    .bind(tx.user_id)
    .bind(tx.delivery_id)
    .bind(&tx.notes)
    .bind(tx.timestamp)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// PostgreSQL read side for the inventory ledger
pub struct PostgresTransactionRepository {
    pool: PgPool,
}

impl PostgresTransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<InventoryTransaction>> {
        let sql = format!(
            "SELECT {} FROM inventory_transactions WHERE id = $1",
            TRANSACTION_COLUMNS
        );
        let row: Option<TransactionRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(InventoryTransaction::from))
    }

    async fn find(&self, filter: &TransactionQuery) -> RepositoryResult<Vec<InventoryTransaction>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM inventory_transactions WHERE TRUE",
            TRANSACTION_COLUMNS
        ));
        if let Some(product_id) = filter.product_id {
            query.push(" AND product_id = ").push_bind(product_id);
        }
        if let Some(sku) = &filter.sku {
            query.push(" AND sku = ").push_bind(sku.clone());
        }
        if let Some(kind) = filter.kind {
            query.push(" AND transaction_type = ").push_bind(kind);
        }
        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(delivery_id) = filter.delivery_id {
            query.push(" AND delivery_id = ").push_bind(delivery_id);
        }
        if let Some(from) = filter.from {
            query.push(" AND timestamp >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            query.push(" AND timestamp <= ").push_bind(to);
        }
        query.push(" ORDER BY timestamp DESC");

        let rows: Vec<TransactionRow> = query
            .build_query_as::<TransactionRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(InventoryTransaction::from).collect())
    }
}
