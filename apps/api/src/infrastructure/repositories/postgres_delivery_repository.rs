use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::delivery::{Delivery, DeliveryItem, DeliveryPriority, DeliveryStatus};
use crate::domain::repositories::{
    DeliveryQuery, DeliveryRepository, RepositoryError, RepositoryResult,
};

const DELIVERY_COLUMNS: &str = "id, delivery_agent_id, items, customer_name, customer_address, \
                                customer_phone, status, priority, scheduled_date, delivered_at, \
                                customer_signature, notes, version, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct DeliveryRow {
    id: Uuid,
    delivery_agent_id: Uuid,
    items: Json<Vec<DeliveryItem>>,
    customer_name: String,
    customer_address: String,
    customer_phone: Option<String>,
    status: DeliveryStatus,
    priority: DeliveryPriority,
    scheduled_date: NaiveDate,
    delivered_at: Option<DateTime<Utc>>,
    customer_signature: Option<String>,
    notes: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DeliveryRow> for Delivery {
    fn from(r: DeliveryRow) -> Self {
        Delivery::from_persistence(
            r.id,
            r.delivery_agent_id,
            r.items.0,
            r.customer_name,
            r.customer_address,
            r.customer_phone,
            r.status,
            r.priority,
            r.scheduled_date,
            r.delivered_at,
            r.customer_signature,
            r.notes,
            r.version,
            r.created_at,
            r.updated_at,
        )
    }
}

pub(super) async fn insert(conn: &mut PgConnection, delivery: &Delivery) -> RepositoryResult<()> {
    sqlx::query(
        r#"
        INSERT INTO deliveries (
            id, delivery_agent_id, items, customer_name, customer_address, customer_phone,
            status, priority, scheduled_date, delivered_at, customer_signature, notes,
            version, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        "#,
    )
    .bind(delivery.id())
    .bind(delivery.delivery_agent_id())
    .bind(Json(delivery.items()))
    .bind(delivery.customer_name())
    .bind(delivery.customer_address())
    .bind(delivery.customer_phone())
    .bind(delivery.status())
    .bind(delivery.priority())
    .bind(delivery.scheduled_date())
    .bind(delivery.delivered_at())
    .bind(delivery.customer_signature())
    .bind(delivery.notes())
    .bind(delivery.version())
    .bind(delivery.created_at())
    .bind(delivery.updated_at())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Writes `delivery` if its stored version still matches the one it was read at
pub(super) async fn update_versioned(
    conn: &mut PgConnection,
    delivery: &Delivery,
) -> RepositoryResult<Delivery> {
    let sql = format!(
        r#"
        UPDATE deliveries
        SET items = $3, customer_name = $4, customer_address = $5, customer_phone = $6,
            status = $7, priority = $8, scheduled_date = $9, delivered_at = $10,
            customer_signature = $11, notes = $12, updated_at = $13, version = version + 1
        WHERE id = $1 AND version = $2
        RETURNING {}
        "#,
        DELIVERY_COLUMNS
    );
    let row: Option<DeliveryRow> = sqlx::query_as(&sql)
        .bind(delivery.id())
        .bind(delivery.version())
        .bind(Json(delivery.items()))
        .bind(delivery.customer_name())
        .bind(delivery.customer_address())
        .bind(delivery.customer_phone())
        .bind(delivery.status())
        .bind(delivery.priority())
        .bind(delivery.scheduled_date())
        .bind(delivery.delivered_at())
        .bind(delivery.customer_signature())
        .bind(delivery.notes())
        .bind(delivery.updated_at())
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(row) = row {
        return Ok(row.into());
    }

    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM deliveries WHERE id = $1)")
            .bind(delivery.id())
            .fetch_one(&mut *conn)
            .await?;

    let id = delivery.id().to_string();
    Err(if exists {
        RepositoryError::Conflict {
            entity: "Delivery",
            id,
        }
    } else {
        RepositoryError::NotFound {
            entity: "Delivery",
            id,
        }
    })
}

/// PostgreSQL read side for deliveries
pub struct PostgresDeliveryRepository {
    pool: PgPool,
}

impl PostgresDeliveryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryRepository for PostgresDeliveryRepository {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Delivery>> {
        let sql = format!("SELECT {} FROM deliveries WHERE id = $1", DELIVERY_COLUMNS);
        let row: Option<DeliveryRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Delivery::from))
    }

    async fn find(&self, filter: &DeliveryQuery) -> RepositoryResult<Vec<Delivery>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM deliveries WHERE TRUE",
            DELIVERY_COLUMNS
        ));
        if let Some(agent_id) = filter.agent_id {
            query.push(" AND delivery_agent_id = ").push_bind(agent_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(from) = filter.scheduled_from {
            query.push(" AND scheduled_date >= ").push_bind(from);
        }
        if let Some(to) = filter.scheduled_to {
            query.push(" AND scheduled_date <= ").push_bind(to);
        }
        if let Some(sku) = &filter.item_sku {
            query
                .push(" AND items @> jsonb_build_array(jsonb_build_object('sku', ")
                .push_bind(sku.clone())
                .push("::text))");
        }
        if filter.damaged_items_only {
            query.push(" AND items @> '[{\"damaged\": true}]'::jsonb");
        }
        query.push(" ORDER BY created_at DESC");

        let rows: Vec<DeliveryRow> = query
            .build_query_as::<DeliveryRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Delivery::from).collect())
    }
}
