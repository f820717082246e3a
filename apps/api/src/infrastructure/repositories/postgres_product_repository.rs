use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::product::{Product, ProductCategory};
use crate::domain::repositories::{
    ProductQuery, ProductRepository, RepositoryError, RepositoryResult,
};

const PRODUCT_COLUMNS: &str = "id, sku, name, description, category, damaged, \
                               perishable, expiry_date, quantity, version, \
                               created_at, updated_at";

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: Uuid,
    sku: String,
    name: String,
    description: Option<String>,
    category: ProductCategory,
    damaged: bool,
    perishable: bool,
    expiry_date: Option<NaiveDate>,
    quantity: i32,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product::from_persistence(
            r.id,
            r.sku,
            r.name,
            r.description,
            r.category,
            r.damaged,
            r.perishable,
            r.expiry_date,
            r.quantity,
            r.version,
            r.created_at,
            r.updated_at,
        )
    }
}

/// Writes `product` if its stored version still matches the one it was read at
///
/// Shared with the unit of work so that ledger postings use the same check.
pub(super) async fn update_versioned(
    conn: &mut PgConnection,
    product: &Product,
) -> RepositoryResult<Product> {
    let sql = format!(
        r#"
        UPDATE products
        SET name = $3, description = $4, category = $5, damaged = $6, perishable = $7,
            expiry_date = $8, quantity = $9, updated_at = $10, version = version + 1
        WHERE id = $1 AND version = $2
        RETURNING {}
        "#,
        PRODUCT_COLUMNS
    );
    let row: Option<ProductRow> = sqlx::query_as(&sql)
        .bind(product.id())
        .bind(product.version())
        .bind(product.name())
        .bind(product.description())
        .bind(product.category())
        .bind(product.is_damaged())
        .bind(product.is_perishable())
        .bind(product.expiry_date())
        .bind(product.quantity())
        .bind(product.updated_at())
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(row) = row {
        return Ok(row.into());
    }

    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
        .bind(product.id())
        .fetch_one(&mut *conn)
        .await?;

    let id = product.id().to_string();
    Err(if exists {
        RepositoryError::Conflict {
            entity: "Product",
            id,
        }
    } else {
        RepositoryError::NotFound {
            entity: "Product",
            id,
        }
    })
}

/// PostgreSQL implementation of ProductRepository
pub struct PostgresProductRepository {
    pool: PgPool,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    async fn create(&self, product: &Product) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, description, category, damaged, perishable,
                expiry_date, quantity, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(product.id())
        .bind(product.sku())
        .bind(product.name())
        .bind(product.description())
        .bind(product.category())
        .bind(product.is_damaged())
        .bind(product.is_perishable())
        .bind(product.expiry_date())
        .bind(product.quantity())
        .bind(product.version())
        .bind(product.created_at())
        .bind(product.updated_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, product: &Product) -> RepositoryResult<Product> {
        let mut conn = self.pool.acquire().await?;
        update_versioned(&mut conn, product).await
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Product",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE sku = $1", PRODUCT_COLUMNS);
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    async fn exists_by_sku(&self, sku: &str) -> RepositoryResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE sku = $1)")
            .bind(sku)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn find(&self, filter: &ProductQuery) -> RepositoryResult<Vec<Product>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM products WHERE TRUE", PRODUCT_COLUMNS));
        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category);
        }
        if let Some(damaged) = filter.damaged {
            query.push(" AND damaged = ").push_bind(damaged);
        }
        if let Some(perishable) = filter.perishable {
            query.push(" AND perishable = ").push_bind(perishable);
        }
        if let Some(from) = filter.expires_on_or_after {
            query.push(" AND expiry_date >= ").push_bind(from);
        }
        if let Some(before) = filter.expires_before {
            query.push(" AND expiry_date < ").push_bind(before);
        }
        query.push(" ORDER BY sku");

        let rows: Vec<ProductRow> = query
            .build_query_as::<ProductRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }
}
