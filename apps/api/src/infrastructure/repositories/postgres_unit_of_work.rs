use async_trait::async_trait;
use sqlx::PgPool;

use super::{postgres_delivery_repository, postgres_product_repository, postgres_transaction_repository};
use crate::domain::repositories::{ChangeSet, Committed, DeliveryWrite, RepositoryResult, UnitOfWork};

/// Commits a change set inside one PostgreSQL transaction
///
/// Any failed version check or constraint rolls the whole set back when the
/// transaction is dropped uncommitted.
pub struct PostgresUnitOfWork {
    pool: PgPool,
}

impl PostgresUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn commit(&self, changes: ChangeSet) -> RepositoryResult<Committed> {
        let mut tx = self.pool.begin().await?;

        let delivery = match changes.delivery {
            Some(DeliveryWrite::Insert(delivery)) => {
                postgres_delivery_repository::insert(&mut tx, &delivery).await?;
                Some(delivery)
            }
            Some(DeliveryWrite::Update(delivery)) => {
                Some(postgres_delivery_repository::update_versioned(&mut tx, &delivery).await?)
            }
            None => None,
        };

        let mut products = Vec::with_capacity(changes.products.len());
        for product in &changes.products {
            products.push(postgres_product_repository::update_versioned(&mut tx, product).await?);
        }

        for entry in &changes.transactions {
            postgres_transaction_repository::insert(&mut tx, entry).await?;
        }

        tx.commit().await?;

        Ok(Committed { delivery, products })
    }
}
