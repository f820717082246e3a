use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use super::errors::{ServiceError, ServiceResult};
use super::inventory_service::LedgerDraft;
use super::user_service::UserService;
use crate::domain::delivery::{
    Delivery, DeliveryItem, DeliveryPriority, DeliveryStatus, ItemFlags, NewDelivery,
};
use crate::domain::errors::DomainResult;
use crate::domain::inventory::TransactionType;
use crate::domain::repositories::{
    DeliveryQuery, DeliveryRepository, DeliveryWrite, ProductRepository, UnitOfWork,
};
use crate::domain::user::UserRole;

/// One requested line of a new delivery
#[derive(Debug, Clone)]
pub struct ItemRequest {
    pub sku: String,
    pub quantity: i32,
}

/// Input for assigning a delivery to an agent
#[derive(Debug, Clone)]
pub struct Assignment {
    pub delivery_agent_id: Uuid,
    pub items: Vec<ItemRequest>,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_phone: Option<String>,
    pub status: Option<DeliveryStatus>,
    pub priority: Option<DeliveryPriority>,
    pub scheduled_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Delivery assignment and the agent-driven lifecycle
///
/// Every write commits the delivery together with the stock movements it
/// causes: STOCK_OUT per item on assignment, RETURN or DAMAGED per flagged
/// item when the delivery closes as returned, damaged or partially delivered.
pub struct DeliveryService {
    deliveries: Arc<dyn DeliveryRepository>,
    products: Arc<dyn ProductRepository>,
    users: Arc<UserService>,
    unit_of_work: Arc<dyn UnitOfWork>,
}

impl DeliveryService {
    pub fn new(
        deliveries: Arc<dyn DeliveryRepository>,
        products: Arc<dyn ProductRepository>,
        users: Arc<UserService>,
        unit_of_work: Arc<dyn UnitOfWork>,
    ) -> Self {
        Self {
            deliveries,
            products,
            users,
            unit_of_work,
        }
    }

    /// Creates a delivery and takes its items out of stock
    pub async fn assign(&self, input: Assignment) -> ServiceResult<Delivery> {
        self.ensure_agent(input.delivery_agent_id).await?;

        let mut items = Vec::with_capacity(input.items.len());
        for request in &input.items {
            let product = self
                .products
                .find_by_sku(&request.sku)
                .await?
                .ok_or_else(|| ServiceError::not_found("Product", "sku", &request.sku))?;
            items.push(DeliveryItem::new(&product, request.quantity));
        }

        let delivery = Delivery::new(NewDelivery {
            delivery_agent_id: input.delivery_agent_id,
            items,
            customer_name: input.customer_name,
            customer_address: input.customer_address,
            customer_phone: input.customer_phone,
            status: input.status,
            priority: input.priority,
            scheduled_date: input.scheduled_date,
            notes: input.notes,
        })?;

        let mut draft = LedgerDraft::new(self.products.as_ref());
        for item in delivery.items() {
            draft
                .post(
                    item.product_id,
                    TransactionType::StockOut,
                    item.quantity,
                    delivery.delivery_agent_id(),
                    Some(delivery.id()),
                    Some(format!("Assigned for delivery #{}", delivery.id())),
                )
                .await?;
        }

        let committed = self
            .unit_of_work
            .commit(draft.into_change_set(Some(DeliveryWrite::Insert(delivery))))
            .await?;
        let delivery = committed
            .delivery
            .ok_or_else(|| ServiceError::Internal("Delivery missing from commit".to_string()))?;

        info!(
            delivery_id = %delivery.id(),
            agent_id = %delivery.delivery_agent_id(),
            items = delivery.items().len(),
            "delivery assigned"
        );
        Ok(delivery)
    }

    async fn ensure_agent(&self, agent_id: Uuid) -> ServiceResult<()> {
        let agent = match self.users.get_by_id(agent_id).await {
            Ok(agent) => agent,
            Err(ServiceError::NotFound(_)) => {
                return Err(ServiceError::field(
                    "delivery_agent_id",
                    "Delivery agent does not exist",
                ))
            }
            Err(e) => return Err(e),
        };
        if !agent.has_role(UserRole::DlTeam) || !agent.enabled {
            return Err(ServiceError::field(
                "delivery_agent_id",
                "Delivery agent must be an enabled DLTEAM user",
            ));
        }
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Delivery> {
        self.deliveries
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Delivery", "id", id))
    }

    pub async fn list(&self, query: &DeliveryQuery) -> ServiceResult<Vec<Delivery>> {
        Ok(self.deliveries.find(query).await?)
    }

    /// Deliveries scheduled between `start` and `end`, both days included
    pub async fn list_scheduled_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ServiceResult<Vec<Delivery>> {
        if start > end {
            return Err(ServiceError::BadRequest(
                "start_date must not be after end_date".to_string(),
            ));
        }
        self.list(&DeliveryQuery {
            scheduled_from: Some(start),
            scheduled_to: Some(end),
            ..Default::default()
        })
        .await
    }

    pub async fn list_for_agent(&self, agent_id: Uuid) -> ServiceResult<Vec<Delivery>> {
        self.list(&DeliveryQuery {
            agent_id: Some(agent_id),
            ..Default::default()
        })
        .await
    }

    pub async fn list_for_agent_today(&self, agent_id: Uuid) -> ServiceResult<Vec<Delivery>> {
        let today = Utc::now().date_naive();
        self.list(&DeliveryQuery {
            agent_id: Some(agent_id),
            scheduled_from: Some(today),
            scheduled_to: Some(today),
            ..Default::default()
        })
        .await
    }

    pub async fn list_pending_for_agent(&self, agent_id: Uuid) -> ServiceResult<Vec<Delivery>> {
        self.list(&DeliveryQuery {
            agent_id: Some(agent_id),
            status: Some(DeliveryStatus::Pending),
            ..Default::default()
        })
        .await
    }

    /// Loads a delivery on behalf of its assigned agent
    pub async fn get_for_agent(&self, id: Uuid, agent_id: Uuid) -> ServiceResult<Delivery> {
        let delivery = self.get(id).await?;
        if let Err(e) = delivery.ensure_assigned_to(agent_id) {
            warn!(delivery_id = %id, agent_id = %agent_id, "agent denied access to delivery");
            return Err(e.into());
        }
        Ok(delivery)
    }

    /// PENDING -> IN_TRANSIT
    pub async fn start(&self, id: Uuid, agent_id: Uuid) -> ServiceResult<Delivery> {
        self.change(id, agent_id, |d| d.transition_to(DeliveryStatus::InTransit, None))
            .await
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        agent_id: Uuid,
        status: DeliveryStatus,
        notes: Option<String>,
    ) -> ServiceResult<Delivery> {
        self.change(id, agent_id, |d| d.transition_to(status, notes)).await
    }

    pub async fn complete(
        &self,
        id: Uuid,
        agent_id: Uuid,
        customer_name: String,
        customer_signature: String,
    ) -> ServiceResult<Delivery> {
        self.change(id, agent_id, |d| d.complete(customer_name, customer_signature))
            .await
    }

    /// Customer unavailable; notes explain what happened
    pub async fn door_lock(&self, id: Uuid, agent_id: Uuid, notes: String) -> ServiceResult<Delivery> {
        if notes.trim().is_empty() {
            return Err(ServiceError::field("notes", "Notes are required for a door lock"));
        }
        self.update_status(id, agent_id, DeliveryStatus::DoorLock, Some(notes))
            .await
    }

    /// Sets damaged/returned flags on items, matched by SKU
    pub async fn update_items(
        &self,
        id: Uuid,
        agent_id: Uuid,
        flags: Vec<ItemFlags>,
    ) -> ServiceResult<Delivery> {
        self.change(id, agent_id, |d| d.flag_items(&flags)).await
    }

    /// Applies an agent operation and commits it with any restocking it causes
    async fn change<F>(&self, id: Uuid, agent_id: Uuid, operation: F) -> ServiceResult<Delivery>
    where
        F: FnOnce(&mut Delivery) -> DomainResult<()>,
    {
        let mut delivery = self.get_for_agent(id, agent_id).await?;
        let before = delivery.status();

        if let Err(e) = operation(&mut delivery) {
            warn!(delivery_id = %id, status = %before, "delivery change rejected: {}", e);
            return Err(e.into());
        }

        let after = delivery.status();
        let mut draft = LedgerDraft::new(self.products.as_ref());
        if after != before && after.restocks_flagged_items() {
            for item in delivery.restock_items() {
                let (kind, suffix) = if item.damaged {
                    (TransactionType::Damaged, " (Damaged)")
                } else {
                    (TransactionType::Return, "")
                };
                draft
                    .post(
                        item.product_id,
                        kind,
                        item.quantity,
                        delivery.delivery_agent_id(),
                        Some(delivery.id()),
                        Some(format!("Returned from delivery #{}{}", delivery.id(), suffix)),
                    )
                    .await?;
            }
        }

        let restocked = draft.len();
        let committed = self
            .unit_of_work
            .commit(draft.into_change_set(Some(DeliveryWrite::Update(delivery))))
            .await?;
        let delivery = committed
            .delivery
            .ok_or_else(|| ServiceError::Internal("Delivery missing from commit".to_string()))?;

        if after != before {
            info!(delivery_id = %id, from = %before, to = %after, restocked, "delivery status changed");
        } else {
            info!(delivery_id = %id, "delivery updated");
        }
        Ok(delivery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::google::{GoogleAuthError, GoogleIdentityProvider, GoogleProfile};
    use crate::domain::product::{Product, ProductCategory, ProductDetails};
    use crate::domain::repositories::{TransactionQuery, TransactionRepository};
    use crate::infrastructure::cache::UserCache;
    use crate::infrastructure::repositories::InMemoryStore;
    use crate::services::user_service::{AuthSettings, Registration};
    use async_trait::async_trait;
    use std::time::Duration;

    struct NoGoogle;

    #[async_trait]
    impl GoogleIdentityProvider for NoGoogle {
        async fn exchange_code(&self, _code: &str) -> Result<GoogleProfile, GoogleAuthError> {
            Err(GoogleAuthError::NotConfigured)
        }
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        users: Arc<UserService>,
        service: DeliveryService,
        agent: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let users = Arc::new(UserService::new(
            store.clone(),
            UserCache::new(Duration::from_secs(60)),
            Arc::new(NoGoogle),
            AuthSettings {
                jwt_secret: "secret".to_string(),
                jwt_expiry_hours: 1,
                bcrypt_cost: 4,
            },
        ));
        let agent = register(&users, "rider1", UserRole::DlTeam).await;
        for (sku, quantity) in [("TOY-1", 10), ("BOOK-1", 4)] {
            let product = Product::new(
                sku.to_string(),
                ProductDetails {
                    name: format!("Product {}", sku),
                    description: None,
                    category: ProductCategory::Toys,
                    damaged: false,
                    perishable: false,
                    expiry_date: None,
                    quantity,
                },
            )
            .unwrap();
            ProductRepository::create(store.as_ref(), &product).await.unwrap();
        }
        let service = DeliveryService::new(store.clone(), store.clone(), users.clone(), store.clone());
        Fixture {
            store,
            users,
            service,
            agent,
        }
    }

    async fn register(users: &UserService, username: &str, role: UserRole) -> Uuid {
        users
            .register(Registration {
                username: username.to_string(),
                password: "password123".to_string(),
                email: format!("{}@dlvery.io", username),
                full_name: username.to_string(),
                role: Some(role),
                phone_number: None,
            })
            .await
            .unwrap()
            .id
    }

    fn assignment(agent: Uuid, items: &[(&str, i32)]) -> Assignment {
        Assignment {
            delivery_agent_id: agent,
            items: items
                .iter()
                .map(|(sku, quantity)| ItemRequest {
                    sku: sku.to_string(),
                    quantity: *quantity,
                })
                .collect(),
            customer_name: "Saman Kumara".to_string(),
            customer_address: "5 Lake Rd, Galle".to_string(),
            customer_phone: None,
            status: None,
            priority: None,
            scheduled_date: None,
            notes: None,
        }
    }

    async fn quantity(store: &InMemoryStore, sku: &str) -> i32 {
        ProductRepository::find_by_sku(store, sku)
            .await
            .unwrap()
            .unwrap()
            .quantity()
    }

    #[tokio::test]
    async fn assignment_takes_stock_out() {
        let f = fixture().await;
        let delivery = f
            .service
            .assign(assignment(f.agent, &[("TOY-1", 3), ("BOOK-1", 4)]))
            .await
            .unwrap();

        assert_eq!(delivery.status(), DeliveryStatus::Pending);
        assert_eq!(quantity(&f.store, "TOY-1").await, 7);
        assert_eq!(quantity(&f.store, "BOOK-1").await, 0);

        let ledger = TransactionRepository::find(
            f.store.as_ref(),
            &TransactionQuery {
                delivery_id: Some(delivery.id()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(ledger.iter().all(|t| t.kind == TransactionType::StockOut && t.user_id == f.agent));
    }

    #[tokio::test]
    async fn assignment_beyond_stock_writes_nothing() {
        let f = fixture().await;
        let result = f
            .service
            .assign(assignment(f.agent, &[("TOY-1", 3), ("BOOK-1", 5)]))
            .await;

        assert!(matches!(result, Err(ServiceError::BadRequest(_))));
        assert_eq!(quantity(&f.store, "TOY-1").await, 10);
        assert!(f.service.list(&DeliveryQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn assignment_requires_dlteam_agent() {
        let f = fixture().await;
        let clerk = register(&f.users, "clerk1", UserRole::InvTeam).await;

        let result = f.service.assign(assignment(clerk, &[("TOY-1", 1)])).await;
        assert!(matches!(result, Err(ServiceError::Validation(v)) if v[0].field == "delivery_agent_id"));

        let result = f.service.assign(assignment(Uuid::new_v4(), &[("TOY-1", 1)])).await;
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn unknown_sku_is_not_found() {
        let f = fixture().await;
        let result = f.service.assign(assignment(f.agent, &[("NOPE-1", 1)])).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn other_agent_is_forbidden_everywhere() {
        let f = fixture().await;
        let other = register(&f.users, "rider2", UserRole::DlTeam).await;
        let delivery = f.service.assign(assignment(f.agent, &[("TOY-1", 1)])).await.unwrap();
        let id = delivery.id();

        assert!(matches!(f.service.get_for_agent(id, other).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(f.service.start(id, other).await, Err(ServiceError::Forbidden(_))));
        assert!(matches!(
            f.service
                .complete(id, other, "X".to_string(), "sig".to_string())
                .await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.door_lock(id, other, "closed".to_string()).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            f.service
                .update_status(id, other, DeliveryStatus::InTransit, None)
                .await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.update_items(id, other, vec![]).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert_eq!(f.service.get(id).await.unwrap().status(), DeliveryStatus::Pending);
    }

    #[tokio::test]
    async fn complete_stamps_delivered_at_once() {
        let f = fixture().await;
        let delivery = f.service.assign(assignment(f.agent, &[("TOY-1", 1)])).await.unwrap();
        let id = delivery.id();

        f.service.start(id, f.agent).await.unwrap();
        let done = f
            .service
            .complete(id, f.agent, "Saman".to_string(), "data:image/png;base64,AA".to_string())
            .await
            .unwrap();
        let stamped = done.delivered_at().expect("delivered_at set");
        assert_eq!(done.status(), DeliveryStatus::Delivered);

        let again = f
            .service
            .complete(id, f.agent, "Saman".to_string(), "sig".to_string())
            .await;
        assert!(matches!(again, Err(ServiceError::BadRequest(_))));
        assert_eq!(f.service.get(id).await.unwrap().delivered_at(), Some(stamped));
    }

    #[tokio::test]
    async fn returned_delivery_restocks_flagged_items() {
        let f = fixture().await;
        let delivery = f
            .service
            .assign(assignment(f.agent, &[("TOY-1", 3), ("BOOK-1", 2)]))
            .await
            .unwrap();
        let id = delivery.id();
        f.service.start(id, f.agent).await.unwrap();
        f.service
            .update_items(
                id,
                f.agent,
                vec![
                    ItemFlags {
                        sku: "TOY-1".to_string(),
                        damaged: true,
                        returned: false,
                    },
                    ItemFlags {
                        sku: "BOOK-1".to_string(),
                        damaged: false,
                        returned: true,
                    },
                ],
            )
            .await
            .unwrap();

        f.service
            .update_status(id, f.agent, DeliveryStatus::Returned, Some("Refused".to_string()))
            .await
            .unwrap();

        assert_eq!(quantity(&f.store, "TOY-1").await, 10);
        assert_eq!(quantity(&f.store, "BOOK-1").await, 4);
        let toy = ProductRepository::find_by_sku(f.store.as_ref(), "TOY-1")
            .await
            .unwrap()
            .unwrap();
        assert!(toy.is_damaged());
        let book = ProductRepository::find_by_sku(f.store.as_ref(), "BOOK-1")
            .await
            .unwrap()
            .unwrap();
        assert!(!book.is_damaged());

        let kinds: Vec<_> = TransactionRepository::find(
            f.store.as_ref(),
            &TransactionQuery {
                delivery_id: Some(id),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect();
        assert!(kinds.contains(&TransactionType::Damaged));
        assert!(kinds.contains(&TransactionType::Return));
    }

    async fn ledger_kinds(store: &InMemoryStore, delivery_id: Uuid) -> Vec<TransactionType> {
        TransactionRepository::find(
            store,
            &TransactionQuery {
                delivery_id: Some(delivery_id),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
    }

    fn count(kinds: &[TransactionType], kind: TransactionType) -> usize {
        kinds.iter().filter(|k| **k == kind).count()
    }

    async fn started(f: &Fixture, items: &[(&str, i32)]) -> Uuid {
        let delivery = f.service.assign(assignment(f.agent, items)).await.unwrap();
        f.service.start(delivery.id(), f.agent).await.unwrap();
        delivery.id()
    }

    #[tokio::test]
    async fn partial_delivery_restocks_only_returned_items() {
        let f = fixture().await;
        let id = started(&f, &[("TOY-1", 3), ("BOOK-1", 2)]).await;
        f.service
            .update_items(
                id,
                f.agent,
                vec![ItemFlags {
                    sku: "BOOK-1".to_string(),
                    damaged: false,
                    returned: true,
                }],
            )
            .await
            .unwrap();

        let delivery = f
            .service
            .update_status(id, f.agent, DeliveryStatus::PartiallyDelivered, None)
            .await
            .unwrap();

        assert_eq!(delivery.status(), DeliveryStatus::PartiallyDelivered);
        assert_eq!(quantity(&f.store, "TOY-1").await, 7);
        assert_eq!(quantity(&f.store, "BOOK-1").await, 4);
        let book = ProductRepository::find_by_sku(f.store.as_ref(), "BOOK-1")
            .await
            .unwrap()
            .unwrap();
        assert!(!book.is_damaged());

        let kinds = ledger_kinds(&f.store, id).await;
        assert_eq!(kinds.len(), 3);
        assert_eq!(count(&kinds, TransactionType::StockOut), 2);
        assert_eq!(count(&kinds, TransactionType::Return), 1);
    }

    #[tokio::test]
    async fn damaged_delivery_restocks_damaged_items() {
        let f = fixture().await;
        let id = started(&f, &[("TOY-1", 3)]).await;
        f.service
            .update_items(
                id,
                f.agent,
                vec![ItemFlags {
                    sku: "TOY-1".to_string(),
                    damaged: true,
                    returned: false,
                }],
            )
            .await
            .unwrap();

        f.service
            .update_status(id, f.agent, DeliveryStatus::Damaged, Some("Crushed box".to_string()))
            .await
            .unwrap();

        assert_eq!(quantity(&f.store, "TOY-1").await, 10);
        let toy = ProductRepository::find_by_sku(f.store.as_ref(), "TOY-1")
            .await
            .unwrap()
            .unwrap();
        assert!(toy.is_damaged());

        let entries = TransactionRepository::find(
            f.store.as_ref(),
            &TransactionQuery {
                delivery_id: Some(id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let damaged: Vec<_> = entries
            .iter()
            .filter(|t| t.kind == TransactionType::Damaged)
            .collect();
        assert_eq!(damaged.len(), 1);
        assert_eq!(damaged[0].quantity, 3);
        assert_eq!(
            damaged[0].notes.as_deref(),
            Some(format!("Returned from delivery #{} (Damaged)", id).as_str())
        );
    }

    #[tokio::test]
    async fn closing_without_flagged_items_writes_no_restock() {
        let f = fixture().await;
        let id = started(&f, &[("TOY-1", 3), ("BOOK-1", 2)]).await;

        f.service
            .update_status(id, f.agent, DeliveryStatus::Returned, None)
            .await
            .unwrap();

        assert_eq!(quantity(&f.store, "TOY-1").await, 7);
        assert_eq!(quantity(&f.store, "BOOK-1").await, 2);
        let kinds = ledger_kinds(&f.store, id).await;
        assert_eq!(kinds.len(), 2);
        assert_eq!(count(&kinds, TransactionType::StockOut), 2);
    }

    #[tokio::test]
    async fn door_lock_then_retry() {
        let f = fixture().await;
        let delivery = f.service.assign(assignment(f.agent, &[("TOY-1", 1)])).await.unwrap();
        let id = delivery.id();
        f.service.start(id, f.agent).await.unwrap();

        assert!(matches!(
            f.service.door_lock(id, f.agent, " ".to_string()).await,
            Err(ServiceError::Validation(_))
        ));
        let locked = f
            .service
            .door_lock(id, f.agent, "Gate locked".to_string())
            .await
            .unwrap();
        assert_eq!(locked.status(), DeliveryStatus::DoorLock);
        assert_eq!(locked.notes(), Some("Gate locked"));

        let retried = f
            .service
            .update_status(id, f.agent, DeliveryStatus::InTransit, None)
            .await
            .unwrap();
        assert_eq!(retried.status(), DeliveryStatus::InTransit);
    }

    #[tokio::test]
    async fn agent_listings() {
        let f = fixture().await;
        let first = f.service.assign(assignment(f.agent, &[("TOY-1", 1)])).await.unwrap();
        f.service.assign(assignment(f.agent, &[("TOY-1", 1)])).await.unwrap();
        f.service.start(first.id(), f.agent).await.unwrap();

        assert_eq!(f.service.list_for_agent(f.agent).await.unwrap().len(), 2);
        assert_eq!(f.service.list_for_agent_today(f.agent).await.unwrap().len(), 2);
        assert_eq!(f.service.list_pending_for_agent(f.agent).await.unwrap().len(), 1);
    }
}
