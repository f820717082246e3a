use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::delivery::Delivery;
use crate::domain::inventory::InventoryTransaction;
use crate::domain::product::Product;
use crate::domain::repositories::{
    ChangeSet, Committed, DeliveryQuery, DeliveryRepository, DeliveryWrite, Page, PageRequest,
    ProductQuery, ProductRepository, RepositoryError, RepositoryResult, SortDirection,
    TransactionQuery, TransactionRepository, UnitOfWork, UserRepository, UserSortField,
};
use crate::domain::user::{Email, User, UserRole};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    deliveries: HashMap<Uuid, Delivery>,
    transactions: Vec<InventoryTransaction>,
}

/// Process-local store implementing every repository port
///
/// All collections sit behind one lock so a [`ChangeSet`] commits atomically.
/// Used by the test suite and `STORAGE=memory` runs.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(entity: &'static str, id: Uuid) -> RepositoryError {
    RepositoryError::NotFound {
        entity,
        id: id.to_string(),
    }
}

fn conflict(entity: &'static str, id: Uuid) -> RepositoryError {
    RepositoryError::Conflict {
        entity,
        id: id.to_string(),
    }
}

fn role_rank(role: UserRole) -> u8 {
    match role {
        UserRole::Admin => 0,
        UserRole::InvTeam => 1,
        UserRole::DlTeam => 2,
    }
}

fn compare_users(a: &User, b: &User, field: UserSortField) -> Ordering {
    match field {
        UserSortField::Username => a.username.cmp(&b.username),
        UserSortField::Email => a.email.as_str().cmp(b.email.as_str()),
        UserSortField::FullName => a.full_name.cmp(&b.full_name),
        UserSortField::Role => role_rank(a.role).cmp(&role_rank(b.role)),
        UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: &User) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::Duplicate("username".to_string()));
        }
        if state.users.values().any(|u| u.email == user.email) {
            return Err(RepositoryError::Duplicate("email".to_string()));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user.id) {
            return Err(not_found("User", user.id));
        }
        if state
            .users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(RepositoryError::Duplicate("email".to_string()));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        state
            .users
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("User", id))
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> RepositoryResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> RepositoryResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| &u.email == email).cloned())
    }

    async fn exists_by_username(&self, username: &str) -> RepositoryResult<bool> {
        let state = self.state.read().await;
        Ok(state.users.values().any(|u| u.username == username))
    }

    async fn exists_by_email(&self, email: &Email) -> RepositoryResult<bool> {
        let state = self.state.read().await;
        Ok(state.users.values().any(|u| &u.email == email))
    }

    async fn find_page(
        &self,
        role: Option<UserRole>,
        request: &PageRequest<UserSortField>,
    ) -> RepositoryResult<Page<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect();

        users.sort_by(|a, b| {
            let ordering = compare_users(a, b, request.sort_by);
            let ordering = match request.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            ordering.then_with(|| a.id.cmp(&b.id))
        });

        let total = users.len() as u64;
        let content = users
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size as usize)
            .collect();
        Ok(Page::new(content, request, total))
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn create(&self, product: &Product) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        if state.products.values().any(|p| p.sku() == product.sku()) {
            return Err(RepositoryError::Duplicate("sku".to_string()));
        }
        state.products.insert(product.id(), product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> RepositoryResult<Product> {
        let mut state = self.state.write().await;
        let stored = state
            .products
            .get(&product.id())
            .ok_or_else(|| not_found("Product", product.id()))?;
        if stored.version() != product.version() {
            return Err(conflict("Product", product.id()));
        }
        let next = product.with_next_version();
        state.products.insert(next.id(), next.clone());
        Ok(next)
    }

    async fn delete(&self, id: Uuid) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        state
            .products
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("Product", id))
    }

    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn find_by_sku(&self, sku: &str) -> RepositoryResult<Option<Product>> {
        let state = self.state.read().await;
        Ok(state.products.values().find(|p| p.sku() == sku).cloned())
    }

    async fn exists_by_sku(&self, sku: &str) -> RepositoryResult<bool> {
        let state = self.state.read().await;
        Ok(state.products.values().any(|p| p.sku() == sku))
    }

    async fn find(&self, query: &ProductQuery) -> RepositoryResult<Vec<Product>> {
        let state = self.state.read().await;
        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.sku().cmp(b.sku()));
        Ok(products)
    }
}

#[async_trait]
impl DeliveryRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<Delivery>> {
        Ok(self.state.read().await.deliveries.get(&id).cloned())
    }

    async fn find(&self, query: &DeliveryQuery) -> RepositoryResult<Vec<Delivery>> {
        let state = self.state.read().await;
        let mut deliveries: Vec<Delivery> = state
            .deliveries
            .values()
            .filter(|d| query.matches(d))
            .cloned()
            .collect();
        deliveries.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(deliveries)
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> RepositoryResult<Option<InventoryTransaction>> {
        let state = self.state.read().await;
        Ok(state.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn find(&self, query: &TransactionQuery) -> RepositoryResult<Vec<InventoryTransaction>> {
        let state = self.state.read().await;
        let mut entries: Vec<InventoryTransaction> = state
            .transactions
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryStore {
    async fn commit(&self, changes: ChangeSet) -> RepositoryResult<Committed> {
        let mut state = self.state.write().await;

        // Check every precondition before touching anything
        match &changes.delivery {
            Some(DeliveryWrite::Insert(delivery)) => {
                if state.deliveries.contains_key(&delivery.id()) {
                    return Err(RepositoryError::Duplicate("delivery".to_string()));
                }
            }
            Some(DeliveryWrite::Update(delivery)) => {
                let stored = state
                    .deliveries
                    .get(&delivery.id())
                    .ok_or_else(|| not_found("Delivery", delivery.id()))?;
                if stored.version() != delivery.version() {
                    return Err(conflict("Delivery", delivery.id()));
                }
            }
            None => {}
        }
        for product in &changes.products {
            let stored = state
                .products
                .get(&product.id())
                .ok_or_else(|| not_found("Product", product.id()))?;
            if stored.version() != product.version() {
                return Err(conflict("Product", product.id()));
            }
        }

        let delivery = changes.delivery.map(|write| {
            let stored = match write {
                DeliveryWrite::Insert(delivery) => delivery,
                DeliveryWrite::Update(delivery) => delivery.with_next_version(),
            };
            state.deliveries.insert(stored.id(), stored.clone());
            stored
        });

        let products = changes
            .products
            .iter()
            .map(|product| {
                let next = product.with_next_version();
                state.products.insert(next.id(), next.clone());
                next
            })
            .collect();

        state.transactions.extend(changes.transactions);

        Ok(Committed { delivery, products })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::TransactionType;
    use crate::domain::product::{ProductCategory, ProductDetails};

    fn user(username: &str, email: &str, role: UserRole) -> User {
        User::new(
            username.to_string(),
            "hash".to_string(),
            Email::new(email).unwrap(),
            format!("{} name", username),
            role,
            None,
        )
    }

    fn product(sku: &str, quantity: i32) -> Product {
        Product::new(
            sku.to_string(),
            ProductDetails {
                name: "Notebook".to_string(),
                description: None,
                category: ProductCategory::Books,
                damaged: false,
                perishable: false,
                expiry_date: None,
                quantity,
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_username_and_email_rejected() {
        let store = InMemoryStore::new();
        UserRepository::create(&store, &user("amal", "amal@x.io", UserRole::DlTeam))
            .await
            .unwrap();

        let dup_name = UserRepository::create(&store, &user("amal", "other@x.io", UserRole::DlTeam)).await;
        assert!(matches!(dup_name, Err(RepositoryError::Duplicate(f)) if f == "username"));

        let dup_email = UserRepository::create(&store, &user("kamal", "amal@x.io", UserRole::DlTeam)).await;
        assert!(matches!(dup_email, Err(RepositoryError::Duplicate(f)) if f == "email"));
    }

    #[tokio::test]
    async fn user_pages_filter_and_sort() {
        let store = InMemoryStore::new();
        for (name, role) in [
            ("charlie", UserRole::DlTeam),
            ("alice", UserRole::DlTeam),
            ("bob", UserRole::Admin),
        ] {
            UserRepository::create(&store, &user(name, &format!("{}@x.io", name), role))
                .await
                .unwrap();
        }

        let request = PageRequest::new(0, 10, UserSortField::Username, SortDirection::Desc);
        let page = store.find_page(Some(UserRole::DlTeam), &request).await.unwrap();
        let names: Vec<_> = page.content.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["charlie", "alice"]);
        assert_eq!(page.total_elements, 2);

        let request = PageRequest::new(1, 2, UserSortField::Username, SortDirection::Asc);
        let page = store.find_page(None, &request).await.unwrap();
        let names: Vec<_> = page.content.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["charlie"]);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn stale_product_update_conflicts() {
        let store = InMemoryStore::new();
        let original = product("BOOK-1", 5);
        ProductRepository::create(&store, &original).await.unwrap();

        let first = ProductRepository::update(&store, &original).await.unwrap();
        assert_eq!(first.version(), 1);

        let stale = ProductRepository::update(&store, &original).await;
        assert!(matches!(stale, Err(RepositoryError::Conflict { .. })));
    }

    #[tokio::test]
    async fn commit_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let a = product("BOOK-1", 5);
        let b = product("BOOK-2", 5);
        ProductRepository::create(&store, &a).await.unwrap();
        ProductRepository::create(&store, &b).await.unwrap();
        // b moves on underneath the change set
        ProductRepository::update(&store, &b).await.unwrap();

        let mut changed_a = a.clone();
        let tx = InventoryTransaction::new(&a, TransactionType::StockOut, 2, Uuid::new_v4(), None, None)
            .unwrap();
        changed_a.apply_transaction(&tx).unwrap();

        let result = store
            .commit(ChangeSet {
                delivery: None,
                products: vec![changed_a, b.clone()],
                transactions: vec![tx],
            })
            .await;

        assert!(matches!(result, Err(RepositoryError::Conflict { .. })));
        let stored = ProductRepository::find_by_id(&store, a.id()).await.unwrap().unwrap();
        assert_eq!(stored.quantity(), 5);
        let ledger = TransactionRepository::find(&store, &TransactionQuery::default())
            .await
            .unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn products_filter_by_expiry_window() {
        let store = InMemoryStore::new();
        let mut milk = product("MILK-1", 3);
        milk.update(ProductDetails {
            name: "Milk".to_string(),
            description: None,
            category: ProductCategory::Food,
            damaged: false,
            perishable: true,
            expiry_date: chrono::NaiveDate::from_ymd_opt(2026, 3, 10),
            quantity: 3,
        })
        .unwrap();
        ProductRepository::create(&store, &milk).await.unwrap();
        ProductRepository::create(&store, &product("BOOK-1", 1)).await.unwrap();

        let before = ProductQuery {
            expires_before: chrono::NaiveDate::from_ymd_opt(2026, 3, 10),
            ..Default::default()
        };
        assert!(ProductRepository::find(&store, &before).await.unwrap().is_empty());

        let between = ProductQuery {
            expires_on_or_after: chrono::NaiveDate::from_ymd_opt(2026, 3, 1),
            expires_before: chrono::NaiveDate::from_ymd_opt(2026, 3, 11),
            ..Default::default()
        };
        let found = ProductRepository::find(&store, &between).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sku(), "MILK-1");
    }
}
