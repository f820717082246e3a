//! Integration tests for the PostgreSQL repositories
//!
//! These tests need a reachable database in `DATABASE_URL`; migrations are
//! applied on connect. Run them with `cargo test -- --ignored`.

use dlvery_api::auth::password::hash_password;
use dlvery_api::domain::delivery::{Delivery, DeliveryItem, DeliveryStatus, NewDelivery};
use dlvery_api::domain::inventory::{InventoryTransaction, TransactionType};
use dlvery_api::domain::product::{Product, ProductCategory, ProductDetails};
use dlvery_api::domain::repositories::{
    ChangeSet, DeliveryQuery, DeliveryRepository, DeliveryWrite, PageRequest, ProductRepository,
    RepositoryError, SortDirection, TransactionQuery, TransactionRepository, UnitOfWork,
    UserRepository, UserSortField,
};
use dlvery_api::domain::user::{Email, User, UserRole};
use dlvery_api::infrastructure::repositories::{
    PostgresDeliveryRepository, PostgresProductRepository, PostgresTransactionRepository,
    PostgresUnitOfWork, PostgresUserRepository,
};
use sqlx::PgPool;
use uuid::Uuid;

/// Set up test database connection pool
async fn setup_test_db() -> PgPool {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Short random suffix so parallel runs do not collide on unique keys
fn suffix() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

fn test_user(role: UserRole) -> User {
    let tag = suffix().to_lowercase();
    User::new(
        format!("user_{}", tag),
        hash_password("password123", 4).expect("hash"),
        Email::new(format!("{}@dlvery.io", tag)).expect("email"),
        "Test User".to_string(),
        role,
        None,
    )
}

fn test_product(quantity: i32) -> Product {
    Product::new(
        format!("T-{}", suffix()),
        ProductDetails {
            name: "Test product".to_string(),
            description: Some("Integration".to_string()),
            category: ProductCategory::Other,
            damaged: false,
            perishable: false,
            expiry_date: None,
            quantity,
        },
    )
    .expect("valid product")
}

#[tokio::test]
#[ignore]
async fn test_user_create_find_and_duplicates() {
    let pool = setup_test_db().await;
    let repo = PostgresUserRepository::new(pool);
    let user = test_user(UserRole::DlTeam);

    repo.create(&user).await.expect("create user");

    let found = repo
        .find_by_username(&user.username)
        .await
        .expect("query")
        .expect("user exists");
    assert_eq!(found.id, user.id);
    assert_eq!(found.role, UserRole::DlTeam);
    assert!(repo.exists_by_email(&user.email).await.expect("query"));

    let mut clash = test_user(UserRole::DlTeam);
    clash.username = user.username.clone();
    let result = repo.create(&clash).await;
    assert!(matches!(result, Err(RepositoryError::Duplicate(ref field)) if field == "username"));

    let page = repo
        .find_page(
            Some(UserRole::DlTeam),
            &PageRequest::new(0, 5, UserSortField::CreatedAt, SortDirection::Desc),
        )
        .await
        .expect("page");
    assert!(page.total_elements >= 1);
    assert!(page.content.len() <= 5);

    repo.delete(user.id).await.expect("delete");
    assert!(repo.find_by_id(user.id).await.expect("query").is_none());
}

#[tokio::test]
#[ignore]
async fn test_product_versioned_update() {
    let pool = setup_test_db().await;
    let repo = PostgresProductRepository::new(pool);
    let product = test_product(5);
    repo.create(&product).await.expect("create product");

    let stored = repo.update(&product).await.expect("first update");
    assert_eq!(stored.version(), product.version() + 1);

    // Writing from the stale copy loses the race
    let result = repo.update(&product).await;
    assert!(matches!(result, Err(RepositoryError::Conflict { .. })));

    let found = repo
        .find_by_sku(product.sku())
        .await
        .expect("query")
        .expect("product exists");
    assert_eq!(found.version(), stored.version());

    repo.delete(product.id()).await.expect("delete");
}

#[tokio::test]
#[ignore]
async fn test_unit_of_work_commits_delivery_with_ledger() {
    let pool = setup_test_db().await;
    let products = PostgresProductRepository::new(pool.clone());
    let deliveries = PostgresDeliveryRepository::new(pool.clone());
    let transactions = PostgresTransactionRepository::new(pool.clone());
    let uow = PostgresUnitOfWork::new(pool);

    let mut product = test_product(5);
    products.create(&product).await.expect("create product");
    let agent = Uuid::new_v4();

    let delivery = Delivery::new(NewDelivery {
        delivery_agent_id: agent,
        items: vec![DeliveryItem::new(&product, 2)],
        customer_name: "Kamala Silva".to_string(),
        customer_address: "12 Temple Rd".to_string(),
        customer_phone: None,
        status: None,
        priority: None,
        scheduled_date: None,
        notes: None,
    })
    .expect("valid delivery");

    let entry = InventoryTransaction::new(
        &product,
        TransactionType::StockOut,
        2,
        agent,
        Some(delivery.id()),
        None,
    )
    .expect("valid entry");
    product.apply_transaction(&entry).expect("stock available");

    uow.commit(ChangeSet {
        delivery: Some(DeliveryWrite::Insert(delivery.clone())),
        products: vec![product.clone()],
        transactions: vec![entry],
    })
    .await
    .expect("commit");

    let stored = products
        .find_by_id(product.id())
        .await
        .expect("query")
        .expect("product exists");
    assert_eq!(stored.quantity(), 3);

    let found = deliveries
        .find(&DeliveryQuery {
            item_sku: Some(product.sku().to_string()),
            ..Default::default()
        })
        .await
        .expect("query");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].status(), DeliveryStatus::Pending);

    let ledger = transactions
        .find(&TransactionQuery {
            delivery_id: Some(delivery.id()),
            ..Default::default()
        })
        .await
        .expect("query");
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].kind, TransactionType::StockOut);
}

#[tokio::test]
#[ignore]
async fn test_unit_of_work_rolls_back_on_stale_product() {
    let pool = setup_test_db().await;
    let products = PostgresProductRepository::new(pool.clone());
    let transactions = PostgresTransactionRepository::new(pool.clone());
    let uow = PostgresUnitOfWork::new(pool);

    let product = test_product(5);
    products.create(&product).await.expect("create product");
    products.update(&product).await.expect("bump version");

    let entry = InventoryTransaction::new(
        &product,
        TransactionType::StockIn,
        1,
        Uuid::new_v4(),
        None,
        None,
    )
    .expect("valid entry");
    let entry_id = entry.id;

    let result = uow
        .commit(ChangeSet {
            delivery: None,
            products: vec![product.clone()],
            transactions: vec![entry],
        })
        .await;
    assert!(matches!(result, Err(RepositoryError::Conflict { .. })));
    assert!(transactions.find_by_id(entry_id).await.expect("query").is_none());
}
