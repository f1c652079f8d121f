//! PostgreSQL 仓储集成测试
//!
//! 需要数据库：`DATABASE_URL=postgres://... cargo test -- --ignored`

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use futures::future::join_all;
use gophermart_ledger::LedgerError;
use gophermart_ledger::models::{InsertOrderResult, OrderStatus};
use gophermart_ledger::repository::{
    PgBalanceRepository, PgOrderRepository, PgReconciliationRepository, PgUserRepository,
};
use gophermart_shared::config::DatabaseConfig;
use gophermart_shared::database::Database;

async fn setup() -> Database {
    let config = DatabaseConfig {
        url: std::env::var("DATABASE_URL").unwrap_or_else(|_| DatabaseConfig::default().url),
        max_connections: 20,
        ..Default::default()
    };
    let db = Database::connect(&config).await.unwrap();
    db.run_migrations().await.unwrap();
    db
}

/// 生成唯一后缀，避免并行测试互相干扰
fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

async fn create_user(db: &Database) -> i64 {
    PgUserRepository::new(db.pool().clone())
        .create_user(&unique("user"), "hash")
        .await
        .unwrap()
        .id
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_user_login_is_unique() {
    let db = setup().await;
    let users = PgUserRepository::new(db.pool().clone());
    let login = unique("alice");

    users.create_user(&login, "hash").await.unwrap();
    assert!(matches!(
        users.create_user(&login, "other").await,
        Err(LedgerError::UserAlreadyExists(_))
    ));
    assert_eq!(
        users.find_by_login(&login).await.unwrap().unwrap().password_hash,
        "hash"
    );
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_order_insert_reports_owner() {
    let db = setup().await;
    let orders = PgOrderRepository::new(db.pool().clone());
    let (alice, bob) = (create_user(&db).await, create_user(&db).await);
    let number = unique("order");

    assert_eq!(
        orders.insert_order(alice, &number).await.unwrap(),
        InsertOrderResult::Inserted
    );
    assert_eq!(
        orders.insert_order(bob, &number).await.unwrap(),
        InsertOrderResult::Exists { owner_id: alice }
    );

    let listed = orders.list_user_orders(alice).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, OrderStatus::New);
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_concurrent_withdrawals_are_serialized() {
    let db = setup().await;
    let user_id = create_user(&db).await;
    let number = unique("credit");
    PgOrderRepository::new(db.pool().clone())
        .insert_order(user_id, &number)
        .await
        .unwrap();
    PgReconciliationRepository::new(db.pool().clone())
        .apply_accrual(&number, 10_000)
        .await
        .unwrap();

    let balances = Arc::new(PgBalanceRepository::new(db.pool().clone()));
    let results = join_all((0..10).map(|i| {
        let balances = balances.clone();
        let number = format!("{}-w{}", number, i);
        async move { balances.withdraw(user_id, &number, 3_000).await }
    }))
    .await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
    let balance = balances.balance(user_id).await.unwrap();
    assert_eq!((balance.current, balance.withdrawn), (1_000, 9_000));
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_duplicate_withdrawal_rolls_back() {
    let db = setup().await;
    let user_id = create_user(&db).await;
    let number = unique("credit");
    PgOrderRepository::new(db.pool().clone())
        .insert_order(user_id, &number)
        .await
        .unwrap();
    PgReconciliationRepository::new(db.pool().clone())
        .apply_accrual(&number, 5_000)
        .await
        .unwrap();

    let balances = PgBalanceRepository::new(db.pool().clone());
    let withdraw_number = unique("withdraw");
    balances.withdraw(user_id, &withdraw_number, 1_000).await.unwrap();
    assert!(matches!(
        balances.withdraw(user_id, &withdraw_number, 1_000).await,
        Err(LedgerError::DuplicateWithdrawal(_))
    ));
    assert!(matches!(
        balances.withdraw(user_id, &unique("withdraw"), 100_000).await,
        Err(LedgerError::InsufficientFunds { .. })
    ));

    let balance = balances.balance(user_id).await.unwrap();
    assert_eq!((balance.current, balance.withdrawn), (4_000, 1_000));
    assert_eq!(balances.list_withdrawals(user_id).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_reconciliation_guards() {
    let db = setup().await;
    let user_id = create_user(&db).await;
    let number = unique("order");
    PgOrderRepository::new(db.pool().clone())
        .insert_order(user_id, &number)
        .await
        .unwrap();

    let repo = PgReconciliationRepository::new(db.pool().clone());
    let pending = repo.list_pending(1_000, Utc::now()).await.unwrap();
    assert!(pending.iter().any(|o| o.number == number));

    // 推迟后不再到期
    repo.touch_sync(&number, Utc::now() + TimeDelta::seconds(120))
        .await
        .unwrap();
    let pending = repo.list_pending(1_000, Utc::now()).await.unwrap();
    assert!(!pending.iter().any(|o| o.number == number));

    // 只入账一次
    assert!(repo.apply_accrual(&number, 700).await.unwrap());
    assert!(!repo.apply_accrual(&number, 700).await.unwrap());
    let balance = PgBalanceRepository::new(db.pool().clone())
        .balance(user_id)
        .await
        .unwrap();
    assert_eq!(balance.current, 700);

    // 终态订单不会被回退
    repo.update_status(&number, OrderStatus::Processing, Utc::now())
        .await
        .unwrap();
    let orders = PgOrderRepository::new(db.pool().clone())
        .list_user_orders(user_id)
        .await
        .unwrap();
    assert_eq!(orders[0].status, OrderStatus::Processed);
    assert_eq!(orders[0].accrual, Some(700));
}

#[tokio::test]
#[ignore] // 需要数据库连接
async fn test_invalid_order_not_credited() {
    let db = setup().await;
    let user_id = create_user(&db).await;
    let number = unique("order");
    PgOrderRepository::new(db.pool().clone())
        .insert_order(user_id, &number)
        .await
        .unwrap();

    let repo = PgReconciliationRepository::new(db.pool().clone());
    repo.update_status(&number, OrderStatus::Invalid, Utc::now())
        .await
        .unwrap();
    assert!(!repo.apply_accrual(&number, 700).await.unwrap());

    let balance = PgBalanceRepository::new(db.pool().clone())
        .balance(user_id)
        .await
        .unwrap();
    assert_eq!(balance.current, 0);
    let orders = PgOrderRepository::new(db.pool().clone())
        .list_user_orders(user_id)
        .await
        .unwrap();
    assert_eq!(orders[0].status, OrderStatus::Invalid);
    assert_eq!(orders[0].accrual, None);
}
