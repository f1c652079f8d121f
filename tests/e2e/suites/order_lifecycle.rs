//! 订单全链路测试套件
//!
//! 提交订单 -> 对账推进状态 -> 入账 -> 提现

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::StatusCode;

    use crate::TestEnvironment;
    use crate::helpers::wait_until;

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_order_processed_and_credited() {
        let env = TestEnvironment::start().await.unwrap();
        let client = env.user("alice").await.unwrap();

        assert_eq!(
            env.accrual.register_order("12345678903").await.unwrap(),
            StatusCode::ACCEPTED
        );
        assert_eq!(
            client.submit_order("12345678903").await.unwrap(),
            StatusCode::ACCEPTED
        );
        assert_eq!(
            client.submit_order("12345678903").await.unwrap(),
            StatusCode::OK
        );

        // REGISTERED -> PROCESSING -> PROCESSED(480.03)
        let api = &client;
        let processed = wait_until(TIMEOUT, || async move {
            matches!(
                api.order("12345678903").await,
                Ok(Some(order)) if order.status == "PROCESSED"
            )
        })
        .await;
        assert!(processed, "订单未在超时前处理完成");

        let order = client.order("12345678903").await.unwrap().unwrap();
        assert_eq!(order.accrual, Some(480.03));
        assert!(order.uploaded_at.ends_with('Z'));

        let balance = client.balance().await.unwrap();
        assert_eq!(balance.current, 480.03);
        assert_eq!(balance.withdrawn, 0.0);

        // 终态订单不再被查询，余额保持不变
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(client.balance().await.unwrap().current, 480.03);

        env.shutdown().await;
    }

    #[tokio::test]
    async fn test_withdraw_after_credit() {
        let env = TestEnvironment::start().await.unwrap();
        let client = env.user("bob").await.unwrap();

        env.accrual
            .script("79927398713", "PROCESSED", Some(500.0))
            .await
            .unwrap();
        assert_eq!(
            client.submit_order("79927398713").await.unwrap(),
            StatusCode::ACCEPTED
        );

        let api = &client;
        let credited = wait_until(TIMEOUT, || async move {
            matches!(api.balance().await, Ok(b) if b.current == 500.0)
        })
        .await;
        assert!(credited, "余额未在超时前入账");

        assert_eq!(
            client.withdraw("2377225624", 600.0).await.unwrap(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            client.withdraw("2377225623", 1.0).await.unwrap(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            client.withdraw("2377225624", 100.5).await.unwrap(),
            StatusCode::OK
        );
        assert_eq!(
            client.withdraw("2377225624", 1.0).await.unwrap(),
            StatusCode::CONFLICT
        );

        let balance = client.balance().await.unwrap();
        assert_eq!(balance.current, 399.5);
        assert_eq!(balance.withdrawn, 100.5);

        let (status, withdrawals) = client.withdrawals().await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(withdrawals.len(), 1);
        assert_eq!(withdrawals[0].order, "2377225624");
        assert_eq!(withdrawals[0].sum, 100.5);
        assert!(!withdrawals[0].processed_at.is_empty());

        env.shutdown().await;
    }

    #[tokio::test]
    async fn test_invalid_and_unknown_orders() {
        let env = TestEnvironment::start().await.unwrap();
        let client = env.user("carol").await.unwrap();

        // 以 0 结尾的订单被 Mock 判定为 INVALID
        env.accrual.register_order("9278923470").await.unwrap();
        assert_eq!(
            client.submit_order("9278923470").await.unwrap(),
            StatusCode::ACCEPTED
        );
        // 未在积分服务登记的订单始终为 NEW
        assert_eq!(
            client.submit_order("346436439").await.unwrap(),
            StatusCode::ACCEPTED
        );

        let api = &client;
        let invalid = wait_until(TIMEOUT, || async move {
            matches!(
                api.order("9278923470").await,
                Ok(Some(order)) if order.status == "INVALID"
            )
        })
        .await;
        assert!(invalid, "订单未在超时前变为 INVALID");

        let (status, orders) = client.orders().await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].number, "9278923470");
        assert_eq!(orders[0].accrual, None);
        assert_eq!(orders[1].number, "346436439");
        assert_eq!(orders[1].status, "NEW");
        assert_eq!(client.balance().await.unwrap().current, 0.0);

        env.shutdown().await;
    }

    #[tokio::test]
    async fn test_order_owned_by_another_user() {
        let env = TestEnvironment::start().await.unwrap();
        let alice = env.user("alice").await.unwrap();
        let bob = env.user("bob").await.unwrap();

        assert_eq!(
            alice.submit_order("4561261212345467").await.unwrap(),
            StatusCode::ACCEPTED
        );
        assert_eq!(
            bob.submit_order("4561261212345467").await.unwrap(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            bob.submit_order("4561261212345464").await.unwrap(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let (status, orders) = bob.orders().await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(orders.is_empty());

        env.shutdown().await;
    }
}
