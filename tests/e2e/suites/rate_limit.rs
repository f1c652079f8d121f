//! 积分服务限流测试套件

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::StatusCode;

    use crate::helpers::wait_until;
    use crate::setup::{TestEnvConfig, TestEnvironment};

    const NUMBERS: [&str; 3] = ["12345678903", "2377225624", "49927398716"];

    #[tokio::test]
    async fn test_rate_limited_worker_cools_down() {
        // 每分钟只允许两次查询，冷却远长于测试时长
        let env = TestEnvironment::with_config(TestEnvConfig {
            max_requests_per_minute: 2,
            ..TestEnvConfig::default()
        })
        .await
        .unwrap();
        let client = env.user("dave").await.unwrap();

        for number in NUMBERS {
            env.accrual
                .script(number, "PROCESSED", Some(100.0))
                .await
                .unwrap();
            assert_eq!(
                client.submit_order(number).await.unwrap(),
                StatusCode::ACCEPTED
            );
        }

        let api = &client;
        let two_credited = wait_until(Duration::from_secs(10), || async move {
            matches!(api.balance().await, Ok(b) if b.current == 200.0)
        })
        .await;
        assert!(two_credited, "限流前的两个订单应已入账");

        // 冷却期间不再查询，第三个订单保持 NEW
        tokio::time::sleep(Duration::from_millis(800)).await;
        let (_, orders) = client.orders().await.unwrap();
        let processed = orders.iter().filter(|o| o.status == "PROCESSED").count();
        let pending = orders.iter().filter(|o| o.status == "NEW").count();
        assert_eq!(processed, 2);
        assert_eq!(pending, 1);
        assert_eq!(client.balance().await.unwrap().current, 200.0);

        env.shutdown().await;
    }
}
