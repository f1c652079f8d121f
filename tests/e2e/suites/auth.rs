//! 认证测试套件

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use crate::TestEnvironment;

    #[tokio::test]
    async fn test_register_login_and_conflict() {
        let env = TestEnvironment::start().await.unwrap();

        let mut client = env.client();
        assert_eq!(client.health().await.unwrap(), StatusCode::OK);
        assert_eq!(
            client.register("alice", "alice-pw").await.unwrap(),
            StatusCode::OK
        );
        assert_eq!(
            client.register("alice", "other").await.unwrap(),
            StatusCode::CONFLICT
        );

        let mut other = env.client();
        assert_eq!(
            other.login("alice", "wrong").await.unwrap(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            other.login("alice", "alice-pw").await.unwrap(),
            StatusCode::OK
        );
        assert_eq!(other.balance().await.unwrap().current, 0.0);

        env.shutdown().await;
    }

    #[tokio::test]
    async fn test_anonymous_requests_rejected() {
        let env = TestEnvironment::start().await.unwrap();
        let anonymous = env.client();

        assert_eq!(
            anonymous.submit_order("12345678903").await.unwrap(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(anonymous.orders().await.unwrap().0, StatusCode::UNAUTHORIZED);
        assert!(anonymous.balance().await.is_err());
        assert!(env.store.order("12345678903").is_none());

        env.shutdown().await;
    }
}
