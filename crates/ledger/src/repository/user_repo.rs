//! 用户仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::UserRepositoryTrait;
use crate::error::{LedgerError, Result, is_unique_violation};
use crate::models::User;

/// 用户仓储
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 创建用户
    pub async fn create_user(&self, login: &str, password_hash: &str) -> Result<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (login, password_hash, created_at)
            VALUES ($1, $2, NOW())
            RETURNING id, login, password_hash, created_at
            "#,
        )
        .bind(login)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match created {
            Ok(user) => Ok(user),
            Err(e) if is_unique_violation(&e) => {
                Err(LedgerError::UserAlreadyExists(login.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 按登录名查询用户
    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, login, password_hash, created_at FROM users WHERE login = $1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserRepositoryTrait for PgUserRepository {
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<User> {
        self.create_user(login, password_hash).await
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        self.find_by_login(login).await
    }
}
