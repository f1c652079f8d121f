use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// 用户账号
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
