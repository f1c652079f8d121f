//! 密码处理
//!
//! bcrypt 哈希与校验。两者都是 CPU 密集型操作，放到阻塞线程池执行。

use bcrypt::{hash, verify};

use crate::error::ApiError;

/// 对密码进行哈希处理
pub async fn hash_password(password: &str, cost: u32) -> Result<String, ApiError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("密码哈希任务失败: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("密码哈希失败: {}", e)))
}

/// 验证密码
///
/// 比较明文密码与存储的哈希值
pub async fn verify_password(password: &str, hashed: &str) -> Result<bool, ApiError> {
    let password = password.to_string();
    let hashed = hashed.to_string();
    tokio::task::spawn_blocking(move || verify(password, &hashed))
        .await
        .map_err(|e| ApiError::Internal(format!("密码验证任务失败: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("密码验证失败: {}", e)))
}
