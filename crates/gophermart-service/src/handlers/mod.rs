//! HTTP 请求处理器

pub mod balance;
pub mod health;
pub mod orders;
pub mod user;
