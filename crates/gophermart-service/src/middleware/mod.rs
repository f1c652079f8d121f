//! 中间件模块

mod auth;

pub use auth::{TOKEN_COOKIE, auth_middleware};
