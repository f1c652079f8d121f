//! 用户注册与登录
//!
//! 成功后同时通过 `Authorization` 头和 `token` Cookie 下发 Token

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{info, warn};
use validator::Validate;

use crate::auth::{hash_password, verify_password};
use crate::dto::{CredentialsRequest, TokenResponse};
use crate::error::{ApiError, Result};
use crate::middleware::TOKEN_COOKIE;
use crate::state::AppState;

/// 用户注册
///
/// POST /api/user/register
pub async fn register(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(req) = payload?;
    req.validate()?;

    let password_hash = hash_password(&req.password, state.password_cost).await?;
    let user = state.users.create_user(&req.login, &password_hash).await?;
    info!(user_id = user.id, login = %user.login, "用户注册成功");

    issue_token(&state, user.id, &user.login)
}

/// 用户登录
///
/// POST /api/user/login
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(req) = payload?;
    req.validate()?;

    let Some(user) = state.users.find_by_login(&req.login).await? else {
        warn!(login = %req.login, "登录失败：用户不存在");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password(&req.password, &user.password_hash).await? {
        warn!(login = %req.login, "登录失败：密码错误");
        return Err(ApiError::InvalidCredentials);
    }

    info!(user_id = user.id, "用户登录成功");
    issue_token(&state, user.id, &user.login)
}

fn issue_token(state: &AppState, user_id: i64, login: &str) -> Result<Response> {
    let (token, expires_at) = state.jwt_manager.generate_token(user_id, login)?;

    let bearer = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| ApiError::Internal(format!("Token 无法写入响应头: {}", e)))?;
    let cookie = Cookie::build((TOKEN_COOKIE, token.clone()))
        .path("/api")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((
        CookieJar::new().add(cookie),
        [(header::AUTHORIZATION, bearer)],
        Json(TokenResponse { token, expires_at }),
    )
        .into_response())
}
