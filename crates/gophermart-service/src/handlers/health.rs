//! 存活与就绪探针

use axum::{Json, extract::State, http::StatusCode};

use crate::dto::HealthResponse;
use crate::state::AppState;

const SERVICE: &str = "gophermart";

/// 存活探针：服务进程正常即返回 ok
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE,
        database: None,
    })
}

/// 就绪探针：检查数据库连接
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let Some(db) = state.db.as_ref() else {
        return (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                service: SERVICE,
                database: None,
            }),
        );
    };

    let db_ok = db.health_check().await.is_ok();
    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if db_ok { "ok" } else { "degraded" },
            service: SERVICE,
            database: Some(if db_ok { "ok" } else { "fail" }),
        }),
    )
}
