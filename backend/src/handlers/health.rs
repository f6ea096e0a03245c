//! Health check endpoint

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::AppState;
use shared::ApiResponse;

pub async fn health_check(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Value>>> {
    let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    Ok(Json(ApiResponse::ok(json!({
        "status": if db_ok { "healthy" } else { "degraded" },
        "database": db_ok,
        "version": env!("CARGO_PKG_VERSION"),
    }))))
}
