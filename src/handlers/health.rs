// src/handlers/health.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Local;
use serde_json::json;

use crate::store::DynStore;

/// Reports whether the store answers.
pub async fn health_check(State(store): State<DynStore>) -> impl IntoResponse {
    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "OK",
                "message": "Backend funcionando",
                "database": "connected",
                "timestamp": Local::now().to_rfc3339()
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "ERROR",
                    "message": "Error de conexión a base de datos"
                })),
            )
        }
    }
}
