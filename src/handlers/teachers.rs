// src/handlers/teachers.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::teacher::{Teacher, TeacherCredentials},
    store::{DynStore, StoreError},
};

/// Registers a new teacher.
///
/// Returns the generated teacher id. Emails are unique.
pub async fn register_teacher(
    State(store): State<DynStore>,
    Json(payload): Json<TeacherCredentials>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.trimmed();
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let teacher = Teacher {
        id: Uuid::new_v4().to_string(),
        name: payload.name,
        email: payload.email,
        created_at: None,
    };

    store.insert_teacher(&teacher).await.map_err(|e| match e {
        StoreError::Conflict(_) => AppError::BadRequest("Email already exists".to_string()),
        other => AppError::from(other),
    })?;

    tracing::info!(teacher_id = %teacher.id, "Teacher registered");

    Ok(Json(json!({
        "teacher_id": teacher.id,
        "success": true
    })))
}

/// Looks a teacher up by name and email.
pub async fn login_teacher(
    State(store): State<DynStore>,
    Json(payload): Json<TeacherCredentials>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.trimmed();
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let teacher = store
        .find_teacher_by_credentials(&payload.name, &payload.email)
        .await?;

    let response = match teacher {
        Some(teacher) => (
            StatusCode::OK,
            Json(json!({
                "teacher_id": teacher.id,
                "success": true,
                "message": "Login exitoso"
            })),
        ),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "error": "Credenciales incorrectas"
            })),
        ),
    };

    Ok(response)
}
