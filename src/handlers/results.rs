// src/handlers/results.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::types::Json as SqlJson;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    grading,
    handlers::exams::normalize_code,
    models::result::{ResultSummary, StudentResult, SubmitExamRequest, SubmitExamResponse},
    store::DynStore,
};

/// Grades a submission against the stored answer key and records it.
pub async fn submit_exam(
    State(store): State<DynStore>,
    Json(payload): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let exam_code = normalize_code(&payload.exam_code);
    let lookup = store
        .fetch_exam_by_code(&exam_code)
        .await?
        .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;

    let report = grading::grade(&lookup.questions, &payload.answers);

    let result = StudentResult {
        id: Uuid::new_v4().to_string(),
        student_name: payload.student_name.trim().to_string(),
        exam_code,
        exam_id: Some(lookup.exam_id),
        answers: SqlJson(payload.answers),
        correct_answers: report.correct_count as i32,
        total_questions: report.total as i32,
        overall_percentage: report.overall_percentage,
        topic_scores: SqlJson(report.topic_scores.clone()),
        submitted_at: None,
    };
    store.insert_result(&result).await?;

    tracing::info!(
        result_id = %result.id,
        exam_code = %result.exam_code,
        score = report.overall_percentage,
        "Exam submitted"
    );

    Ok(Json(SubmitExamResponse {
        result_id: result.id,
        correct_answers: report.correct_count,
        total_questions: report.total,
        overall_percentage: report.overall_percentage,
        topic_scores: report.topic_scores,
        success: true,
    }))
}

/// Lists results for every exam and version a teacher owns, newest first.
pub async fn get_student_results(
    State(store): State<DynStore>,
    Path(teacher_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let results: Vec<ResultSummary> = store
        .fetch_results_by_teacher(&teacher_id)
        .await?
        .into_iter()
        .map(ResultSummary::from)
        .collect();

    Ok(Json(json!({ "results": results })))
}

/// Full stored record of one submission, answers included.
pub async fn get_student_details(
    State(store): State<DynStore>,
    Path(result_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = store
        .fetch_result_by_id(&result_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Result not found".to_string()))?;

    Ok(Json(result))
}
