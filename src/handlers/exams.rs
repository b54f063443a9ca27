// src/handlers/exams.rs

use std::{path::Path as FsPath, sync::Arc};

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
    config::Config,
    error::AppError,
    models::exam::{
        Exam, ExamForStudent, ExamSummary, ExamVersion, GenerateExamRequest,
        GenerateExamResponse, GenerateVersionsRequest, VersionSummary,
    },
    pipeline::{ExamAssembler, ExtractionError, shuffler},
    store::{DynStore, StoreError},
    utils::{codes, files},
};

/// Attempts per record before giving up on finding a free code.
const CODE_ATTEMPTS: usize = 5;

/// Runs `insert` with fresh random codes until one is not taken.
async fn insert_with_fresh_code<T, F, Fut>(mut insert: F) -> Result<T, StoreError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    for attempt in 1..=CODE_ATTEMPTS {
        let code = codes::exam_code(&mut rand::thread_rng());
        match insert(code).await {
            Err(StoreError::Conflict(what)) => {
                tracing::warn!(attempt, "Code collision on {}, retrying", what);
            }
            other => return other,
        }
    }
    Err(StoreError::Conflict("exam code".to_string()))
}

/// Codes are generated uppercase; students may type them in any case.
pub(crate) fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Generates an exam from a staged PDF and stores it under a new code.
///
/// The PDF is removed once the exam is stored.
pub async fn generate_exam(
    State(store): State<DynStore>,
    State(config): State<Config>,
    State(assembler): State<Arc<ExamAssembler>>,
    Json(payload): Json<GenerateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // Checked before any LLM call; the staged PDF stays for a retry.
    if store.find_teacher_by_id(&payload.teacher_id).await?.is_none() {
        return Err(AppError::BadRequest("Teacher not found".to_string()));
    }

    let source = files::resolve_within(FsPath::new(&config.upload_dir), &payload.file_path)
        .await
        .map_err(|_| ExtractionError::NotFound(payload.file_path.clone()))?
        .ok_or_else(|| AppError::BadRequest("Invalid file path".to_string()))?;

    let spec = assembler.spec(source.clone(), payload.num_questions as usize, &payload.difficulty);
    let questions = assembler.assemble(&spec).await?;

    if questions.is_empty() {
        return Err(AppError::BadRequest(
            "La generación del examen falló, no hay preguntas.".to_string(),
        ));
    }

    let exam = insert_with_fresh_code(|code| {
        let exam = Exam {
            id: Uuid::new_v4().to_string(),
            teacher_id: payload.teacher_id.clone(),
            exam_code: code,
            questions: SqlJson(questions.clone()),
            time_limit: payload.time_limit,
            difficulty: payload.difficulty.clone(),
            versions: 1,
            created_at: None,
        };
        let store = store.clone();
        async move { store.insert_exam(&exam).await.map(|_| exam) }
    })
    .await?;

    if let Err(e) = tokio::fs::remove_file(&source).await {
        tracing::warn!("Failed to remove staged PDF {}: {:?}", source.display(), e);
    }

    tracing::info!(
        exam_id = %exam.id,
        exam_code = %exam.exam_code,
        questions = exam.questions.len(),
        "Exam generated"
    );

    Ok(Json(GenerateExamResponse {
        exam_id: exam.id,
        exam_code: exam.exam_code,
        questions: exam.questions.0,
        success: true,
    }))
}

/// Lists a teacher's exams, newest first.
pub async fn get_teacher_exams(
    State(store): State<DynStore>,
    Path(teacher_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let exams = store.fetch_exams_by_teacher(&teacher_id).await?;
    let exams: Vec<ExamSummary> = exams.iter().map(ExamSummary::from).collect();

    Ok(Json(json!({ "exams": exams })))
}

/// Stores `num_versions` shuffled copies of an exam, each with its own code.
pub async fn generate_exam_versions(
    State(store): State<DynStore>,
    Json(payload): Json<GenerateVersionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let original = store
        .fetch_exam_by_id(&payload.exam_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;

    let mut versions = Vec::with_capacity(payload.num_versions as usize);
    for _ in 0..payload.num_versions {
        let variant = shuffler::make_variant(&original.questions, None);

        let version = insert_with_fresh_code(|code| {
            let version = ExamVersion {
                id: Uuid::new_v4().to_string(),
                original_exam_id: original.id.clone(),
                version_code: code,
                questions: SqlJson(variant.clone()),
                time_limit: original.time_limit,
                created_at: None,
            };
            let store = store.clone();
            async move { store.insert_exam_version(&version).await.map(|_| version) }
        })
        .await?;

        versions.push(VersionSummary {
            version_id: version.id,
            version_code: version.version_code,
        });
    }

    tracing::info!(exam_id = %original.id, count = versions.len(), "Exam versions generated");

    Ok(Json(json!({
        "versions": versions,
        "success": true
    })))
}

/// Opens an exam or version by code for a student. Answer keys are not sent.
pub async fn get_exam(
    State(store): State<DynStore>,
    Path(exam_code): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let lookup = store
        .fetch_exam_by_code(&normalize_code(&exam_code))
        .await?
        .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;

    Ok(Json(ExamForStudent::from(&lookup)))
}
