// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::{
    config::{
        DEFAULT_DIFFICULTY, DEFAULT_QUESTION_COUNT, DEFAULT_TIME_LIMIT, MAX_QUESTION_COUNT,
        MAX_VERSIONS_PER_REQUEST,
    },
    models::question::{PublicQuestion, QuestionRecord},
};

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Exam {
    pub id: String,
    pub teacher_id: String,

    /// Short code students type in to open the exam.
    pub exam_code: String,

    /// Full question list including the answer key, stored as JSONB.
    pub questions: Json<Vec<QuestionRecord>>,

    /// Minutes.
    pub time_limit: i32,

    pub difficulty: String,

    /// Number of versions generated so far, the original included.
    pub versions: i32,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'exam_versions' table in the database.
/// A shuffled copy of an exam with its own code.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExamVersion {
    pub id: String,
    pub original_exam_id: String,
    pub version_code: String,
    pub questions: Json<Vec<QuestionRecord>>,
    pub time_limit: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// An exam or version found by its code.
#[derive(Debug, Clone)]
pub struct ExamLookup {
    pub exam_id: String,
    pub questions: Vec<QuestionRecord>,
    pub time_limit: i32,
    pub is_version: bool,
}

fn default_question_count() -> u32 {
    DEFAULT_QUESTION_COUNT
}

fn default_difficulty() -> String {
    DEFAULT_DIFFICULTY.to_string()
}

fn default_time_limit() -> i32 {
    DEFAULT_TIME_LIMIT
}

fn default_versions() -> u32 {
    1
}

/// DTO for generating an exam from a previously uploaded PDF.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateExamRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 36, message = "Faltan parámetros obligatorios"))]
    pub teacher_id: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Faltan parámetros obligatorios"))]
    pub file_path: String,

    #[serde(default = "default_question_count")]
    #[validate(range(max = MAX_QUESTION_COUNT))]
    pub num_questions: u32,

    #[serde(default = "default_difficulty")]
    #[validate(length(min = 1, max = 20))]
    pub difficulty: String,

    #[serde(default = "default_time_limit")]
    #[validate(range(min = 1, max = 600))]
    pub time_limit: i32,
}

/// DTO returned after an exam is generated and stored.
#[derive(Debug, Serialize)]
pub struct GenerateExamResponse {
    pub exam_id: String,
    pub exam_code: String,
    pub questions: Vec<QuestionRecord>,
    pub success: bool,
}

/// One row of a teacher's exam listing.
#[derive(Debug, Serialize)]
pub struct ExamSummary {
    pub exam_id: String,
    pub exam_code: String,
    pub num_questions: usize,
    pub difficulty: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub versions: i32,
}

impl From<&Exam> for ExamSummary {
    fn from(exam: &Exam) -> Self {
        Self {
            exam_id: exam.id.clone(),
            exam_code: exam.exam_code.clone(),
            num_questions: exam.questions.len(),
            difficulty: exam.difficulty.clone(),
            created_at: exam.created_at,
            versions: exam.versions,
        }
    }
}

/// DTO for requesting shuffled versions of an exam.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateVersionsRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 36, message = "Faltan parámetros obligatorios"))]
    pub exam_id: String,

    #[serde(default = "default_versions")]
    #[validate(range(min = 1, max = MAX_VERSIONS_PER_REQUEST))]
    pub num_versions: u32,
}

#[derive(Debug, Serialize)]
pub struct VersionSummary {
    pub version_id: String,
    pub version_code: String,
}

/// DTO for a student opening an exam. Answer keys are stripped.
#[derive(Debug, Serialize)]
pub struct ExamForStudent {
    pub exam_id: String,
    pub questions: Vec<PublicQuestion>,
    pub time_limit: i32,
    pub is_version: bool,
}

impl From<&ExamLookup> for ExamForStudent {
    fn from(lookup: &ExamLookup) -> Self {
        Self {
            exam_id: lookup.exam_id.clone(),
            questions: lookup.questions.iter().map(PublicQuestion::from).collect(),
            time_limit: lookup.time_limit,
            is_version: lookup.is_version,
        }
    }
}
