// src/models/result.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// Score for one topic within a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicScore {
    pub percentage: f64,
    /// "Aprobado" or "Reprobado".
    pub status: String,
    pub correct: u32,
    pub total: u32,
}

/// Represents the 'student_results' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudentResult {
    pub id: String,
    pub student_name: String,

    /// Code the student used; may belong to an exam or one of its versions.
    pub exam_code: String,
    pub exam_id: Option<String>,

    /// Raw answers as submitted.
    /// Key: question index (0-based, as text)
    /// Value: selected option label
    pub answers: Json<HashMap<String, String>>,

    pub correct_answers: i32,
    pub total_questions: i32,
    pub overall_percentage: f64,
    pub topic_scores: Json<BTreeMap<String, TopicScore>>,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for a student submitting an exam.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitExamRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Faltan parámetros obligatorios"))]
    pub student_name: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 10, message = "Faltan parámetros obligatorios"))]
    pub exam_code: String,

    #[serde(default)]
    pub answers: HashMap<String, String>,
}

/// DTO returned to the student after grading.
#[derive(Debug, Serialize)]
pub struct SubmitExamResponse {
    pub result_id: String,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub overall_percentage: f64,
    pub topic_scores: BTreeMap<String, TopicScore>,
    pub success: bool,
}

/// One row of a teacher's results listing.
#[derive(Debug, Serialize)]
pub struct ResultSummary {
    pub result_id: String,
    pub student_name: String,
    pub exam_code: String,
    pub overall_percentage: f64,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub topic_scores: BTreeMap<String, TopicScore>,
}

impl From<StudentResult> for ResultSummary {
    fn from(result: StudentResult) -> Self {
        Self {
            result_id: result.id,
            student_name: result.student_name,
            exam_code: result.exam_code,
            overall_percentage: result.overall_percentage,
            submitted_at: result.submitted_at,
            topic_scores: result.topic_scores.0,
        }
    }
}
