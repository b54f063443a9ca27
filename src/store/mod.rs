// src/store/mod.rs

//! Record storage for teachers, exams, versions and results.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    exam::{Exam, ExamLookup, ExamVersion},
    result::StudentResult,
    teacher::Teacher,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique column already holds the value (e.g. email, exam code).
    #[error("duplicate value for {0}")]
    Conflict(String),

    /// A referenced row (e.g. the teacher of a new exam) does not exist.
    #[error("referenced {0} does not exist")]
    MissingReference(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Shared handle used by the handlers.
pub type DynStore = Arc<dyn ExamStore>;

/// Every operation is atomic on its own; nothing spans several calls.
#[async_trait]
pub trait ExamStore: Send + Sync {
    /// Cheap round trip for health checks.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn insert_teacher(&self, teacher: &Teacher) -> Result<(), StoreError>;

    async fn find_teacher_by_credentials(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<Teacher>, StoreError>;

    async fn find_teacher_by_id(&self, id: &str) -> Result<Option<Teacher>, StoreError>;

    /// Exam codes and version codes share one namespace; a clash with either
    /// table is a `Conflict`.
    async fn insert_exam(&self, exam: &Exam) -> Result<(), StoreError>;

    /// Newest first.
    async fn fetch_exams_by_teacher(&self, teacher_id: &str) -> Result<Vec<Exam>, StoreError>;

    async fn fetch_exam_by_id(&self, id: &str) -> Result<Option<Exam>, StoreError>;

    /// Stores the version and bumps the parent's `versions` counter together.
    async fn insert_exam_version(&self, version: &ExamVersion) -> Result<(), StoreError>;

    /// Looks in exams first, then in versions.
    async fn fetch_exam_by_code(&self, code: &str) -> Result<Option<ExamLookup>, StoreError>;

    async fn insert_result(&self, result: &StudentResult) -> Result<(), StoreError>;

    /// Results submitted against the teacher's exams or their versions, newest first.
    async fn fetch_results_by_teacher(
        &self,
        teacher_id: &str,
    ) -> Result<Vec<StudentResult>, StoreError>;

    async fn fetch_result_by_id(&self, id: &str) -> Result<Option<StudentResult>, StoreError>;
}
