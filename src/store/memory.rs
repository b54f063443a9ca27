// src/store/memory.rs

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    models::{
        exam::{Exam, ExamLookup, ExamVersion},
        result::StudentResult,
        teacher::Teacher,
    },
    store::{ExamStore, StoreError},
};

#[derive(Default)]
struct Tables {
    teachers: Vec<Teacher>,
    exams: Vec<Exam>,
    versions: Vec<ExamVersion>,
    results: Vec<StudentResult>,
}

/// In-process store with the same constraints as the Postgres schema.
/// Rows are kept in insertion order; "newest first" reads walk it backwards.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExamStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_teacher(&self, teacher: &Teacher) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.teachers.iter().any(|t| t.email == teacher.email || t.id == teacher.id) {
            return Err(StoreError::Conflict("teacher email".to_string()));
        }

        let mut row = teacher.clone();
        row.created_at.get_or_insert_with(Utc::now);
        tables.teachers.push(row);
        Ok(())
    }

    async fn find_teacher_by_credentials(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<Teacher>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .teachers
            .iter()
            .find(|t| t.name == name && t.email == email)
            .cloned())
    }

    async fn find_teacher_by_id(&self, id: &str) -> Result<Option<Teacher>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.teachers.iter().find(|t| t.id == id).cloned())
    }

    async fn insert_exam(&self, exam: &Exam) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.teachers.iter().any(|t| t.id == exam.teacher_id) {
            return Err(StoreError::MissingReference("exam".to_string()));
        }
        if tables.exams.iter().any(|e| e.id == exam.id || e.exam_code == exam.exam_code)
            || tables.versions.iter().any(|v| v.version_code == exam.exam_code)
        {
            return Err(StoreError::Conflict("exam".to_string()));
        }

        let mut row = exam.clone();
        row.created_at.get_or_insert_with(Utc::now);
        tables.exams.push(row);
        Ok(())
    }

    async fn fetch_exams_by_teacher(&self, teacher_id: &str) -> Result<Vec<Exam>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .exams
            .iter()
            .rev()
            .filter(|e| e.teacher_id == teacher_id)
            .cloned()
            .collect())
    }

    async fn fetch_exam_by_id(&self, id: &str) -> Result<Option<Exam>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.exams.iter().find(|e| e.id == id).cloned())
    }

    async fn insert_exam_version(&self, version: &ExamVersion) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables
            .versions
            .iter()
            .any(|v| v.id == version.id || v.version_code == version.version_code)
            || tables.exams.iter().any(|e| e.exam_code == version.version_code)
        {
            return Err(StoreError::Conflict("exam version".to_string()));
        }

        let parent = tables
            .exams
            .iter_mut()
            .find(|e| e.id == version.original_exam_id)
            .ok_or_else(|| StoreError::MissingReference("exam version".to_string()))?;
        parent.versions += 1;

        let mut row = version.clone();
        row.created_at.get_or_insert_with(Utc::now);
        tables.versions.push(row);
        Ok(())
    }

    async fn fetch_exam_by_code(&self, code: &str) -> Result<Option<ExamLookup>, StoreError> {
        let tables = self.tables.read().await;

        if let Some(exam) = tables.exams.iter().find(|e| e.exam_code == code) {
            return Ok(Some(ExamLookup {
                exam_id: exam.id.clone(),
                questions: exam.questions.0.clone(),
                time_limit: exam.time_limit,
                is_version: false,
            }));
        }

        Ok(tables
            .versions
            .iter()
            .find(|v| v.version_code == code)
            .map(|v| ExamLookup {
                exam_id: v.id.clone(),
                questions: v.questions.0.clone(),
                time_limit: v.time_limit,
                is_version: true,
            }))
    }

    async fn insert_result(&self, result: &StudentResult) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.results.iter().any(|r| r.id == result.id) {
            return Err(StoreError::Conflict("result".to_string()));
        }

        let mut row = result.clone();
        row.submitted_at.get_or_insert_with(Utc::now);
        tables.results.push(row);
        Ok(())
    }

    async fn fetch_results_by_teacher(
        &self,
        teacher_id: &str,
    ) -> Result<Vec<StudentResult>, StoreError> {
        let tables = self.tables.read().await;

        let exam_ids: Vec<&str> = tables
            .exams
            .iter()
            .filter(|e| e.teacher_id == teacher_id)
            .map(|e| e.id.as_str())
            .collect();

        let codes: Vec<&str> = tables
            .exams
            .iter()
            .filter(|e| e.teacher_id == teacher_id)
            .map(|e| e.exam_code.as_str())
            .chain(
                tables
                    .versions
                    .iter()
                    .filter(|v| exam_ids.contains(&v.original_exam_id.as_str()))
                    .map(|v| v.version_code.as_str()),
            )
            .collect();

        Ok(tables
            .results
            .iter()
            .rev()
            .filter(|r| codes.contains(&r.exam_code.as_str()))
            .cloned()
            .collect())
    }

    async fn fetch_result_by_id(&self, id: &str) -> Result<Option<StudentResult>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.results.iter().find(|r| r.id == id).cloned())
    }
}
