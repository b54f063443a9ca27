// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    models::{
        exam::{Exam, ExamLookup, ExamVersion},
        result::StudentResult,
        teacher::Teacher,
    },
    store::{ExamStore, StoreError},
};

const EXAM_COLUMNS: &str =
    "id, teacher_id, exam_code, questions, time_limit, difficulty, versions, created_at";

const VERSION_COLUMNS: &str =
    "id, original_exam_id, version_code, questions, time_limit, created_at";

const RESULT_COLUMNS: &str = "\
    id, student_name, exam_code, exam_id, answers, correct_answers, \
    total_questions, overall_percentage, topic_scores, submitted_at";

/// Maps constraint violations to their own variants so handlers can answer
/// with 4xx instead of 500.
fn classify(err: sqlx::Error, what: &str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(what.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference(what.to_string());
        }
    }
    tracing::error!("Database error on {}: {:?}", what, err);
    StoreError::Database(err)
}

/// Takes a transaction-scoped lock on `code`, then fails with `Conflict` if
/// `other_table` already uses it. Exam and version codes share one namespace.
async fn claim_code(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    code: &str,
    other_table: &str,
    other_column: &str,
    what: &str,
) -> Result<(), StoreError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(code)
        .execute(&mut **tx)
        .await?;

    let taken: bool = sqlx::query_scalar(&format!(
        "SELECT EXISTS(SELECT 1 FROM {other_table} WHERE {other_column} = $1)"
    ))
    .bind(code)
    .fetch_one(&mut **tx)
    .await?;

    if taken {
        return Err(StoreError::Conflict(what.to_string()));
    }
    Ok(())
}

/// Postgres-backed store. Queries are checked at runtime.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExamStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_teacher(&self, teacher: &Teacher) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO teachers (id, name, email) VALUES ($1, $2, $3)")
            .bind(&teacher.id)
            .bind(&teacher.name)
            .bind(&teacher.email)
            .execute(&self.pool)
            .await
            .map_err(|e| classify(e, "teacher email"))?;
        Ok(())
    }

    async fn find_teacher_by_credentials(
        &self,
        name: &str,
        email: &str,
    ) -> Result<Option<Teacher>, StoreError> {
        let teacher = sqlx::query_as::<_, Teacher>(
            "SELECT id, name, email, created_at FROM teachers WHERE name = $1 AND email = $2",
        )
        .bind(name)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(teacher)
    }

    async fn find_teacher_by_id(&self, id: &str) -> Result<Option<Teacher>, StoreError> {
        let teacher = sqlx::query_as::<_, Teacher>(
            "SELECT id, name, email, created_at FROM teachers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(teacher)
    }

    async fn insert_exam(&self, exam: &Exam) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        claim_code(&mut tx, &exam.exam_code, "exam_versions", "version_code", "exam").await?;

        sqlx::query(
            r#"
            INSERT INTO exams (id, teacher_id, exam_code, questions, time_limit, difficulty, versions)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&exam.id)
        .bind(&exam.teacher_id)
        .bind(&exam.exam_code)
        .bind(&exam.questions)
        .bind(exam.time_limit)
        .bind(&exam.difficulty)
        .bind(exam.versions)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify(e, "exam"))?;

        tx.commit().await?;
        Ok(())
    }

    async fn fetch_exams_by_teacher(&self, teacher_id: &str) -> Result<Vec<Exam>, StoreError> {
        let exams = sqlx::query_as::<_, Exam>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE teacher_id = $1 ORDER BY created_at DESC"
        ))
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(exams)
    }

    async fn fetch_exam_by_id(&self, id: &str) -> Result<Option<Exam>, StoreError> {
        let exam = sqlx::query_as::<_, Exam>(&format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(exam)
    }

    async fn insert_exam_version(&self, version: &ExamVersion) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        claim_code(&mut tx, &version.version_code, "exams", "exam_code", "exam version").await?;

        sqlx::query(
            r#"
            INSERT INTO exam_versions (id, original_exam_id, version_code, questions, time_limit)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&version.id)
        .bind(&version.original_exam_id)
        .bind(&version.version_code)
        .bind(&version.questions)
        .bind(version.time_limit)
        .execute(&mut *tx)
        .await
        .map_err(|e| classify(e, "exam version"))?;

        sqlx::query("UPDATE exams SET versions = versions + 1 WHERE id = $1")
            .bind(&version.original_exam_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn fetch_exam_by_code(&self, code: &str) -> Result<Option<ExamLookup>, StoreError> {
        let exam = sqlx::query_as::<_, Exam>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE exam_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(exam) = exam {
            return Ok(Some(ExamLookup {
                exam_id: exam.id,
                questions: exam.questions.0,
                time_limit: exam.time_limit,
                is_version: false,
            }));
        }

        let version = sqlx::query_as::<_, ExamVersion>(&format!(
            "SELECT {VERSION_COLUMNS} FROM exam_versions WHERE version_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(version.map(|v| ExamLookup {
            exam_id: v.id,
            questions: v.questions.0,
            time_limit: v.time_limit,
            is_version: true,
        }))
    }

    async fn insert_result(&self, result: &StudentResult) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO student_results
                (id, student_name, exam_code, exam_id, answers, correct_answers,
                 total_questions, overall_percentage, topic_scores)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&result.id)
        .bind(&result.student_name)
        .bind(&result.exam_code)
        .bind(&result.exam_id)
        .bind(&result.answers)
        .bind(result.correct_answers)
        .bind(result.total_questions)
        .bind(result.overall_percentage)
        .bind(&result.topic_scores)
        .execute(&self.pool)
        .await
        .map_err(|e| classify(e, "result"))?;
        Ok(())
    }

    async fn fetch_results_by_teacher(
        &self,
        teacher_id: &str,
    ) -> Result<Vec<StudentResult>, StoreError> {
        let results = sqlx::query_as::<_, StudentResult>(&format!(
            r#"
            SELECT {RESULT_COLUMNS} FROM student_results
            WHERE exam_code IN (SELECT exam_code FROM exams WHERE teacher_id = $1)
               OR exam_code IN (
                    SELECT ev.version_code FROM exam_versions ev
                    JOIN exams e ON ev.original_exam_id = e.id
                    WHERE e.teacher_id = $1
               )
            ORDER BY submitted_at DESC
            "#
        ))
        .bind(teacher_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(results)
    }

    async fn fetch_result_by_id(&self, id: &str) -> Result<Option<StudentResult>, StoreError> {
        let result = sqlx::query_as::<_, StudentResult>(&format!(
            "SELECT {RESULT_COLUMNS} FROM student_results WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(result)
    }
}
