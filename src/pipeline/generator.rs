// src/pipeline/generator.rs

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use rand::{SeedableRng, rngs::StdRng};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::{
    models::question::{CandidateQuestion, QuestionRecord},
    pipeline::{PipelineConfig, fallback, json_extract::extract_first_json_object, renumber, truncate_chars},
};

/// Why a batch could not be generated. Never leaves the pipeline: every
/// variant is answered with fallback questions.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to generation API failed: {0}")]
    Transport(String),

    #[error("generation API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("generation API did not answer within {0:?}")]
    Timeout(Duration),

    #[error("generation API returned no content")]
    EmptyContent,

    #[error("response contained no JSON object")]
    NoJson,

    #[error("response JSON has no question array")]
    MissingQuestions,

    #[error("response had no valid questions")]
    NoValidQuestions,
}

/// A text-completion capability: prompt in, free text out.
#[async_trait]
pub trait QuestionResponder: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}

const RESPONSE_SCHEMA: &str = r#"{
  "preguntas": [
    {
      "numero": 1,
      "tema": "Tema detectado",
      "pregunta": "Texto de la pregunta",
      "opciones": {"A": "...", "B": "...", "C": "...", "D": "..."},
      "respuesta_correcta": "A"
    }
  ]
}"#;

/// Builds the instruction sent for one batch.
pub fn build_prompt(
    candidates: &[CandidateQuestion],
    count: usize,
    difficulty: &str,
    topic_hint: &str,
    char_limit: usize,
) -> String {
    let references: Vec<CandidateQuestion> = candidates
        .iter()
        .map(|c| CandidateQuestion {
            ordinal: c.ordinal,
            text: truncate_chars(&c.text, char_limit).to_string(),
        })
        .collect();
    let references = serde_json::to_string(&references).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Genera exactamente {count} pregunta(s) de examen de opción múltiple a partir de las \
preguntas base, manteniendo el mismo tema y con dificultad {difficulty}.
Tema sugerido: {topic_hint}.
Reglas:
- Exactamente {count} elementos en \"preguntas\"
- 4 opciones (A-D) por pregunta
- Marca la respuesta correcta en \"respuesta_correcta\"
- Devuelve SOLO un objeto JSON, sin texto adicional
Formato:
{RESPONSE_SCHEMA}
Preguntas base: {references}"
    )
}

/// Pulls the valid questions out of a raw generator reply.
///
/// Entries that do not form a valid [`QuestionRecord`] are dropped.
pub fn parse_questions(text: &str) -> Result<Vec<QuestionRecord>, GenerationError> {
    let object = extract_first_json_object(text).ok_or(GenerationError::NoJson)?;

    let entries = ["preguntas", "questions"]
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_array))
        .ok_or(GenerationError::MissingQuestions)?;

    let valid: Vec<QuestionRecord> = entries
        .iter()
        .filter_map(|entry| match QuestionRecord::deserialize(entry) {
            Ok(q) => Some(q),
            Err(e) => {
                tracing::debug!(error = %e, "Dropping invalid generated question");
                None
            }
        })
        .collect();

    if valid.is_empty() {
        return Err(GenerationError::NoValidQuestions);
    }
    Ok(valid)
}

/// One batch of work for the generator.
#[derive(Debug, Clone, Copy)]
pub struct BatchRequest<'a> {
    pub candidates: &'a [CandidateQuestion],
    pub count: usize,
    pub difficulty: &'a str,
    pub topic_hint: &'a str,
}

/// Turns candidate batches into questions through a [`QuestionResponder`].
#[derive(Clone)]
pub struct BatchGenerator {
    responder: Arc<dyn QuestionResponder>,
    config: PipelineConfig,
}

impl BatchGenerator {
    pub fn new(responder: Arc<dyn QuestionResponder>, config: PipelineConfig) -> Self {
        Self { responder, config }
    }

    /// A single bounded call to the responder, parsed and validated.
    pub async fn request_batch(
        &self,
        request: BatchRequest<'_>,
    ) -> Result<Vec<QuestionRecord>, GenerationError> {
        let prompt = build_prompt(
            request.candidates,
            request.count,
            request.difficulty,
            request.topic_hint,
            self.config.prompt_char_limit,
        );

        let reply = tokio::time::timeout(self.config.batch_timeout, self.responder.complete(&prompt))
            .await
            .map_err(|_| GenerationError::Timeout(self.config.batch_timeout))??;

        parse_questions(&reply)
    }

    /// Returns exactly `request.count` questions numbered from 1, unless the
    /// fallback has nothing to draw from.
    ///
    /// A failed call is replaced wholesale by fallback questions; a reply
    /// with too few valid entries is topped up with them.
    pub async fn generate_batch(&self, request: BatchRequest<'_>) -> Vec<QuestionRecord> {
        let mut questions = match self.request_batch(request).await {
            Ok(questions) => questions,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    count = request.count,
                    "Question generation failed, using fallback questions"
                );
                Vec::new()
            }
        };
        questions.truncate(request.count);

        if questions.len() < request.count {
            let missing = request.count - questions.len();
            if !questions.is_empty() {
                tracing::info!(missing, "Topping up partial generation with fallback questions");
            }

            // Prefer stems the generator did not already cover.
            let unused = request.candidates.get(questions.len()..).unwrap_or_default();
            let pool = if unused.is_empty() { request.candidates } else { unused };

            let mut rng = StdRng::from_entropy();
            questions.extend(fallback::synthesize(
                pool,
                missing,
                request.topic_hint,
                self.config.fallback_answer,
                &mut rng,
            ));
        }

        renumber(&mut questions);
        questions
    }
}
