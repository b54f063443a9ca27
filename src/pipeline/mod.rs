// src/pipeline/mod.rs

//! Exam generation pipeline.
//!
//! PDF text → numbered question stems → batched requests to the generation
//! API → validated question records, with placeholder questions standing in
//! for any batch the API fails to deliver.

pub mod assembler;
pub mod extractor;
pub mod fallback;
pub mod generator;
pub mod json_extract;
pub mod segmenter;
pub mod shuffler;
pub mod topic;

use std::time::Duration;

use crate::models::question::QuestionRecord;

pub use assembler::{ExamAssembler, ExamSpec, GeneratedExam};
pub use extractor::ExtractionError;
pub use generator::{GenerationError, QuestionResponder};

/// How fallback questions pick their correct option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackAnswer {
    /// Uniformly random among A-D.
    Random,
    /// Always A.
    Fixed,
}

/// Tunables for the generation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Candidate questions sent per generation request.
    pub batch_size: usize,
    /// Only the first N pages of the PDF are read.
    pub max_pages: Option<usize>,
    /// Reference text sent to the generator is cut to this many characters.
    pub prompt_char_limit: usize,
    /// Segmented stems at or above this length are discarded.
    pub max_candidate_chars: Option<usize>,
    pub fallback_answer: FallbackAnswer,
    /// Upper bound on a single generation request.
    pub batch_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 2,
            max_pages: None,
            prompt_char_limit: 250,
            max_candidate_chars: None,
            fallback_answer: FallbackAnswer::Random,
            batch_timeout: Duration::from_secs(60),
        }
    }
}

/// Assigns display numbers 1..=N in slice order.
pub fn renumber(questions: &mut [QuestionRecord]) {
    for (i, question) in questions.iter_mut().enumerate() {
        question.set_number(i as u32 + 1);
    }
}

/// Cuts `text` to at most `max` characters on a char boundary.
pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
