// src/pipeline/assembler.rs

use std::{path::PathBuf, sync::Arc};

use crate::{
    models::question::{CandidateQuestion, QuestionRecord},
    pipeline::{
        ExtractionError, PipelineConfig, QuestionResponder, extractor,
        generator::{BatchGenerator, BatchRequest},
        renumber, segmenter, topic,
    },
};

/// Ordered questions of one exam, numbered 1..=N.
pub type GeneratedExam = Vec<QuestionRecord>;

/// Input to [`ExamAssembler::assemble`].
#[derive(Debug, Clone)]
pub struct ExamSpec {
    pub source_path: PathBuf,
    pub requested_count: usize,
    pub difficulty: String,
    pub batch_size: usize,
}

/// Drives extraction, segmentation and batched generation for one exam.
#[derive(Clone)]
pub struct ExamAssembler {
    generator: BatchGenerator,
    config: PipelineConfig,
}

impl ExamAssembler {
    pub fn new(responder: Arc<dyn QuestionResponder>, config: PipelineConfig) -> Self {
        Self {
            generator: BatchGenerator::new(responder, config.clone()),
            config,
        }
    }

    /// An [`ExamSpec`] using the configured batch size.
    pub fn spec(&self, source_path: PathBuf, requested_count: usize, difficulty: &str) -> ExamSpec {
        ExamSpec {
            source_path,
            requested_count,
            difficulty: difficulty.to_string(),
            batch_size: self.config.batch_size,
        }
    }

    /// Builds an exam from a PDF.
    ///
    /// Only a missing or unreadable file is an error. A document with no
    /// numbered questions gives an empty exam.
    pub async fn assemble(&self, spec: &ExamSpec) -> Result<GeneratedExam, ExtractionError> {
        let text = extractor::extract_text_async(spec.source_path.clone(), self.config.max_pages).await?;
        let candidates = segmenter::candidates(&text, self.config.max_candidate_chars);

        tracing::info!(
            path = %spec.source_path.display(),
            candidates = candidates.len(),
            requested = spec.requested_count,
            "Segmented source document"
        );

        Ok(self
            .assemble_candidates(&candidates, spec.requested_count, &spec.difficulty, spec.batch_size)
            .await)
    }

    /// Builds an exam from already segmented candidates.
    ///
    /// The count is clamped to the number of candidates. Batches are requested
    /// in order and merged in order, so numbering only depends on the inputs
    /// and the generator's replies.
    pub async fn assemble_candidates(
        &self,
        candidates: &[CandidateQuestion],
        requested_count: usize,
        difficulty: &str,
        batch_size: usize,
    ) -> GeneratedExam {
        if candidates.is_empty() || requested_count == 0 {
            return Vec::new();
        }

        let target = requested_count.min(candidates.len());
        let batch_size = batch_size.max(1);
        let topic_hint = topic::sniff_topic(candidates[..target].iter().map(|c| c.text.as_str()));

        let mut exam: GeneratedExam = Vec::with_capacity(target);
        for (index, batch) in candidates[..target].chunks(batch_size).enumerate() {
            let count = batch_size.min(target.saturating_sub(exam.len()));
            if count == 0 {
                break;
            }

            tracing::debug!(batch = index, count, "Requesting question batch");
            let questions = self
                .generator
                .generate_batch(BatchRequest {
                    candidates: batch,
                    count,
                    difficulty,
                    topic_hint,
                })
                .await;
            exam.extend(questions);
        }

        exam.truncate(target);
        renumber(&mut exam);
        exam
    }
}
