// src/pipeline/fallback.rs

//! Placeholder questions for batches the generator could not deliver.
//!
//! The output is deliberately low fidelity: the prompt is the raw source stem,
//! the options are "Opción A".."Opción D" and the marked answer carries no
//! meaning. Callers must present these as placeholders for a teacher to edit.

use rand::{Rng, seq::SliceRandom};

use crate::{
    models::question::{CandidateQuestion, MAX_PROMPT_CHARS, OptionLabel, Options, QuestionRecord},
    pipeline::{FallbackAnswer, truncate_chars},
};

/// Generic prompts used when there is no source text at all.
const TEMPLATE_PROMPTS: &[&str] = &[
    "¿Cuál es el concepto central de {topic}?",
    "¿Qué afirmación describe mejor un principio básico de {topic}?",
    "¿Cuál de las siguientes opciones es un ejemplo de {topic}?",
    "¿Qué término se relaciona más con {topic}?",
    "¿Cuál es la aplicación más común de {topic}?",
];

/// Builds `count` placeholder questions, numbered from 1.
///
/// Candidate texts are drawn without replacement; they are reused, in a fresh
/// random order, only once every candidate has been drawn. With no candidates
/// the template list is used, which caps the output at its length.
pub fn synthesize<R: Rng + ?Sized>(
    candidates: &[CandidateQuestion],
    count: usize,
    topic: &str,
    answer: FallbackAnswer,
    rng: &mut R,
) -> Vec<QuestionRecord> {
    let prompts: Vec<String> = if candidates.is_empty() {
        TEMPLATE_PROMPTS
            .iter()
            .take(count)
            .map(|t| t.replace("{topic}", topic))
            .collect()
    } else {
        sample_prompts(candidates, count, rng)
    };

    prompts
        .iter()
        .enumerate()
        .filter_map(|(i, prompt)| {
            let correct = match answer {
                FallbackAnswer::Fixed => OptionLabel::A,
                FallbackAnswer::Random => OptionLabel::ALL[rng.gen_range(0..OptionLabel::ALL.len())],
            };
            QuestionRecord::new(
                i as u32 + 1,
                topic,
                truncate_chars(prompt, MAX_PROMPT_CHARS),
                Options::placeholder(),
                correct,
            )
            .ok()
        })
        .collect()
}

fn sample_prompts<R: Rng + ?Sized>(
    candidates: &[CandidateQuestion],
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut prompts = Vec::with_capacity(count);
    while prompts.len() < count {
        let mut pool: Vec<&CandidateQuestion> = candidates.iter().collect();
        pool.shuffle(rng);
        let needed = count - prompts.len();
        prompts.extend(pool.into_iter().take(needed).map(|c| c.text.clone()));
    }
    prompts
}
