// src/grading.rs

use std::collections::{BTreeMap, HashMap};

use crate::{
    config::PASSING_SCORE_PERCENTAGE,
    models::{
        question::{OptionLabel, QuestionRecord},
        result::TopicScore,
    },
};

pub const STATUS_PASSED: &str = "Aprobado";
pub const STATUS_FAILED: &str = "Reprobado";

/// Outcome of grading one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeReport {
    pub correct_count: u32,
    pub total: u32,
    pub overall_percentage: f64,
    pub topic_scores: BTreeMap<String, TopicScore>,
}

/// Grades `answers` against the answer key in `questions`.
///
/// Answers are keyed by the 0-based position of the question, as text.
/// Unanswered questions and unknown labels count as wrong. An empty exam
/// scores 0.
pub fn grade(questions: &[QuestionRecord], answers: &HashMap<String, String>) -> GradeReport {
    let mut tally: BTreeMap<String, (u32, u32)> = BTreeMap::new();
    let mut correct_count = 0u32;

    for (index, question) in questions.iter().enumerate() {
        let entry = tally.entry(question.topic().to_string()).or_insert((0, 0));
        entry.1 += 1;

        let chosen = answers
            .get(&index.to_string())
            .and_then(|raw| OptionLabel::parse(raw));
        if chosen == Some(question.correct_option()) {
            correct_count += 1;
            entry.0 += 1;
        }
    }

    let topic_scores = tally
        .into_iter()
        .map(|(topic, (correct, total))| {
            let percentage = percentage(correct, total);
            let status = if percentage >= PASSING_SCORE_PERCENTAGE {
                STATUS_PASSED
            } else {
                STATUS_FAILED
            };
            let score = TopicScore {
                percentage: round2(percentage),
                status: status.to_string(),
                correct,
                total,
            };
            (topic, score)
        })
        .collect();

    let total = questions.len() as u32;
    GradeReport {
        correct_count,
        total,
        overall_percentage: round2(percentage(correct_count, total)),
        topic_scores,
    }
}

fn percentage(correct: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
