// src/pipeline/segmenter.rs

use std::sync::LazyLock;

use regex::Regex;

use crate::models::question::CandidateQuestion;

/// Stems this short are page furniture, not questions.
const MIN_QUESTION_CHARS: usize = 10;

/// A line starting with "12. ".
static BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\d+\.\s").expect("valid block regex"));

/// " B)" style marker that introduces the listed options.
static OPTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s[A-E]\)").expect("valid option regex"));

/// Splits exam text into question stems.
///
/// A block runs from an ordinal-prefixed line ("1. ...") to the next one.
/// Each block is flattened to single spaces and cut before its first option
/// marker. Blocks of 10 characters or fewer are dropped, as are blocks at or
/// above `max_chars` when given.
pub fn segment(text: &str, max_chars: Option<usize>) -> Vec<String> {
    let starts: Vec<(usize, usize)> = BLOCK_START
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();

    starts
        .iter()
        .enumerate()
        .filter_map(|(i, &(_, body_start))| {
            let end = starts.get(i + 1).map(|&(s, _)| s).unwrap_or(text.len());
            let stem = clean_block(&text[body_start..end]);
            let len = stem.chars().count();

            let long_enough = len > MIN_QUESTION_CHARS;
            let short_enough = max_chars.is_none_or(|max| len < max);
            (long_enough && short_enough).then_some(stem)
        })
        .collect()
}

/// Segments and numbers the stems from 1.
pub fn candidates(text: &str, max_chars: Option<usize>) -> Vec<CandidateQuestion> {
    segment(text, max_chars)
        .into_iter()
        .enumerate()
        .map(|(i, text)| CandidateQuestion { ordinal: i + 1, text })
        .collect()
}

/// Collapses whitespace and strips trailing option text from one block.
pub fn clean_block(block: &str) -> String {
    let collapsed = block.split_whitespace().collect::<Vec<_>>().join(" ");
    let stem = match OPTION_MARKER.find(&collapsed) {
        Some(m) => &collapsed[..m.start()],
        None => collapsed.as_str(),
    };
    stem.trim().to_string()
}
