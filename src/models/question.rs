// src/models/question.rs

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};
use thiserror::Error;

/// Longest accepted question prompt, in characters.
pub const MAX_PROMPT_CHARS: usize = 500;

/// Topic label used when nothing better is known.
pub const DEFAULT_TOPIC: &str = "General";

/// Reasons a question cannot enter the data model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuestionError {
    #[error("expected 4 options, got {0}")]
    WrongOptionCount(usize),
    #[error("unknown option label '{0}'")]
    UnknownLabel(String),
    #[error("option {0} appears more than once")]
    DuplicateLabel(OptionLabel),
    #[error("option {0} is blank")]
    BlankOption(OptionLabel),
    #[error("question prompt is empty")]
    EmptyPrompt,
    #[error("question prompt has {0} characters, limit is {MAX_PROMPT_CHARS}")]
    PromptTooLong(usize),
}

/// One of the four answer labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    pub const ALL: [OptionLabel; 4] = [OptionLabel::A, OptionLabel::B, OptionLabel::C, OptionLabel::D];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionLabel::A => "A",
            OptionLabel::B => "B",
            OptionLabel::C => "C",
            OptionLabel::D => "D",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            OptionLabel::A => 0,
            OptionLabel::B => 1,
            OptionLabel::C => 2,
            OptionLabel::D => 3,
        }
    }

    /// Lenient parse for labels coming from students or the generator:
    /// accepts "b", " B", "B)" and "B.".
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = raw.trim().trim_end_matches([')', '.']).trim();
        match cleaned.to_ascii_uppercase().as_str() {
            "A" => Some(OptionLabel::A),
            "B" => Some(OptionLabel::B),
            "C" => Some(OptionLabel::C),
            "D" => Some(OptionLabel::D),
            _ => None,
        }
    }
}

impl fmt::Display for OptionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exactly four labelled answer texts. Entry order is display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options(Vec<(OptionLabel, String)>);

impl Options {
    pub fn new(entries: Vec<(OptionLabel, String)>) -> Result<Self, QuestionError> {
        if entries.len() != OptionLabel::ALL.len() {
            return Err(QuestionError::WrongOptionCount(entries.len()));
        }

        let mut seen = [false; 4];
        let mut cleaned = Vec::with_capacity(entries.len());
        for (label, text) in entries {
            if seen[label.index()] {
                return Err(QuestionError::DuplicateLabel(label));
            }
            seen[label.index()] = true;

            let text = text.trim().to_string();
            if text.is_empty() {
                return Err(QuestionError::BlankOption(label));
            }
            cleaned.push((label, text));
        }

        Ok(Self(cleaned))
    }

    /// The low-fidelity option set used by fallback questions.
    pub fn placeholder() -> Self {
        Self(
            OptionLabel::ALL
                .iter()
                .map(|label| (*label, format!("Opción {}", label)))
                .collect(),
        )
    }

    pub fn get(&self, label: OptionLabel) -> Option<&str> {
        self.0
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, text)| text.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptionLabel, &str)> {
        self.0.iter().map(|(label, text)| (*label, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Serialize for Options {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, text) in &self.0 {
            map.serialize_entry(label.as_str(), text)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Options {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OptionsVisitor;

        impl<'de> Visitor<'de> for OptionsVisitor {
            type Value = Options;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of four option labels (A-D) to strings")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<Options, M::Error> {
                let mut entries = Vec::with_capacity(4);
                while let Some((key, text)) = access.next_entry::<String, String>()? {
                    let label = OptionLabel::parse(&key).ok_or_else(|| {
                        <M::Error as serde::de::Error>::custom(QuestionError::UnknownLabel(
                            key.clone(),
                        ))
                    })?;
                    entries.push((label, text));
                }
                Options::new(entries).map_err(<M::Error as serde::de::Error>::custom)
            }
        }

        deserializer.deserialize_map(OptionsVisitor)
    }
}

/// A validated multiple-choice question.
///
/// Fields are private so every record at rest keeps four options and a
/// correct label among them. Serialized with the Spanish keys the frontend
/// and the generator contract use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuestion")]
pub struct QuestionRecord {
    #[serde(rename = "numero")]
    number: u32,
    #[serde(rename = "tema")]
    topic: String,
    #[serde(rename = "pregunta")]
    prompt: String,
    #[serde(rename = "opciones")]
    options: Options,
    #[serde(rename = "respuesta_correcta")]
    correct_option: OptionLabel,
}

impl QuestionRecord {
    pub fn new(
        number: u32,
        topic: &str,
        prompt: &str,
        options: Options,
        correct_option: OptionLabel,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        let prompt_chars = prompt.chars().count();
        if prompt_chars > MAX_PROMPT_CHARS {
            return Err(QuestionError::PromptTooLong(prompt_chars));
        }

        let topic = match topic.trim() {
            "" => DEFAULT_TOPIC,
            t => t,
        };

        Ok(Self {
            number,
            topic: topic.to_string(),
            prompt: prompt.to_string(),
            options,
            correct_option,
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn correct_option(&self) -> OptionLabel {
        self.correct_option
    }

    /// Text of the correct option.
    pub fn correct_text(&self) -> &str {
        self.options.get(self.correct_option).unwrap_or_default()
    }

    pub fn set_number(&mut self, number: u32) {
        self.number = number;
    }

    /// Rebuilds the options so label `OptionLabel::ALL[i]` holds the text
    /// previously at position `order[i]`. The correct answer follows its text.
    /// Returns false and leaves the record untouched if `order` is not a
    /// permutation of 0..4.
    pub fn permute_options(&mut self, order: [usize; 4]) -> bool {
        let mut seen = [false; 4];
        for &i in &order {
            if i >= 4 || seen[i] {
                return false;
            }
            seen[i] = true;
        }

        let old: Vec<(OptionLabel, String)> = self.options.0.clone();
        let correct_pos = old
            .iter()
            .position(|(label, _)| *label == self.correct_option)
            .unwrap_or(0);

        let mut rebuilt = Vec::with_capacity(4);
        for (new_pos, &old_pos) in order.iter().enumerate() {
            let label = OptionLabel::ALL[new_pos];
            if old_pos == correct_pos {
                self.correct_option = label;
            }
            rebuilt.push((label, old[old_pos].1.clone()));
        }
        self.options = Options(rebuilt);
        true
    }
}

/// Loosely-typed question as written by the generator or read from storage.
/// Accepts both the Spanish contract keys and English aliases.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default, rename = "numero", alias = "number")]
    number: Option<serde_json::Value>,
    #[serde(default, rename = "tema", alias = "topic")]
    topic: Option<String>,
    #[serde(default, rename = "pregunta", alias = "prompt", alias = "question")]
    prompt: Option<String>,
    #[serde(rename = "opciones", alias = "options")]
    options: Options,
    #[serde(
        rename = "respuesta_correcta",
        alias = "correct_option",
        alias = "correct_answer"
    )]
    correct_option: String,
}

impl TryFrom<RawQuestion> for QuestionRecord {
    type Error = QuestionError;

    fn try_from(raw: RawQuestion) -> Result<Self, Self::Error> {
        let number = match raw.number {
            Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(0),
            Some(serde_json::Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        };
        let correct_option = OptionLabel::parse(&raw.correct_option)
            .ok_or_else(|| QuestionError::UnknownLabel(raw.correct_option.clone()))?;

        QuestionRecord::new(
            u32::try_from(number).unwrap_or(0),
            raw.topic.as_deref().unwrap_or_default(),
            raw.prompt.as_deref().unwrap_or_default(),
            raw.options,
            correct_option,
        )
    }
}

/// Question as shown to students: the answer key is left out.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub numero: u32,
    pub tema: String,
    pub pregunta: String,
    pub opciones: Options,
}

impl From<&QuestionRecord> for PublicQuestion {
    fn from(q: &QuestionRecord) -> Self {
        Self {
            numero: q.number,
            tema: q.topic.clone(),
            pregunta: q.prompt.clone(),
            opciones: q.options.clone(),
        }
    }
}

/// A question stem lifted from the source document, before generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateQuestion {
    #[serde(rename = "num")]
    pub ordinal: usize,
    #[serde(rename = "texto")]
    pub text: String,
}
