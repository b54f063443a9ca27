// src/config.rs

use std::{env, str::FromStr, time::Duration};

use dotenvy::dotenv;

use crate::pipeline::{FallbackAnswer, PipelineConfig};

/// Percentage a student needs on a topic to pass it.
pub const PASSING_SCORE_PERCENTAGE: f64 = 60.0;

pub const DEFAULT_QUESTION_COUNT: u32 = 20;
pub const MAX_QUESTION_COUNT: u32 = 100;
pub const DEFAULT_TIME_LIMIT: i32 = 40;
pub const DEFAULT_DIFFICULTY: &str = "medium";
pub const MAX_VERSIONS_PER_REQUEST: u32 = 20;

/// Length of exam and version codes.
pub const EXAM_CODE_LENGTH: usize = 6;

/// Settings for the external text-generation API.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub port: u16,
    pub upload_dir: String,
    pub static_dir: String,
    /// `None` allows any origin.
    pub cors_origins: Option<Vec<String>>,
    pub max_upload_bytes: usize,
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let api_key = env::var("OPENAI_API_KEY")
            .expect("OPENAI_API_KEY must be set");

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let llm = LlmConfig {
            api_key,
            base_url: env_or("OPENAI_BASE_URL", "https://openrouter.ai/api/v1".to_string()),
            model: env_or("LLM_MODEL", "deepseek/deepseek-r1:free".to_string()),
            timeout: Duration::from_secs(env_or("LLM_TIMEOUT_SECS", 60)),
        };

        let fallback_answer = if env_or("FALLBACK_RANDOM_ANSWER", true) {
            FallbackAnswer::Random
        } else {
            FallbackAnswer::Fixed
        };

        let pipeline = PipelineConfig {
            batch_size: env_or("EXAM_BATCH_SIZE", 2usize).max(1),
            max_pages: env_opt("PDF_MAX_PAGES"),
            prompt_char_limit: env_or("PROMPT_CHAR_LIMIT", 250usize).max(1),
            max_candidate_chars: None,
            fallback_answer,
            batch_timeout: llm.timeout,
        };

        Self {
            database_url,
            rust_log,
            port: env_or("PORT", 5000),
            upload_dir: env_or("UPLOAD_DIR", "uploads".to_string()),
            static_dir: env_or("STATIC_DIR", "frontend".to_string()),
            cors_origins: env::var("CORS_ORIGINS").ok().and_then(|raw| parse_list(&raw)),
            max_upload_bytes: env_or("MAX_UPLOAD_MB", 16usize) * 1024 * 1024,
            llm,
            pipeline,
        }
    }
}

/// Reads and parses an env var, falling back to `default` when it is unset
/// or does not parse.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env_opt(key).unwrap_or(default)
}

fn env_opt<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Splits a comma separated list, dropping blanks. `None` if nothing is left.
fn parse_list(raw: &str) -> Option<Vec<String>> {
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() { None } else { Some(items) }
}
