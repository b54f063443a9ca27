// src/clients/mod.rs

//! Clients for outside services.

pub mod llm_client;

pub use llm_client::ChatCompletionsResponder;
