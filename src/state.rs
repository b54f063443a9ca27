// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, pipeline::ExamAssembler, store::DynStore};

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub config: Config,
    pub assembler: Arc<ExamAssembler>,
}

impl FromRef<AppState> for DynStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<ExamAssembler> {
    fn from_ref(state: &AppState) -> Self {
        state.assembler.clone()
    }
}
