use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::analysis::Analyzer;

pub mod error;
pub mod handlers;
pub mod types;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/analyze", post(handlers::analyze))
}
