use axum::{extract::rejection::JsonRejection, extract::State, Json};
use std::time::Instant;
use tracing::{field, info, warn, Instrument, Span};
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{AnalyzeRequest, HealthResponse, MessageResponse},
    AppState,
};
use crate::analysis::AnalysisResult;

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Support Ticket Analyzer API",
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

pub async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(ticket) = payload.map_err(|rejection| {
        warn!("rejected analyze request: {rejection}");
        ApiError::from(rejection)
    })?;

    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!("analyze", %request_id, words = field::Empty);

    async move {
        let started = Instant::now();
        let analyzer = state.analyzer.clone();
        let result = tokio::task::spawn_blocking(move || analyzer.analyze(&ticket.text))
            .await
            .map_err(|err| {
                ApiError::InferenceUnavailable(anyhow::anyhow!("inference task failed: {err}"))
            })?
            .map_err(|err| {
                warn!("analysis failed: {err:#}");
                ApiError::InferenceUnavailable(err)
            })?;

        Span::current().record("words", result.word_count);
        info!(
            sentiment = result.sentiment.as_str(),
            path = ?result.summary_path,
            words = result.word_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ticket analyzed"
        );
        Ok::<_, ApiError>(Json(result))
    }
    .instrument(span)
    .await
}
