use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::lookups::{start_lookup, LookupStore};
use crate::models::*;
use crate::narrative::NarrativeEnricher;
use crate::scoring::generate_report;
use crate::validation::{is_valid_gstin, normalize_gstin, validate_gstin};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Narrative enrichment (language model client, breaker, narrative cache).
    pub enricher: NarrativeEnricher,
    /// In-flight and recent lookups, keyed by lookup id.
    pub lookups: LookupStore,
}

/// Health check endpoint.
///
/// Returns the service status, version, and which narrative backend is active.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "gstin-credibility-api",
            "version": env!("CARGO_PKG_VERSION"),
            "narrative": {
                "generator": state.enricher.generator_name(),
                "model": state.config.gemini_model,
            }
        })),
    )
}

/// GET /api/v1/gstin/validate?gstin=
///
/// Reports whether the identifier matches the GSTIN layout after normalization.
pub async fn validate(Query(params): Query<GstinQueryParams>) -> Json<GstinValidationResponse> {
    let valid = is_valid_gstin(&params.gstin);
    tracing::debug!("GET /gstin/validate - {} valid={}", params.gstin, valid);

    Json(GstinValidationResponse {
        gstin: normalize_gstin(&params.gstin),
        valid,
    })
}

/// GET /api/v1/reports/:gstin
///
/// Deterministic report with the placeholder narrative. No language model call.
pub async fn get_report(Path(gstin): Path<String>) -> Result<Json<CredibilityReport>, AppError> {
    let gstin = validate_gstin(&gstin)?;
    tracing::info!("GET /reports/{}", gstin);

    Ok(Json(generate_report(&gstin)))
}

/// POST /api/v1/reports/:gstin/explain
///
/// Report with the narrative awaited inline. Falls back to the static
/// narrative if the language model is unavailable.
pub async fn explain_report(
    State(state): State<Arc<AppState>>,
    Path(gstin): Path<String>,
) -> Result<Json<CredibilityReport>, AppError> {
    let gstin = validate_gstin(&gstin)?;
    tracing::info!("POST /reports/{}/explain", gstin);

    let report = generate_report(&gstin);
    let narrative = state.enricher.enrich(&report).await;

    Ok(Json(report.with_explanation(narrative)))
}

/// POST /api/v1/lookups
///
/// Starts a lookup: the report is returned immediately with the placeholder
/// narrative while enrichment continues in the background. Poll
/// `GET /api/v1/lookups/:id` for the enriched report.
pub async fn create_lookup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LookupRequest>,
) -> Result<(StatusCode, Json<LookupResponse>), AppError> {
    let gstin = validate_gstin(&payload.gstin)?;
    tracing::info!("POST /lookups - gstin: {}", gstin);

    let (lookup_id, report, _enrichment) =
        start_lookup(&state.lookups, &state.enricher, &gstin).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(LookupResponse { lookup_id, report }),
    ))
}

/// GET /api/v1/lookups/:id
///
/// Current state of a lookup. The narrative is the placeholder until
/// enrichment completes.
pub async fn get_lookup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CredibilityReport>, AppError> {
    tracing::debug!("GET /lookups/{}", id);

    let report = state
        .lookups
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Lookup {} not found or expired", id)))
        .with_context(|| format!("Fetching lookup {}", id))?;

    Ok(Json(report))
}
