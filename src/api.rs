//! HTTP surface: one import tick per POST, waitlist forwarding, and a health
//! snapshot. CORS is permissive so the admin UI can call from any origin.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::config::PublicAppConfig;
use crate::errors::{AppError, AppResult};
use crate::import::{self, ImportTickResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub city: Option<String>,
    #[serde(default)]
    pub resume: bool,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub db_path: String,
    pub config: PublicAppConfig,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/import", post(run_import))
        .route("/api/subscribe", post(subscribe))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn run_import(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> AppResult<Json<ImportTickResponse>> {
    let city = request
        .city
        .as_deref()
        .map(str::trim)
        .filter(|city| !city.is_empty())
        .ok_or_else(|| AppError::BadRequest("city is required".into()))?
        .to_string();

    let api = state
        .places
        .clone()
        .ok_or_else(|| AppError::Config("GOOGLE_PLACES_API_KEY is not configured".into()))?;

    let response = import::run_import_tick(
        api.as_ref(),
        &state.sessions,
        &state.config,
        &city,
        request.resume,
    )
    .await?;
    Ok(Json(response))
}

async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> AppResult<Json<SubscribeResponse>> {
    state.waitlist.forward(&request.email).await?;
    Ok(Json(SubscribeResponse {
        message: "Subscribed".into(),
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthSnapshot> {
    Json(HealthSnapshot {
        status: "ok",
        db_path: state.db_path.to_string_lossy().to_string(),
        config: state.config.public_profile(),
    })
}
