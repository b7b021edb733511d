//! /apis handlers: listing and registering services.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{error_status, ApiInfo, ApiState};

// ── /apis (GET) ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ApisResponse {
    pub apis: Vec<ApiInfo>,
}

pub async fn handle_apis(State(state): State<ApiState>) -> Json<ApisResponse> {
    let apis = state
        .registry
        .get_available_apis()
        .await
        .iter()
        .map(ApiInfo::from)
        .collect();

    Json(ApisResponse { apis })
}

// ── /apis/{name} (GET) ────────────────────────────────────────────────────────

pub async fn handle_apis_by_name(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Json<ApisResponse> {
    let apis = state
        .registry
        .get_apis_by_name(&name)
        .await
        .iter()
        .map(ApiInfo::from)
        .collect();

    Json(ApisResponse { apis })
}

// ── /apis (POST) ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub version: String,
    pub port: u16,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub name: String,
    pub version: String,
    pub port: u16,
}

pub async fn handle_register(
    State(state): State<ApiState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, (StatusCode, String)> {
    state
        .registry
        .register_api(&req.name, &req.version, req.port)
        .await
        .map_err(|e| {
            tracing::warn!(name = %req.name, error = %e, "registration via API failed");
            (error_status(&e), e.to_string())
        })?;

    Ok(Json(RegisterResponse {
        name: req.name,
        version: req.version,
        port: req.port,
    }))
}
