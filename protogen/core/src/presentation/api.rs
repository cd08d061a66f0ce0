// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP API
//!
//! Routes, CORS and the mapping from service errors to status codes.

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::application::{ProtocolError, ProtocolService};
use crate::domain::llm::DispatchError;
use crate::domain::protocol::{
    HealthResponse, ProtocolGenerationRequest, RouteGenRequest, ToolGenRequest,
    TroubleshootingRequest, TECHNIQUES,
};

pub struct AppState {
    pub service: Arc<ProtocolService>,
}

pub fn app(service: Arc<ProtocolService>, cors_origins: &[String]) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/providers", get(providers_handler))
        .route("/api/v1/techniques", get(techniques_handler))
        .route("/api/v1/generate", post(generate_handler))
        .route("/api/v1/troubleshoot", post(troubleshoot_handler))
        .route("/api/v1/routes", post(routes_handler))
        .route("/api/v1/tools", post(tools_handler))
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}

/// Failure from a generation endpoint, rendered as the structured
/// `{success: false, error}` body.
pub struct ApiError {
    error: ProtocolError,
}

impl From<ProtocolError> for ApiError {
    fn from(error: ProtocolError) -> Self {
        Self { error }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.error {
            ProtocolError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ProtocolError::Dispatch(e) if e.is_configuration_error() => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ProtocolError::Dispatch(_) => StatusCode::BAD_GATEWAY,
            ProtocolError::Prompt(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Only a provider that was actually called counts as used.
        let (provider, message) = match &self.error {
            ProtocolError::Dispatch(e @ DispatchError::VendorCallFailed { provider, .. }) => {
                (provider.as_str(), e.user_message())
            }
            other => ("", other.to_string()),
        };

        if status.is_server_error() {
            error!("Request failed ({}): {}", status, self.error);
        }

        let body = Json(json!({
            "success": false,
            "provider_used": provider,
            "error": message,
        }));

        (status, body).into_response()
    }
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        available_providers: state.service.dispatcher().available_providers(),
    })
}

async fn providers_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "providers": state.service.dispatcher().available_providers(),
    }))
}

async fn techniques_handler() -> Json<serde_json::Value> {
    let techniques: Vec<_> = TECHNIQUES
        .iter()
        .map(|t| json!({ "value": t, "label": t }))
        .collect();

    Json(json!({ "techniques": techniques }))
}

async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProtocolGenerationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .service
        .generate_protocol(&request)
        .await
        .map(Json)
        .map_err(ApiError::from)
}

async fn troubleshoot_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TroubleshootingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .service
        .troubleshoot_protocol(&request)
        .await
        .map(Json)
        .map_err(ApiError::from)
}

async fn routes_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RouteGenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .service
        .generate_routes(&request)
        .await
        .map(Json)
        .map_err(ApiError::from)
}

async fn tools_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ToolGenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .service
        .generate_tools(&request)
        .await
        .map(Json)
        .map_err(ApiError::from)
}
