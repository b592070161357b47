// handlers/mod.rs - Same-origin proxy surface
//
// Two tiers, split by whether the caller is expected to carry a token:
// Public (token acquisition) → Protected (everything else, token forwarded)
//
// Neither tier authenticates locally. The backend decides; the gateway relays.
pub mod params;
pub mod protected; // /api/{auth,requisitions,approvals,attachments,signature}/*
pub mod public;    // /api/auth/authenticate

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::HeaderValue,
    response::{IntoResponse, Json},
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig};
use crate::error::ApiError;
use crate::proxy::{ProxyClient, ProxySetupError};

/// Shared, immutable handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub proxy: Arc<ProxyClient>,
}

impl AppState {
    pub fn from_config(config: &AppConfig) -> Result<Self, ProxySetupError> {
        Ok(Self {
            proxy: Arc::new(ProxyClient::new(&config.backend)?),
        })
    }
}

/// Full application router for the given configuration
pub fn app(config: &AppConfig) -> Result<Router, ProxySetupError> {
    let state = AppState::from_config(config)?;
    Ok(router(state, config))
}

pub fn router(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        // Protected
        .merge(requisition_routes())
        .merge(approval_routes())
        .merge(attachment_routes())
        .merge(signature_routes())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .with_state(state);

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/authenticate", post(public::auth::authenticate))
        .route("/api/auth/update/id/:id", put(protected::auth::update_user))
        .route("/api/auth/user/id/:id", get(protected::auth::get_user))
}

fn requisition_routes() -> Router<AppState> {
    use protected::requisitions;

    Router::new()
        .route("/api/requisitions/create", post(requisitions::create))
        .route("/api/requisitions/by-status", get(requisitions::by_status_query))
        .route("/api/requisitions/by-status/:status", get(requisitions::by_status_path))
        .route("/api/requisitions/:id", get(requisitions::find))
        .route("/api/requisitions/:id/update", put(requisitions::update))
        .route("/api/requisitions/:id/approval", post(requisitions::approval))
        .route("/api/requisitions/:id/upload", post(requisitions::upload))
}

fn approval_routes() -> Router<AppState> {
    use protected::approvals;

    Router::new()
        .route("/api/approvals/create", post(approvals::create))
        .route("/api/approvals/by-status", get(approvals::by_status_query))
        .route("/api/approvals/by-status/:status", get(approvals::by_status_path))
        .route("/api/approvals/:id", get(approvals::find))
        .route("/api/approvals/:id/update", put(approvals::update))
}

fn attachment_routes() -> Router<AppState> {
    use protected::attachments;

    Router::new()
        .route("/api/attachments/requisition/:id", get(attachments::list_for_requisition))
        .route("/api/attachments/:id", delete(attachments::delete))
        .route("/api/attachments/:id/upload", post(attachments::upload))
        .route("/api/attachments/:id/rename", put(attachments::rename))
        .route("/api/attachments/:id/download", get(attachments::download))
}

fn signature_routes() -> Router<AppState> {
    use protected::signature;

    Router::new()
        .route("/api/signature/user/email", get(signature::by_email))
        .route("/api/signature/file/:id", get(signature::file))
        .route("/api/signature/file/:id/normalized", get(signature::file_normalized))
        .route("/api/signature/upload/:email", post(signature::upload))
        .route("/api/signature/update/:email", put(signature::update))
        .route("/api/signature/:id", delete(signature::delete))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Requisition Gateway",
            "version": version,
            "description": "Same-origin proxy for the contract requisition approval workflow",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/auth/authenticate, /api/auth/update/id/:id, /api/auth/user/id/:id",
                "requisitions": "/api/requisitions/{create,by-status,:id,:id/update,:id/approval,:id/upload}",
                "approvals": "/api/approvals/{create,by-status,:id,:id/update}",
                "attachments": "/api/attachments/{requisition/:id,:id,:id/upload,:id/rename,:id/download}",
                "signature": "/api/signature/{user/email,file/:id,file/:id/normalized,upload/:email,update/:email,:id}",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": now,
            "backend": state.proxy.base_url(),
        }
    }))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
