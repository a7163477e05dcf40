use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{AuditConfig, PortfolioReport, PortfolioRow, ProjectDocument, audit_portfolio};

/// Request body cap. Audit uploads carry whole MSPDI exports inline.
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    config: Arc<RwLock<AuditConfig>>,
    body_limit: usize,
}

impl AppState {
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, bytes: usize) -> Self {
        self.body_limit = bytes;
        self
    }

    fn config(&self) -> AuditConfig {
        self.config.read().clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Invalid(message) => {
                let body = Json(ErrorBody {
                    error: "invalid_request",
                    message,
                });
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::Internal(message) => {
                error!(%message, "audit request failed");
                let body = Json(ErrorBody {
                    error: "internal_error",
                    message,
                });
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadedDocument {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct AuditRequest {
    #[serde(default)]
    pub documents: Vec<UploadedDocument>,
}

impl AuditRequest {
    fn into_documents(self) -> Vec<ProjectDocument> {
        self.documents
            .into_iter()
            .map(|doc| ProjectDocument::from_upload(&doc.name, doc.content))
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Rankings {
    pub by_spi: Vec<PortfolioRow>,
    pub by_score: Vec<PortfolioRow>,
}

impl From<&PortfolioReport> for Rankings {
    fn from(report: &PortfolioReport) -> Self {
        Self {
            by_spi: report.ranked_by_spi().into_iter().cloned().collect(),
            by_score: report.ranked_by_score().into_iter().cloned().collect(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.body_limit;
    Router::new()
        .route("/health", get(health))
        .route("/config", get(get_config).put(update_config))
        .route("/audit", post(audit))
        .route("/audit/rankings", post(audit_rankings))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let body_limit = state.body_limit;
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, body_limit, "portfolio audit api listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_config(State(state): State<AppState>) -> Json<AuditConfig> {
    Json(state.config())
}

async fn update_config(
    State(state): State<AppState>,
    Json(config): Json<AuditConfig>,
) -> Result<Json<AuditConfig>, ApiError> {
    config
        .validate()
        .map_err(|err| ApiError::invalid(err.to_string()))?;
    {
        let mut guard = state.config.write();
        *guard = config;
    }
    Ok(Json(state.config()))
}

async fn run_audit(state: &AppState, request: AuditRequest) -> Result<PortfolioReport, ApiError> {
    let config = state.config();
    let documents = request.into_documents();
    tokio::task::spawn_blocking(move || audit_portfolio(&config, &documents))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))
}

async fn audit(
    State(state): State<AppState>,
    Json(request): Json<AuditRequest>,
) -> Result<Json<PortfolioReport>, ApiError> {
    Ok(Json(run_audit(&state, request).await?))
}

async fn audit_rankings(
    State(state): State<AppState>,
    Json(request): Json<AuditRequest>,
) -> Result<Json<Rankings>, ApiError> {
    let report = run_audit(&state, request).await?;
    Ok(Json(Rankings::from(&report)))
}
