use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use framingham_model::{ArtifactInfo, Classifier};
use framingham_types::{parse_patient_record, RiskLabel};

/// Shared request-handling state.
///
/// The classifier handle is injected at startup and read-only for the
/// life of the process; there is no reload or hot-swap path.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
    pub start_time: Instant,
    pub req_count: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            start_time: Instant::now(),
            req_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn record_request(&self) -> u64 {
        self.req_count.fetch_add(1, Ordering::Relaxed) as u64 + 1
    }

    fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct LivenessResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
    req_total: u64,
    model: ArtifactInfo,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    #[serde(rename = "chances of Ten year CHD")]
    label: RiskLabel,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new<S: Into<String>>(status: StatusCode, message: S) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, payload).into_response()
    }
}

/// Serve the API on the given address until the process exits.
pub async fn start_server(state: AppState, addr: &str) -> Result<()> {
    let shared = Arc::new(state);
    let app = build_router(shared);
    let listener = bind_listener(addr).await?;
    info!("CHD risk API listening on {addr}");
    axum::serve(listener, app)
        .await
        .context("API server terminated unexpectedly")
}

async fn bind_listener(addr: &str) -> Result<tokio::net::TcpListener> {
    if let Ok(socket_addr) = addr.parse::<SocketAddr>() {
        tokio::net::TcpListener::bind(socket_addr)
            .await
            .with_context(|| format!("failed to bind API listener on {socket_addr}"))
    } else {
        tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind API listener on {addr}"))
    }
}

pub(crate) fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(handle_liveness))
        .route("/health", get(handle_health))
        .route("/predict", post(handle_predict))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness probe; answers whenever the process is up, independent of
/// model state.
async fn handle_liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        message: "heart disease api is working",
    })
}

async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let req_total = state.record_request();
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime_seconds(),
        req_total,
        model: state.classifier.info(),
    })
}

/// Validate, derive BMI, and invoke the classifier.
///
/// Pipeline errors map onto the HTTP taxonomy: schema or domain
/// rejections are the caller's fault (422, model never invoked),
/// inference failures are ours (500).
async fn handle_predict(
    State(state): State<SharedState>,
    Json(payload): Json<Value>,
) -> Result<Json<PredictResponse>, ApiError> {
    state.record_request();

    let record = parse_patient_record(&payload).map_err(|err| {
        warn!("rejected payload: {err}");
        ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
    })?;

    let row = record.into_model_input().map_err(|err| {
        warn!("rejected payload: {err}");
        ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
    })?;

    let label = state.classifier.predict(&row).map_err(|err| {
        tracing::error!("inference failed: {err}");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    })?;

    Ok(Json(PredictResponse { label }))
}
