use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tower::limit::ConcurrencyLimitLayer;

use crate::allocation;
use crate::config::Settings;
use crate::data::{
    Allocation, ClashDeclarations, RawAllocation, RawEvent, UnavailabilityDeclarations,
    VenueDirectory,
};
use crate::error::SchedulerError;
use crate::model::Model;
use crate::solver::{Diagnostic, Engine, Orchestrator, STRATEGIES, SolveOutcome, Strategy};

/// Everything needed to build and solve one conference model.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    pub venues: VenueDirectory,
    pub events: Vec<RawEvent>,
    #[serde(default)]
    pub unavailability: UnavailabilityDeclarations,
    #[serde(default)]
    pub clashes: ClashDeclarations,
    pub strategy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub strategy: String,
    pub allocations: Vec<Allocation>,
    pub declared_clash_pairs: usize,
}

/// JSON error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Handler failures and the status each maps to.
#[derive(Debug)]
pub enum AppError {
    /// The body could not be read as the expected JSON shape.
    MalformedRequest(String),
    Scheduler(SchedulerError),
    NoSolution(Diagnostic),
    Internal(String),
}

impl From<SchedulerError> for AppError {
    fn from(err: SchedulerError) -> Self {
        AppError::Scheduler(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::MalformedRequest(message) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_REQUEST", message)
            }
            AppError::Scheduler(err @ SchedulerError::MalformedRecord { .. }) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_RECORD", err.to_string())
            }
            AppError::Scheduler(err @ SchedulerError::UnknownStrategy(_)) => {
                (StatusCode::BAD_REQUEST, "UNKNOWN_STRATEGY", err.to_string())
            }
            AppError::Scheduler(err @ SchedulerError::IndexOutOfBounds { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INDEX_OUT_OF_BOUNDS", err.to_string())
            }
            AppError::NoSolution(diagnostic) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "NO_SOLUTION",
                format!("{}: {}", diagnostic.strategy, diagnostic.reason),
            ),
            AppError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
            }
        };
        if status.is_server_error() {
            warn!("{code}: {message}");
        }
        let body = ApiError {
            code: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator<Engine>>,
    default_strategy: String,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            orchestrator: Arc::new(Orchestrator::with_tuning(Engine, settings.tuning)),
            default_strategy: settings.default_strategy.clone(),
        }
    }
}

async fn solve_handler(
    State(state): State<AppState>,
    payload: Result<Json<ScheduleRequest>, JsonRejection>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let Json(request) = payload?;
    let strategy = request
        .strategy
        .clone()
        .unwrap_or_else(|| state.default_strategy.clone());
    let strategy_name = strategy.clone();

    // the solve is CPU bound; keep it off the async workers
    let orchestrator = Arc::clone(&state.orchestrator);
    let (model, outcome) = tokio::task::spawn_blocking(move || {
        let model = Model::build(
            &request.venues,
            &request.events,
            &request.unavailability,
            &request.clashes,
        )?;
        let outcome = orchestrator.solve(&model, &strategy)?;
        Ok::<_, SchedulerError>((model, outcome))
    })
    .await
    .map_err(|e| AppError::Internal(format!("solve task failed: {e}")))??;

    match outcome {
        SolveOutcome::Scheduled(pairs) => {
            let allocations = allocation::resolve(&pairs, &model.events, &model.slots)?;
            info!("Scheduled {} events", allocations.len());
            for allocation in &allocations {
                debug!("{allocation}");
            }
            Ok(Json(ScheduleResponse {
                strategy: strategy_name,
                allocations,
                declared_clash_pairs: model.clashes.declared_pairs(),
            }))
        }
        SolveOutcome::NoSolution(diagnostic) => {
            error!(
                "No valid solution found using {}: {}",
                diagnostic.strategy, diagnostic.reason
            );
            Err(AppError::NoSolution(diagnostic))
        }
    }
}

async fn allocations_handler(
    payload: Result<Json<Vec<RawAllocation>>, JsonRejection>,
) -> Result<Json<Vec<Allocation>>, AppError> {
    let Json(records) = payload?;
    Ok(Json(allocation::resolve_manual(&records)?))
}

async fn strategies_handler() -> Json<&'static [Strategy]> {
    Json(STRATEGIES)
}

pub fn router(state: AppState, max_concurrent_solves: usize) -> Router {
    Router::new()
        .route(
            "/v1/schedule/solve",
            post(solve_handler).layer(ConcurrencyLimitLayer::new(max_concurrent_solves)),
        )
        .route("/v1/schedule/allocations", post(allocations_handler))
        .route("/v1/strategies", get(strategies_handler))
        .with_state(state)
}

pub async fn run_server(settings: Settings) -> std::io::Result<()> {
    let app = router(AppState::new(&settings), settings.max_concurrent_solves);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
