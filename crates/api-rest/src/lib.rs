//! # API REST
//!
//! REST API for the diet inference service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON error bodies, status codes, CORS)
//!
//! All domain work is delegated to [`diet_core::ServiceContext`].

#![warn(rust_2018_idioms)]

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use diet_core::{
    classifier::RawOutput, DietPlan, HealthReport, Meal, ModelOutput, PatientRecord, PlanSummary,
    PredictionResponse, ResponseMeta, ServiceContext, ServiceError,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<ServiceContext>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, predict, diet_plan),
    components(schemas(
        HealthReport,
        PredictionResponse,
        ResponseMeta,
        PatientRecord,
        ModelOutput,
        RawOutput,
        DietPlan,
        PlanSummary,
        Meal,
        ErrorBody,
        ErrorDetail,
    ))
)]
pub struct ApiDoc;

/// Builds the service router with Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/model/health", get(health))
        .route("/api/model/predict", post(predict))
        .route("/api/model/dietplan", post(diet_plan))
        .merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub message: String,
    pub code: String,
    pub status: u16,
    pub details: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorDetail,
}

/// Request failure as seen by HTTP clients.
#[derive(Debug)]
pub enum ApiError {
    /// Body is not JSON.
    MalformedBody(String),
    Service(ServiceError),
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self::Service(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            Self::MalformedBody(message) => (
                StatusCode::BAD_REQUEST,
                "MALFORMED_BODY",
                message.clone(),
                vec![message],
            ),
            Self::Service(ServiceError::Validation(e)) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                e.to_string(),
                e.violations(),
            ),
            Self::Service(ServiceError::Prediction(e)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "PREDICTION_ERROR",
                e.to_string(),
                vec![e.0.to_string()],
            ),
        };

        let body = ErrorBody {
            success: false,
            error: ErrorDetail {
                message,
                code: code.into(),
                status: status.as_u16(),
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[utoipa::path(
    get,
    path = "/api/model/health",
    responses(
        (status = 200, description = "Service and model status", body = HealthReport)
    )
)]
/// Health check endpoint, also reporting the loaded model.
async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.ctx.health())
}

#[utoipa::path(
    post,
    path = "/api/model/predict",
    request_body = PatientRecord,
    responses(
        (status = 200, description = "Prediction with safety warnings", body = PredictionResponse),
        (status = 400, description = "Invalid patient record", body = ErrorBody),
        (status = 500, description = "Prediction failed", body = ErrorBody)
    )
)]
/// Validate a patient record and predict its diet recommendation.
///
/// The body is taken as untyped JSON so the validator can report unknown fields and every
/// missing field instead of failing on the first.
async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(raw) = body?;
    Ok(Json(state.ctx.predict(&raw)?))
}

#[utoipa::path(
    post,
    path = "/api/model/dietplan",
    request_body = PatientRecord,
    responses(
        (status = 200, description = "Prediction with a sanitized diet plan", body = PredictionResponse),
        (status = 400, description = "Invalid patient record", body = ErrorBody),
        (status = 500, description = "Prediction failed", body = ErrorBody)
    )
)]
/// Predict and return a diet plan filtered for the patient's restrictions.
async fn diet_plan(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(raw) = body?;
    Ok(Json(state.ctx.generate_diet_plan(&raw)?))
}
