use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use utoipa::{OpenApi, ToSchema};

use crate::inspection::InspectionRecord;
use crate::services::{ImportOutcome, InspectionImportError, InspectionImportService};

#[derive(Clone)]
pub struct AppState {
    pub import_service: InspectionImportService,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct ImportResponse {
    pub message: String,
    #[serde(flatten)]
    pub outcome: ImportOutcome,
}

#[derive(Serialize, ToSchema)]
pub struct PreviewResponse {
    pub filename: String,
    pub record_count: usize,
    /// Flat objects keyed by column name
    #[schema(value_type = Vec<Object>)]
    pub records: Vec<InspectionRecord>,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(OpenApi)]
#[openapi(
    paths(health, import_file, preview_file),
    components(schemas(HealthResponse, ImportResponse, ImportOutcome, PreviewResponse, ErrorResponse)),
    tags((name = "inspections", description = "Inspection report ingestion"))
)]
pub struct ApiDoc;

pub fn generate_openapi_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/imports/{*filename}", post(import_file))
        .route("/previews/{*filename}", post(preview_file))
        .with_state(state);

    Router::new().nest("/api/v1", api_routes)
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "inspections",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
#[instrument]
async fn health() -> impl IntoResponse {
    debug!("Health check requested");
    let response = HealthResponse {
        status: "healthy".to_string(),
    };
    (StatusCode::OK, Json(response))
}

/// Extract and store the records of one uploaded report
#[utoipa::path(
    post,
    path = "/api/v1/imports/{filename}",
    tag = "inspections",
    params(("filename" = String, Path, description = "Report file name or object key, stored verbatim")),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Records stored, or no measurable records found", body = ImportResponse),
        (status = 422, description = "File could not be read as a grid", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    )
)]
#[instrument(skip(state, body), fields(filename = %filename, bytes = body.len()))]
async fn import_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    body: Bytes,
) -> Result<Json<ImportResponse>, ApiError> {
    debug!("Importing inspection file {}", filename);

    let outcome = state
        .import_service
        .import_file(&filename, body.to_vec())
        .await
        .map_err(|e| to_api_error(&filename, e))?;

    let message = outcome.message();
    info!("{}", message);

    Ok(Json(ImportResponse { message, outcome }))
}

/// Extract the records of one report without storing them
#[utoipa::path(
    post,
    path = "/api/v1/previews/{filename}",
    tag = "inspections",
    params(("filename" = String, Path, description = "Report file name; its extension selects the parser")),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Extracted records", body = PreviewResponse),
        (status = 422, description = "File could not be read as a grid", body = ErrorResponse)
    )
)]
#[instrument(skip(state, body), fields(filename = %filename, bytes = body.len()))]
async fn preview_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    body: Bytes,
) -> Result<Json<PreviewResponse>, ApiError> {
    let records = state
        .import_service
        .preview_file(&filename, body.to_vec())
        .await
        .map_err(|e| to_api_error(&filename, e))?;

    info!("Previewed {} records from {}", records.len(), filename);

    Ok(Json(PreviewResponse {
        filename,
        record_count: records.len(),
        records,
    }))
}

fn to_api_error(filename: &str, err: InspectionImportError) -> ApiError {
    let status = match &err {
        InspectionImportError::Parse(_) => {
            warn!("Unreadable inspection file {}: {}", filename, err);
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => {
            error!("Error processing {}: {}", filename, err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
