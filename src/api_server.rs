// Axum API server
//
// Upload a workbook or Kraken report, get a session id back, then query chart
// and table descriptions scoped to that session. Chart endpoints always answer
// 200 with a figure (a placeholder when the input cannot be plotted).

#[cfg(feature = "api")]
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};

#[cfg(feature = "api")]
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

#[cfg(feature = "api")]
use serde::Deserialize;

#[cfg(feature = "api")]
use std::sync::Arc;

#[cfg(feature = "api")]
use crate::columns::{classify_columns, sample_names, SAMPLE_COLUMN};

#[cfg(feature = "api")]
use crate::config::{GraphQuery, ServerConfig};

#[cfg(feature = "api")]
use crate::data::{TabularDataset, Upload};

#[cfg(feature = "api")]
use crate::error::DashboardError;

#[cfg(feature = "api")]
use crate::figures::{
    bar_figure, build_data_table, sample_flow_figure, stacked_figure, taxonomy_sankey_figure,
    taxonomy_table, top_taxa_figure, Figure, Placeholder, Table,
};

#[cfg(feature = "api")]
use crate::session::SessionStore;

#[cfg(feature = "api")]
use crate::taxonomy::{DEFAULT_HIERARCHY, DEFAULT_TOP_N, DEFAULT_VALUE_COLUMN};

/// Category column used by the stacked chart when none is given.
pub const DEFAULT_CATEGORY_COLUMN: &str = "Species.2";

// ============================================================================
// Application State
// ============================================================================

#[cfg(feature = "api")]
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub config: Arc<ServerConfig>,
}

#[cfg(feature = "api")]
impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        tracing::info!(
            "Initializing session store (max {} sessions, idle TTL {:?})...",
            config.max_sessions,
            config.session_ttl
        );
        Self {
            sessions: SessionStore::new(&config),
            config: Arc::new(config),
        }
    }

    async fn upload(&self, session_id: &str) -> Result<Arc<Upload>, AppError> {
        self.sessions
            .get(session_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("session '{}' not found", session_id)))
    }
}

// ============================================================================
// Router
// ============================================================================

#[cfg(feature = "api")]
pub fn create_router(state: AppState) -> Router {
    let max_upload = state.config.max_upload_bytes;

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Uploads and sessions
        .route("/api/uploads", post(upload_file))
        .route("/api/sessions/:sid", delete(delete_session))
        .route("/api/sessions/:sid/sheets", get(list_sheets))

        // Column explorer over any sheet
        .route("/api/sessions/:sid/sheets/:sheet/columns", get(sheet_columns))
        .route("/api/sessions/:sid/sheets/:sheet/bar", get(sheet_bar))
        .route("/api/sessions/:sid/sheets/:sheet/table", get(sheet_table))
        .route("/api/sessions/:sid/sheets/:sheet/samples", get(sheet_samples))
        .route("/api/sessions/:sid/sheets/:sheet/sample-flow", get(sheet_sample_flow))
        .route("/api/sessions/:sid/sheets/:sheet/stacked", get(sheet_stacked))

        // Kraken report views
        .route("/api/sessions/:sid/kraken/sankey", get(kraken_sankey))
        .route("/api/sessions/:sid/kraken/table", get(kraken_table))
        .route("/api/sessions/:sid/kraken/top", get(kraken_top))

        // Middleware (applied in reverse order)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Request Parameters
// ============================================================================

#[cfg(feature = "api")]
#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub filename: String,
}

#[cfg(feature = "api")]
#[derive(Debug, Default, Deserialize)]
pub struct AxisParams {
    pub x: Option<String>,
    pub y: Option<String>,
}

#[cfg(feature = "api")]
#[derive(Debug, Default, Deserialize)]
pub struct SampleParams {
    pub sample: Option<String>,
    /// Sample column (default `Sample_name`)
    pub column: Option<String>,
    /// Link weight column (default `Reads_(%)`)
    pub value: Option<String>,
}

#[cfg(feature = "api")]
#[derive(Debug, Default, Deserialize)]
pub struct StackedParams {
    pub group: Option<String>,
    pub category: Option<String>,
    pub value: Option<String>,
}

#[cfg(feature = "api")]
#[derive(Debug, Default, Deserialize)]
pub struct TopParams {
    pub top_n: Option<usize>,
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

#[cfg(feature = "api")]
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "sessions": state.sessions.len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[cfg(feature = "api")]
async fn upload_file(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let filename = params.filename.trim().to_string();
    if filename.is_empty() {
        return Err(AppError::BadRequest("filename must not be empty".to_string()));
    }

    tracing::info!("Decoding upload '{}' ({} bytes)", filename, body.len());

    // Workbook and report decoding are CPU-bound
    let name = filename.clone();
    let upload = tokio::task::spawn_blocking(move || Upload::from_bytes(&name, &body))
        .await
        .map_err(|e| AppError::Internal(format!("Task join error: {}", e)))??;

    let sheets = upload.sheet_names();
    let has_report = upload.has_report();
    let session_id = state.sessions.insert(upload).await;

    Ok(Json(serde_json::json!({
        "session_id": session_id,
        "filename": filename,
        "sheets": sheets,
        "has_report": has_report,
    })))
}

#[cfg(feature = "api")]
async fn delete_session(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(&sid).await {
        tracing::info!("Session {} deleted", sid);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("session '{}' not found", sid)))
    }
}

#[cfg(feature = "api")]
async fn list_sheets(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let upload = state.upload(&sid).await?;
    Ok(Json(serde_json::json!({ "sheets": upload.sheet_names() })))
}

#[cfg(feature = "api")]
async fn sheet_columns(
    State(state): State<AppState>,
    Path((sid, sheet)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let upload = state.upload(&sid).await?;
    let dataset = upload.workbook.sheet(&sheet)?;
    let classification = classify_columns(dataset);

    Ok(Json(serde_json::json!({
        "all": classification.all,
        "numeric": classification.numeric,
        "pattern_based": classification.pattern_based,
        "x_options": classification.x_options(),
        "y_options": classification.y_options(),
    })))
}

#[cfg(feature = "api")]
async fn sheet_bar(
    State(state): State<AppState>,
    Path((sid, sheet)): Path<(String, String)>,
    Query(params): Query<AxisParams>,
) -> Result<Json<Figure>, AppError> {
    let upload = state.upload(&sid).await?;
    let figure = match (params.x.as_deref(), params.y.as_deref()) {
        (Some(x), Some(y)) => with_sheet(&upload, &sheet, |ds| bar_figure(ds, x, y)),
        _ => Figure::no_data(),
    };
    Ok(Json(figure))
}

#[cfg(feature = "api")]
async fn sheet_table(
    State(state): State<AppState>,
    Path((sid, sheet)): Path<(String, String)>,
    Query(params): Query<AxisParams>,
) -> Result<Json<Table>, AppError> {
    let upload = state.upload(&sid).await?;
    let table = match (params.x.as_deref(), params.y.as_deref()) {
        (Some(x), Some(y)) => match upload.workbook.sheet(&sheet) {
            Ok(ds) => build_data_table(ds, x, y),
            Err(e) => Table::Placeholder(Placeholder::error(&e)),
        },
        _ => Table::Placeholder(Placeholder::no_data("No data to display")),
    };
    Ok(Json(table))
}

#[cfg(feature = "api")]
async fn sheet_samples(
    State(state): State<AppState>,
    Path((sid, sheet)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let upload = state.upload(&sid).await?;
    let dataset = upload.workbook.sheet(&sheet)?;
    Ok(Json(serde_json::json!({
        "samples": sample_names(dataset, SAMPLE_COLUMN)
    })))
}

#[cfg(feature = "api")]
async fn sheet_sample_flow(
    State(state): State<AppState>,
    Path((sid, sheet)): Path<(String, String)>,
    Query(params): Query<SampleParams>,
) -> Result<Json<Figure>, AppError> {
    let upload = state.upload(&sid).await?;
    let Some(sample) = params.sample.as_deref() else {
        return Ok(Json(Figure::no_data()));
    };
    let column = params.column.as_deref().unwrap_or(SAMPLE_COLUMN);
    let value = params.value.as_deref().unwrap_or(DEFAULT_VALUE_COLUMN);

    let figure = with_sheet(&upload, &sheet, |ds| {
        sample_flow_figure(ds, column, sample, &DEFAULT_HIERARCHY, value)
    });
    Ok(Json(figure))
}

#[cfg(feature = "api")]
async fn sheet_stacked(
    State(state): State<AppState>,
    Path((sid, sheet)): Path<(String, String)>,
    Query(params): Query<StackedParams>,
) -> Result<Json<Figure>, AppError> {
    let upload = state.upload(&sid).await?;
    let group = params.group.as_deref().unwrap_or(SAMPLE_COLUMN);
    let category = params.category.as_deref().unwrap_or(DEFAULT_CATEGORY_COLUMN);
    let value = params.value.as_deref().unwrap_or(DEFAULT_VALUE_COLUMN);

    let figure = with_sheet(&upload, &sheet, |ds| stacked_figure(ds, group, category, value));
    Ok(Json(figure))
}

#[cfg(feature = "api")]
async fn kraken_sankey(
    State(state): State<AppState>,
    Path(sid): Path<String>,
    Query(query): Query<GraphQuery>,
) -> Result<Json<Figure>, AppError> {
    let upload = state.upload(&sid).await?;
    let Some(report) = upload.report.as_ref() else {
        return Ok(Json(no_report()));
    };

    let figure = match query.to_options() {
        Ok(options) => taxonomy_sankey_figure(report.rows(), &options),
        Err(e) => Figure::error(&e),
    };
    Ok(Json(figure))
}

#[cfg(feature = "api")]
async fn kraken_table(
    State(state): State<AppState>,
    Path(sid): Path<String>,
    Query(query): Query<GraphQuery>,
) -> Result<Json<Table>, AppError> {
    let upload = state.upload(&sid).await?;
    let Some(report) = upload.report.as_ref() else {
        return Ok(Json(Table::Placeholder(Placeholder::no_data(NO_REPORT))));
    };

    let table = match query.to_options() {
        Ok(options) => taxonomy_table(report, &options),
        Err(e) => Table::Placeholder(Placeholder::error(&e)),
    };
    Ok(Json(table))
}

#[cfg(feature = "api")]
async fn kraken_top(
    State(state): State<AppState>,
    Path(sid): Path<String>,
    Query(params): Query<TopParams>,
) -> Result<Json<Figure>, AppError> {
    let upload = state.upload(&sid).await?;
    let Some(report) = upload.report.as_ref() else {
        return Ok(Json(no_report()));
    };
    let top_n = params.top_n.unwrap_or(DEFAULT_TOP_N);
    Ok(Json(top_taxa_figure(report, top_n)))
}

#[cfg(feature = "api")]
const NO_REPORT: &str = "No Kraken report in this session";

#[cfg(feature = "api")]
fn no_report() -> Figure {
    Figure::Placeholder(Placeholder::no_data(NO_REPORT))
}

/// Unknown sheets render as an error placeholder.
#[cfg(feature = "api")]
fn with_sheet<F>(upload: &Upload, sheet: &str, render: F) -> Figure
where
    F: FnOnce(&TabularDataset) -> Figure,
{
    match upload.workbook.sheet(sheet) {
        Ok(dataset) => render(dataset),
        Err(e) => Figure::error(&e),
    }
}

// ============================================================================
// Error Handling
// ============================================================================

#[cfg(feature = "api")]
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

#[cfg(feature = "api")]
impl From<DashboardError> for AppError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::UnknownSheet { .. } | DashboardError::MissingColumn { .. } => {
                AppError::NotFound(err.to_string())
            }
            e if e.is_malformed_input() => AppError::BadRequest(e.to_string()),
            e => AppError::Internal(e.to_string()),
        }
    }
}

#[cfg(feature = "api")]
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            tracing::error!("{}", message);
        } else {
            tracing::debug!("{}: {}", status, message);
        }

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
