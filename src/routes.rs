use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::Display;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config_store::ConfigUpdate;
use crate::files::{resolve_in_dir, sanitize_upload_name};
use crate::history::DEFAULT_PAGE_SIZE;
use crate::sheet::{self, SheetError};
use crate::state::AppState;
use crate::translate::TranslationError;

type ApiError = (StatusCode, Json<Value>);
type ApiResult = Result<Json<Value>, ApiError>;

fn api_error(status: StatusCode, message: impl Display) -> ApiError {
    (status, Json(json!({ "error": message.to_string() })))
}

/// Full application: routes, request tracing and CORS, with state attached.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub fn create_routes(state: AppState) -> Router<AppState> {
    let max_upload_bytes = state.settings.upload.max_bytes;

    Router::new()
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/download/:filename", get(download_file))
        .route("/api/config", get(get_config).post(update_config))
        .route("/api/models", get(list_models))
        .route("/api/history", get(get_history))
        .route("/api/health", get(health_check))
}

fn join_error(e: tokio::task::JoinError) -> ApiError {
    error!(error = %e, "Background task failed");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

/// Run SQLite and file work on the blocking pool; every store call may wait
/// on `busy_timeout`.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(join_error)
}

async fn health_check(State(state): State<AppState>) -> ApiResult {
    let store = state.config_store.clone();
    let (config, sources) = blocking(move || (store.load().redacted(), store.describe())).await?;
    Ok(Json(json!({
        "status": "ok",
        "config": config,
        "sources": sources,
    })))
}

async fn get_config(State(state): State<AppState>) -> ApiResult {
    let store = state.config_store.clone();
    let config = blocking(move || store.load()).await?;
    Ok(Json(json!(config)))
}

async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<ConfigUpdate>,
) -> ApiResult {
    if update.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "no config fields provided"));
    }

    let store = state.config_store.clone();
    blocking(move || store.save(update)).await?.map_err(|e| {
        error!(error = %e, "Failed to save translation API config");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("failed to save config: {}", e))
    })?;

    Ok(Json(json!({ "message": "config saved" })))
}

async fn list_models(State(state): State<AppState>) -> ApiResult {
    let store = state.config_store.clone();
    let config = blocking(move || store.load()).await?;
    let models = state.translator.list_models(&config).await.map_err(|e| match e {
        TranslationError::Configuration => api_error(StatusCode::BAD_REQUEST, e),
        other => {
            warn!(error = %other, "Failed to list models");
            api_error(StatusCode::BAD_GATEWAY, format!("failed to list models: {}", other))
        }
    })?;

    let models: Vec<Value> = models.into_iter().map(|id| json!({ "id": id })).collect();
    Ok(Json(json!({ "models": models })))
}

#[derive(Debug, Deserialize)]
struct HistoryParams {
    limit: Option<usize>,
    offset: Option<usize>,
}

async fn get_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> ApiResult {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0);

    let history = state.history.clone();
    let page = blocking(move || history.query(limit, offset)).await?.map_err(|e| {
        error!(error = %e, "Failed to query translation history");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("failed to load history: {}", e))
    })?;

    Ok(Json(json!({
        "total": page.total,
        "history": page.records,
    })))
}

fn sheet_error(file_name: &str, e: SheetError) -> ApiError {
    match e {
        SheetError::Write(_) => {
            error!(file_name, error = %e, "Failed to write translated sheet");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e)
        }
        _ => {
            warn!(file_name, error = %e, "Rejected upload");
            api_error(StatusCode::BAD_REQUEST, e)
        }
    }
}

fn multipart_error(e: MultipartError, max_bytes: usize) -> ApiError {
    let status = e.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(max_bytes, "Rejected upload over the size limit");
        return api_error(status, format!("upload exceeds the {} byte limit", max_bytes));
    }
    api_error(status, e.body_text())
}

/// Pull the `file` field out of the form, validating its name before the body
/// is read.
async fn read_upload(
    multipart: &mut Multipart,
    max_bytes: usize,
) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let raw_name = field.file_name().unwrap_or("").to_string();
        if raw_name.is_empty() {
            return Err(api_error(StatusCode::BAD_REQUEST, "no file selected"));
        }
        let file_name = sanitize_upload_name(&raw_name)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
        sheet::check_extension(&file_name).map_err(|e| sheet_error(&file_name, e))?;

        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, max_bytes))?;
        return Ok((file_name, data));
    }

    Err(api_error(StatusCode::BAD_REQUEST, "no file uploaded"))
}

async fn upload_file(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult {
    let (file_name, data) = read_upload(&mut multipart, state.settings.upload.max_bytes).await?;
    info!(file_name = %file_name, bytes = data.len(), "Received upload");

    let table = blocking(move || sheet::read_table(data.to_vec()))
        .await?
        .map_err(|e| sheet_error(&file_name, e))?;

    let store = state.config_store.clone();
    let config = blocking(move || store.load()).await?;
    let (output, result) = state
        .processor()
        .process(table, &file_name, &config)
        .await
        .map_err(|e| sheet_error(&file_name, e))?;

    let output_name = sheet::output_file_name(&file_name);
    let output_path = resolve_in_dir(state.upload_dir(), &output_name)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    blocking(move || sheet::write_table(&output, &output_path))
        .await?
        .map_err(|e| sheet_error(&file_name, e))?;

    Ok(Json(json!({
        "message": "translation finished",
        "filename": output_name,
        "success_count": result.success_count,
        "error_count": result.error_count,
    })))
}

async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let path = resolve_in_dir(state.upload_dir(), &filename).map_err(|e| {
        warn!(filename = %filename, "Rejected download path");
        api_error(StatusCode::BAD_REQUEST, e)
    })?;

    let response = ServeFile::new(&path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    if response.status() == StatusCode::NOT_FOUND {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("file not found: {}", filename),
        ));
    }

    let disposition = format!("attachment; filename*=UTF-8''{}", urlencoding::encode(&filename));
    let disposition = HeaderValue::from_str(&disposition).map_err(|e| {
        error!(filename = %filename, error = %e, "Unencodable download name");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "invalid file name")
    })?;

    let mut response = response.map(Body::new);
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}
