use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::{HeaderMap, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::{
    config::DEFAULT_MAX_UPLOAD_BYTES,
    converter::file_extension,
    error::ApiError,
    formats::{self, FormatCategory},
    result::ConversionResult,
    service::ConversionService,
    youtube,
};

const DEFAULT_DOWNLOAD_NAME: &str = "output.md";

#[derive(Clone)]
pub struct AppState {
    service: Arc<ConversionService>,
    auth_token: Option<Arc<str>>,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(service: ConversionService) -> Self {
        Self {
            service: Arc::new(service),
            auth_token: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.map(Arc::from);
        self
    }

    pub fn with_max_upload_bytes(mut self, limit: usize) -> Self {
        self.max_upload_bytes = limit;
        self
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    engine: &'static str,
}

#[derive(Debug, Serialize)]
struct MarkdownResponse {
    markdown: String,
    filename: String,
}

#[derive(Debug, Deserialize)]
struct YoutubeRequest {
    #[serde(default)]
    youtube_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DownloadRequest {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    filename: Option<String>,
}

struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/formats", get(list_formats))
        .route("/api/convert/file", post(convert_file))
        .route("/api/convert/youtube", post(convert_youtube))
        .route("/api/download", post(download))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|auth_header| auth_header.strip_prefix("Bearer "))
}

async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.auth_token.as_deref() else {
        return Ok(next.run(request).await);
    };
    match extract_bearer_token(&headers) {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => Err(ApiError::Unauthorized),
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        engine: state.service.engine_name(),
    })
}

async fn list_formats() -> Json<&'static [FormatCategory]> {
    Json(formats::categories())
}

async fn convert_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MarkdownResponse>, ApiError> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!(%rejection, "request is not multipart");
        ApiError::BadRequest("No file part".to_string())
    })?;

    let upload = read_upload(&mut multipart)
        .await?
        .ok_or_else(|| ApiError::BadRequest("No file part".to_string()))?;

    if upload.filename.is_empty() {
        return Err(ApiError::BadRequest("No file selected".to_string()));
    }

    let ext = file_extension(&upload.filename);
    if !formats::is_supported(&ext) {
        return Err(ApiError::BadRequest(format!("Unsupported file format: {ext}")));
    }

    let result = state
        .service
        .convert_upload(&upload.bytes, &upload.filename)
        .await;
    markdown_response(result)
}

async fn read_upload(multipart: &mut Multipart) -> Result<Option<Upload>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(read_error)? {
        if field.name() != Some("file") {
            continue;
        }
        // A `file` part without a filename parameter is a plain form value.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await.map_err(read_error)?;
        return Ok(Some(Upload {
            filename,
            bytes: bytes.to_vec(),
        }));
    }
    Ok(None)
}

fn read_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    warn!(error = %err, "failed to read multipart body");
    let message = format!("Failed to read upload: {}", err.body_text());
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(message)
    } else {
        ApiError::BadRequest(message)
    }
}

async fn convert_youtube(
    State(state): State<AppState>,
    payload: Result<Json<YoutubeRequest>, JsonRejection>,
) -> Result<Json<MarkdownResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let url = request.youtube_url.unwrap_or_default();

    if url.is_empty() {
        return Err(ApiError::BadRequest("No YouTube URL provided".to_string()));
    }
    if !youtube::is_valid(&url) {
        return Err(ApiError::BadRequest("Invalid YouTube URL".to_string()));
    }

    let result = state.service.convert_youtube(&url).await;
    markdown_response(result)
}

async fn download(
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let markdown = request.markdown.unwrap_or_default();
    let filename = request
        .filename
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DOWNLOAD_NAME.to_string());

    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(&filename)),
        ],
        markdown,
    )
        .into_response())
}

fn markdown_response(result: ConversionResult) -> Result<Json<MarkdownResponse>, ApiError> {
    match result.into_outcome() {
        Ok((markdown, filename)) => Ok(Json(MarkdownResponse { markdown, filename })),
        Err(message) => Err(ApiError::Conversion(message)),
    }
}

// Quoted ASCII name for every client, plus RFC 5987 `filename*` when the name needs it.
fn content_disposition(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let fallback: String = name
        .chars()
        .map(|ch| {
            if ch.is_ascii() && !ch.is_ascii_control() && ch != '"' {
                ch
            } else {
                '_'
            }
        })
        .collect();

    if fallback == name {
        format!("attachment; filename=\"{name}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(name)
        )
    }
}
