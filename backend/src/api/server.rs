//! HTTP server for the operator UI.
//!
//! # API Endpoints
//!
//! | Method | Path          | Description                                  |
//! |--------|---------------|----------------------------------------------|
//! | GET    | `/health`     | Health check                                 |
//! | GET    | `/api/banks`  | Active bank-code table                       |
//! | POST   | `/api/upload` | Validate a schedule and preview the rows     |
//! | POST   | `/api/export` | Validate a schedule and download the CSV     |
//! | GET    | `/api/logs`   | SSE stream of pipeline logs                  |
//!
//! Upload and export take multipart form data: a `file` field (`.csv` or
//! `.xlsx`) and an optional `remark` text field. Nothing is kept between
//! requests; the UI sends the same form to `/api/export` once the operator
//! has confirmed the preview.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderName, Method, StatusCode},
    response::{sse::Event, sse::KeepAlive, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{error_response, UploadResponse};
use crate::bank_codes::BankCodeTable;
use crate::config::Config;
use crate::error::{PipelineError, ServerError, ServerResult, SheetError};
use crate::export::{file_name_now, CSV_MIME};
use crate::transform::pipeline::{process_bytes, PipelineResult, TransformOptions};

/// Header carrying `ready` / `warning` on CSV downloads.
const STATUS_HEADER: &str = "x-disburse-status";

/// Process-wide, read-only state built once at startup.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub bank_codes: BankCodeTable,
}

type SharedState = Arc<AppState>;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let max_upload = state.config.max_upload_bytes;
    let static_dir = state.config.static_dir.clone();

    let app: Router<SharedState> = Router::new()
        .route("/health", get(health))
        .route("/api/banks", get(list_banks))
        .route("/api/upload", post(upload))
        .route("/api/export", post(export))
        .route("/api/logs", get(sse_logs));

    let app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app.route("/", get(health)),
    };

    app.layer(DefaultBodyLimit::max(max_upload))
        .layer(cors_layer())
        .with_state(Arc::new(state))
}

/// Start the HTTP server.
pub async fn start_server(config: Config, bank_codes: BankCodeTable) -> ServerResult<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let bank_count = bank_codes.len();
    let app = router(AppState { config, bank_codes });

    eprintln!("🚀 Disburse server running on http://localhost:{}", addr.port());
    eprintln!("   POST /api/upload - Validate and preview a schedule");
    eprintln!("   POST /api/export - Download the bulk-upload CSV");
    eprintln!("   GET  /api/banks  - Bank codes ({} names)", bank_count);
    eprintln!("   GET  /api/logs   - SSE log stream");
    eprintln!("   GET  /health     - Health check");
    eprintln!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([
            header::CONTENT_TYPE,
            header::CONTENT_DISPOSITION,
            HeaderName::from_static(STATUS_HEADER),
        ])
}

// =============================================================================
// Handlers
// =============================================================================

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "disburse",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "export": "POST /api/export",
            "banks": "GET /api/banks",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

async fn list_banks(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "count": state.bank_codes.len(),
        "banks": &state.bank_codes,
    }))
}

async fn upload(
    State(state): State<SharedState>,
    multipart: Multipart,
) -> ServerResult<Json<UploadResponse>> {
    let form = read_form(multipart).await?;
    let result = run_pipeline(&state, &form)?;

    let file_name = file_name_now(state.config.utc_offset);
    Ok(Json(UploadResponse::new(
        result,
        &state.config.currency_symbol,
        file_name,
    )))
}

async fn export(State(state): State<SharedState>, multipart: Multipart) -> ServerResult<Response> {
    let form = read_form(multipart).await?;
    let result = run_pipeline(&state, &form)?;
    let csv = result.encode().map_err(PipelineError::from)?;

    let file_name = file_name_now(state.config.utc_offset);
    log_info(format!("📥 Serving {} ({} bytes)", file_name, csv.len()));

    let headers = [
        (header::CONTENT_TYPE, CSV_MIME.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ),
        (
            HeaderName::from_static(STATUS_HEADER),
            result.status().to_string(),
        ),
    ];
    Ok((headers, csv).into_response())
}

async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// =============================================================================
// Helpers
// =============================================================================

/// Fields of an upload form.
struct UploadForm {
    file_name: String,
    bytes: Vec<u8>,
    remark: String,
}

async fn read_form(mut multipart: Multipart) -> ServerResult<UploadForm> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut remark = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                file = Some((file_name, bytes.to_vec()));
            }
            "remark" => {
                remark = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            }
            _ => {}
        }
    }

    let (file_name, bytes) =
        file.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;

    Ok(UploadForm {
        file_name,
        bytes,
        remark,
    })
}

fn run_pipeline(state: &AppState, form: &UploadForm) -> ServerResult<PipelineResult> {
    eprintln!("\n{}", "=".repeat(70));
    eprintln!(
        "📄 NEW UPLOAD: {} ({} bytes)",
        if form.file_name.is_empty() { "unnamed" } else { &form.file_name },
        form.bytes.len()
    );
    eprintln!("{}\n", "=".repeat(70));

    let options = TransformOptions {
        remark: form.remark.clone(),
        currency: state.config.currency_symbol.clone(),
    };

    Ok(process_bytes(
        &form.bytes,
        &form.file_name,
        &state.bank_codes,
        &options,
    )?)
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Sheet(SheetError::UnsupportedFormat(_))) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ServerError::Pipeline(err) if err.is_user_error() => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(error_response(&self.to_string()))).into_response()
    }
}
