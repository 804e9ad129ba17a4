use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tracing::{Level, error, info, info_span, warn};
use uuid::Uuid;

mod metrics;

use mediacut::{
    Artifact, AudioCodec, Dispatcher, EncodingOpts, Error, FfmpegProvider, MediaKind,
    OperationRequest, SelectedInput, Session, SourceLocation, TracingStatus,
};

type SharedDispatcher = Arc<Mutex<Dispatcher<FfmpegProvider, TracingStatus>>>;

#[derive(Parser, Debug)]
#[command(name = "mediacut-server")]
#[command(about = "HTTP server for trimming media and extracting audio")]
struct Params {
    /// Engine source candidates, highest priority first (path, command name, or URL).
    #[arg(short = 'e', long = "engine", num_args = 1.., default_values_t = vec!["ffmpeg".to_string()])]
    engines: Vec<String>,

    /// JSON file overriding encoder defaults.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Load the engine at startup instead of on the first request.
    #[arg(long = "preload", default_value_t = false)]
    preload: bool,

    /// Host interface to bind to.
    #[arg(long = "host", default_value = "127.0.0.1")]
    host: String,

    /// TCP port to listen on.
    #[arg(long = "port", default_value_t = 8080)]
    port: u16,

    /// Maximum request body size (bytes).
    #[arg(long = "max-bytes", default_value_t = 512 * 1024 * 1024)]
    max_bytes: usize,
}

#[derive(Clone)]
struct AppState {
    dispatcher: SharedDispatcher,
}

#[derive(Debug, Deserialize)]
struct TrimQuery {
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    kind: Option<MediaKind>,
    #[serde(default)]
    start: Option<String>,
    #[serde(default)]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConvertQuery {
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    kind: Option<MediaKind>,
    #[serde(default)]
    target: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::NoFileSelected => StatusCode::BAD_REQUEST,
            Error::EngineUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::InvocationFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

#[tokio::main]
async fn main() {
    mediacut::init_logging_with_default(tracing::level_filters::LevelFilter::INFO);

    if let Err(err) = run().await {
        error!(error = ?err, "mediacut-server failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let params = Params::parse();

    if let Err(err) = metrics::init() {
        warn!(error = ?err, "metrics disabled (init failed)");
    }

    let addr: SocketAddr = format!("{}:{}", params.host, params.port)
        .parse()
        .context("invalid host/port bind address")?;

    let opts = match &params.config {
        Some(path) => EncodingOpts::from_json_file(path)?,
        None => EncodingOpts::default(),
    };

    let candidates = params
        .engines
        .iter()
        .map(|raw| SourceLocation::parse(raw))
        .collect();

    let mut dispatcher =
        Dispatcher::ffmpeg(candidates, opts).context("failed to configure engine loader")?;

    if params.preload {
        dispatcher
            .loader_mut()
            .ensure_ready()
            .context("failed to preload engine")?;
    }

    let state = AppState {
        dispatcher: Arc::new(Mutex::new(dispatcher)),
    };

    let app = Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics::prometheus_metrics))
        .route("/v1/trim", post(trim))
        .route("/v1/convert", post(convert))
        .route_layer(from_fn(metrics::track_http_metrics))
        .with_state(state)
        .layer(DefaultBodyLimit::max(params.max_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        );

    let listener = TcpListener::bind(addr).await.context("bind failed")?;
    info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = ?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn root() -> &'static str {
    "mediacut-server: POST /v1/trim?file_name=&start=&duration= or /v1/convert?file_name=&target= (raw file body)"
}

async fn healthz() -> &'static str {
    "ok"
}

async fn trim(
    State(state): State<AppState>,
    Query(query): Query<TrimQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Response, AppError> {
    let request = OperationRequest::trim(
        query.start.unwrap_or_default(),
        query.duration.unwrap_or_default(),
    );
    run_operation(state, query.file_name, query.kind, &headers, body, request).await
}

async fn convert(
    State(state): State<AppState>,
    Query(query): Query<ConvertQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> std::result::Result<Response, AppError> {
    let target = parse_target(query.target.as_deref())?;
    let request = OperationRequest::extract_or_convert(target);
    run_operation(state, query.file_name, query.kind, &headers, body, request).await
}

async fn run_operation(
    state: AppState,
    file_name: Option<String>,
    kind: Option<MediaKind>,
    headers: &HeaderMap,
    body: Bytes,
    request: OperationRequest,
) -> std::result::Result<Response, AppError> {
    let request_id = Uuid::new_v4();
    let declared_mime = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let file_name = file_name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "upload".to_owned());

    let operation = request.name();
    let dispatcher = state.dispatcher.clone();

    let res = tokio::task::spawn_blocking(move || {
        let span = info_span!("request", %request_id, file_name = %file_name);
        let _enter = span.enter();

        let mut session = Session::new();
        if !body.is_empty() {
            let bytes = body.to_vec();
            let selected = match kind {
                Some(kind) => SelectedInput::new(bytes, file_name, kind),
                None => SelectedInput::detect(bytes, file_name, declared_mime.as_deref()),
            };
            session.select(selected);
        }

        // Operations are serialized: one in flight per engine.
        let mut dispatcher = dispatcher
            .lock()
            .map_err(|_| {
                metrics::record_operation(operation, "other");
                AppError::internal("dispatcher mutex poisoned")
            })?;
        dispatcher.run(&mut session, &request).map_err(|err| {
            metrics::record_operation(operation, err.kind());
            AppError::from(err)
        })
    })
    .await
    .map_err(|err| {
        metrics::record_operation(operation, "other");
        AppError::internal(format!("operation task failed: {err}"))
    })?;

    let artifact = res?;
    metrics::record_operation(operation, "ok");
    artifact_response(artifact)
}

fn artifact_response(artifact: Artifact) -> std::result::Result<Response, AppError> {
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        artifact.file_name
    ))
    .map_err(|err| AppError::internal(err.to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(artifact.mime)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(artifact.bytes),
    )
        .into_response())
}

fn parse_target(target: Option<&str>) -> std::result::Result<AudioCodec, AppError> {
    match target {
        None => Ok(AudioCodec::Mp3),
        Some(raw) => AudioCodec::parse(raw).ok_or_else(|| {
            AppError::bad_request(format!(
                "unknown target '{}' (expected 'mp3', 'wav' or 'aac')",
                raw.trim()
            ))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_target_defaults_to_mp3() -> anyhow::Result<()> {
        assert_eq!(parse_target(None).map_err(|e| anyhow::anyhow!(e.message))?, AudioCodec::Mp3);
        Ok(())
    }

    #[test]
    fn parse_target_accepts_known_values_case_insensitively() {
        assert!(matches!(parse_target(Some(" AAC ")), Ok(AudioCodec::Aac)));
        assert!(matches!(parse_target(Some("wav")), Ok(AudioCodec::Wav)));
    }

    #[test]
    fn parse_target_rejects_unknown_value() {
        let err = parse_target(Some("flac")).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("unknown target"));
    }

    #[test]
    fn operation_errors_map_to_http_statuses() {
        assert_eq!(
            AppError::from(Error::NoFileSelected).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(Error::EngineUnavailable { attempts: vec![] }).status,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::from(Error::InvocationFailure {
                reason: "exit 1".into()
            })
            .status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::from(Error::RetrievalFailure {
                name: "audio.mp3".into(),
                reason: "missing".into()
            })
            .status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn artifact_response_sets_download_headers() -> anyhow::Result<()> {
        let response = artifact_response(Artifact {
            bytes: b"data".to_vec(),
            file_name: "cut.mp4".to_owned(),
            mime: "video/mp4",
        })
        .map_err(|e| anyhow::anyhow!(e.message))?;

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"cut.mp4\""
        );
        Ok(())
    }

    #[tokio::test]
    async fn missing_body_is_rejected_as_no_file_selected() -> anyhow::Result<()> {
        let dispatcher = Dispatcher::ffmpeg(
            vec![SourceLocation::parse("/definitely/not/ffmpeg")],
            EncodingOpts::default(),
        )?;
        let state = AppState {
            dispatcher: Arc::new(Mutex::new(dispatcher)),
        };

        let err = run_operation(
            state,
            None,
            None,
            &HeaderMap::new(),
            Bytes::new(),
            OperationRequest::trim("", ""),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("no file selected"));
        Ok(())
    }

    #[tokio::test]
    async fn poisoned_dispatcher_is_counted_as_other_outcome() -> anyhow::Result<()> {
        metrics::init()?;
        let dispatcher = Dispatcher::ffmpeg(
            vec![SourceLocation::parse("/definitely/not/ffmpeg")],
            EncodingOpts::default(),
        )?;
        let state = AppState {
            dispatcher: Arc::new(Mutex::new(dispatcher)),
        };

        let shared = state.dispatcher.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.lock();
            panic!("poison the dispatcher lock");
        })
        .join();
        assert!(state.dispatcher.is_poisoned());

        let before = metrics::operation_count("trim", "other");
        let err = run_operation(
            state,
            Some("clip.mov".to_owned()),
            None,
            &HeaderMap::new(),
            Bytes::from_static(b"media"),
            OperationRequest::trim("", ""),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(metrics::operation_count("trim", "other") > before);
        Ok(())
    }
}
