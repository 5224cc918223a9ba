use crate::{
    app::{self, App, AppError, Counts, ImportSummary, RecentImport},
    records::UnifiedRecord,
    search,
};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::signal;

#[derive(Clone)]
struct SharedState {
    app: Arc<App>,
}

/// Run the background service: first import (which always settles before the
/// periodic timer is armed), the recurring import loop, and the local HTTP
/// api the launcher UI talks to.
pub fn start_daemon(app: Arc<App>) {
    match app.counts() {
        Ok(counts) if counts.records == 0 => {
            if let Err(err) = app.initialize_history() {
                log::error!("initial import failed: {err}");
            }
        }
        Ok(counts) => log::info!("store already holds {} records", counts.records),
        Err(err) => log::error!("couldnt inspect store at startup: {err}"),
    }

    let _scheduler = app::scheduler::start(app.clone());

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(async { start_app(app).await });
}

async fn start_app(app: Arc<App>) {
    let listen_addr = {
        let config = app.config();
        let addr = config.read().unwrap().listen_addr.clone();
        addr
    };

    let shared_state = Arc::new(SharedState { app });

    let router = Router::new()
        .route("/api/history/search", post(search_history))
        .route("/api/history/import", post(import))
        .route("/api/history/import_recent", post(import_recent))
        .route("/api/history/count", get(count))
        .route("/api/history/reset", post(reset))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state);

    let listener = tokio::net::TcpListener::bind(listen_addr.as_str())
        .await
        .unwrap();
    log::info!("listening on {listen_addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[derive(Debug)]
struct HttpError(AppError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        match self.0 {
            AppError::InvalidInput(_) => (
                axum::http::StatusCode::BAD_REQUEST,
                json!({"error": self.0.to_string()}).to_string(),
            ),
            _ => {
                log::error!("{self:?}");
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": self.0.to_string()}).to_string(),
                )
            }
        }
        .into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SearchRequest {
    term: String,

    /// Set by the live popup path: short queries clear the display instead
    /// of erroring.
    #[serde(default)]
    live: bool,
}

async fn search_history(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<Vec<UnifiedRecord>>, HttpError> {
    if payload.live && !payload.term.starts_with(search::BOOKMARK_PREFIX) {
        let min_query_len = state.app.config().read().unwrap().min_query_len;
        if payload.term.trim().len() < min_query_len {
            return Ok(Json(Vec::new()));
        }
    }

    match state.app.search(&payload.term) {
        Ok(results) => Ok(Json(results)),
        Err(AppError::InvalidInput(_)) if payload.live => Ok(Json(Vec::new())),
        Err(err) => Err(err.into()),
    }
}

async fn import(State(state): State<Arc<SharedState>>) -> Result<Json<ImportSummary>, HttpError> {
    Ok(Json(state.app.import_from_browser()?))
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ImportRecentRequest {
    /// Cutoff in epoch milliseconds; defaults to the configured window.
    #[serde(default)]
    since_ms: Option<i64>,
}

async fn import_recent(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<ImportRecentRequest>,
) -> Result<Json<RecentImport>, HttpError> {
    let since_ms = payload.since_ms.unwrap_or_else(|| {
        let window_secs = state.app.config().read().unwrap().recent_window_secs;
        app::service::now_ms() - window_secs as i64 * 1000
    });

    Ok(Json(state.app.import_recent_history(since_ms)?))
}

async fn count(State(state): State<Arc<SharedState>>) -> Result<Json<Counts>, HttpError> {
    Ok(Json(state.app.counts()?))
}

async fn reset(State(state): State<Arc<SharedState>>) -> Result<impl IntoResponse, HttpError> {
    state.app.reset()?;
    Ok(Json(json!({"ok": true})))
}
