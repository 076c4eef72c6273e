//! HTTP surface: one endpoint, dispatched on the query-string command, with
//! static files served for plain paths.

pub mod command;
pub mod static_files;

use crate::titles::{TitleCorrection, TitleStore};
use crate::upstream::Upstream;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use command::Command;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn Upstream>,
    /// The only mutable state shared between requests. Held across the
    /// file rewrite so concurrent corrections serialize.
    pub titles: Arc<Mutex<TitleStore>>,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(upstream: Arc<dyn Upstream>, titles: TitleStore, static_dir: PathBuf) -> Self {
        Self {
            upstream,
            titles: Arc::new(Mutex::new(titles)),
            static_dir,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

async fn dispatch(State(state): State<AppState>, uri: Uri) -> Response {
    if uri.query().is_none() {
        return static_files::serve(&state.static_dir, uri.path()).await;
    }

    let pairs = match Query::<Vec<(String, String)>>::try_from_uri(&uri) {
        Ok(Query(pairs)) => pairs,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match Command::parse(&pairs) {
        Ok(cmd) => {
            tracing::info!(command = cmd.name(), "dispatch");
            run(&state, cmd).await
        }
        Err(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

async fn run(state: &AppState, cmd: Command) -> Response {
    match cmd {
        Command::Wake => match state.upstream.fetch_reviews().await {
            Ok(items) => Json(items).into_response(),
            Err(e) => upstream_failure("wake", e),
        },
        Command::Search(query) => match state.upstream.search_app_ids(&query).await {
            Ok(ids) => Json(ids).into_response(),
            Err(e) => upstream_failure("search", e),
        },
        Command::Steam(app_id) => match state.upstream.app_details(&app_id).await {
            Ok(body) => raw_json(body),
            Err(e) => upstream_failure("steam", e),
        },
        Command::Kraken(query) => match state.upstream.search_streams(&query).await {
            Ok(body) => raw_json(body),
            Err(e) => upstream_failure("kraken", e),
        },
        Command::Correct { old, new } => {
            let mut store = state.titles.lock().await;
            if let Err(e) = store.record(TitleCorrection::new(old.as_str(), new.as_str())).await {
                tracing::warn!(error = %e, "title correction kept in memory only");
            } else {
                tracing::info!(old = %old, new = %new, "title corrected");
            }
            Json(json!({ "ok": true })).into_response()
        }
        Command::Titles => {
            let store = state.titles.lock().await;
            Json(store.book().entries().to_vec()).into_response()
        }
    }
}

fn raw_json(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn upstream_failure(command: &str, e: anyhow::Error) -> Response {
    tracing::warn!(command, error = %format!("{:#}", e), "upstream failed");
    error_response(StatusCode::BAD_GATEWAY, format!("{:#}", e))
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server running and live on http://{}", addr);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
