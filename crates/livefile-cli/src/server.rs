//! HTTP surface: the WebSocket upgrade route and static asset serving.
//!
//! Static files come from the configured root directory first and from the
//! client bundled into the binary second, so `livefile serve notes.md` works
//! in an empty directory.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::{
        Request, State,
        ws::{WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::{StatusCode, Uri, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use futures::StreamExt;
use livefile_core::{
    Broadcaster, ClientSession, ConnectionError, SessionConfig, SubscribeRequest,
};
use rust_embed::RustEmbed;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, info, warn};

/// Client page and script compiled into the binary.
#[derive(RustEmbed)]
#[folder = "assets/client"]
struct ClientAssets;

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub broadcaster: Broadcaster,
    pub session_config: SessionConfig,
    pub static_root: Arc<PathBuf>,
    pub snapshot_on_subscribe: bool,
}

/// Build the router.
///
/// `request_timeout` applies to static requests only; upgraded connections
/// live as long as the client stays.
pub fn build_router(state: AppState, ws_path: &str, request_timeout: Duration) -> Router {
    Router::new()
        .route(ws_path, get(handle_upgrade))
        .fallback(get(handle_static).layer(TimeoutLayer::new(request_timeout)))
        .layer(middleware::from_fn(log_request))
        .layer(
            // Dev tool: any origin may connect
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    info!(%method, %path, status = response.status().as_u16(), "request");
    response
}

/// Upgrade to WebSocket and run a client session.
async fn handle_upgrade(
    State(state): State<AppState>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match upgrade {
        Ok(ws) => ws
            .on_failed_upgrade(|e: axum::Error| {
                let err = ConnectionError::Upgrade(e.to_string());
                warn!(error = %err, "websocket upgrade failed");
            })
            .on_upgrade(move |socket| handle_socket(socket, state)),
        Err(rejection) => {
            let err = ConnectionError::Upgrade(rejection.to_string());
            warn!(error = %err, "rejected upgrade request");
            rejection.into_response()
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let registry = Arc::clone(state.broadcaster.registry());
    let session = registry.open_session(&state.session_config);
    info!(session = %session.id(), clients = registry.len(), "client connected");

    let (sink, stream) = socket.split();
    let broadcaster = state.broadcaster.clone();
    let snapshots = state.snapshot_on_subscribe;

    let on_text = move |session: &Arc<ClientSession>, text: &str| {
        if !snapshots {
            return;
        }
        let Some(request) = SubscribeRequest::parse(text) else {
            debug!(session = %session.id(), "ignoring unrecognized message");
            return;
        };

        let broadcaster = broadcaster.clone();
        let session = Arc::clone(session);
        tokio::spawn(async move {
            broadcaster.send_snapshot(&session, &request.file).await;
        });
    };

    session.serve(registry, sink, stream, on_text).await;
}

/// Serve a file from the static root, then from the bundled client.
async fn handle_static(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();

    let Some(relative) = resolve_asset_path(path) else {
        info!(path, "rejected asset path");
        return not_found(path);
    };

    let file_path = state.static_root.join(&relative);
    match tokio::fs::read(&file_path).await {
        Ok(content) => return asset_response(content, &relative),
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            debug!(path = %file_path.display(), error = %e, "static read failed");
        }
        Err(_) => {}
    }

    if let Some(asset) = ClientAssets::get(&relative) {
        return asset_response(asset.data.into_owned(), &relative);
    }

    info!(path, "asset not found");
    not_found(path)
}

/// Map a URL path to a relative asset path.
///
/// Directory paths get `index.html`. Anything but plain name components
/// (`..`, `.`, a root or drive prefix) is refused.
pub fn resolve_asset_path(path: &str) -> Option<String> {
    let trimmed = path.trim_start_matches('/');
    let relative = if trimmed.is_empty() || trimmed.ends_with('/') {
        format!("{}index.html", trimmed)
    } else {
        trimmed.to_string()
    };

    Path::new(&relative)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
        .then_some(relative)
}

fn asset_response(content: Vec<u8>, relative: &str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, determine_content_type(relative)),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from(content),
    )
        .into_response()
}

fn not_found(path: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("File not found: {}", path),
    )
        .into_response()
}

/// Determine content type from file extension.
fn determine_content_type(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");

    match extension {
        "html" | "htm" => "text/html; charset=utf-8",
        "js" | "mjs" => "application/javascript",
        "css" => "text/css",
        "json" | "map" => "application/json",
        "txt" | "md" => "text/plain; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "wasm" => "application/wasm",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}
