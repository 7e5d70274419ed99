//! Wires the pipeline together: watcher, broadcaster and HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use livefile_core::{Broadcaster, ClientRegistry, WatchNormalizer, WatchedFile, WatchedFiles};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::LivefileConfig;
use crate::error::{CliError, Result};
use crate::server::{AppState, build_router};

/// A running server and its background tasks.
///
/// Dropping it stops everything.
pub struct RunningServer {
    local_addr: SocketAddr,
    registry: Arc<ClientRegistry>,
    watched: Vec<WatchedFile>,
    inert: Vec<WatchedFile>,
    server: JoinHandle<std::io::Result<()>>,
    normalizer: JoinHandle<()>,
    broadcaster: JoinHandle<()>,
}

impl RunningServer {
    /// Address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    /// Files whose watch was armed at startup.
    pub fn watched(&self) -> &[WatchedFile] {
        &self.watched
    }

    /// Files that could not be watched and stay inert for this run.
    pub fn inert(&self) -> &[WatchedFile] {
        &self.inert
    }

    /// Wait until the HTTP server stops.
    pub async fn wait(&mut self) -> Result<()> {
        match (&mut self.server).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(CliError::Server(e.to_string())),
            Err(e) => Err(CliError::Server(format!("server task failed: {}", e))),
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.server.abort();
        self.normalizer.abort();
        self.broadcaster.abort();
    }
}

/// Start watching, broadcasting and serving according to `config`.
///
/// # Errors
///
/// Fails if the watcher cannot be created, the watched set is inconsistent,
/// or the listener cannot bind. A single file that cannot be watched is only
/// reported; the server starts without it.
pub async fn launch(config: &LivefileConfig) -> Result<RunningServer> {
    let files = Arc::new(config.watched_files()?);
    let (normalizer, changes) = WatchNormalizer::with_notify(config.settle_delay())?;

    let (watched, inert) = arm_watches(&normalizer, &files);

    let registry = Arc::new(ClientRegistry::new());
    let broadcaster = Broadcaster::new(Arc::clone(&files), Arc::clone(&registry));

    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| CliError::Bind {
            addr: config.bind,
            source,
        })?;
    let local_addr = listener.local_addr()?;

    let state = AppState {
        broadcaster: broadcaster.clone(),
        session_config: config.session_config(),
        static_root: Arc::new(config.static_root.clone()),
        snapshot_on_subscribe: config.snapshot_on_subscribe,
    };
    let router = build_router(state, &config.ws_path, config.request_timeout());

    let normalizer = normalizer.spawn();
    let broadcaster = broadcaster.spawn(changes);
    let server = tokio::spawn(async move { axum::serve(listener, router).await });

    info!(addr = %local_addr, files = watched.len(), "server started");

    Ok(RunningServer {
        local_addr,
        registry,
        watched,
        inert,
        server,
        normalizer,
        broadcaster,
    })
}

fn arm_watches(
    normalizer: &WatchNormalizer,
    files: &WatchedFiles,
) -> (Vec<WatchedFile>, Vec<WatchedFile>) {
    let mut watched = Vec::new();
    let mut inert = Vec::new();

    for file in files.iter() {
        match normalizer.watch(file) {
            Ok(()) => watched.push(file.clone()),
            Err(e) => {
                warn!(file = %file.logical_id, error = %e, "file will not be watched");
                inert.push(file.clone());
            }
        }
    }

    (watched, inert)
}
