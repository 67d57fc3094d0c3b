use std::sync::{Arc, Mutex};

use crate::ingest::IngestSession;

pub mod api;
pub mod routes;
pub mod static_files;

/// Shared handler state: the ingest session behind a mutex held only across
/// the synchronous commit stage, never across file reads.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<IngestSession>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            session: Arc::new(Mutex::new(IngestSession::new())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn run_server(bind_addr: &str) -> std::io::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let listener = tokio::net::TcpListener::bind(bind_addr).await?;
        println!("astrometrics server listening on http://{bind_addr}");
        axum::serve(listener, routes::router(AppState::new())).await
    })
}
