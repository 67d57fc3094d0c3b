//! Route table for the layer service, kept in one place.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::services::ServeDir;

use crate::server::{api, static_files, AppState};

/// Shapefile uploads are binary and can be large; the default 2 MiB body
/// limit is too small for real batches.
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(static_files::index_page))
        .route("/api/health", get(api::health))
        .route("/api/layers", get(api::list_layers).post(api::upload_layers))
        .route("/api/layers/:key", get(api::get_layer))
        .route("/api/layers/:key/visibility", put(api::set_visibility))
        .route("/api/layers/:key/export", get(api::export_layer))
        .route("/api/layers/:key/attributes.csv", get(api::export_attributes_csv))
        .route("/api/map", get(api::map_document))
        .route("/api/pending", get(api::list_pending))
        .route("/api/pending/:base/decode", post(api::force_decode))
        .fallback_service(ServeDir::new(static_files::FRONTEND_DIST_DIR))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
