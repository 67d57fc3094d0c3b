//! HTTP handlers and payload types for the layer service.

use std::collections::BTreeSet;
use std::slice;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use geojson::{Feature, FeatureCollection, GeoJson, JsonValue};
use serde::{Deserialize, Serialize};

use crate::ingest::{read_batch, GeoFileEntry, IngestError, IngestReport, RawFile, SourceFile};
use crate::server::AppState;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
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

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        let status = match err {
            IngestError::NoPendingPart { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "status": "error",
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

fn lock_session(state: &AppState) -> Result<std::sync::MutexGuard<'_, crate::ingest::IngestSession>, ApiError> {
    state
        .session
        .lock()
        .map_err(|err| ApiError::internal(format!("session lock poisoned: {err}")))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "astrometrics-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// POST /api/layers — multipart batch upload. Files are read before the
/// session lock is taken; the commit stage is the only part that serializes.
pub async fn upload_layers(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>, ApiError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::bad_request(format!("invalid multipart body: {err}")))?
    {
        let Some(name) = field.file_name().map(str::to_string) else {
            return Err(ApiError::bad_request("multipart field is missing a file name"));
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::bad_request(format!("failed to read upload '{name}': {err}")))?;
        files.push(RawFile::from_bytes(name, bytes.to_vec()));
    }
    if files.is_empty() {
        return Err(ApiError::bad_request("no files in upload"));
    }

    let loaded = read_batch(files).await?;
    let mut session = lock_session(&state)?;
    let report = session.commit_batch(loaded)?;
    Ok(Json(report))
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerSummary {
    pub key: String,
    pub is_converted: bool,
    pub visible: bool,
    pub source_files: Vec<SourceFile>,
    pub feature_count: usize,
    pub registered_at: String,
}

pub async fn list_layers(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = lock_session(&state)?;
    let layers: Vec<LayerSummary> = session
        .registry()
        .entries()
        .iter()
        .map(|entry| LayerSummary {
            key: entry.key.clone(),
            is_converted: entry.is_converted,
            visible: session.registry().is_visible(&entry.key),
            source_files: entry.source_files.clone(),
            feature_count: feature_count(&entry.geojson),
            registered_at: entry.registered_at.clone(),
        })
        .collect();
    Ok(Json(serde_json::json!({ "layers": layers })))
}

pub async fn get_layer(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GeoJson>, ApiError> {
    let session = lock_session(&state)?;
    let entry = session
        .registry()
        .get(&key)
        .ok_or_else(|| ApiError::not_found(format!("layer '{key}' not found")))?;
    Ok(Json(entry.geojson.clone()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
}

pub async fn set_visibility(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<VisibilityRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut session = lock_session(&state)?;
    if !session.set_visibility(&key, request.visible) {
        return Err(ApiError::not_found(format!("layer '{key}' not found")));
    }
    Ok(Json(serde_json::json!({
        "status": "ok",
        "key": key,
        "visible": request.visible,
    })))
}

/// GET /api/layers/:key/export — indented GeoJSON attachment named after the
/// first originating file with its extension swapped to `.geojson`.
pub async fn export_layer(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let entry = {
        let session = lock_session(&state)?;
        session
            .registry()
            .get(&key)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("layer '{key}' not found")))?
    };
    let body = serde_json::to_string_pretty(&entry.geojson)
        .map_err(|err| ApiError::internal(format!("failed to serialize layer: {err}")))?;
    let file_name = export_file_name(&entry, "geojson");
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// GET /api/layers/:key/attributes.csv — the attribute table round-trip.
/// Columns are the sorted union of property keys across features.
pub async fn export_attributes_csv(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let entry = {
        let session = lock_session(&state)?;
        session
            .registry()
            .get(&key)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("layer '{key}' not found")))?
    };

    let features: &[Feature] = match &entry.geojson {
        GeoJson::FeatureCollection(collection) => &collection.features,
        GeoJson::Feature(feature) => slice::from_ref(feature),
        GeoJson::Geometry(_) => &[],
    };

    let mut columns: BTreeSet<&String> = BTreeSet::new();
    for feature in features {
        if let Some(properties) = &feature.properties {
            columns.extend(properties.keys());
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(columns.iter().map(|column| column.as_str()))
        .map_err(|err| ApiError::internal(format!("failed to write csv header: {err}")))?;
    for feature in features {
        let record: Vec<String> = columns
            .iter()
            .map(|column| {
                feature
                    .properties
                    .as_ref()
                    .and_then(|properties| properties.get(*column))
                    .map(csv_cell)
                    .unwrap_or_default()
            })
            .collect();
        writer
            .write_record(&record)
            .map_err(|err| ApiError::internal(format!("failed to write csv record: {err}")))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ApiError::internal(format!("failed to finish csv: {err}")))?;

    let file_name = export_file_name(&entry, "csv");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/map — combined FeatureCollection of all visible layers, the feed
/// for the map collaborator.
pub async fn map_document(State(state): State<AppState>) -> Result<Json<GeoJson>, ApiError> {
    let session = lock_session(&state)?;
    let mut features = Vec::new();
    for entry in session.registry().visible_entries() {
        match &entry.geojson {
            GeoJson::FeatureCollection(collection) => {
                features.extend(collection.features.iter().cloned());
            }
            GeoJson::Feature(feature) => features.push(feature.clone()),
            GeoJson::Geometry(geometry) => features.push(Feature {
                bbox: None,
                geometry: Some(geometry.clone()),
                id: None,
                properties: None,
                foreign_members: None,
            }),
        }
    }
    Ok(Json(GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })))
}

pub async fn list_pending(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = lock_session(&state)?;
    Ok(Json(serde_json::json!({
        "pending": session.pending_summaries(),
    })))
}

/// POST /api/pending/:base/decode — forced single-part decode of a pending
/// lone geometry part.
pub async fn force_decode(
    State(state): State<AppState>,
    Path(base): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut session = lock_session(&state)?;
    let key = session.force_decode(&base)?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "key": key,
    })))
}

fn feature_count(document: &GeoJson) -> usize {
    match document {
        GeoJson::FeatureCollection(collection) => collection.features.len(),
        GeoJson::Feature(_) | GeoJson::Geometry(_) => 1,
    }
}

fn export_file_name(entry: &GeoFileEntry, extension: &str) -> String {
    let name = entry
        .source_files
        .first()
        .map(|file| file.name.as_str())
        .unwrap_or(entry.key.as_str());
    match name.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.{extension}"),
        None => format!("{name}.{extension}"),
    }
}

fn csv_cell(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(text) => text.clone(),
        JsonValue::Bool(flag) => flag.to_string(),
        JsonValue::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}
