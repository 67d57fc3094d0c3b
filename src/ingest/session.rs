//! The ingest session: single owner of the pending pool and the layer
//! registry. Batches commit atomically; every failure is recoverable at the
//! batch boundary and leaves prior state untouched.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use crate::ingest::decoder;
use crate::ingest::matcher::{match_parts, PendingShapePool};
use crate::ingest::reader::{read_batch, LoadedFile, PartRole, RawFile};
use crate::ingest::registry::{GeoFileEntry, LayerRegistry};
use crate::shapefile::ShapefileError;

#[derive(Debug)]
pub enum IngestError {
    UnsupportedFileType { file_name: String },
    MalformedJson { file_name: String, message: String },
    Read { file_name: String, source: std::io::Error },
    Decode(ShapefileError),
    NoPendingPart { base_name: String },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFileType { file_name } => {
                write!(f, "unsupported file type: '{file_name}'")
            }
            Self::MalformedJson { file_name, message } => {
                write!(f, "failed to parse '{file_name}' as GeoJSON: {message}")
            }
            Self::Read { file_name, source } => {
                write!(f, "failed to read '{file_name}': {source}")
            }
            Self::Decode(err) => write!(f, "shapefile decode failed: {err}"),
            Self::NoPendingPart { base_name } => {
                write!(f, "no pending geometry part for base name '{base_name}'")
            }
        }
    }
}

impl std::error::Error for IngestError {}

/// One pending pool entry, shaped for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSummary {
    pub base_name: String,
    pub role: &'static str,
    pub file_name: String,
}

/// Outcome of one committed batch.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub batch_id: String,
    pub received_files: usize,
    pub direct_documents: usize,
    pub completed_pairs: Vec<String>,
    pub registered_keys: Vec<String>,
    pub pending: Vec<PendingSummary>,
    pub registry_size: usize,
}

#[derive(Debug)]
pub struct IngestSession {
    pending: PendingShapePool,
    registry: LayerRegistry,
    encoding: String,
}

impl Default for IngestSession {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestSession {
    pub fn new() -> Self {
        Self::with_encoding(decoder::attribute_encoding())
    }

    pub fn with_encoding(encoding: impl Into<String>) -> Self {
        Self {
            pending: PendingShapePool::new(),
            registry: LayerRegistry::default(),
            encoding: encoding.into(),
        }
    }

    /// Read and commit one selection batch: the async convenience used by
    /// the CLI. The server splits the two stages so reads run outside its
    /// session lock.
    pub async fn ingest(&mut self, files: Vec<RawFile>) -> Result<IngestReport, IngestError> {
        let loaded = read_batch(files).await?;
        self.commit_batch(loaded)
    }

    /// Match, decode, and reconcile one batch of loaded files. Nothing is
    /// mutated until every decode has succeeded, so a failed batch leaves
    /// both the pool and the registry exactly as they were.
    pub fn commit_batch(&mut self, loaded: Vec<LoadedFile>) -> Result<IngestReport, IngestError> {
        let received_files = loaded.len();
        let mut entries: Vec<GeoFileEntry> = Vec::new();
        let mut parts = Vec::new();
        for file in loaded {
            match file {
                LoadedFile::GeoJson {
                    document,
                    file_name,
                    byte_len,
                } => entries.push(GeoFileEntry::direct(document, file_name, byte_len)),
                LoadedFile::ShapePart(part) => parts.push(part),
            }
        }
        let direct_documents = entries.len();

        let outcome = match_parts(self.pending.clone(), parts);
        let decoded =
            decoder::decode_batch(&outcome.completed, &self.encoding).map_err(IngestError::Decode)?;

        let completed_pairs: Vec<String> = outcome
            .completed
            .iter()
            .map(|pair| pair.geometry.base_name.clone())
            .collect();
        entries.extend(decoded);
        let registered_keys: Vec<String> = entries.iter().map(|entry| entry.key.clone()).collect();

        self.pending = outcome.pending;
        self.registry = std::mem::take(&mut self.registry).reconcile(entries);

        Ok(IngestReport {
            batch_id: Uuid::new_v4().to_string(),
            received_files,
            direct_documents,
            completed_pairs,
            registered_keys,
            pending: self.pending_summaries(),
            registry_size: self.registry.len(),
        })
    }

    /// Decode a pending lone geometry part without waiting for its attribute
    /// part. The part leaves the pool only after a successful decode.
    pub fn force_decode(&mut self, base_name: &str) -> Result<String, IngestError> {
        let part = match self.pending.get(base_name) {
            Some(part) if part.role == PartRole::Geometry => part,
            _ => {
                return Err(IngestError::NoPendingPart {
                    base_name: base_name.to_string(),
                })
            }
        };
        let entry = decoder::decode_single(part, &self.encoding).map_err(IngestError::Decode)?;
        let key = entry.key.clone();
        self.pending.remove(base_name);
        self.registry = std::mem::take(&mut self.registry).reconcile(vec![entry]);
        Ok(key)
    }

    pub fn registry(&self) -> &LayerRegistry {
        &self.registry
    }

    pub fn set_visibility(&mut self, key: &str, visible: bool) -> bool {
        self.registry.set_visibility(key, visible)
    }

    pub fn pending_summaries(&self) -> Vec<PendingSummary> {
        // BTreeMap iteration keeps listings sorted by base name.
        self.pending
            .iter()
            .map(|(base_name, part)| PendingSummary {
                base_name: base_name.clone(),
                role: part.role.as_str(),
                file_name: part.file_name.clone(),
            })
            .collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
