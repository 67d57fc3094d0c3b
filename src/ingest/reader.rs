//! Batch file reading. All files of one selection are read concurrently and
//! joined at a single point; the whole batch fails if any single file fails,
//! so a failed batch never leaves partial state behind.

use std::path::PathBuf;

use futures_util::future;
use geojson::GeoJson;

use crate::ingest::classify::{self, FileKind};
use crate::ingest::session::IngestError;

/// A user-selected file: a name (the matching key) plus content that is
/// loaded lazily, from memory for uploads or from disk for CLI paths.
#[derive(Debug, Clone)]
pub struct RawFile {
    pub name: String,
    source: FileSource,
}

#[derive(Debug, Clone)]
enum FileSource {
    Memory(Vec<u8>),
    Path(PathBuf),
}

impl RawFile {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Memory(bytes),
        }
    }

    /// File backed by a local path; the name is the path's final component.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            source: FileSource::Path(path),
        }
    }

    pub async fn read(&self) -> Result<Vec<u8>, std::io::Error> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => tokio::fs::read(path).await,
        }
    }
}

/// Role of a shapefile part within a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartRole {
    Geometry,
    Attribute,
}

impl PartRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Geometry => "geometry",
            Self::Attribute => "attribute",
        }
    }
}

/// One loaded shapefile part, keyed for matching by `base_name`.
#[derive(Debug, Clone)]
pub struct ShapePart {
    pub role: PartRole,
    pub base_name: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A file after classification and reading. Consumed by the matcher/decoder
/// and discarded.
#[derive(Debug, Clone)]
pub enum LoadedFile {
    GeoJson {
        document: GeoJson,
        file_name: String,
        byte_len: usize,
    },
    ShapePart(ShapePart),
}

/// Classify and read one selection batch. Classification happens up front so
/// an unsupported extension aborts the batch before any read starts; the
/// reads themselves run concurrently and join here.
pub async fn read_batch(files: Vec<RawFile>) -> Result<Vec<LoadedFile>, IngestError> {
    let mut classified = Vec::with_capacity(files.len());
    for file in files {
        let kind = classify::classify(&file.name).ok_or_else(|| IngestError::UnsupportedFileType {
            file_name: file.name.clone(),
        })?;
        classified.push((file, kind));
    }

    future::try_join_all(
        classified
            .into_iter()
            .map(|(file, kind)| read_one(file, kind)),
    )
    .await
}

async fn read_one(file: RawFile, kind: FileKind) -> Result<LoadedFile, IngestError> {
    let bytes = file.read().await.map_err(|source| IngestError::Read {
        file_name: file.name.clone(),
        source,
    })?;

    match kind {
        FileKind::Json => {
            let byte_len = bytes.len();
            let text = String::from_utf8(bytes).map_err(|err| IngestError::MalformedJson {
                file_name: file.name.clone(),
                message: err.to_string(),
            })?;
            let document: GeoJson = text.parse().map_err(|err: geojson::Error| {
                IngestError::MalformedJson {
                    file_name: file.name.clone(),
                    message: err.to_string(),
                }
            })?;
            Ok(LoadedFile::GeoJson {
                document,
                file_name: file.name,
                byte_len,
            })
        }
        FileKind::ShapeGeometryPart => Ok(LoadedFile::ShapePart(ShapePart {
            role: PartRole::Geometry,
            base_name: classify::base_name(&file.name).to_string(),
            file_name: file.name,
            bytes,
        })),
        FileKind::ShapeAttributePart => Ok(LoadedFile::ShapePart(ShapePart {
            role: PartRole::Attribute,
            base_name: classify::base_name(&file.name).to_string(),
            file_name: file.name,
            bytes,
        })),
    }
}
