//! File classification by extension suffix. Decoded once at the ingest
//! boundary; everything downstream works with the closed `FileKind` variant.

pub const ACCEPT_JSON_EXTENSIONS: &[&str] = &[".geojson", ".json"];
pub const ACCEPT_GEOMETRY_EXTENSION: &str = ".shp";
pub const ACCEPT_ATTRIBUTE_EXTENSION: &str = ".dbf";

/// Role of an uploaded file, determined purely from its name suffix
/// (case-sensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Json,
    ShapeGeometryPart,
    ShapeAttributePart,
}

/// Classify a file name. Returns `None` for unrecognized extensions; the
/// caller treats that as a batch-aborting error. Shapefile parts need a
/// non-empty stem because the stem is the pairing key, so a bare `.shp` or
/// `.dbf` is rejected.
pub fn classify(file_name: &str) -> Option<FileKind> {
    if ACCEPT_JSON_EXTENSIONS
        .iter()
        .any(|ext| file_name.ends_with(ext))
    {
        return Some(FileKind::Json);
    }
    if let Some(stem) = file_name.strip_suffix(ACCEPT_GEOMETRY_EXTENSION) {
        if !stem.is_empty() {
            return Some(FileKind::ShapeGeometryPart);
        }
    }
    if let Some(stem) = file_name.strip_suffix(ACCEPT_ATTRIBUTE_EXTENSION) {
        if !stem.is_empty() {
            return Some(FileKind::ShapeAttributePart);
        }
    }
    None
}

/// Strip the shapefile-part extension from a file name. The result is the
/// join key between a geometry part and its attribute part.
pub fn base_name(file_name: &str) -> &str {
    file_name
        .strip_suffix(ACCEPT_GEOMETRY_EXTENSION)
        .or_else(|| file_name.strip_suffix(ACCEPT_ATTRIBUTE_EXTENSION))
        .unwrap_or(file_name)
}
