//! Shapefile decode capability: SHP geometry records plus the optional DBF
//! attribute table, zipped into a GeoJSON FeatureCollection. 2D shape types
//! only; Z/M variants are rejected as decode errors.

use std::fmt;

use encoding_rs::Encoding;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};

pub mod dbf;
pub mod shp;

#[derive(Debug)]
pub enum ShapefileError {
    Truncated { section: &'static str },
    BadFileCode(i32),
    UnsupportedShapeType(i32),
    UnknownEncoding(String),
    Malformed(String),
}

impl fmt::Display for ShapefileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { section } => write!(f, "unexpected end of data in {section}"),
            Self::BadFileCode(code) => {
                write!(f, "not a shapefile: file code {code} (expected 9994)")
            }
            Self::UnsupportedShapeType(shape_type) => {
                write!(f, "unsupported shape type {shape_type}")
            }
            Self::UnknownEncoding(label) => {
                write!(f, "unknown attribute text encoding '{label}'")
            }
            Self::Malformed(message) => write!(f, "malformed attribute table: {message}"),
        }
    }
}

impl std::error::Error for ShapefileError {}

/// Decode geometry bytes plus optional attribute bytes into a
/// FeatureCollection. Attribute records zip with geometries sequentially;
/// missing records yield empty properties, surplus records are dropped.
pub fn read(
    shp_bytes: &[u8],
    dbf_bytes: Option<&[u8]>,
    encoding_label: &str,
) -> Result<GeoJson, ShapefileError> {
    let encoding = Encoding::for_label(encoding_label.as_bytes())
        .ok_or_else(|| ShapefileError::UnknownEncoding(encoding_label.to_string()))?;

    let geometries = shp::read_geometries(shp_bytes)?;
    let mut records = match dbf_bytes {
        Some(bytes) => dbf::read_records(bytes, encoding)?,
        None => Vec::new(),
    };
    records.truncate(geometries.len());

    let mut attributes = records.into_iter();
    let features = geometries
        .into_iter()
        .map(|geometry| Feature {
            bbox: None,
            geometry,
            id: None,
            properties: Some(attributes.next().unwrap_or_else(JsonObject::new)),
            foreign_members: None,
        })
        .collect();

    Ok(GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }))
}
