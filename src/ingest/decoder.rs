//! Decode glue between matched pairs and the shapefile decode capability.
//! The attribute text encoding defaults to shift_jis (the source data ships
//! with legacy attribute tables) and is overridable via
//! `ASTROMETRICS_DBF_ENCODING`.

use std::env;

use rayon::prelude::*;

use crate::ingest::matcher::CompletedPair;
use crate::ingest::reader::ShapePart;
use crate::ingest::registry::GeoFileEntry;
use crate::shapefile::{self, ShapefileError};

pub const DEFAULT_ATTRIBUTE_ENCODING: &str = "shift_jis";

pub fn attribute_encoding() -> String {
    env::var("ASTROMETRICS_DBF_ENCODING").unwrap_or_else(|_| DEFAULT_ATTRIBUTE_ENCODING.to_string())
}

/// Decode one completed pair into a registrable entry.
pub fn decode_pair(pair: &CompletedPair, encoding: &str) -> Result<GeoFileEntry, ShapefileError> {
    let document = shapefile::read(&pair.geometry.bytes, Some(&pair.attributes.bytes), encoding)?;
    Ok(GeoFileEntry::converted(
        document,
        &pair.geometry,
        Some(&pair.attributes),
    ))
}

/// Decode a lone geometry part (explicit user override; features come out
/// with empty properties).
pub fn decode_single(part: &ShapePart, encoding: &str) -> Result<GeoFileEntry, ShapefileError> {
    let document = shapefile::read(&part.bytes, None, encoding)?;
    Ok(GeoFileEntry::converted(document, part, None))
}

/// Decode every pair of a batch in parallel. Reports the first error in
/// input order; the caller discards the batch on error, so pool state for
/// unrelated base names is never touched by a failure here.
pub fn decode_batch(
    pairs: &[CompletedPair],
    encoding: &str,
) -> Result<Vec<GeoFileEntry>, ShapefileError> {
    pairs
        .par_iter()
        .map(|pair| decode_pair(pair, encoding))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}
