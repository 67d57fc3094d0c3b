//! Astrometrics: geospatial file ingestion, shapefile pairing, and layer service.
//!
//! The core is the ingest pipeline (`ingest`): classify uploaded files,
//! read batches concurrently, reassemble `.shp`/`.dbf` pairs that may arrive
//! across separate uploads, decode them to GeoJSON, and reconcile the result
//! into the layer registry. The `shapefile` module is the decode capability;
//! `server` exposes the pipeline over HTTP.

pub mod cli;
pub mod ingest;
pub mod server;
pub mod shapefile;
