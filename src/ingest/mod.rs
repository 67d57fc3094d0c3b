//! File ingestion pipeline: classification, batch reading, shapefile pair
//! matching, decode glue, and layer registry reconciliation.

pub mod classify;
pub mod decoder;
pub mod matcher;
pub mod reader;
pub mod registry;
pub mod session;
pub mod validate;

pub use classify::{base_name, classify, FileKind};
pub use matcher::{match_parts, CompletedPair, MatchOutcome, PendingShapePool};
pub use reader::{read_batch, LoadedFile, PartRole, RawFile, ShapePart};
pub use registry::{GeoFileEntry, LayerRegistry, SourceFile};
pub use session::{IngestError, IngestReport, IngestSession, PendingSummary};
