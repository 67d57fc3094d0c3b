//! Shapefile pair matching. Pure function over the pending pool plus the
//! newly-read parts of one batch; unmatched parts are a valid resting state,
//! not a failure.

use std::collections::BTreeMap;

use crate::ingest::reader::{PartRole, ShapePart};

/// Unmatched parts carried across upload events, keyed by base name. The map
/// holds at most one part per base name; the moment both roles are present
/// the pair is emitted and removed, so the pool can never hold both.
pub type PendingShapePool = BTreeMap<String, ShapePart>;

/// A geometry part and its attribute part sharing one base name.
#[derive(Debug, Clone)]
pub struct CompletedPair {
    pub geometry: ShapePart,
    pub attributes: ShapePart,
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub completed: Vec<CompletedPair>,
    pub pending: PendingShapePool,
}

/// Match incoming parts against the pool. A part completing a pair removes
/// the held counterpart; a newer part of the same role supersedes the held
/// one. Completed pairs come out ordered by the first appearance of their
/// base name in the incoming batch.
pub fn match_parts(pending: PendingShapePool, incoming: Vec<ShapePart>) -> MatchOutcome {
    let mut pool = pending;
    let mut completed = Vec::new();

    for part in incoming {
        match pool.remove(&part.base_name) {
            Some(held) if held.role != part.role => {
                let (geometry, attributes) = match part.role {
                    PartRole::Geometry => (part, held),
                    PartRole::Attribute => (held, part),
                };
                completed.push(CompletedPair {
                    geometry,
                    attributes,
                });
            }
            // Same role (held part dropped, superseded) or nothing held yet.
            _ => {
                pool.insert(part.base_name.clone(), part);
            }
        }
    }

    MatchOutcome { completed, pending: pool }
}
