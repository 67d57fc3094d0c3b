//! Layer registry: the ordered collection of registered geometry documents
//! plus per-key visibility. Reconciliation is a pure merge so it can be
//! exercised without any session or server around it.

use std::collections::HashMap;

use geojson::GeoJson;
use serde::Serialize;

use crate::ingest::reader::ShapePart;

/// Name and size of one originating file, kept for display and export naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub name: String,
    pub len: usize,
}

/// The unit of registration: one parsed geometry document plus provenance.
/// The identity key is the source file names joined with `,` in
/// `[geometry, attribute]` order.
#[derive(Debug, Clone, Serialize)]
pub struct GeoFileEntry {
    pub key: String,
    pub geojson: GeoJson,
    pub is_converted: bool,
    pub source_files: Vec<SourceFile>,
    pub registered_at: String,
}

impl GeoFileEntry {
    /// Entry for a directly-loaded GeoJSON document.
    pub fn direct(document: GeoJson, file_name: String, byte_len: usize) -> Self {
        let source_files = vec![SourceFile {
            name: file_name,
            len: byte_len,
        }];
        Self {
            key: entry_key(&source_files),
            geojson: document,
            is_converted: false,
            source_files,
            registered_at: now_rfc3339(),
        }
    }

    /// Entry for a decoded shapefile pair, or a lone geometry part when the
    /// user forces single-part decoding.
    pub fn converted(
        document: GeoJson,
        geometry: &ShapePart,
        attributes: Option<&ShapePart>,
    ) -> Self {
        let mut source_files = vec![SourceFile {
            name: geometry.file_name.clone(),
            len: geometry.bytes.len(),
        }];
        if let Some(attributes) = attributes {
            source_files.push(SourceFile {
                name: attributes.file_name.clone(),
                len: attributes.bytes.len(),
            });
        }
        Self {
            key: entry_key(&source_files),
            geojson: document,
            is_converted: true,
            source_files,
            registered_at: now_rfc3339(),
        }
    }
}

pub fn entry_key(source_files: &[SourceFile]) -> String {
    source_files
        .iter()
        .map(|file| file.name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Ordered entries plus a visibility flag per identity key. Keys are unique
/// at all times; `reconcile` guarantees no duplicate survives a merge.
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    entries: Vec<GeoFileEntry>,
    visibility: HashMap<String, bool>,
}

impl LayerRegistry {
    /// Merge a batch of new entries. Any existing entry sharing a key with a
    /// new one is removed first (replace-on-conflict, never skip), new
    /// entries append in batch order, and every (re)registered key is set
    /// visible. Intra-batch duplicates collapse to the last occurrence.
    #[must_use]
    pub fn reconcile(mut self, incoming: Vec<GeoFileEntry>) -> LayerRegistry {
        for entry in incoming {
            self.entries.retain(|existing| existing.key != entry.key);
            self.visibility.insert(entry.key.clone(), true);
            self.entries.push(entry);
        }
        self
    }

    pub fn entries(&self) -> &[GeoFileEntry] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&GeoFileEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn is_visible(&self, key: &str) -> bool {
        self.visibility.get(key).copied().unwrap_or(false)
    }

    /// Returns false when the key is not registered.
    pub fn set_visibility(&mut self, key: &str, visible: bool) -> bool {
        if self.get(key).is_none() {
            return false;
        }
        self.visibility.insert(key.to_string(), visible);
        true
    }

    pub fn visible_entries(&self) -> impl Iterator<Item = &GeoFileEntry> {
        self.entries
            .iter()
            .filter(|entry| self.is_visible(&entry.key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
