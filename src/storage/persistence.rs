//! File-backed version store with atomic, fsync'd writes

use super::{VersionStore, check_monotonic};
use crate::config::{DurabilityMode, GateConfig};
use crate::core::{GateError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{Level, event};

const FORMAT_VERSION: u16 = 1;

// ============================================================================
// On-disk Document
// ============================================================================

/// What the store remembers about one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VersionDocument {
    format_version: u16,
    #[serde(default)]
    components: BTreeMap<String, ComponentRecord>,
}

impl Default for VersionDocument {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            components: BTreeMap::new(),
        }
    }
}

// ============================================================================
// File Version Store
// ============================================================================

/// Keeps every component's installed version in a single JSON file.
///
/// Each `record_version` rewrites the whole document into a temp file next
/// to the target, syncs it (in [`DurabilityMode::Sync`]) and renames it over
/// the old one, so a crash leaves either the previous or the new document.
pub struct FileVersionStore {
    path: PathBuf,
    durability: DurabilityMode,
    document: VersionDocument,
}

impl FileVersionStore {
    /// Opens the store described by `config`, loading the existing document
    /// if there is one.
    pub fn open(config: &GateConfig) -> Result<Self> {
        let document = load_document(&config.state_path)?;
        event!(
            Level::DEBUG,
            path = %config.state_path.display(),
            components = document.components.len(),
            "version store opened"
        );
        Ok(Self {
            path: config.state_path.clone(),
            durability: config.durability,
            document,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn durability(&self) -> DurabilityMode {
        self.durability
    }

    /// Full record for a component, including when it was last written.
    pub fn record(&self, component: &str) -> Option<&ComponentRecord> {
        self.document.components.get(component)
    }

    fn write_document(&self, document: &VersionDocument) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| {
            GateError::StorageError(format!("Failed to create state directory: {}", e))
        })?;

        let mut temp = NamedTempFile::new_in(&dir)
            .map_err(|e| GateError::StorageError(format!("Failed to create temp file: {}", e)))?;
        serde_json::to_writer_pretty(temp.as_file_mut(), document).map_err(|e| {
            GateError::StorageError(format!("Failed to serialize version document: {}", e))
        })?;
        temp.as_file_mut()
            .flush()
            .map_err(|e| GateError::StorageError(format!("Failed to flush version document: {}", e)))?;
        if self.durability == DurabilityMode::Sync {
            temp.as_file()
                .sync_all()
                .map_err(|e| GateError::StorageError(format!("Failed to sync version document: {}", e)))?;
        }
        temp.persist(&self.path).map_err(|e| {
            GateError::StorageError(format!("Failed to rename version document: {}", e.error))
        })?;

        if self.durability == DurabilityMode::Sync {
            sync_dir(&dir)?;
        }
        Ok(())
    }
}

impl VersionStore for FileVersionStore {
    fn installed_version(&self, component: &str) -> Result<Option<u64>> {
        Ok(self.record(component).map(|record| record.version))
    }

    fn record_version(&mut self, component: &str, version: u64) -> Result<()> {
        check_monotonic(component, self.installed_version(component)?, version)?;

        let mut next = self.document.clone();
        next.components.insert(
            component.to_string(),
            ComponentRecord {
                version,
                updated_at: Utc::now(),
            },
        );
        self.write_document(&next)?;
        self.document = next;

        event!(Level::DEBUG, component, version, "installed version recorded");
        Ok(())
    }

    fn components(&self) -> Result<Vec<String>> {
        Ok(self.document.components.keys().cloned().collect())
    }
}

// The rename only survives a crash once the directory entry is synced.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)
        .and_then(|handle| handle.sync_all())
        .map_err(|e| GateError::StorageError(format!("Failed to sync state directory: {}", e)))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

fn load_document(path: &Path) -> Result<VersionDocument> {
    if !path.exists() {
        return Ok(VersionDocument::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| GateError::StorageError(format!("Failed to read version document: {}", e)))?;
    let document: VersionDocument = serde_json::from_str(&raw).map_err(|e| {
        GateError::StorageError(format!("Failed to parse version document: {}", e))
    })?;
    if document.format_version != FORMAT_VERSION {
        return Err(GateError::StorageError(format!(
            "Unsupported version document format {} (expected {})",
            document.format_version, FORMAT_VERSION
        )));
    }
    Ok(document)
}
