//! Stage storage areas and artifact lifecycle
//!
//! Each stage's output is written durably before its input is removed from
//! the pending set, so the pipeline is resumable at stage granularity.

pub mod database;
pub mod table;

pub use table::DataTable;

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::config::StorageConfig;
use crate::error::{Error, Result};

/// The five storage areas the pipeline moves artifacts through.
#[derive(Debug, Clone)]
pub struct StageStore {
    incoming: PathBuf,
    pages: PathBuf,
    chunks: PathBuf,
    tables: PathBuf,
    archive: PathBuf,
}

impl StageStore {
    /// Build the store and create every area directory.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let store = Self {
            incoming: config.incoming_dir.clone(),
            pages: config.pages_dir.clone(),
            chunks: config.chunks_dir.clone(),
            tables: config.tables_dir.clone(),
            archive: config.archive_dir.clone(),
        };
        for dir in [
            &store.incoming,
            &store.pages,
            &store.chunks,
            &store.tables,
            &store.archive,
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(store)
    }

    /// Source documents awaiting /split
    pub fn incoming(&self) -> &Path {
        &self.incoming
    }

    /// Per-page documents awaiting /extract
    pub fn pages(&self) -> &Path {
        &self.pages
    }

    /// Chunk tables awaiting /generate
    pub fn chunks(&self) -> &Path {
        &self.chunks
    }

    /// Generated tables awaiting /insert
    pub fn tables(&self) -> &Path {
        &self.tables
    }

    /// Consumed source documents
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    /// Resolve `filename` inside `dir`, rejecting empty names, separators
    /// and parent references.
    pub fn resolve(dir: &Path, filename: &str) -> Result<PathBuf> {
        if filename.trim().is_empty() {
            return Err(Error::InvalidParameter(
                "filename must not be empty".to_string(),
            ));
        }
        if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
            return Err(Error::InvalidParameter(format!(
                "invalid filename: {}",
                filename
            )));
        }
        Ok(dir.join(filename))
    }

    /// Remove a consumed input artifact.
    ///
    /// Idempotent: an already-removed artifact is not an error.
    pub fn remove_consumed(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Move a consumed source document into the archive area.
    pub fn archive_source(&self, path: &Path) -> Result<PathBuf> {
        let name = path
            .file_name()
            .ok_or_else(|| Error::Internal(format!("no file name in {}", path.display())))?;
        let destination = self.archive.join(name);
        if fs::rename(path, &destination).is_err() {
            // Cross-device move: copy then remove
            fs::copy(path, &destination)?;
            fs::remove_file(path)?;
        }
        Ok(destination)
    }
}

/// Exclusive create of an output artifact.
///
/// An existing file is a Conflict: the stage has already run for this unit
/// of work. The atomic create-if-absent open doubles as the
/// duplicate-invocation guard.
pub fn create_artifact(path: &Path) -> Result<File> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(Error::Conflict(format!(
            "output artifact already exists: {}",
            path.display()
        ))),
        Err(e) => Err(e.into()),
    }
}
