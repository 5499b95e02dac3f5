//! Whole-document JSON persistence.
//!
//! A [`JsonDocument`] is a single file holding one JSON value. Every load reads
//! and parses the full file; every save serializes the full value and replaces
//! the file. There is no indexing, caching, or partial update.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// Errors raised while reading or writing a document
#[derive(Error, Debug)]
pub enum DbError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Handle on a JSON document stored at a fixed path
#[derive(Debug, Clone)]
pub struct JsonDocument {
    path: PathBuf,
}

impl JsonDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the whole document
    pub async fn load<T: DeserializeOwned>(&self) -> Result<T, DbError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        serde_json::from_slice(&bytes).map_err(|source| DbError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    /// Serialize `value` pretty-printed and replace the document with it.
    ///
    /// The bytes go to a uniquely named sibling temporary file that is then
    /// persisted over the document, so readers see either the old or the new
    /// contents and concurrent savers never share a staging file.
    pub async fn save<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), DbError> {
        let encoded = serde_json::to_vec_pretty(value).map_err(DbError::Encode)?;
        let bytes = encoded.len();
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || replace_file(&path, &encoded))
            .await
            .map_err(|join| self.io_error(std::io::Error::other(join)))?
            .map_err(|source| self.io_error(source))?;

        tracing::debug!(
            target: "libris-db",
            path = %self.path.display(),
            bytes,
            "document saved"
        );
        Ok(())
    }

    /// Write `T::default()` when the document does not exist yet.
    ///
    /// Returns `true` when a new document was created.
    pub async fn ensure_exists<T: Serialize + Default>(&self) -> Result<bool, DbError> {
        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;
        if exists {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        self.save(&T::default()).await?;
        tracing::info!(
            target: "libris-db",
            path = %self.path.display(),
            "created empty document"
        );
        Ok(true)
    }

    fn io_error(&self, source: std::io::Error) -> DbError {
        DbError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn replace_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staging = tempfile::NamedTempFile::new_in(dir)?;
    staging.write_all(contents)?;
    staging.as_file().sync_all()?;
    staging.persist(path).map_err(|err| err.error)?;
    Ok(())
}
