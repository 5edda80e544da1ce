//! Object store for uploaded application documents.
//!
//! Blobs are addressed by a string key. `put` is write-once, `get` streams the
//! body back without buffering it, and `delete` of an absent key succeeds.

pub mod local;
#[cfg(test)]
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;
use uuid::Uuid;

/// Lazily produced blob body.
pub type BlobStream = BoxStream<'static, Result<Bytes, std::io::Error>>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blob '{0}' not found")]
    NotFound(String),

    #[error("blob '{0}' already exists")]
    AlreadyExists(String),

    #[error("invalid blob key '{0}'")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), StorageError>;

    async fn get(&self, key: &str) -> Result<BlobStream, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// The two documents an application can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Resume,
    CoverLetter,
}

impl DocumentKind {
    pub fn slug(&self) -> &'static str {
        match self {
            DocumentKind::Resume => "resume",
            DocumentKind::CoverLetter => "cover_letter",
        }
    }
}

/// Storage key for an uploaded document:
/// `{application_id}/{submitter}_{kind}_{filename}`.
///
/// Scoping by the application id keeps two submitters with the same display
/// name from overwriting each other while the rest stays human-readable.
pub fn blob_key(
    application_id: Uuid,
    submitter_name: &str,
    kind: DocumentKind,
    original_filename: &str,
) -> String {
    let filename = original_filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default();
    let mut filename = sanitize(filename);
    if filename.trim_matches(|c: char| c == '.' || c == '_').is_empty() {
        filename = "document".to_string();
    }
    let mut submitter = sanitize(submitter_name);
    if submitter.trim_matches('_').is_empty() {
        submitter = "applicant".to_string();
    }
    format!("{application_id}/{submitter}_{}_{filename}", kind.slug())
}

fn sanitize(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Last path segment of a key, used as the download filename.
pub fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
