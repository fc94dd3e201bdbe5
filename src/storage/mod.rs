//! Object storage for uploaded video files.
//!
//! The workflow only ever needs three things from a store: put bytes in and
//! get back a locator plus an opaque provider reference, read the bytes back
//! by reference, and delete by reference.

use async_trait::async_trait;
use thiserror::Error;

pub mod local;

pub use local::{is_supported_video_type, LocalObjectStore};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Blocking task failed: {0}")]
    Blocking(String),
    #[error("Invalid provider reference: {0}")]
    InvalidReference(String),
    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),
    #[error("Object not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    pub original_name: String,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    /// Where clients fetch the file from.
    pub url: String,
    /// Opaque handle for later fetch/delete requests.
    pub provider_ref: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn store(&self, bytes: Vec<u8>, metadata: ObjectMetadata) -> Result<StoredObject, StorageError>;

    async fn fetch(&self, provider_ref: &str) -> Result<Vec<u8>, StorageError>;

    async fn delete(&self, provider_ref: &str) -> Result<(), StorageError>;
}
