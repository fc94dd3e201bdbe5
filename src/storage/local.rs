use super::{ObjectMetadata, ObjectStorage, StorageError, StoredObject};
use actix_web::web;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

const VIDEO_DIR: &str = "videos";

/// Maps an accepted MIME type to the extension the file is stored under.
/// Not configurable: an upload can never choose its own extension.
fn mime_to_safe_extension(mime_type: &str) -> Option<&'static str> {
    let map: BTreeMap<&str, &str> = [
        ("video/mp4", "mp4"),
        ("video/quicktime", "mov"),
        ("video/webm", "webm"),
        ("video/x-matroska", "mkv"),
    ]
    .iter()
    .cloned()
    .collect();

    map.get(mime_type).cloned()
}

pub fn is_supported_video_type(mime_type: &str) -> bool {
    mime_to_safe_extension(mime_type).is_some()
}

/// Stores files under `<root>/videos/<aa>/<bb>/<uuid>.<ext>` and hands out
/// `<url_prefix>/videos/...` locators. The provider reference is the path
/// relative to the root.
pub struct LocalObjectStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: &str) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    fn resolve(&self, provider_ref: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(provider_ref);
        let mut components = relative.components();
        let inside_video_dir = matches!(components.next(), Some(Component::Normal(first)) if first == VIDEO_DIR);
        if !inside_video_dir || !components.all(|c| matches!(c, Component::Normal(_))) {
            return Err(StorageError::InvalidReference(provider_ref.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn blocking_error(e: actix_web::error::BlockingError) -> StorageError {
    StorageError::Blocking(e.to_string())
}

#[async_trait]
impl ObjectStorage for LocalObjectStore {
    async fn store(&self, bytes: Vec<u8>, metadata: ObjectMetadata) -> Result<StoredObject, StorageError> {
        let extension = mime_to_safe_extension(&metadata.content_type)
            .ok_or_else(|| StorageError::UnsupportedType(metadata.content_type.clone()))?;

        let file_id = Uuid::new_v4().to_string();
        let provider_ref = format!(
            "{}/{}/{}/{}.{}",
            VIDEO_DIR,
            &file_id[0..2],
            &file_id[2..4],
            file_id,
            extension
        );
        let final_path = self.resolve(&provider_ref)?;

        web::block(move || {
            if let Some(parent) = final_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&final_path, &bytes)
        })
        .await
        .map_err(blocking_error)??;

        log::info!("Stored '{}' as {}", metadata.original_name, provider_ref);
        Ok(StoredObject {
            url: format!("{}/{}", self.url_prefix, provider_ref),
            provider_ref,
        })
    }

    async fn fetch(&self, provider_ref: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(provider_ref)?;
        let reference = provider_ref.to_string();
        web::block(move || fs::read(&path))
            .await
            .map_err(blocking_error)?
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => StorageError::NotFound(reference),
                _ => StorageError::Io(e),
            })
    }

    async fn delete(&self, provider_ref: &str) -> Result<(), StorageError> {
        let path = self.resolve(provider_ref)?;
        match web::block(move || fs::remove_file(&path)).await.map_err(blocking_error)? {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!("Stored file {} was already missing during deletion.", provider_ref);
                Ok(())
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(content_type: &str) -> ObjectMetadata {
        ObjectMetadata {
            original_name: "cut.mp4".to_string(),
            content_type: content_type.to_string(),
        }
    }

    #[actix_web::test]
    async fn store_fetch_delete_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "/media/");

        let stored = store.store(b"frames".to_vec(), metadata("video/mp4")).await.unwrap();
        assert!(stored.provider_ref.starts_with("videos/"));
        assert!(stored.provider_ref.ends_with(".mp4"));
        assert_eq!(stored.url, format!("/media/{}", stored.provider_ref));
        assert!(dir.path().join(&stored.provider_ref).exists());

        assert_eq!(store.fetch(&stored.provider_ref).await.unwrap(), b"frames".to_vec());

        store.delete(&stored.provider_ref).await.unwrap();
        assert!(!dir.path().join(&stored.provider_ref).exists());
        assert!(matches!(store.fetch(&stored.provider_ref).await, Err(StorageError::NotFound(_))));
    }

    #[actix_web::test]
    async fn references_cannot_escape_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "/media");

        for reference in ["../etc/passwd", "/etc/passwd", "videos/../../secret", "attachments/a.mp4"] {
            assert!(
                matches!(store.delete(reference).await, Err(StorageError::InvalidReference(_))),
                "accepted {}",
                reference
            );
        }
    }

    #[actix_web::test]
    async fn unsupported_types_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path(), "/media");

        let result = store.store(b"GIF89a".to_vec(), metadata("image/gif")).await;
        assert!(matches!(result, Err(StorageError::UnsupportedType(_))));
        assert!(is_supported_video_type("video/webm"));
        assert!(!is_supported_video_type("application/zip"));
    }
}
