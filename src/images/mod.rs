use anyhow::Context;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::forms::Upload;
use crate::storage::StorageClient;

/// Body limit for routes that accept image uploads.
pub const UPLOAD_LIMIT: usize = 20 * 1024 * 1024; // 20MB

/// An image written to storage: `key` addresses the object, `url` goes into the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

/// Stores an uploaded image under `<folder>/<uuid>.<ext>`.
pub async fn store_image(
    storage: &dyn StorageClient,
    folder: &str,
    upload: Upload,
) -> anyhow::Result<StoredImage> {
    let ext = ext_from_mime(&upload.content_type)
        .map(str::to_string)
        .or_else(|| upload.file_name.as_deref().and_then(ext_from_file_name))
        .unwrap_or_else(|| "bin".into());
    let key = format!("{}/{}.{}", folder, Uuid::new_v4(), ext);

    storage
        .put_object(&key, upload.body, &upload.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;

    let url = storage.public_url(&key);
    debug!(%key, %url, "image stored");
    Ok(StoredImage { key, url })
}

/// Removes an image whose record was never written. Failures are logged, not returned:
/// the request already has its answer.
pub async fn discard_image(storage: &dyn StorageClient, image: Option<StoredImage>) {
    let Some(image) = image else { return };
    match storage.delete_object(&image.key).await {
        Ok(()) => debug!(key = %image.key, "orphaned image removed"),
        Err(e) => warn!(error = ?e, key = %image.key, "failed to remove orphaned image"),
    }
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/heic" => Some("heic"),
        _ => None,
    }
}

fn ext_from_file_name(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    let ok = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    ok.then(|| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{LocalStorage, MemoryStorage};
    use bytes::Bytes;

    fn png(name: &str) -> Upload {
        Upload {
            body: Bytes::from_static(b"\x89PNG"),
            content_type: "image/png".into(),
            file_name: Some(name.into()),
        }
    }

    #[test]
    fn mime_types_map_to_extensions() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn file_name_extensions_are_sanitized() {
        assert_eq!(ext_from_file_name("shirt.JPEG").as_deref(), Some("jpeg"));
        assert_eq!(ext_from_file_name("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(ext_from_file_name("noext"), None);
        assert_eq!(ext_from_file_name("evil./../x"), None);
    }

    #[tokio::test]
    async fn stores_under_folder_and_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let stored = store_image(&storage, "posts", png("shirt.png")).await.unwrap();

        assert!(stored.key.starts_with("posts/"));
        assert!(stored.key.ends_with(".png"));
        assert_eq!(stored.url, format!("/uploads/{}", stored.key));
        assert!(dir.path().join(&stored.key).exists());
    }

    #[tokio::test]
    async fn falls_back_to_file_name_extension() {
        let storage = MemoryStorage::default();
        let stored = store_image(
            &storage,
            "profiles",
            Upload {
                body: Bytes::from_static(b"data"),
                content_type: "application/octet-stream".into(),
                file_name: Some("me.avif".into()),
            },
        )
        .await
        .unwrap();
        assert!(stored.key.ends_with(".avif"));
    }

    #[tokio::test]
    async fn discard_removes_the_object() {
        let storage = MemoryStorage::default();
        let stored = store_image(&storage, "posts", png("a.png")).await.unwrap();
        assert_eq!(storage.keys(), vec![stored.key.clone()]);

        discard_image(&storage, Some(stored)).await;
        assert!(storage.keys().is_empty());

        // nothing to discard is a no-op
        discard_image(&storage, None).await;
        assert_eq!(storage.puts(), 1);
    }
}
