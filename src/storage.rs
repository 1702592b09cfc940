use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{BehaviorVersion, Builder as S3ConfigBuilder, Region},
    Client,
};
use aws_smithy_types::byte_stream::ByteStream;
use bytes::Bytes;

use crate::config::StorageConfig;

/// URL prefix under which the local backend's files are served.
pub const LOCAL_PUBLIC_PREFIX: &str = "/uploads";

/// Object store for uploaded images. Records keep the URL from `public_url`, never the key.
#[async_trait]
pub trait StorageClient: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()>;
    /// Deleting a key that does not exist succeeds.
    async fn delete_object(&self, key: &str) -> anyhow::Result<()>;
    fn public_url(&self, key: &str) -> String;
}

pub async fn from_config(cfg: &StorageConfig) -> anyhow::Result<Arc<dyn StorageClient>> {
    let storage: Arc<dyn StorageClient> = match cfg {
        StorageConfig::Local { root } => Arc::new(LocalStorage::new(root)),
        StorageConfig::S3 {
            endpoint,
            bucket,
            access_key,
            secret_key,
            region,
            public_url,
        } => Arc::new(S3Storage::connect(S3Settings {
            endpoint,
            bucket,
            access_key,
            secret_key,
            region,
            public_url,
        })),
    };
    Ok(storage)
}

/// Files on local disk, exposed by the router under `/uploads`.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> anyhow::Result<PathBuf> {
        // keys are generated server-side, but never let one escape the root
        if key.is_empty() || key.split('/').any(|seg| seg.is_empty() || seg == "..") {
            anyhow::bail!("invalid storage key {key:?}");
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageClient for LocalStorage {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("create upload dir {}", dir.display()))?;
        }
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("write upload {}", path.display()))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove upload {}", path.display())),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", LOCAL_PUBLIC_PREFIX, key)
    }
}

/// Connection details for an S3-compatible bucket.
#[derive(Debug, Clone, Copy)]
pub struct S3Settings<'a> {
    pub endpoint: &'a str,
    pub bucket: &'a str,
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub region: &'a str,
    pub public_url: &'a str,
}

/// S3 or MinIO bucket, addressed path-style.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
    public_url: String,
}

impl S3Storage {
    pub fn connect(s: S3Settings<'_>) -> Self {
        let credentials = Credentials::new(s.access_key, s.secret_key, None, None, "shopfeed-env");
        let conf = S3ConfigBuilder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(s.region.to_string()))
            .credentials_provider(credentials)
            .endpoint_url(s.endpoint)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(conf),
            bucket: s.bucket.to_string(),
            public_url: s.public_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StorageClient for S3Storage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .with_context(|| format!("upload s3://{}/{}", self.bucket, key))?;
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("delete s3://{}/{}", self.bucket, key))?;
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

/// In-process store that remembers what was written, for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: std::sync::Mutex<std::collections::BTreeMap<String, Bytes>>,
    puts: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn puts(&self) -> usize {
        self.puts.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl StorageClient for MemoryStorage {
    async fn put_object(&self, key: &str, body: Bytes, _content_type: &str) -> anyhow::Result<()> {
        self.puts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://fake.local/{}", key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_put_then_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage
            .put_object("posts/abc.png", Bytes::from_static(b"png-bytes"), "image/png")
            .await
            .expect("put should succeed");
        let path = dir.path().join("posts/abc.png");
        assert_eq!(std::fs::read(&path).unwrap(), b"png-bytes");
        assert_eq!(storage.public_url("posts/abc.png"), "/uploads/posts/abc.png");

        storage.delete_object("posts/abc.png").await.unwrap();
        assert!(!path.exists());
        // second delete of the same key is fine
        storage.delete_object("posts/abc.png").await.unwrap();
    }

    #[tokio::test]
    async fn local_rejects_keys_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        for key in ["../etc/passwd", "posts/../../x", "", "/abs"] {
            let put = storage
                .put_object(key, Bytes::from_static(b"x"), "text/plain")
                .await;
            assert!(put.is_err(), "put {key:?} should be rejected");
            assert!(storage.delete_object(key).await.is_err(), "delete {key:?} should be rejected");
        }
    }

    #[test]
    fn s3_public_url_drops_trailing_slash() {
        let storage = S3Storage::connect(S3Settings {
            endpoint: "http://127.0.0.1:9000",
            bucket: "shirts",
            access_key: "k",
            secret_key: "s",
            region: "us-east-1",
            public_url: "https://cdn.example.com/shirts/",
        });
        assert_eq!(
            storage.public_url("posts/a.png"),
            "https://cdn.example.com/shirts/posts/a.png"
        );
    }
}
