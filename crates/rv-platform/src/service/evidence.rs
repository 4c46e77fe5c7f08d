//! Evidence file storage

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{PlatformError, Result};

/// URL prefix evidence files are served under
pub const UPLOADS_PREFIX: &str = "/uploads";

#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Persist an uploaded file and return its public path.
    async fn store(&self, original_name: &str, content: Bytes) -> Result<String>;

    /// Delete a file returned by `store`. Removing a missing file succeeds.
    async fn remove(&self, public_path: &str) -> Result<()>;
}

/// Writes evidence to a local directory served statically at `/uploads`.
pub struct LocalEvidenceStore {
    root: PathBuf,
}

impl LocalEvidenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Keeps the final path component and replaces anything outside
/// `[A-Za-z0-9._-]`, so the name can never leave the uploads directory.
fn sanitize_file_name(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "evidence".to_string()
    } else {
        cleaned.to_string()
    }
}

#[async_trait]
impl EvidenceStore for LocalEvidenceStore {
    async fn store(&self, original_name: &str, content: Bytes) -> Result<String> {
        if content.is_empty() {
            return Err(PlatformError::validation("Evidence file is empty"));
        }

        let stored_name = format!("{}-{}", uuid::Uuid::new_v4().simple(), sanitize_file_name(original_name));
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&stored_name), &content).await?;

        debug!(file = %stored_name, bytes = content.len(), "Evidence stored");
        Ok(format!("{}/{}", UPLOADS_PREFIX, stored_name))
    }

    async fn remove(&self, public_path: &str) -> Result<()> {
        let stored_name = public_path
            .strip_prefix(UPLOADS_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && sanitize_file_name(name) == *name)
            .ok_or_else(|| PlatformError::validation(format!("Not an evidence path: {}", public_path)))?;

        match tokio::fs::remove_file(self.root.join(stored_name)).await {
            Ok(()) => {
                debug!(file = %stored_name, "Evidence removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("script.pdf"), "script.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\my script.pdf"), "my_script.pdf");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "evidence");
        assert_eq!(sanitize_file_name(".."), "evidence");
    }

    #[tokio::test]
    async fn test_store_writes_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalEvidenceStore::new(dir.path().join("uploads"));

        let path = store
            .store("../answer sheet.pdf", Bytes::from_static(b"%PDF-1.4"))
            .await
            .unwrap();

        assert!(path.starts_with("/uploads/"));
        assert!(path.ends_with("-answer_sheet.pdf"));

        let stored = path.trim_start_matches("/uploads/");
        let written = std::fs::read(store.root().join(stored)).unwrap();
        assert_eq!(written, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_same_name_does_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalEvidenceStore::new(dir.path());

        let a = store.store("e1.pdf", Bytes::from_static(b"a")).await.unwrap();
        let b = store.store("e1.pdf", Bytes::from_static(b"b")).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_empty_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalEvidenceStore::new(dir.path());
        let err = store.store("e1.pdf", Bytes::new()).await.unwrap_err();
        assert!(matches!(err, PlatformError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_remove_deletes_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalEvidenceStore::new(dir.path());

        let path = store.store("e1.pdf", Bytes::from_static(b"pdf")).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

        store.remove(&path).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        // Already gone
        store.remove(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_stays_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalEvidenceStore::new(dir.path().join("uploads"));
        std::fs::write(dir.path().join("keep.txt"), b"keep").unwrap();

        for path in ["/uploads/../keep.txt", "/elsewhere/keep.txt", "/uploads/", "keep.txt"] {
            let err = store.remove(path).await.unwrap_err();
            assert!(matches!(err, PlatformError::Validation { .. }), "{}", path);
        }
        assert!(dir.path().join("keep.txt").exists());
    }
}
