//! Disk storage for uploaded images.
//!
//! Saving is fatal on failure and always happens before the owning document
//! is written; a save followed by a failed store update leaves the file on
//! disk. Deletion is best-effort: failures are logged and collected into a
//! [`CleanupReport`], never returned as errors of the enclosing operation.

use std::path::{Component, Path, PathBuf};

use tokio::io::{AsyncRead, AsyncWriteExt};
use uuid::Uuid;

use crate::api::metrics::record_asset_cleanup_failure;
use crate::services::{ServiceError, ServiceResult};

/// Branch images live directly under the asset root
pub const BRANCH_IMAGES: &str = "";
pub const COMPANY_LOGOS: &str = "logos";
pub const PROFILE_PHOTOS: &str = "profiles";

/// Outcome of a batch of best-effort deletions, kept apart from the
/// result of the operation that triggered them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
    public_prefix: String,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: &str) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.trim_matches('/').to_string(),
        }
    }

    /// Persist `reader` under `target_dir` with a fresh collision-resistant name.
    ///
    /// Returns the relative reference stored in documents, e.g.
    /// `uploads/logos/<uuid>.png`.
    pub async fn save<R>(
        &self,
        reader: &mut R,
        original_name: &str,
        target_dir: &str,
    ) -> ServiceResult<String>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let dir_segments = sanitize_segments(target_dir);
        let mut dir = self.root.clone();
        for segment in &dir_segments {
            dir.push(segment);
        }

        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            ServiceError::StorageIo(format!("Failed to create {}: {}", dir.display(), e))
        })?;

        let file_name = format!("{}{}", Uuid::new_v4(), extension_of(original_name));
        let path = dir.join(&file_name);

        let mut file = tokio::fs::File::create(&path).await.map_err(|e| {
            ServiceError::StorageIo(format!("Failed to create {}: {}", path.display(), e))
        })?;
        tokio::io::copy(reader, &mut file)
            .await
            .map_err(|e| ServiceError::StorageIo(format!("Failed to write {}: {}", path.display(), e)))?;
        file.flush()
            .await
            .map_err(|e| ServiceError::StorageIo(format!("Failed to write {}: {}", path.display(), e)))?;

        let mut reference = vec![self.public_prefix.clone()];
        reference.extend(dir_segments);
        reference.push(file_name);
        reference.retain(|s| !s.is_empty());

        tracing::debug!(path = %path.display(), "Stored asset");
        Ok(reference.join("/"))
    }

    /// Map a stored reference (or a requested public path) to a file under the root.
    ///
    /// Every segment is reduced to its final component, so nothing resolves
    /// outside the root.
    pub fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let trimmed = reference.trim_start_matches('/');
        let relative = trimmed
            .strip_prefix(self.public_prefix.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .unwrap_or(trimmed);

        let segments = sanitize_segments(relative);
        if segments.is_empty() {
            return None;
        }

        let mut path = self.root.clone();
        for segment in segments {
            path.push(segment);
        }
        Some(path)
    }

    /// Remove one stored asset
    pub async fn delete(&self, reference: &str) -> ServiceResult<()> {
        let path = self
            .resolve(reference)
            .ok_or_else(|| ServiceError::StorageIo(format!("Not an asset path: {}", reference)))?;

        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| ServiceError::StorageIo(format!("{}: {}", path.display(), e)))
    }

    /// Best-effort removal of every reference; failures are logged and reported
    pub async fn cleanup<I, S>(&self, references: I) -> CleanupReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut report = CleanupReport::default();

        for reference in references {
            let reference = reference.as_ref();
            if reference.is_empty() {
                continue;
            }
            match self.delete(reference).await {
                Ok(()) => report.removed.push(reference.to_string()),
                Err(e) => {
                    tracing::warn!(path = %reference, error = %e, "Failed to delete asset");
                    record_asset_cleanup_failure();
                    report.failed.push((reference.to_string(), e.to_string()));
                }
            }
        }

        report
    }
}

/// Split on `/` and `\`, keeping only the final normal component of each piece
fn sanitize_segments(path: &str) -> Vec<String> {
    path.split(['/', '\\'])
        .filter_map(|piece| {
            Path::new(piece)
                .components()
                .filter_map(|c| match c {
                    Component::Normal(name) => name.to_str(),
                    _ => None,
                })
                .last()
                .map(str::to_string)
        })
        .collect()
}

/// `.ext` of the uploaded name, dropped when it is not plain alphanumerics
fn extension_of(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &Path) -> AssetStore {
        AssetStore::new(dir.join("uploads"), "/uploads")
    }

    #[tokio::test]
    async fn test_save_creates_directory_and_unique_names() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = store(tmp.path());

        let first = assets
            .save(&mut b"one".as_slice(), "photo.JPG", BRANCH_IMAGES)
            .await
            .unwrap();
        let second = assets
            .save(&mut b"two".as_slice(), "photo.JPG", BRANCH_IMAGES)
            .await
            .unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("uploads/"));
        assert!(first.ends_with(".JPG"));

        let on_disk = assets.resolve(&first).unwrap();
        assert_eq!(std::fs::read(on_disk).unwrap(), b"one");
    }

    #[tokio::test]
    async fn test_save_into_subdirectory() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = store(tmp.path());

        let reference = assets
            .save(&mut b"png".as_slice(), "logo.png", COMPANY_LOGOS)
            .await
            .unwrap();
        assert!(reference.starts_with("uploads/logos/"));
        assert!(tmp.path().join("uploads/logos").is_dir());
    }

    #[tokio::test]
    async fn test_save_fails_when_root_is_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("uploads");
        std::fs::write(&blocker, b"not a dir").unwrap();

        let assets = AssetStore::new(&blocker, "/uploads");
        let result = assets.save(&mut b"x".as_slice(), "a.png", COMPANY_LOGOS).await;
        assert!(matches!(result, Err(ServiceError::StorageIo(_))));
    }

    #[test]
    fn test_resolve_stays_under_root() {
        let assets = AssetStore::new("/srv/assets", "/uploads");

        assert_eq!(
            assets.resolve("uploads/../../etc/passwd"),
            Some(PathBuf::from("/srv/assets/etc/passwd"))
        );
        assert_eq!(
            assets.resolve("/uploads/logos/a.png"),
            Some(PathBuf::from("/srv/assets/logos/a.png"))
        );
        assert_eq!(assets.resolve("a.png"), Some(PathBuf::from("/srv/assets/a.png")));
        assert_eq!(assets.resolve("uploads/.."), None);
    }

    #[tokio::test]
    async fn test_cleanup_reports_failures_without_erroring() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = store(tmp.path());

        let kept = assets
            .save(&mut b"x".as_slice(), "a.png", BRANCH_IMAGES)
            .await
            .unwrap();

        let report = assets
            .cleanup([kept.as_str(), "uploads/missing.png"])
            .await;
        assert_eq!(report.removed, vec![kept.clone()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "uploads/missing.png");
        assert!(!report.is_clean());
        assert!(assets.resolve(&kept).map(|p| !p.exists()).unwrap_or(false));
    }

    #[test]
    fn test_extension_filtering() {
        assert_eq!(extension_of("a.png"), ".png");
        assert_eq!(extension_of("noext"), "");
        assert_eq!(extension_of("weird.p/g"), "");
        assert_eq!(extension_of("x.tar.gz"), ".gz");
    }
}
