//! Per-run artifact namespaces on the local filesystem.
//!
//! Every orchestration call gets a fresh batch run id owning two parallel
//! directory trees: raw uploads under `resumes_uploaded/<run>/` and parsed
//! JSON under `resumes_parsed/<run>/`. Runs are never reused and never
//! deleted here — retention is an operator concern.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

const UPLOADED_TREE: &str = "resumes_uploaded";
const PARSED_TREE: &str = "resumes_parsed";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: io::Error,
    },

    #[error("malformed artifact {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<ArtifactError> for crate::pipeline::StageError {
    fn from(err: ArtifactError) -> Self {
        use crate::pipeline::StageError;
        match err {
            ArtifactError::NotFound(_) => StageError::MissingArtifact(err.to_string()),
            ArtifactError::Json { .. } => StageError::Malformed(err.to_string()),
            ArtifactError::Io { .. } => StageError::Provider(err.to_string()),
        }
    }
}

/// Resolves and persists artifacts under a configurable data root.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Generates a fresh run id: second-granularity timestamp for operator
    /// legibility plus a UUID suffix so concurrent runs started within the
    /// same second cannot collide.
    pub fn new_run_id(&self) -> String {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S");
        let suffix = Uuid::new_v4().simple().to_string();
        format!("batch_{timestamp}_{}", &suffix[..8])
    }

    /// Creates both directory trees for a run. Idempotent: existing
    /// directories are not an error.
    pub async fn create_run_dirs(&self, run_id: &str) -> Result<(), ArtifactError> {
        for dir in [self.uploaded_dir(run_id), self.parsed_dir(run_id)] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|source| ArtifactError::Io {
                    path: dir.clone(),
                    source,
                })?;
            debug!("Ensured artifact directory {}", dir.display());
        }
        Ok(())
    }

    pub fn uploaded_dir(&self, run_id: &str) -> PathBuf {
        self.root.join(UPLOADED_TREE).join(run_id)
    }

    pub fn parsed_dir(&self, run_id: &str) -> PathBuf {
        self.root.join(PARSED_TREE).join(run_id)
    }

    pub fn uploaded_path(&self, run_id: &str, filename: &str) -> PathBuf {
        self.uploaded_dir(run_id).join(filename)
    }

    /// Path of the parsed artifact for a filename stem: `<stem>_parsed.json`.
    pub fn parsed_path(&self, run_id: &str, stem: &str) -> PathBuf {
        self.parsed_dir(run_id).join(format!("{stem}_parsed.json"))
    }

    pub async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    /// Persists raw upload bytes, returning the stored path.
    pub async fn write_upload(
        &self,
        run_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, ArtifactError> {
        let path = self.uploaded_path(run_id, filename);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| ArtifactError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Persists a parsed artifact as pretty-printed JSON under the stem.
    pub async fn write_parsed<T: Serialize>(
        &self,
        run_id: &str,
        stem: &str,
        value: &T,
    ) -> Result<PathBuf, ArtifactError> {
        let path = self.parsed_path(run_id, stem);
        let json = serde_json::to_vec_pretty(value).map_err(|source| ArtifactError::Json {
            path: path.clone(),
            source,
        })?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| ArtifactError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Reads and deserializes a JSON artifact, failing fast with a
    /// descriptive not-found error so a missing file never masquerades as a
    /// downstream failure.
    pub async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, ArtifactError> {
        if !self.exists(path).await {
            return Err(ArtifactError::NotFound(path.to_path_buf()));
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ArtifactError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Filename with a trailing `.pdf` removed — the key under which parsed
/// artifacts are stored and later matched.
pub fn parsed_stem(filename: &str) -> &str {
    filename.strip_suffix(".pdf").unwrap_or(filename)
}

/// True when `name` is usable as a single path component. Run ids and
/// client-supplied filenames must never traverse out of their namespace.
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Doc {
        name: String,
    }

    fn store() -> (tempfile::TempDir, ArtifactStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_run_id_shape() {
        let (_dir, store) = store();
        let id = store.new_run_id();
        assert!(id.starts_with("batch_"), "{id}");
        // batch_ + YYYY-MM-DDTHH-MM-SS + _ + 8 hex chars
        assert_eq!(id.len(), "batch_".len() + 19 + 1 + 8, "{id}");
    }

    #[test]
    fn test_consecutive_run_ids_differ() {
        let (_dir, store) = store();
        assert_ne!(store.new_run_id(), store.new_run_id());
    }

    #[test]
    fn test_path_resolution() {
        let store = ArtifactStore::new("/data");
        assert_eq!(
            store.uploaded_path("batch_x", "cv.pdf"),
            PathBuf::from("/data/resumes_uploaded/batch_x/cv.pdf")
        );
        assert_eq!(
            store.parsed_path("batch_x", "cv"),
            PathBuf::from("/data/resumes_parsed/batch_x/cv_parsed.json")
        );
    }

    #[test]
    fn test_parsed_stem_strips_pdf_suffix_only() {
        assert_eq!(parsed_stem("jane_doe.pdf"), "jane_doe");
        assert_eq!(parsed_stem("jane_doe"), "jane_doe");
        assert_eq!(parsed_stem("archive.pdf.pdf"), "archive.pdf");
    }

    #[test]
    fn test_is_safe_component() {
        assert!(is_safe_component("batch_2026-01-01T00-00-00_ab12cd34"));
        assert!(is_safe_component("jane doe.pdf"));
        assert!(!is_safe_component(""));
        assert!(!is_safe_component(".."));
        assert!(!is_safe_component("../etc/passwd"));
        assert!(!is_safe_component("a/b.pdf"));
        assert!(!is_safe_component("a\\b.pdf"));
    }

    #[tokio::test]
    async fn test_create_run_dirs_is_idempotent() {
        let (_dir, store) = store();
        store.create_run_dirs("batch_a").await.unwrap();
        store.create_run_dirs("batch_a").await.unwrap();
        assert!(store.uploaded_dir("batch_a").is_dir());
        assert!(store.parsed_dir("batch_a").is_dir());
    }

    #[tokio::test]
    async fn test_write_and_read_round_trip() {
        let (_dir, store) = store();
        store.create_run_dirs("batch_a").await.unwrap();

        let uploaded = store
            .write_upload("batch_a", "cv.pdf", b"%PDF-1.4")
            .await
            .unwrap();
        assert!(store.exists(&uploaded).await);

        let doc = Doc {
            name: "Jane".to_string(),
        };
        let parsed = store.write_parsed("batch_a", "cv", &doc).await.unwrap();
        let read: Doc = store.read_json(&parsed).await.unwrap();
        assert_eq!(read, doc);
    }

    #[tokio::test]
    async fn test_read_missing_artifact_names_the_path() {
        let (_dir, store) = store();
        let path = store.parsed_path("batch_missing", "ghost");
        let err = store.read_json::<Doc>(&path).await.unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound(_)));
        assert!(err.to_string().contains("ghost_parsed.json"));
    }

    #[tokio::test]
    async fn test_read_corrupt_artifact_is_malformed() {
        let (_dir, store) = store();
        store.create_run_dirs("batch_a").await.unwrap();
        let path = store.parsed_path("batch_a", "bad");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        let err = store.read_json::<Doc>(&path).await.unwrap_err();
        assert!(matches!(err, ArtifactError::Json { .. }));
    }
}
