use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// One input to the batch runner: an audio file and its ground truth.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchItem {
    pub path: PathBuf,
    pub transcript: String,
    /// Report id. Manifest loading fills it with the path as written in the
    /// manifest.
    #[serde(default)]
    pub id: Option<String>,
}

impl BatchItem {
    pub fn new(path: impl Into<PathBuf>, transcript: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            transcript: transcript.into(),
            id: None,
        }
    }

    /// Identifier used in reports: the explicit id, else the path.
    pub fn file_id(&self) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Load a JSON array of `{"path": ..., "transcript": ...}` objects.
///
/// Relative audio paths are resolved against the manifest's directory.
pub fn load_manifest(path: &Path) -> Result<Vec<BatchItem>, ManifestError> {
    let json = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let items: Vec<BatchItem> = serde_json::from_str(&json).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(items
        .into_iter()
        .map(|item| BatchItem {
            id: Some(item.id.unwrap_or_else(|| item.path.display().to_string())),
            path: if item.path.is_relative() {
                base.join(&item.path)
            } else {
                item.path
            },
            transcript: item.transcript,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_id_defaults_to_path() {
        let item = BatchItem::new("/data/speaker_01/utt.wav", "hi");
        assert_eq!(item.file_id(), "/data/speaker_01/utt.wav");
    }

    #[test]
    fn test_manifest_ids_keep_subdirectories() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("manifest.json");
        fs::write(
            &manifest,
            r#"[
                {"path": "spk1/utt.wav", "transcript": "one"},
                {"path": "spk2/utt.wav", "transcript": "two"},
                {"path": "spk3/utt.wav", "transcript": "three", "id": "custom"}
            ]"#,
        )
        .unwrap();

        let items = load_manifest(&manifest).unwrap();
        assert_eq!(items[0].file_id(), "spk1/utt.wav");
        assert_eq!(items[1].file_id(), "spk2/utt.wav");
        assert_eq!(items[2].file_id(), "custom");
        assert_eq!(items[0].path, dir.path().join("spk1/utt.wav"));
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("manifest.json");
        fs::write(
            &manifest,
            r#"[
                {"path": "a.wav", "transcript": "hello there"},
                {"path": "/abs/b.wav", "transcript": "general kenobi"}
            ]"#,
        )
        .unwrap();

        let items = load_manifest(&manifest).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].path, dir.path().join("a.wav"));
        assert_eq!(items[0].transcript, "hello there");
        assert_eq!(items[1].path, PathBuf::from("/abs/b.wav"));
    }

    #[test]
    fn test_missing_manifest_is_error() {
        assert!(matches!(
            load_manifest(Path::new("/nonexistent/manifest.json")),
            Err(ManifestError::Read { .. })
        ));
    }

    #[test]
    fn test_malformed_manifest_is_error() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("manifest.json");
        fs::write(&manifest, r#"[{"path": "a.wav"}]"#).unwrap();
        assert!(matches!(
            load_manifest(&manifest),
            Err(ManifestError::Parse { .. })
        ));
    }
}
