use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::audio::domain::pipeline_parameters::PipelineParameters;
use crate::shared::constants::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Per-user config location, e.g. `~/.config/VoiceGuard/pipeline.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load pipeline parameters.
///
/// An explicit path must exist and parse. Without one, the per-user config
/// file is used when present, otherwise the defaults.
pub fn load_parameters(explicit: Option<&Path>) -> Result<PipelineParameters, ConfigError> {
    let params = match explicit {
        Some(path) => read_parameters(path)?,
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => {
                log::debug!("Loading pipeline config from {}", path.display());
                read_parameters(&path)?
            }
            None => PipelineParameters::default(),
        },
    };
    params.validate()?;
    Ok(params)
}

pub fn read_parameters(path: &Path) -> Result<PipelineParameters, ConfigError> {
    let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_file_is_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.json");
        fs::write(&path, r#"{"pitch_shift_semitones": 2.5, "noise_stddev": 0.0}"#).unwrap();
        let params = load_parameters(Some(&path)).unwrap();
        assert_eq!(params.pitch_shift_semitones, 2.5);
        assert_eq!(params.noise_stddev, 0.0);
        assert_eq!(params.band_order, 4);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = load_parameters(Some(Path::new("/nonexistent/params.json")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_parameters(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.json");
        fs::write(&path, r#"{"time_stretch_rate": -2.0}"#).unwrap();
        assert!(matches!(
            load_parameters(Some(&path)),
            Err(ConfigError::Invalid { field: "time_stretch_rate", .. })
        ));
    }
}
