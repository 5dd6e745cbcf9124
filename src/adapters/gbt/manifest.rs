//! Model manifest: binds model files to their SHA-256 digests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::SchemaVersion;
use crate::ports::{ConfigurationError, Predictor};

use super::{GbtPredictor, MODEL_FILE};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    /// Feature layout of the bound model.
    pub schema: SchemaVersion,
    /// Relative file name to hex digest.
    pub files: BTreeMap<String, String>,
}

impl ModelManifest {
    pub const VERSION: u32 = 1;

    /// Read `manifest.json` from `dir`, if present.
    ///
    /// # Errors
    /// Returns `ConfigurationError` if the file exists but cannot be parsed
    /// or has an unsupported version.
    pub fn read(dir: &Path) -> Result<Option<Self>, ConfigurationError> {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read(&path)?;
        let manifest: Self = serde_json::from_slice(&content).map_err(|e| {
            ConfigurationError::Integrity(format!("Invalid {MANIFEST_FILE} format: {e}"))
        })?;

        if manifest.version != Self::VERSION {
            return Err(ConfigurationError::Integrity(format!(
                "Unsupported manifest version: {}",
                manifest.version
            )));
        }
        if manifest.files.is_empty() {
            return Err(ConfigurationError::Integrity(format!(
                "{MANIFEST_FILE} contains no files"
            )));
        }
        Ok(Some(manifest))
    }

    /// Build a manifest for the model in `dir`.
    ///
    /// The model is parsed and validated first, so a manifest is never
    /// written for an artifact the application would refuse to load.
    ///
    /// # Errors
    /// Returns `ConfigurationError` if the model is missing or malformed.
    pub fn for_model_dir(dir: &Path) -> Result<Self, ConfigurationError> {
        let model_path = dir.join(MODEL_FILE);
        let content = fs::read_to_string(&model_path).map_err(|e| {
            ConfigurationError::ModelNotFound(format!("{model_path:?}: {e}"))
        })?;

        let predictor = GbtPredictor::from_json(&content)?;

        let mut files = BTreeMap::new();
        files.insert(MODEL_FILE.to_string(), predictor.digest().to_string());

        Ok(Self {
            version: Self::VERSION,
            schema: predictor.schema(),
            files,
        })
    }

    /// Write the manifest as pretty JSON into `dir`.
    ///
    /// # Errors
    /// Returns `ConfigurationError::Io` if the file cannot be written.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, ConfigurationError> {
        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| ConfigurationError::Integrity(e.to_string()))?;
        let path = dir.join(MANIFEST_FILE);
        fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Check that `file_name` is bound and its digest matches.
    ///
    /// # Errors
    /// Returns `ConfigurationError::Integrity` on a missing entry or mismatch.
    pub fn verify_file(&self, file_name: &str, digest: &str) -> Result<(), ConfigurationError> {
        let expected = self.files.get(file_name).ok_or_else(|| {
            ConfigurationError::Integrity(format!("{MANIFEST_FILE} does not bind {file_name}"))
        })?;
        if !expected.eq_ignore_ascii_case(digest) {
            return Err(ConfigurationError::Integrity(format!(
                "File hash mismatch for {file_name}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sha256_hex_known_value() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_read_absent_manifest() {
        let temp = tempdir().expect("tempdir");
        assert_eq!(ModelManifest::read(temp.path()).expect("read"), None);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let temp = tempdir().expect("tempdir");
        fs::write(
            temp.path().join(MANIFEST_FILE),
            r#"{"version":2,"schema":"full","files":{"gbt_model.json":"00"}}"#,
        )
        .expect("write");
        assert!(matches!(
            ModelManifest::read(temp.path()),
            Err(ConfigurationError::Integrity(_))
        ));
    }

    #[test]
    fn test_verify_file() {
        let mut files = BTreeMap::new();
        files.insert(MODEL_FILE.to_string(), "ABCDEF".to_string());
        let manifest = ModelManifest {
            version: 1,
            schema: SchemaVersion::Full,
            files,
        };
        assert!(manifest.verify_file(MODEL_FILE, "abcdef").is_ok());
        assert!(manifest.verify_file(MODEL_FILE, "abcdee").is_err());
        assert!(manifest.verify_file("other.json", "abcdef").is_err());
    }
}
