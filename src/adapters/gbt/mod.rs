//! Gradient-boosted tree adapter: Implementation of Predictor.
//!
//! Loads a tree ensemble exported from the training notebook as JSON and
//! evaluates it in plain `f64`.
//!
//! # Model Format
//!
//! ```json
//! {
//!   "schema": "full",
//!   "feature_names": ["age", "sex", "cp", "..."],
//!   "base_score": -0.05,
//!   "trees": [
//!     { "nodes": [
//!         { "feature": 2, "threshold": 0.5, "yes": 1, "no": 2, "missing": 1 },
//!         { "leaf": -0.41 },
//!         { "leaf": 0.37 }
//!     ] }
//!   ]
//! }
//! ```
//!
//! A split sends `x < threshold` to `yes`, otherwise to `no`; NaN follows
//! `missing` (or `yes` when absent). Child indices must point forward, so
//! every traversal terminates. The probability is the logistic sigmoid of
//! `base_score` plus the sum of the reached leaves.
//!
//! # Integrity
//!
//! When `manifest.json` sits next to the model, the model bytes must match
//! its SHA-256 digest and the declared schema. Use the `write_manifest`
//! binary to produce it.

mod manifest;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{FeatureVector, SchemaVersion};
use crate::ports::{ConfigurationError, Predictor};

pub use manifest::{sha256_hex, ModelManifest, MANIFEST_FILE};

/// Default file name of the exported ensemble.
pub const MODEL_FILE: &str = "gbt_model.json";

/// Upper bounds to reject absurd artifacts before evaluating them.
const MAX_TREES: usize = 10_000;
const MAX_NODES_PER_TREE: usize = 1 << 16;

/// A single node of a flattened tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        missing: Option<usize>,
    },
    Leaf {
        leaf: f64,
    },
}

/// One regression tree, root at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    fn validate(&self, tree_idx: usize, n_features: usize) -> Result<(), ConfigurationError> {
        if self.nodes.is_empty() || self.nodes.len() > MAX_NODES_PER_TREE {
            return Err(ConfigurationError::MalformedModel(format!(
                "tree {tree_idx} has {} nodes",
                self.nodes.len()
            )));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => {
                    if *feature >= n_features {
                        return Err(ConfigurationError::MalformedModel(format!(
                            "tree {tree_idx} node {idx}: feature index {feature} out of range"
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ConfigurationError::MalformedModel(format!(
                            "tree {tree_idx} node {idx}: non-finite threshold"
                        )));
                    }
                    let children = [Some(*yes), Some(*no), *missing];
                    for child in children.into_iter().flatten() {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(ConfigurationError::MalformedModel(format!(
                                "tree {tree_idx} node {idx}: child index {child} invalid"
                            )));
                        }
                    }
                }
                TreeNode::Leaf { leaf } => {
                    if !leaf.is_finite() {
                        return Err(ConfigurationError::MalformedModel(format!(
                            "tree {tree_idx} node {idx}: non-finite leaf"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Walk from the root to a leaf.
    fn score(&self, x: &[f64]) -> Result<f64, ConfigurationError> {
        let mut idx = 0;
        loop {
            let node = self.nodes.get(idx).ok_or_else(|| {
                ConfigurationError::MalformedModel(format!("dangling node index {idx}"))
            })?;
            match node {
                TreeNode::Leaf { leaf } => return Ok(*leaf),
                TreeNode::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                } => {
                    let value = x.get(*feature).copied().unwrap_or(f64::NAN);
                    idx = if value.is_nan() {
                        missing.unwrap_or(*yes)
                    } else if value < *threshold {
                        *yes
                    } else {
                        *no
                    };
                }
            }
        }
    }
}

/// Ensemble parameters as exported by the training notebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedGbtModel {
    pub schema: SchemaVersion,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl ExportedGbtModel {
    fn validate(&self) -> Result<(), ConfigurationError> {
        let expected = self.schema.feature_names();
        if self.feature_names != expected {
            return Err(ConfigurationError::MalformedModel(format!(
                "feature_names {:?} do not match the {} schema {:?}",
                self.feature_names, self.schema, expected
            )));
        }
        if self.trees.is_empty() || self.trees.len() > MAX_TREES {
            return Err(ConfigurationError::MalformedModel(format!(
                "invalid tree count: {}",
                self.trees.len()
            )));
        }
        if !self.base_score.is_finite() {
            return Err(ConfigurationError::MalformedModel(
                "non-finite base_score".into(),
            ));
        }
        let n = self.feature_names.len();
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i, n)?;
        }
        Ok(())
    }
}

fn sigmoid(margin: f64) -> f64 {
    1.0 / (1.0 + (-margin).exp())
}

/// Tree-ensemble predictor.
#[derive(Debug, Clone)]
pub struct GbtPredictor {
    model: ExportedGbtModel,
    digest: String,
}

impl GbtPredictor {
    /// Load the ensemble from a model directory or a model file.
    ///
    /// A directory is expected to contain `gbt_model.json` and, optionally,
    /// `manifest.json`.
    ///
    /// # Errors
    /// Returns `ConfigurationError` if the artifact is missing, malformed,
    /// or does not match its manifest.
    pub fn load(model_path: &Path) -> Result<Self, ConfigurationError> {
        if !model_path.exists() {
            return Err(ConfigurationError::ModelNotFound(format!(
                "{model_path:?} does not exist"
            )));
        }

        let (base_dir, model_file) = if model_path.is_dir() {
            (model_path.to_path_buf(), model_path.join(MODEL_FILE))
        } else {
            let parent = model_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            (parent, model_path.to_path_buf())
        };

        let file_name = model_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(MODEL_FILE)
            .to_string();

        let bytes = std::fs::read(&model_file).map_err(|e| {
            ConfigurationError::ModelNotFound(format!("{model_file:?}: {e}"))
        })?;
        let digest = sha256_hex(&bytes);

        let manifest = ModelManifest::read(&base_dir)?;
        match &manifest {
            Some(manifest) => manifest.verify_file(&file_name, &digest)?,
            None => tracing::warn!(
                "No {} next to {:?}; loading model without integrity check",
                MANIFEST_FILE,
                model_file
            ),
        }

        let model: ExportedGbtModel = serde_json::from_slice(&bytes)
            .map_err(|e| ConfigurationError::MalformedModel(e.to_string()))?;

        if let Some(manifest) = &manifest {
            if manifest.schema != model.schema {
                return Err(ConfigurationError::SchemaMismatch {
                    expected: manifest.schema,
                    found: model.schema,
                });
            }
        }

        let predictor = Self::from_model(model, digest)?;
        tracing::info!(
            "Loaded model from {:?} (schema={}, trees={}, sha256={})",
            model_file,
            predictor.model.schema,
            predictor.model.trees.len(),
            predictor.short_digest()
        );
        Ok(predictor)
    }

    /// Parse and validate an ensemble from JSON text.
    ///
    /// # Errors
    /// Returns `ConfigurationError::MalformedModel` if parsing or validation fails.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let model: ExportedGbtModel = serde_json::from_str(json)
            .map_err(|e| ConfigurationError::MalformedModel(e.to_string()))?;
        Self::from_model(model, sha256_hex(json.as_bytes()))
    }

    fn from_model(model: ExportedGbtModel, digest: String) -> Result<Self, ConfigurationError> {
        model.validate()?;
        Ok(Self { model, digest })
    }

    /// SHA-256 of the artifact bytes (hex).
    #[must_use]
    pub fn digest(&self) -> &str {
        &self.digest
    }

    #[must_use]
    pub fn short_digest(&self) -> &str {
        self.digest.get(..12).unwrap_or(&self.digest)
    }

    #[must_use]
    pub fn tree_count(&self) -> usize {
        self.model.trees.len()
    }

    /// Raw additive score before the sigmoid.
    fn margin(&self, x: &[f64]) -> Result<f64, ConfigurationError> {
        self.model
            .trees
            .iter()
            .try_fold(self.model.base_score, |acc, tree| Ok(acc + tree.score(x)?))
    }
}

impl Predictor for GbtPredictor {
    fn schema(&self) -> SchemaVersion {
        self.model.schema
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64, ConfigurationError> {
        if features.schema() != self.model.schema {
            return Err(ConfigurationError::SchemaMismatch {
                expected: self.model.schema,
                found: features.schema(),
            });
        }
        let expected = self.model.feature_names.len();
        if features.len() != expected {
            return Err(ConfigurationError::VectorShape {
                expected,
                got: features.len(),
            });
        }

        let margin = self.margin(features.values())?;
        let probability = sigmoid(margin);
        tracing::debug!("GBT margin={:.4} probability={:.4}", margin, probability);
        Ok(probability)
    }

    fn describe(&self) -> String {
        format!(
            "Gradient-boosted trees ({} trees, {} schema, sha256 {})",
            self.model.trees.len(),
            self.model.schema,
            self.short_digest()
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Two stumps over the reduced schema: chest pain and max heart rate.
    pub(crate) fn reduced_model_json() -> String {
        let names = SchemaVersion::Reduced.feature_names();
        serde_json::json!({
            "schema": "reduced",
            "feature_names": names,
            "base_score": 0.0,
            "trees": [
                { "nodes": [
                    { "feature": 2, "threshold": 0.5, "yes": 1, "no": 2 },
                    { "leaf": -1.0 },
                    { "leaf": 1.0 }
                ] },
                { "nodes": [
                    { "feature": 7, "threshold": 150.0, "yes": 1, "no": 2, "missing": 2 },
                    { "leaf": -0.5 },
                    { "leaf": 0.5 }
                ] }
            ]
        })
        .to_string()
    }

    fn reduced_vector(cp: f64, thalach: f64) -> FeatureVector {
        let values = vec![50.0, 1.0, cp, 130.0, 240.0, 0.0, 0.0, thalach, 0.0, 1.0, 1.0];
        FeatureVector::new(SchemaVersion::Reduced, values).expect("valid vector")
    }

    #[test]
    fn test_predict_sums_leaves() {
        let predictor = GbtPredictor::from_json(&reduced_model_json()).expect("valid model");

        let p = predictor.predict(&reduced_vector(0.0, 120.0)).expect("predict");
        assert!((p - sigmoid(-1.5)).abs() < 1e-12);

        let p = predictor.predict(&reduced_vector(3.0, 170.0)).expect("predict");
        assert!((p - sigmoid(1.5)).abs() < 1e-12);
        assert!(p > 0.5 && p < 1.0);
    }

    #[test]
    fn test_nan_follows_missing_branch() {
        let predictor = GbtPredictor::from_json(&reduced_model_json()).expect("valid model");
        let p = predictor
            .predict(&reduced_vector(0.0, f64::NAN))
            .expect("predict");
        assert!((p - sigmoid(-0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_schema_mismatch_is_fatal() {
        let predictor = GbtPredictor::from_json(&reduced_model_json()).expect("valid model");
        let full = FeatureVector::new(SchemaVersion::Full, vec![0.0; 13]).expect("valid");
        assert!(matches!(
            predictor.predict(&full),
            Err(ConfigurationError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_rejects_backward_child_index() {
        let json = reduced_model_json().replace("\"yes\":1", "\"yes\":0");
        assert!(matches!(
            GbtPredictor::from_json(&json),
            Err(ConfigurationError::MalformedModel(_))
        ));
    }

    #[test]
    fn test_rejects_feature_name_drift() {
        let json = reduced_model_json().replace("\"trestbps\"", "\"trtbps\"");
        assert!(matches!(
            GbtPredictor::from_json(&json),
            Err(ConfigurationError::MalformedModel(_))
        ));
    }

    #[test]
    fn test_bundled_model_loads() {
        let predictor = GbtPredictor::load(Path::new("models")).expect("bundled model");
        assert_eq!(predictor.schema(), SchemaVersion::Full);
        assert!(predictor.tree_count() > 0);
    }

    #[test]
    fn test_load_verifies_manifest_digest() {
        let temp = tempdir().expect("tempdir");
        let dir = temp.path();
        std::fs::write(dir.join(MODEL_FILE), reduced_model_json()).expect("write model");

        let manifest = ModelManifest::for_model_dir(dir).expect("manifest");
        manifest.write(dir).expect("write manifest");
        let loaded = GbtPredictor::load(dir).expect("verified load");
        assert_eq!(loaded.schema(), SchemaVersion::Reduced);

        // Tamper after the manifest was written.
        let tampered = reduced_model_json().replace("-1.0", "-2.0");
        std::fs::write(dir.join(MODEL_FILE), tampered).expect("rewrite model");
        assert!(matches!(
            GbtPredictor::load(dir),
            Err(ConfigurationError::Integrity(_))
        ));
    }

    #[test]
    fn test_load_missing_path() {
        assert!(matches!(
            GbtPredictor::load(Path::new("does/not/exist")),
            Err(ConfigurationError::ModelNotFound(_))
        ));
    }
}
