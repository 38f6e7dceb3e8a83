use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use framingham_types::FEATURE_COLUMNS;

use crate::errors::InferenceError;

/// A single decision tree node in the boosted ensemble
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Feature index to compare against (internal nodes)
    #[serde(default)]
    pub feature_index: u16,
    /// Split threshold; `feature <= threshold` goes left
    #[serde(default)]
    pub threshold: f64,
    /// Left child node index
    #[serde(default)]
    pub left: u16,
    /// Right child node index
    #[serde(default)]
    pub right: u16,
    /// Leaf value (None for internal nodes)
    #[serde(default)]
    pub value: Option<f64>,
}

/// A single decision tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Nodes indexed by position, root at index 0
    pub nodes: Vec<Node>,
}

/// The pre-fitted binary classifier artifact, produced by an external
/// training pipeline and consumed here as an opaque decision function.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    /// Artifact format version
    pub version: u32,
    /// Feature columns the model was trained on, in order
    pub feature_names: Vec<String>,
    /// Base score added to all predictions
    pub bias: f64,
    /// Raw scores at or above this value classify as high risk
    pub decision_threshold: f64,
    /// Decision trees in the ensemble
    pub trees: Vec<Tree>,
    /// Free-form training provenance
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Summary of a loaded artifact, for logs and the health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactInfo {
    pub version: u32,
    pub feature_count: usize,
    pub tree_count: usize,
    pub sha256: String,
}

impl Artifact {
    /// Load and validate an artifact from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, InferenceError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse and validate an artifact from its JSON serialization.
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        let artifact: Artifact = serde_json::from_str(json)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// SHA-256 over the canonical JSON serialization, hex encoded.
    pub fn sha256(&self) -> String {
        let serialized = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&serialized);
        hex::encode(hasher.finalize())
    }

    /// Summary for logging and health reporting.
    pub fn info(&self) -> ArtifactInfo {
        ArtifactInfo {
            version: self.version,
            feature_count: self.feature_names.len(),
            tree_count: self.trees.len(),
            sha256: self.sha256(),
        }
    }

    /// Validate the artifact structure and its column contract.
    ///
    /// The column check is what protects every later prediction: once
    /// `feature_names` matches [`FEATURE_COLUMNS`], any row built from a
    /// validated record lines up with the trained feature order.
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.trees.is_empty() {
            return Err(InferenceError::InvalidArtifact(
                "artifact has no trees".into(),
            ));
        }

        if self.feature_names.len() != FEATURE_COLUMNS.len() {
            return Err(InferenceError::ColumnMismatch {
                expected: FEATURE_COLUMNS.len(),
                actual: self.feature_names.len(),
            });
        }
        for (index, (found, expected)) in self
            .feature_names
            .iter()
            .zip(FEATURE_COLUMNS.iter())
            .enumerate()
        {
            if found != expected {
                return Err(InferenceError::ColumnName {
                    index,
                    expected: (*expected).to_string(),
                    found: found.clone(),
                });
            }
        }

        for (tree_idx, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(InferenceError::InvalidArtifact(format!(
                    "tree {tree_idx} has no nodes"
                )));
            }

            for (node_idx, node) in tree.nodes.iter().enumerate() {
                if node.value.is_some() {
                    if node.left != 0 || node.right != 0 {
                        return Err(InferenceError::InvalidArtifact(format!(
                            "leaf node {node_idx} in tree {tree_idx} has non-zero children"
                        )));
                    }
                } else {
                    // Children must point strictly forward; a back-edge
                    // would make the evaluation walk loop forever.
                    if node.left as usize >= tree.nodes.len() || node.left as usize <= node_idx {
                        return Err(InferenceError::InvalidArtifact(format!(
                            "node {node_idx} in tree {tree_idx} has invalid left child {}",
                            node.left
                        )));
                    }
                    if node.right as usize >= tree.nodes.len() || node.right as usize <= node_idx {
                        return Err(InferenceError::InvalidArtifact(format!(
                            "node {node_idx} in tree {tree_idx} has invalid right child {}",
                            node.right
                        )));
                    }
                    if node.feature_index as usize >= self.feature_names.len() {
                        return Err(InferenceError::InvalidArtifact(format!(
                            "node {node_idx} in tree {tree_idx} has invalid feature index {}",
                            node.feature_index
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
