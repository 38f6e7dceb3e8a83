//! The inference boundary: a trait the server holds as an injected
//! handle, plus the production GBDT implementation.

use std::path::Path;

use tracing::info;

use framingham_types::{ModelInputRow, RiskLabel};

use crate::artifact::{Artifact, ArtifactInfo, Tree};
use crate::errors::InferenceError;

/// Decision function over a single validated feature row.
///
/// Implemented by the production artifact wrapper and by test stubs;
/// the server never constructs a classifier itself, it receives one at
/// startup.
pub trait Classifier: Send + Sync {
    /// Produce exactly one binary label for the row.
    fn predict(&self, row: &ModelInputRow) -> Result<RiskLabel, InferenceError>;

    /// Summary of the loaded model, for health reporting.
    fn info(&self) -> ArtifactInfo;
}

/// Gradient-boosted-tree classifier backed by a validated [`Artifact`].
///
/// Read-only after construction; safe to share across request tasks
/// behind an `Arc`.
#[derive(Debug, Clone)]
pub struct GbdtClassifier {
    artifact: Artifact,
}

impl GbdtClassifier {
    /// Wrap an already-validated artifact.
    pub fn new(artifact: Artifact) -> Result<Self, InferenceError> {
        artifact.validate()?;
        Ok(Self { artifact })
    }

    /// Load the artifact from disk, once, at service startup.
    pub fn from_path(path: &Path) -> Result<Self, InferenceError> {
        let artifact = Artifact::from_path(path)?;
        let info = artifact.info();
        info!(
            version = info.version,
            trees = info.tree_count,
            sha256 = %info.sha256,
            "classifier artifact loaded"
        );
        Ok(Self { artifact })
    }

    /// Raw ensemble score: bias plus the sum of per-tree leaf values.
    fn score(&self, features: &[f64]) -> f64 {
        let mut sum = self.artifact.bias;
        for tree in &self.artifact.trees {
            sum += eval_tree(tree, features);
        }
        sum
    }
}

impl Classifier for GbdtClassifier {
    fn predict(&self, row: &ModelInputRow) -> Result<RiskLabel, InferenceError> {
        let features = row.as_vector();
        // Validation pins the artifact to the schema at load time; this
        // is the per-request shape check the API must never skip.
        if features.len() != self.artifact.feature_names.len() {
            return Err(InferenceError::RowWidth {
                expected: self.artifact.feature_names.len(),
                actual: features.len(),
            });
        }

        let score = self.score(&features);
        if score >= self.artifact.decision_threshold {
            Ok(RiskLabel::High)
        } else {
            Ok(RiskLabel::Low)
        }
    }

    fn info(&self) -> ArtifactInfo {
        self.artifact.info()
    }
}

/// Walk a single tree from the root to a leaf.
fn eval_tree(tree: &Tree, features: &[f64]) -> f64 {
    let mut idx = 0usize;

    loop {
        if idx >= tree.nodes.len() {
            // Unreachable for validated artifacts
            return 0.0;
        }

        let node = &tree.nodes[idx];

        if let Some(value) = node.value {
            return value;
        }

        let feature_idx = node.feature_index as usize;
        if feature_idx >= features.len() {
            return 0.0;
        }

        idx = if features[feature_idx] <= node.threshold {
            node.left as usize
        } else {
            node.right as usize
        };
    }
}
