//! Classifier artifact handling for the CHD risk service.
//!
//! The model is trained and serialized elsewhere; this crate only loads
//! the pre-fitted artifact, verifies its shape against the feature
//! schema, and delegates single-row predictions to it.
//!
//! Modules:
//! - `artifact`: on-disk artifact format and structural validation
//! - `classifier`: the `Classifier` trait and the GBDT implementation
//! - `errors`: inference error taxonomy

pub mod artifact;
pub mod classifier;
pub mod errors;

pub use artifact::{Artifact, ArtifactInfo, Node, Tree};
pub use classifier::{Classifier, GbdtClassifier};
pub use errors::InferenceError;
