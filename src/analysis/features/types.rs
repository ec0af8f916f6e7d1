// Types module - Data structures produced by the feature pipeline

use serde::{Deserialize, Serialize};

/// Feature vector for one frame
///
/// `values` holds the spectral features first, in declaration order,
/// followed by the harmonic features. Its layout matches the pipeline's
/// description list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFrame {
    /// Frame start position in seconds (start sample / sample rate)
    pub time: f64,

    /// Feature values, one per description
    pub values: Vec<f32>,
}

impl FeatureFrame {
    /// Number of features in the frame
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the frame carries no features
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
