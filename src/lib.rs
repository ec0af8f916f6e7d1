// Timbre Features Core - per-frame spectral/harmonic feature extraction
// Configurable feature catalog over a reusable-buffer FFT pipeline

// Module declarations
pub mod analysis;
pub mod config;
pub mod error;

// Re-exports for convenience
pub use analysis::{
    FeatureFrame, FeaturePipeline, FrequencyMap, HarmonicRoutine, PitchRoutine, SpectralRoutine,
    HARMONIC_CATALOG, SPECTRAL_CATALOG,
};
pub use config::{FeatureParams, HarmonicConfig, PipelineConfig};
pub use error::{ErrorCode, PipelineError};
