// Analysis module - per-frame spectral/harmonic feature extraction
//
// Architecture:
// - catalog: feature-name tokens -> extractor routines (spectral, harmonic)
// - frequency_map: frequency axis and spectrum projection
// - features: FeaturePipeline (frame driver, spectral and harmonic stages,
//   replication) plus the FFT and feature math it calls
// - parallel: chunked extraction over replicated pipelines
//
// Data flow: signal → frame driver → spectral stage → (harmonic stage) →
// feature frames

pub mod catalog;
pub mod features;
pub mod frequency_map;
pub mod parallel;


pub use catalog::{
    FeatureEntry, HarmonicFeature, HarmonicRoutine, SpectralFeature, SpectralRoutine,
    HARMONIC_CATALOG, SPECTRAL_CATALOG,
};
pub use features::{select_fft_size, FeatureFrame, FeaturePipeline, PitchEstimator, PitchRoutine};
pub use frequency_map::FrequencyMap;
