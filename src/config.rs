//! Configuration for the feature extraction pipeline
//!
//! This module provides the typed pipeline configuration and its JSON
//! loader. Feature parameters that specialise individual routines
//! (flatness floor, rolloff fraction, noiseness reference) are resolved
//! once, before any routine is bound, and never consulted again.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::PipelineError;

/// Default magnitude floor applied before computing spectral flatness
pub const DEFAULT_MIN_LEVEL: f32 = 1e-10;

/// Default reference frequency for spectral noiseness in Hz
pub const DEFAULT_NOISE_FREQUENCY: f32 = 2000.0;

/// Default spectral rolloff energy fraction (85% of spectral energy)
pub const DEFAULT_ROLLOFF_PERCENT: f32 = 0.85;

/// Default maximum number of harmonic peaks tracked per frame
pub const DEFAULT_MAX_PEAKS: usize = 10;

/// Default lower bound of the pitch search band in Hz
pub const DEFAULT_PITCH_LOW_HZ: f32 = 80.0;

/// Default upper bound of the pitch search band in Hz
pub const DEFAULT_PITCH_HIGH_HZ: f32 = 400.0;

/// Complete pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Sampling rate of the input signal in Hz
    pub sample_rate: u32,
    /// Delimited feature specification (`, + - ; :`), or `all` / `full`
    pub features: String,
    /// Frame duration in seconds
    pub frame_duration: f64,
    /// Hop duration in seconds
    pub hop_duration: f64,
    /// Requested FFT size; raised to the next power of two >= frame size
    /// when smaller than the frame
    pub fft_size: Option<usize>,
    /// Explicit center frequencies to project the spectrum onto
    pub center_frequencies: Option<Vec<f32>>,
    /// Parameters bound into parameterised feature routines
    pub params: FeatureParams,
    /// Optional harmonic stage configuration
    pub harmonic: Option<HarmonicConfig>,
    /// Reject unknown feature tokens at construction instead of on first use
    pub strict: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            features: "all".to_string(),
            frame_duration: 0.025,
            hop_duration: 0.010,
            fft_size: None,
            center_frequencies: None,
            params: FeatureParams::default(),
            harmonic: None,
            strict: false,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration for a sample rate and feature specification,
    /// leaving every other option at its default
    pub fn new(sample_rate: u32, features: &str) -> Self {
        Self {
            sample_rate,
            features: features.to_string(),
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// * `Ok(PipelineConfig)` - Loaded configuration
    /// * `Err(PipelineError::ConfigLoad)` - File unreadable or JSON invalid
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path_display = path.as_ref().display().to_string();
        let contents = fs::read_to_string(&path).map_err(|err| PipelineError::ConfigLoad {
            path: path_display.clone(),
            reason: err.to_string(),
        })?;

        let config: Self =
            serde_json::from_str(&contents).map_err(|err| PipelineError::ConfigLoad {
                path: path_display.clone(),
                reason: err.to_string(),
            })?;

        tracing::info!("[Config] Loaded configuration from {}", path_display);
        Ok(config)
    }
}

/// Parameters bound into parameterised feature routines at resolution time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureParams {
    /// Magnitude floor for spectral flatness
    pub min_level: f32,
    /// Reference frequency in Hz for spectral noiseness
    pub noise_frequency: f32,
    /// Energy fraction for spectral rolloff (values above 1 read as percent)
    pub rolloff_percent: f32,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            min_level: DEFAULT_MIN_LEVEL,
            noise_frequency: DEFAULT_NOISE_FREQUENCY,
            rolloff_percent: DEFAULT_ROLLOFF_PERCENT,
        }
    }
}

impl FeatureParams {
    /// Build parameters from a loose name -> value map
    ///
    /// Recognised keys are `minLevel`, `noiseFrequency` and
    /// `rolloffPercent`. Missing keys keep their defaults; unknown keys are
    /// logged and ignored.
    pub fn from_map(map: &HashMap<String, f32>) -> Self {
        let mut params = Self::default();
        for (key, &value) in map {
            match key.as_str() {
                "minLevel" => params.min_level = value,
                "noiseFrequency" => params.noise_frequency = value,
                "rolloffPercent" => params.rolloff_percent = value,
                other => {
                    tracing::warn!("[Config] Ignoring unknown feature parameter '{}'", other)
                }
            }
        }
        params
    }

    /// Rolloff fraction in (0, 1]
    pub fn rolloff_fraction(&self) -> f32 {
        let fraction = if self.rolloff_percent > 1.0 {
            self.rolloff_percent / 100.0
        } else {
            self.rolloff_percent
        };
        fraction.clamp(0.0, 1.0)
    }
}

/// Harmonic stage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarmonicConfig {
    /// Delimited harmonic feature specification, or `all` / `full`
    pub features: String,
    /// Maximum number of harmonic peaks located per frame
    pub max_peaks: usize,
    /// Lower bound of the default pitch search band in Hz
    pub low_hz: f32,
    /// Upper bound of the default pitch search band in Hz
    pub high_hz: f32,
}

impl Default for HarmonicConfig {
    fn default() -> Self {
        Self {
            features: "all".to_string(),
            max_peaks: DEFAULT_MAX_PEAKS,
            low_hz: DEFAULT_PITCH_LOW_HZ,
            high_hz: DEFAULT_PITCH_HIGH_HZ,
        }
    }
}

impl HarmonicConfig {
    /// Harmonic configuration for a feature specification with default
    /// peak count and pitch band
    pub fn new(features: &str) -> Self {
        Self {
            features: features.to_string(),
            ..Self::default()
        }
    }
}
