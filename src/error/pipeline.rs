// Pipeline error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Pipeline error code constants
///
/// Error code range: 2001-2008
pub struct PipelineErrorCodes {}

impl PipelineErrorCodes {
    /// A feature token did not resolve to any known routine
    pub const UNKNOWN_FEATURE: i32 = 2001;

    /// Requested sample range is empty or exceeds the signal
    pub const INVALID_RANGE: i32 = 2002;

    /// Feature specification contained no tokens
    pub const EMPTY_SPECIFICATION: i32 = 2003;

    /// Sample rate, frame or hop duration is unusable
    pub const INVALID_TIMING: i32 = 2004;

    /// Explicit center frequency cannot be mapped onto the spectrum
    pub const INVALID_FREQUENCY: i32 = 2005;

    /// Harmonic stage parameters are inconsistent
    pub const INVALID_HARMONIC_CONFIG: i32 = 2006;

    /// Configuration file could not be read or parsed
    pub const CONFIG_LOAD: i32 = 2007;

    /// Worker pool for parallel extraction could not be created
    pub const WORKER_POOL: i32 = 2008;
}

/// Log a pipeline error with structured context
///
/// This function logs pipeline errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
pub fn log_pipeline_error(err: &PipelineError, context: &str) {
    error!(
        "Pipeline error in {}: code={}, component=FeaturePipeline, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Feature pipeline errors
///
/// These errors cover configuration, feature resolution and frame
/// processing. Every error aborts the current call; no partial results
/// are returned alongside an error.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Feature token does not name any spectral or harmonic routine
    UnknownFeature { token: String },

    /// Start position is not strictly before the end position, or the end
    /// position lies past the signal
    InvalidRange { start: usize, end: usize },

    /// Feature specification string produced no tokens
    EmptySpecification { stage: String },

    /// Sample rate, frame size or hop size is zero or not finite
    InvalidTiming { reason: String },

    /// Explicit center frequency is unusable
    InvalidFrequency { frequency: f32, reason: String },

    /// Harmonic stage parameters are inconsistent
    InvalidHarmonicConfig { reason: String },

    /// Configuration file could not be loaded
    ConfigLoad { path: String, reason: String },

    /// Thread pool for parallel extraction could not be built
    WorkerPool { reason: String },
}

impl ErrorCode for PipelineError {
    fn code(&self) -> i32 {
        match self {
            PipelineError::UnknownFeature { .. } => PipelineErrorCodes::UNKNOWN_FEATURE,
            PipelineError::InvalidRange { .. } => PipelineErrorCodes::INVALID_RANGE,
            PipelineError::EmptySpecification { .. } => PipelineErrorCodes::EMPTY_SPECIFICATION,
            PipelineError::InvalidTiming { .. } => PipelineErrorCodes::INVALID_TIMING,
            PipelineError::InvalidFrequency { .. } => PipelineErrorCodes::INVALID_FREQUENCY,
            PipelineError::InvalidHarmonicConfig { .. } => {
                PipelineErrorCodes::INVALID_HARMONIC_CONFIG
            }
            PipelineError::ConfigLoad { .. } => PipelineErrorCodes::CONFIG_LOAD,
            PipelineError::WorkerPool { .. } => PipelineErrorCodes::WORKER_POOL,
        }
    }

    fn message(&self) -> String {
        match self {
            PipelineError::UnknownFeature { token } => {
                format!("Unknown feature '{}'", token)
            }
            PipelineError::InvalidRange { start, end } => {
                format!(
                    "Invalid sample range: start {} must be less than end {} and end must lie within the signal",
                    start, end
                )
            }
            PipelineError::EmptySpecification { stage } => {
                format!("No {} features were specified", stage)
            }
            PipelineError::InvalidTiming { reason } => {
                format!("Invalid timing parameters: {}", reason)
            }
            PipelineError::InvalidFrequency { frequency, reason } => {
                format!("Invalid center frequency {} Hz: {}", frequency, reason)
            }
            PipelineError::InvalidHarmonicConfig { reason } => {
                format!("Invalid harmonic configuration: {}", reason)
            }
            PipelineError::ConfigLoad { path, reason } => {
                format!("Failed to load configuration from {}: {}", path, reason)
            }
            PipelineError::WorkerPool { reason } => {
                format!("Failed to create worker pool: {}", reason)
            }
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PipelineError::{} (code {}): {}",
            self.variant_name(),
            self.code(),
            self.message()
        )
    }
}

impl PipelineError {
    fn variant_name(&self) -> &'static str {
        match self {
            PipelineError::UnknownFeature { .. } => "UnknownFeature",
            PipelineError::InvalidRange { .. } => "InvalidRange",
            PipelineError::EmptySpecification { .. } => "EmptySpecification",
            PipelineError::InvalidTiming { .. } => "InvalidTiming",
            PipelineError::InvalidFrequency { .. } => "InvalidFrequency",
            PipelineError::InvalidHarmonicConfig { .. } => "InvalidHarmonicConfig",
            PipelineError::ConfigLoad { .. } => "ConfigLoad",
            PipelineError::WorkerPool { .. } => "WorkerPool",
        }
    }
}

impl std::error::Error for PipelineError {}
