//! Analysis configuration
//!
//! Every numeric threshold used by the pipeline lives here and is passed in at
//! call time. Two deployment presets exist: the on-demand service averages into
//! 20 buckets, the offline batch run into 30.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Bucket count used by the on-demand service
pub const SERVER_BUCKET_COUNT: usize = 20;

/// Bucket count used by offline batch analysis
pub const BATCH_BUCKET_COUNT: usize = 30;

/// Fewest buckets the cubic interpolant can be fitted through
pub const MIN_BUCKET_COUNT: usize = 4;

/// Gait analysis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum topographic prominence for peaks and troughs (default: 1.0 degree)
    pub prominence_threshold: f64,

    /// Peaks below this pitch cannot open or close a step (default: 5.0 degrees)
    pub peak_pitch_min: f64,

    /// Troughs above this pitch cannot be a step's mid point (default: -50.0 degrees)
    pub trough_pitch_max: f64,

    /// Shortest accepted step (default: 0.5 s)
    pub step_duration_min: f64,

    /// Longest accepted step (default: 2.0 s)
    pub step_duration_max: f64,

    /// Fractional-time buckets for the average step (default: 20)
    pub bucket_count: usize,

    /// Points on the dense grid the smoothed curve is evaluated at (default: 500)
    pub dense_grid_size: usize,

    /// Gaussian sigma in samples for the diagnostic smoothed trace (default: 2.0)
    pub smoothing_sigma: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            prominence_threshold: 1.0,
            peak_pitch_min: 5.0,
            trough_pitch_max: -50.0,
            step_duration_min: 0.5,
            step_duration_max: 2.0,
            bucket_count: SERVER_BUCKET_COUNT,
            dense_grid_size: 500,
            smoothing_sigma: 2.0,
        }
    }
}

impl AnalysisConfig {
    /// Preset for on-demand analysis of stored recordings
    pub fn server() -> Self {
        Self::default()
    }

    /// Preset for offline analysis of a recorded file
    pub fn batch() -> Self {
        Self {
            bucket_count: BATCH_BUCKET_COUNT,
            ..Self::default()
        }
    }

    /// Override the bucket count
    pub fn with_bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    /// Parse a (possibly partial) JSON document over the defaults
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let config: AnalysisConfig = serde_json::from_str(json)
            .map_err(|e| AnalysisError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check that every parameter is usable
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let finite = [
            ("prominence_threshold", self.prominence_threshold),
            ("peak_pitch_min", self.peak_pitch_min),
            ("trough_pitch_max", self.trough_pitch_max),
            ("step_duration_min", self.step_duration_min),
            ("step_duration_max", self.step_duration_max),
            ("smoothing_sigma", self.smoothing_sigma),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(AnalysisError::InvalidConfig(format!("{} must be finite", name)));
        }

        if self.prominence_threshold < 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "prominence_threshold must be >= 0, got {}",
                self.prominence_threshold
            )));
        }

        if self.step_duration_min <= 0.0 || self.step_duration_max < self.step_duration_min {
            return Err(AnalysisError::InvalidConfig(format!(
                "step duration range [{}, {}] must be positive and ordered",
                self.step_duration_min, self.step_duration_max
            )));
        }

        if self.bucket_count < MIN_BUCKET_COUNT {
            return Err(AnalysisError::InvalidConfig(format!(
                "bucket_count must be >= {}, got {}",
                MIN_BUCKET_COUNT, self.bucket_count
            )));
        }

        if self.dense_grid_size < 2 {
            return Err(AnalysisError::InvalidConfig(format!(
                "dense_grid_size must be >= 2, got {}",
                self.dense_grid_size
            )));
        }

        if self.smoothing_sigma <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "smoothing_sigma must be > 0, got {}",
                self.smoothing_sigma
            )));
        }

        Ok(())
    }
}
