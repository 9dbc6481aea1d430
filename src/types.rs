//! Core types for the Gait Flux pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: orientation samples, detected extrema, segmented steps, per-step
//! metrics, aggregate statistics, the averaged step profile and the final report.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::AnalysisError;

/// One orientation reading from the foot-mounted sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the start of the recording
    pub time: f64,
    /// Forward/backward tilt (degrees)
    pub pitch: f64,
    /// Inward/outward tilt (degrees)
    pub roll: f64,
}

impl Sample {
    pub fn new(time: f64, pitch: f64, roll: f64) -> Self {
        Self { time, pitch, roll }
    }
}

/// Which foot produced a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FootSide {
    Left,
    Right,
}

impl FootSide {
    /// Infer the foot from a recording name.
    ///
    /// Recorders name their files `left-...` or `right-...`; anything that does
    /// not start with `left` is treated as the right foot.
    pub fn from_record_name(name: &str) -> Self {
        if name.starts_with("left") {
            FootSide::Left
        } else {
            FootSide::Right
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FootSide::Left => "left",
            FootSide::Right => "right",
        }
    }

    /// Multiplier applied to roll so outward roll has the same sign on both feet
    pub fn roll_sign(&self) -> f64 {
        match self {
            FootSide::Left => 1.0,
            FootSide::Right => -1.0,
        }
    }
}

/// Validated, time-ordered sample columns.
///
/// Construction rejects mismatched column lengths, non-finite values and
/// decreasing timestamps, so every later stage can index freely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSeries {
    time: Vec<f64>,
    pitch: Vec<f64>,
    roll: Vec<f64>,
}

impl SampleSeries {
    /// Build a series from parallel columns
    pub fn from_columns(
        time: Vec<f64>,
        pitch: Vec<f64>,
        roll: Vec<f64>,
    ) -> Result<Self, AnalysisError> {
        if time.len() != pitch.len() || time.len() != roll.len() {
            return Err(AnalysisError::MalformedInput(format!(
                "column lengths differ: time={}, pitch={}, roll={}",
                time.len(),
                pitch.len(),
                roll.len()
            )));
        }

        for (name, column) in [("time", &time), ("pitch", &pitch), ("roll", &roll)] {
            if let Some(idx) = column.iter().position(|v| !v.is_finite()) {
                return Err(AnalysisError::MalformedInput(format!(
                    "non-finite {} value at index {}",
                    name, idx
                )));
            }
        }

        if let Some(idx) = time.windows(2).position(|w| w[1] < w[0]) {
            return Err(AnalysisError::MalformedInput(format!(
                "time decreases at index {} ({} -> {})",
                idx + 1,
                time[idx],
                time[idx + 1]
            )));
        }

        Ok(Self { time, pitch, roll })
    }

    /// Build a series from individual samples
    pub fn from_samples(samples: &[Sample]) -> Result<Self, AnalysisError> {
        Self::from_columns(
            samples.iter().map(|s| s.time).collect(),
            samples.iter().map(|s| s.pitch).collect(),
            samples.iter().map(|s| s.roll).collect(),
        )
    }

    /// Apply the foot-side roll convention (right foot roll is negated)
    pub fn normalize_roll(mut self, side: FootSide) -> Self {
        let sign = side.roll_sign();
        if sign != 1.0 {
            for value in &mut self.roll {
                *value *= sign;
            }
        }
        self
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn pitch(&self) -> &[f64] {
        &self.pitch
    }

    pub fn roll(&self) -> &[f64] {
        &self.roll
    }

    pub fn sample(&self, index: usize) -> Option<Sample> {
        if index < self.len() {
            Some(Sample::new(self.time[index], self.pitch[index], self.roll[index]))
        } else {
            None
        }
    }
}

/// Kind of pitch extremum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremumKind {
    Peak,
    Trough,
}

/// A detected peak or trough, addressed by sample index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtremumPoint {
    pub index: usize,
    pub kind: ExtremumKind,
}

impl ExtremumPoint {
    pub fn peak(index: usize) -> Self {
        Self {
            index,
            kind: ExtremumKind::Peak,
        }
    }

    pub fn trough(index: usize) -> Self {
        Self {
            index,
            kind: ExtremumKind::Trough,
        }
    }
}

/// One gait cycle: peak -> trough -> peak in the pitch signal.
///
/// Invariant: `start_index < mid_index < end_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub start_index: usize,
    pub mid_index: usize,
    pub end_index: usize,
}

impl Step {
    /// Samples owned by this step, end inclusive
    pub fn sample_range(&self) -> RangeInclusive<usize> {
        self.start_index..=self.end_index
    }
}

/// Per-step measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepMetrics {
    pub step: Step,
    /// time[end] - time[start] (seconds)
    pub total_duration: f64,
    /// time[mid] - time[start] (seconds)
    pub foot_down_duration: f64,
    /// Pitch at the opening peak (degrees)
    pub pitch_peak: f64,
    /// Pitch at the trough (degrees)
    pub pitch_trough: f64,
    /// Max roll over [start, end) (degrees)
    pub roll_max: f64,
    /// Min roll over [start, end) (degrees)
    pub roll_min: f64,
}

/// Aggregate statistics across all detected steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaitStatistics {
    pub step_count: usize,
    /// Mean step duration (seconds)
    pub step_time_average: f64,
    /// Population standard deviation of step duration (seconds)
    pub step_time_std_dev: f64,
    /// Mean foot-down duration (seconds)
    pub foot_down_time_average: f64,
    /// Population standard deviation of foot-down duration (seconds)
    pub foot_down_time_std_dev: f64,
    /// Mean foot-down time as a share of mean step time (0-100)
    pub percent_time_foot_down: f64,
    /// [mean peak pitch, mean trough pitch] (degrees)
    pub average_pitch_range: [f64; 2],
    /// [mean max roll, mean min roll] (degrees)
    pub average_roll_range: [f64; 2],
}

/// Normalized average step, bucketed and spline-smoothed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageStepProfile {
    /// Bucket positions t_k = k * mean_duration / (N - 1)
    pub bucket_time: Vec<f64>,
    /// Mean pitch per bucket
    pub bucket_pitch: Vec<f64>,
    /// Mean roll per bucket
    pub bucket_roll: Vec<f64>,
    /// Dense evaluation grid spanning [t_0, t_{N-1}]
    pub time: Vec<f64>,
    /// Smoothed pitch on the dense grid
    pub pitch: Vec<f64>,
    /// Smoothed roll on the dense grid
    pub roll: Vec<f64>,
}

impl AverageStepProfile {
    pub fn bucket_count(&self) -> usize {
        self.bucket_time.len()
    }
}

/// Complete result of one analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GaitReport {
    /// Summary statistics, rounded for display
    pub statistics: GaitStatistics,
    /// Per-step metrics at full precision, in ascending start order
    pub steps: Vec<StepMetrics>,
    /// Average step curve at full precision
    pub average_step: AverageStepProfile,
}
