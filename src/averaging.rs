//! Step averaging
//!
//! Folds every step onto a common fractional-time axis and averages pitch and
//! roll per bucket, then fits a cubic spline through the bucket means.
//!
//! Each step is bucketed by its own duration (bucket width =
//! `step_duration / (N - 1)`), so steps of different length line up by phase.
//! The output axis `t_k = k * mean_duration / (N - 1)` is built from the mean
//! step duration.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::metrics::mean;
use crate::spline::{linspace, CubicSpline};
use crate::types::{AverageStepProfile, SampleSeries, Step};

/// Running sums for one fractional-time bucket
#[derive(Debug, Clone, Copy, Default)]
struct BucketAccumulator {
    pitch_sum: f64,
    roll_sum: f64,
    count: usize,
}

impl BucketAccumulator {
    fn add(&mut self, pitch: f64, roll: f64) {
        self.pitch_sum += pitch;
        self.roll_sum += roll;
        self.count += 1;
    }

    fn mean(&self) -> Option<(f64, f64)> {
        if self.count == 0 {
            None
        } else {
            let n = self.count as f64;
            Some((self.pitch_sum / n, self.roll_sum / n))
        }
    }
}

/// Builds the average step profile
#[derive(Debug, Clone)]
pub struct StepAverager {
    bucket_count: usize,
    dense_grid_size: usize,
}

impl StepAverager {
    pub fn new(bucket_count: usize, dense_grid_size: usize) -> Self {
        Self {
            bucket_count,
            dense_grid_size,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.bucket_count, config.dense_grid_size)
    }

    /// Average all steps into one smoothed profile
    pub fn average(
        &self,
        steps: &[Step],
        series: &SampleSeries,
    ) -> Result<AverageStepProfile, AnalysisError> {
        let n = self.bucket_count;
        if steps.is_empty() {
            return Err(AnalysisError::InsufficientStepsForAveraging(
                "no steps to average".to_string(),
            ));
        }
        if n < 2 {
            return Err(AnalysisError::InvalidConfig(format!(
                "bucket_count must be >= 2, got {}",
                n
            )));
        }

        let time = series.time();
        let durations: Vec<f64> = steps
            .iter()
            .map(|s| time[s.end_index] - time[s.start_index])
            .collect();
        let mean_duration = mean(&durations);
        let last_bucket = n - 1;

        let mut buckets = vec![BucketAccumulator::default(); n];
        for (step, &duration) in steps.iter().zip(&durations) {
            if duration <= 0.0 {
                return Err(AnalysisError::InsufficientStepsForAveraging(format!(
                    "step starting at sample {} has zero duration",
                    step.start_index
                )));
            }

            let start_time = time[step.start_index];
            let bucket_width = duration / last_bucket as f64;

            for j in step.sample_range() {
                // The closing sample belongs in the last bucket even when
                // elapsed / width rounds to just below N - 1.
                let bucket = if j == step.end_index {
                    last_bucket
                } else {
                    let elapsed = time[j] - start_time;
                    ((elapsed / bucket_width) as usize).min(last_bucket)
                };
                buckets[bucket].add(series.pitch()[j], series.roll()[j]);
            }
        }

        let mut bucket_pitch = Vec::with_capacity(n);
        let mut bucket_roll = Vec::with_capacity(n);
        for (k, bucket) in buckets.iter().enumerate() {
            let (pitch, roll) = bucket.mean().ok_or_else(|| {
                AnalysisError::InsufficientStepsForAveraging(format!(
                    "bucket {} of {} received no samples from {} steps",
                    k,
                    n,
                    steps.len()
                ))
            })?;
            bucket_pitch.push(pitch);
            bucket_roll.push(roll);
        }

        let bucket_time: Vec<f64> = (0..n)
            .map(|k| k as f64 * mean_duration / last_bucket as f64)
            .collect();

        log::debug!(
            "Averaged {} steps into {} buckets (mean duration {:.3} s, {} samples)",
            steps.len(),
            n,
            mean_duration,
            buckets.iter().map(|b| b.count).sum::<usize>()
        );

        let pitch_spline = CubicSpline::not_a_knot(&bucket_time, &bucket_pitch)?;
        let roll_spline = CubicSpline::not_a_knot(&bucket_time, &bucket_roll)?;

        let grid = linspace(bucket_time[0], bucket_time[last_bucket], self.dense_grid_size);
        let pitch = pitch_spline.evaluate_all(&grid);
        let roll = roll_spline.evaluate_all(&grid);

        Ok(AverageStepProfile {
            bucket_time,
            bucket_pitch,
            bucket_roll,
            time: grid,
            pitch,
            roll,
        })
    }
}
