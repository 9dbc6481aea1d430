//! Step metrics
//!
//! Per-step durations and pitch/roll extrema, and the aggregate statistics
//! across all steps of a recording.

use crate::error::AnalysisError;
use crate::types::{GaitStatistics, SampleSeries, Step, StepMetrics};

/// Calculator for per-step and aggregate gait metrics
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Compute metrics for one step.
    ///
    /// Pitch comes from the individual samples at `start` and `mid`; roll
    /// extrema span `[start, end)`, excluding the closing peak sample.
    pub fn compute(step: &Step, series: &SampleSeries) -> StepMetrics {
        let time = series.time();
        let pitch = series.pitch();
        let roll_window = &series.roll()[step.start_index..step.end_index];

        let roll_max = roll_window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let roll_min = roll_window.iter().copied().fold(f64::INFINITY, f64::min);

        StepMetrics {
            step: *step,
            total_duration: time[step.end_index] - time[step.start_index],
            foot_down_duration: time[step.mid_index] - time[step.start_index],
            pitch_peak: pitch[step.start_index],
            pitch_trough: pitch[step.mid_index],
            roll_max,
            roll_min,
        }
    }

    /// Compute metrics for every step, preserving order
    pub fn compute_all(steps: &[Step], series: &SampleSeries) -> Vec<StepMetrics> {
        steps.iter().map(|step| Self::compute(step, series)).collect()
    }

    /// Aggregate statistics across steps.
    ///
    /// Standard deviations are population (divide by n). An empty step list
    /// has no meaningful statistics and is reported as `NoStepsDetected`.
    pub fn aggregate(metrics: &[StepMetrics]) -> Result<GaitStatistics, AnalysisError> {
        if metrics.is_empty() {
            return Err(AnalysisError::NoStepsDetected(
                "no peak-trough-peak pattern passed the step thresholds".to_string(),
            ));
        }

        let total: Vec<f64> = metrics.iter().map(|m| m.total_duration).collect();
        let foot_down: Vec<f64> = metrics.iter().map(|m| m.foot_down_duration).collect();

        let step_time_average = mean(&total);
        let foot_down_time_average = mean(&foot_down);

        let percent_time_foot_down = if step_time_average > 0.0 {
            foot_down_time_average / step_time_average * 100.0
        } else {
            0.0
        };

        Ok(GaitStatistics {
            step_count: metrics.len(),
            step_time_average,
            step_time_std_dev: population_std_dev(&total),
            foot_down_time_average,
            foot_down_time_std_dev: population_std_dev(&foot_down),
            percent_time_foot_down,
            average_pitch_range: [
                mean_of(metrics, |m| m.pitch_peak),
                mean_of(metrics, |m| m.pitch_trough),
            ],
            average_roll_range: [
                mean_of(metrics, |m| m.roll_max),
                mean_of(metrics, |m| m.roll_min),
            ],
        })
    }
}

/// Arithmetic mean; callers guarantee a non-empty slice
pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn mean_of(metrics: &[StepMetrics], field: impl Fn(&StepMetrics) -> f64) -> f64 {
    metrics.iter().map(field).sum::<f64>() / metrics.len() as f64
}

fn population_std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support;

    fn step(start: usize, mid: usize, end: usize) -> Step {
        Step {
            start_index: start,
            mid_index: mid,
            end_index: end,
        }
    }

    #[test]
    fn test_single_step_metrics() {
        let series = SampleSeries::from_columns(
            vec![0.0, 0.25, 0.5, 0.75, 1.0],
            vec![0.0, 12.0, -70.0, 9.0, 0.0],
            vec![1.0, 3.0, -4.0, 20.0, 0.0],
        )
        .unwrap();

        let metrics = MetricsCalculator::compute(&step(1, 2, 3), &series);
        assert!((metrics.total_duration - 0.5).abs() < 1e-12);
        assert!((metrics.foot_down_duration - 0.25).abs() < 1e-12);
        assert_eq!(metrics.pitch_peak, 12.0);
        assert_eq!(metrics.pitch_trough, -70.0);
        // roll window is [1, 3): the 20.0 at the closing peak is excluded
        assert_eq!(metrics.roll_max, 3.0);
        assert_eq!(metrics.roll_min, -4.0);
    }

    #[test]
    fn test_empty_aggregate_is_no_steps() {
        let result = MetricsCalculator::aggregate(&[]);
        assert!(matches!(result, Err(AnalysisError::NoStepsDetected(_))));
    }

    #[test]
    fn test_population_std_dev() {
        // population std of [1, 2, 3, 4] = sqrt(1.25)
        let std = population_std_dev(&[1.0, 2.0, 3.0, 4.0]);
        assert!((std - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_aggregate_regular_walk() {
        let series = test_support::regular_walk(5);
        let steps: Vec<Step> = (0..5)
            .map(|i| {
                let start = test_support::LEAD_SAMPLES + i * 100;
                step(start, start + 60, start + 100)
            })
            .collect();

        let metrics = MetricsCalculator::compute_all(&steps, &series);
        let stats = MetricsCalculator::aggregate(&metrics).unwrap();

        assert_eq!(stats.step_count, 5);
        assert!((stats.step_time_average - 1.0).abs() < 1e-9);
        assert!(stats.step_time_std_dev < 1e-9);
        assert!((stats.foot_down_time_average - 0.6).abs() < 1e-9);
        assert!((stats.percent_time_foot_down - 60.0).abs() < 1e-6);
        assert_eq!(stats.average_pitch_range, [10.0, -60.0]);
        assert!(stats.average_roll_range[0] > 7.5);
        assert!(stats.average_roll_range[1] < -7.5);
    }

    #[test]
    fn test_percent_foot_down_in_range() {
        let series = SampleSeries::from_columns(
            vec![0.0, 0.3, 0.9, 1.2, 1.5, 2.4, 2.5],
            vec![0.0, 10.0, -60.0, 10.0, -60.0, 10.0, 0.0],
            vec![0.0; 7],
        )
        .unwrap();
        let metrics = MetricsCalculator::compute_all(&[step(1, 2, 3), step(3, 4, 5)], &series);
        let stats = MetricsCalculator::aggregate(&metrics).unwrap();
        assert!(stats.percent_time_foot_down >= 0.0 && stats.percent_time_foot_down <= 100.0);
        // durations 0.9 and 1.2, foot-down 0.6 and 0.3
        assert!((stats.step_time_average - 1.05).abs() < 1e-9);
        assert!((stats.step_time_std_dev - 0.15).abs() < 1e-9);
        assert!((stats.foot_down_time_std_dev - 0.15).abs() < 1e-9);
    }
}
