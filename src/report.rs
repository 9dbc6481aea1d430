//! Report assembly
//!
//! Combines per-step metrics, aggregate statistics and the average step into a
//! `GaitReport`. Human-facing statistics are rounded here (times to 2 decimals,
//! percentages and angle ranges to 1); per-step metrics and the average-step
//! curves keep full precision.

use std::fmt::Write as _;

use crate::types::{AverageStepProfile, GaitReport, GaitStatistics, StepMetrics};

/// Decimal places for durations (seconds)
const TIME_DECIMALS: i32 = 2;

/// Decimal places for percentages and angles
const ANGLE_DECIMALS: i32 = 1;

/// Builds the final report structure
pub struct ReportAggregator;

impl ReportAggregator {
    /// Assemble a report, rounding the display statistics
    pub fn assemble(
        steps: Vec<StepMetrics>,
        statistics: &GaitStatistics,
        average_step: AverageStepProfile,
    ) -> GaitReport {
        GaitReport {
            statistics: round_statistics(statistics),
            steps,
            average_step,
        }
    }
}

fn round_statistics(stats: &GaitStatistics) -> GaitStatistics {
    GaitStatistics {
        step_count: stats.step_count,
        step_time_average: round_to(stats.step_time_average, TIME_DECIMALS),
        step_time_std_dev: round_to(stats.step_time_std_dev, TIME_DECIMALS),
        foot_down_time_average: round_to(stats.foot_down_time_average, TIME_DECIMALS),
        foot_down_time_std_dev: round_to(stats.foot_down_time_std_dev, TIME_DECIMALS),
        percent_time_foot_down: round_to(stats.percent_time_foot_down, ANGLE_DECIMALS),
        average_pitch_range: stats.average_pitch_range.map(|v| round_to(v, ANGLE_DECIMALS)),
        average_roll_range: stats.average_roll_range.map(|v| round_to(v, ANGLE_DECIMALS)),
    }
}

/// Round half away from zero to `decimals` places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

impl GaitReport {
    /// Console summary of the statistics, one line per figure
    pub fn render_text(&self) -> String {
        let s = &self.statistics;
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = writeln!(out, "Number of Steps: {}", s.step_count);
        let _ = writeln!(
            out,
            "Step Time Average: {:.2} s  Step Time Std Dev: {:.2} s",
            s.step_time_average, s.step_time_std_dev
        );
        let _ = writeln!(
            out,
            "Foot Down Time Average: {:.2} s  Foot Down Std Dev: {:.2} s",
            s.foot_down_time_average, s.foot_down_time_std_dev
        );
        let _ = writeln!(out, "Percent Time Foot Down: {:.1} %", s.percent_time_foot_down);
        let _ = writeln!(
            out,
            "Average Pitch Range: {:.1}° to {:.1}°",
            s.average_pitch_range[0], s.average_pitch_range[1]
        );
        let _ = writeln!(
            out,
            "Average Roll Range: {:.1}° to {:.1}°",
            s.average_roll_range[0], s.average_roll_range[1]
        );
        out
    }
}
