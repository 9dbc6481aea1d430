//! Step segmentation
//!
//! Scans the merged peak/trough sequence with a sliding window of three
//! consecutive extrema and accepts every peak -> trough -> peak window that
//! clears the amplitude and duration thresholds.
//!
//! The scan never skips past an accepted step, so the peak that closes one step
//! is free to open the next. Accepted steps are not deduplicated.

use crate::config::AnalysisConfig;
use crate::types::{ExtremumKind, ExtremumPoint, SampleSeries, Step};

/// Step segmenter
pub struct StepSegmenter;

impl StepSegmenter {
    /// Segment steps from extrema in ascending index order
    pub fn segment(
        points: &[ExtremumPoint],
        series: &SampleSeries,
        config: &AnalysisConfig,
    ) -> Vec<Step> {
        let steps: Vec<Step> = points
            .windows(3)
            .filter_map(|window| classify_window(window, series, config))
            .collect();

        log::debug!(
            "Segmented {} steps from {} extrema",
            steps.len(),
            points.len()
        );

        steps
    }
}

/// Accept or reject one window of three consecutive extrema
fn classify_window(
    window: &[ExtremumPoint],
    series: &SampleSeries,
    config: &AnalysisConfig,
) -> Option<Step> {
    let (p0, p1, p2) = (window[0], window[1], window[2]);

    let is_step_pattern = p0.kind == ExtremumKind::Peak
        && p1.kind == ExtremumKind::Trough
        && p2.kind == ExtremumKind::Peak;
    if !is_step_pattern {
        return None;
    }

    let pitch = series.pitch();
    if pitch[p0.index] < config.peak_pitch_min
        || pitch[p1.index] > config.trough_pitch_max
        || pitch[p2.index] < config.peak_pitch_min
    {
        return None;
    }

    let time = series.time();
    let duration = time[p2.index] - time[p0.index];
    if duration < config.step_duration_min || duration > config.step_duration_max {
        return None;
    }

    Some(Step {
        start_index: p0.index,
        mid_index: p1.index,
        end_index: p2.index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peaks::detect_extrema;
    use crate::types::test_support;
    use pretty_assertions::assert_eq;

    /// Three-extremum series: samples at `times`, pitch `[0, peak, trough, peak2, 0]`
    fn triple(times: [f64; 5], peak: f64, trough: f64, peak2: f64) -> (SampleSeries, Vec<ExtremumPoint>) {
        let series = SampleSeries::from_columns(
            times.to_vec(),
            vec![0.0, peak, trough, peak2, 0.0],
            vec![0.0; 5],
        )
        .unwrap();
        let points = vec![
            ExtremumPoint::peak(1),
            ExtremumPoint::trough(2),
            ExtremumPoint::peak(3),
        ];
        (series, points)
    }

    fn segment_triple(times: [f64; 5], peak: f64, trough: f64, peak2: f64) -> Vec<Step> {
        let (series, points) = triple(times, peak, trough, peak2);
        StepSegmenter::segment(&points, &series, &AnalysisConfig::default())
    }

    const HALF_SECOND: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];
    const TWO_SECONDS: [f64; 5] = [0.0, 1.0, 2.0, 3.0, 4.0];

    #[test]
    fn test_thresholds_are_inclusive() {
        let steps = segment_triple(HALF_SECOND, 5.0, -50.0, 5.0);
        assert_eq!(
            steps,
            vec![Step {
                start_index: 1,
                mid_index: 2,
                end_index: 3
            }]
        );

        // duration exactly 2.0 s
        assert_eq!(segment_triple(TWO_SECONDS, 5.0, -50.0, 5.0).len(), 1);
    }

    #[test]
    fn test_amplitude_rejections() {
        assert!(segment_triple(HALF_SECOND, 4.99, -60.0, 10.0).is_empty());
        assert!(segment_triple(HALF_SECOND, 10.0, -49.99, 10.0).is_empty());
        assert!(segment_triple(HALF_SECOND, 10.0, -60.0, 4.99).is_empty());
    }

    #[test]
    fn test_duration_rejections() {
        // 0.4 s
        assert!(segment_triple([0.0, 0.2, 0.4, 0.6, 0.8], 10.0, -60.0, 10.0).is_empty());
        // 2.5 s
        assert!(segment_triple([0.0, 1.0, 2.25, 3.5, 4.0], 10.0, -60.0, 10.0).is_empty());
    }

    #[test]
    fn test_pattern_must_start_on_peak() {
        let series = SampleSeries::from_columns(
            vec![0.0, 0.25, 0.5, 0.75, 1.0, 1.25],
            vec![0.0, -60.0, 10.0, -60.0, 10.0, 0.0],
            vec![0.0; 6],
        )
        .unwrap();
        // trough, peak, trough: never a step
        let points = vec![
            ExtremumPoint::trough(1),
            ExtremumPoint::peak(2),
            ExtremumPoint::trough(3),
        ];
        assert!(StepSegmenter::segment(&points, &series, &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn test_two_peaks_in_a_row_break_the_pattern() {
        let series = SampleSeries::from_columns(
            vec![0.0, 0.25, 0.5, 0.75, 1.0],
            vec![0.0, 10.0, 20.0, -60.0, 10.0],
            vec![0.0; 5],
        )
        .unwrap();
        let points = vec![
            ExtremumPoint::peak(1),
            ExtremumPoint::peak(2),
            ExtremumPoint::trough(3),
        ];
        assert!(StepSegmenter::segment(&points, &series, &AnalysisConfig::default()).is_empty());
    }

    #[test]
    fn test_fewer_than_three_points() {
        let (series, points) = triple(HALF_SECOND, 10.0, -60.0, 10.0);
        let config = AnalysisConfig::default();
        assert!(StepSegmenter::segment(&points[..2], &series, &config).is_empty());
        assert!(StepSegmenter::segment(&[], &series, &config).is_empty());
    }

    #[test]
    fn test_consecutive_steps_share_peaks() {
        let series = test_support::regular_walk(5);
        let points = detect_extrema(series.pitch(), 1.0).merged();
        let steps = StepSegmenter::segment(&points, &series, &AnalysisConfig::default());

        assert_eq!(steps.len(), 5);
        for pair in steps.windows(2) {
            assert_eq!(pair[0].end_index, pair[1].start_index);
        }
        for step in &steps {
            assert!(step.start_index < step.mid_index && step.mid_index < step.end_index);
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let config = AnalysisConfig {
            peak_pitch_min: 12.0,
            ..AnalysisConfig::default()
        };
        let series = test_support::regular_walk(3);
        let points = detect_extrema(series.pitch(), 1.0).merged();
        // every peak is 10 deg, below the raised threshold
        assert!(StepSegmenter::segment(&points, &series, &config).is_empty());
    }
}
