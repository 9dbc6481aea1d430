//! Pipeline orchestration
//!
//! This module provides the public API for Gait Flux.
//! It runs the full analysis from a validated sample series to a `GaitReport`.

use crate::averaging::StepAverager;
use crate::config::AnalysisConfig;
use crate::encoder::ReportEncoder;
use crate::error::AnalysisError;
use crate::metrics::MetricsCalculator;
use crate::peaks::detect_extrema;
use crate::report::ReportAggregator;
use crate::segmentation::StepSegmenter;
use crate::source::Recording;
use crate::types::{FootSide, GaitReport, SampleSeries, Step};

/// Fewest samples that can contain an interior extremum
const MIN_SAMPLES: usize = 3;

/// Detect steps in a series without computing any statistics.
///
/// Returns an empty list when the signal has no qualifying peak-trough-peak
/// pattern.
pub fn detect_steps(series: &SampleSeries, config: &AnalysisConfig) -> Vec<Step> {
    let extrema = detect_extrema(series.pitch(), config.prominence_threshold);
    StepSegmenter::segment(&extrema.merged(), series, config)
}

/// Analyze a series whose roll has already been normalized for foot side.
///
/// Pipeline stages:
/// 1. Peak/trough detection on the raw pitch signal
/// 2. Step segmentation (peak -> trough -> peak)
/// 3. Per-step metrics and aggregate statistics
/// 4. Step averaging and spline smoothing
/// 5. Report assembly
///
/// # Example
/// ```ignore
/// let series = SampleSeries::from_samples(&samples)?.normalize_roll(FootSide::Left);
/// let report = analyze(&series, &AnalysisConfig::server())?;
/// println!("{}", report.render_text());
/// ```
pub fn analyze(series: &SampleSeries, config: &AnalysisConfig) -> Result<GaitReport, AnalysisError> {
    config.validate()?;

    if series.len() < MIN_SAMPLES {
        return Err(AnalysisError::InsufficientSamples(format!(
            "need at least {} samples, got {}",
            MIN_SAMPLES,
            series.len()
        )));
    }

    // Stage 1: Find extrema
    let extrema = detect_extrema(series.pitch(), config.prominence_threshold);
    if extrema.is_empty() {
        return Err(AnalysisError::NoStepsDetected(format!(
            "no peaks or troughs with prominence >= {} in {} samples",
            config.prominence_threshold,
            series.len()
        )));
    }

    // Stage 2: Segment steps
    let points = extrema.merged();
    let steps = StepSegmenter::segment(&points, series, config);
    if steps.is_empty() {
        return Err(AnalysisError::NoStepsDetected(format!(
            "{} peaks and {} troughs found but no peak-trough-peak pattern passed the thresholds",
            extrema.peaks.len(),
            extrema.troughs.len()
        )));
    }

    // Stage 3: Metrics
    let metrics = MetricsCalculator::compute_all(&steps, series);
    let statistics = MetricsCalculator::aggregate(&metrics)?;

    // Stage 4: Average step
    let average_step = StepAverager::from_config(config).average(&steps, series)?;

    // Stage 5: Assemble
    let report = ReportAggregator::assemble(metrics, &statistics, average_step);

    log::info!(
        "Analyzed {} samples: {} steps, mean step time {:.2} s",
        series.len(),
        report.statistics.step_count,
        report.statistics.step_time_average
    );

    Ok(report)
}

/// Analyze a recording, applying the roll convention for `side` first
pub fn analyze_recording(
    recording: &Recording,
    side: FootSide,
    config: &AnalysisConfig,
) -> Result<GaitReport, AnalysisError> {
    let series = recording.series(side)?;
    log::debug!(
        "Analyzing {} as {} foot ({} samples)",
        recording.name,
        side.as_str(),
        series.len()
    );
    analyze(&series, config)
}

/// Analyzer bound to one configuration and encoder.
///
/// Holds no per-analysis state; each call allocates its own working data.
pub struct GaitAnalyzer {
    config: AnalysisConfig,
    encoder: ReportEncoder,
}

impl Default for GaitAnalyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl GaitAnalyzer {
    /// Create an analyzer with the given configuration
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            encoder: ReportEncoder::new(),
        }
    }

    /// Create an analyzer with a specific encoder instance ID
    pub fn with_instance_id(config: AnalysisConfig, instance_id: String) -> Self {
        Self {
            config,
            encoder: ReportEncoder::with_instance_id(instance_id),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze a recording with its foot inferred from the name
    pub fn analyze(&self, recording: &Recording) -> Result<GaitReport, AnalysisError> {
        analyze_recording(recording, recording.foot_side(), &self.config)
    }

    /// Analyze a recording as `side`
    pub fn analyze_as(
        &self,
        recording: &Recording,
        side: FootSide,
    ) -> Result<GaitReport, AnalysisError> {
        analyze_recording(recording, side, &self.config)
    }

    /// Analyze and encode as a pretty-printed JSON report document
    pub fn analyze_to_json(
        &self,
        recording: &Recording,
        side: FootSide,
    ) -> Result<String, AnalysisError> {
        let report = self.analyze_as(recording, side)?;
        self.encoder.encode_to_json(&report, &recording.name, side, recording.samples.len())
    }
}
