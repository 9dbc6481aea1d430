//! Report encoding
//!
//! This module wraps a `GaitReport` in a self-describing JSON document carrying
//! producer and provenance metadata.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AnalysisError;
use crate::types::{FootSide, GaitReport};
use crate::{GAIT_FLUX_VERSION, PRODUCER_NAME};

/// Current report document format version
pub const REPORT_FORMAT_VERSION: &str = "1.0.0";

/// Software that produced the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Where the analyzed data came from and when it was analyzed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProvenance {
    pub record: String,
    pub foot: FootSide,
    pub sample_count: usize,
    pub computed_at_utc: String,
}

/// Complete encoded report document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub format_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub report: GaitReport,
}

/// Encoder for report documents
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Wrap a report with producer and provenance metadata
    pub fn encode(
        &self,
        report: &GaitReport,
        record: &str,
        foot: FootSide,
        sample_count: usize,
    ) -> ReportDocument {
        ReportDocument {
            format_version: REPORT_FORMAT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: GAIT_FLUX_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            provenance: ReportProvenance {
                record: record.to_string(),
                foot,
                sample_count,
                computed_at_utc: Utc::now().to_rfc3339(),
            },
            report: report.clone(),
        }
    }

    /// Encode to pretty-printed JSON
    pub fn encode_to_json(
        &self,
        report: &GaitReport,
        record: &str,
        foot: FootSide,
        sample_count: usize,
    ) -> Result<String, AnalysisError> {
        let document = self.encode(report, record, foot, sample_count);
        serde_json::to_string_pretty(&document).map_err(|e| AnalysisError::EncodingError(e.to_string()))
    }

    /// Encode to single-line JSON
    pub fn encode_to_compact_json(
        &self,
        report: &GaitReport,
        record: &str,
        foot: FootSide,
        sample_count: usize,
    ) -> Result<String, AnalysisError> {
        let document = self.encode(report, record, foot, sample_count);
        serde_json::to_string(&document).map_err(|e| AnalysisError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::pipeline::analyze;
    use crate::types::test_support;

    fn sample_report() -> GaitReport {
        analyze(&test_support::regular_walk(3), &AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn test_encode_metadata() {
        let encoder = ReportEncoder::with_instance_id("fixed-id".to_string());
        let report = sample_report();
        let document = encoder.encode(&report, "left-0001.csv", FootSide::Left, 321);

        assert_eq!(document.format_version, REPORT_FORMAT_VERSION);
        assert_eq!(document.producer.name, "gait-flux");
        assert_eq!(document.producer.version, GAIT_FLUX_VERSION);
        assert_eq!(document.producer.instance_id, "fixed-id");
        assert_eq!(document.provenance.record, "left-0001.csv");
        assert_eq!(document.provenance.sample_count, 321);
        assert!(chrono::DateTime::parse_from_rfc3339(&document.provenance.computed_at_utc).is_ok());
        assert_eq!(document.report, report);
    }

    #[test]
    fn test_json_shape() {
        let encoder = ReportEncoder::new();
        let json = encoder
            .encode_to_compact_json(&sample_report(), "right-7.csv", FootSide::Right, 10)
            .unwrap();
        assert!(!json.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["provenance"]["foot"], "right");
        assert_eq!(value["report"]["statistics"]["step_count"], 3);
        assert_eq!(
            value["report"]["average_step"]["time"].as_array().map(|a| a.len()),
            Some(500)
        );
    }

    #[test]
    fn test_instance_ids_are_unique() {
        assert_ne!(ReportEncoder::new().instance_id(), ReportEncoder::new().instance_id());
    }

    #[test]
    fn test_document_round_trip() {
        let encoder = ReportEncoder::with_instance_id("x".into());
        let json = encoder
            .encode_to_json(&sample_report(), "left-2.csv", FootSide::Left, 5)
            .unwrap();
        let parsed: ReportDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.producer.instance_id, "x");
        assert_eq!(parsed.provenance.foot, FootSide::Left);
    }
}
