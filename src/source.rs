//! Sample sources
//!
//! Readers that turn recorded files and stored records into time-ordered
//! `(time, pitch, roll)` samples, plus the read-only record store the request
//! handler looks recordings up in.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, SourceError};
use crate::types::{FootSide, Sample, SampleSeries};

/// Nanoseconds per second; batch recordings are timestamped in nanoseconds
pub const NANOS_PER_SECOND: f64 = 1e9;

/// A named recording from one foot
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub name: String,
    pub start_time: Option<DateTime<Utc>>,
    pub samples: Vec<Sample>,
}

impl Recording {
    pub fn new(name: impl Into<String>, samples: Vec<Sample>) -> Self {
        Self {
            name: name.into(),
            start_time: None,
            samples,
        }
    }

    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Foot inferred from the recording name
    pub fn foot_side(&self) -> FootSide {
        FootSide::from_record_name(&self.name)
    }

    /// Validated series with the roll convention of `side` applied
    pub fn series(&self, side: FootSide) -> Result<SampleSeries, AnalysisError> {
        Ok(SampleSeries::from_samples(&self.samples)?.normalize_roll(side))
    }

    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            file_name: self.name.clone(),
            start_time: self.start_time,
            data_points: self.samples.len(),
        }
    }
}

/// Listing entry for a stored recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    #[serde(rename = "file-name")]
    pub file_name: String,

    #[serde(rename = "start-time", default, with = "epoch_millis")]
    pub start_time: Option<DateTime<Utc>>,

    #[serde(rename = "data-points")]
    pub data_points: usize,
}

/// Read-only access to stored recordings
pub trait RecordStore {
    /// Summaries of every stored recording
    fn list(&self) -> Vec<RecordSummary>;

    /// Look up one recording by name
    fn get(&self, name: &str) -> Result<Recording, SourceError>;
}

/// Stored record as persisted by the upload service: rows are kept as a JSON
/// string under `data`
#[derive(Debug, Deserialize)]
struct StoredRecord {
    #[serde(rename = "file-name")]
    file_name: String,

    #[serde(rename = "start-time", default, with = "epoch_millis")]
    start_time: Option<DateTime<Utc>>,

    #[serde(rename = "data-points", default)]
    data_points: Option<usize>,

    data: String,
}

/// Record store held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordStore {
    records: HashMap<String, Recording>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a recording
    pub fn insert(&mut self, recording: Recording) {
        self.records.insert(recording.name.clone(), recording);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load a JSON array of stored records
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let stored: Vec<StoredRecord> = serde_json::from_str(json)?;
        let mut store = Self::new();

        for record in stored {
            let samples = samples_from_json_rows(&record.data).map_err(|e| {
                SourceError::Malformed(format!("record {}: {}", record.file_name, e))
            })?;

            if let Some(expected) = record.data_points {
                if expected != samples.len() {
                    log::warn!(
                        "Record {} declares {} data points but holds {}",
                        record.file_name,
                        expected,
                        samples.len()
                    );
                }
            }

            let mut recording = Recording::new(record.file_name, samples);
            recording.start_time = record.start_time;
            store.insert(recording);
        }

        log::info!("Loaded {} stored recordings", store.len());
        Ok(store)
    }

    /// Load a JSON array of stored records from a file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let mut json = String::new();
        File::open(path)?.read_to_string(&mut json)?;
        Self::from_json(&json)
    }
}

impl RecordStore for InMemoryRecordStore {
    fn list(&self) -> Vec<RecordSummary> {
        self.records.values().map(Recording::summary).collect()
    }

    fn get(&self, name: &str) -> Result<Recording, SourceError> {
        self.records
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(name.to_string()))
    }
}

/// Parse headerless `time,pitch,roll` CSV rows.
///
/// Extra columns are ignored. Time is divided by `time_scale` to give seconds
/// (`NANOS_PER_SECOND` for raw batch recordings, `1.0` for files already in
/// seconds).
pub fn read_samples_csv<R: Read>(reader: R, time_scale: f64) -> Result<Vec<Sample>, SourceError> {
    check_time_scale(time_scale)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut samples = Vec::new();
    for (row, result) in reader.deserialize::<Vec<f64>>().enumerate() {
        let record = result?;
        samples.push(row_to_sample(&record, row, time_scale)?);
    }

    log::debug!("Read {} samples from CSV", samples.len());
    Ok(samples)
}

/// Parse a CSV file of samples
pub fn read_samples_csv_path(
    path: impl AsRef<Path>,
    time_scale: f64,
) -> Result<Vec<Sample>, SourceError> {
    let file = File::open(path)?;
    read_samples_csv(file, time_scale)
}

/// Parse a JSON array of `[time, pitch, roll]` rows with time in seconds
pub fn samples_from_json_rows(json: &str) -> Result<Vec<Sample>, SourceError> {
    let rows: Vec<Vec<f64>> = serde_json::from_str(json)?;
    rows.iter()
        .enumerate()
        .map(|(row, values)| row_to_sample(values, row, 1.0))
        .collect()
}

fn row_to_sample(values: &[f64], row: usize, time_scale: f64) -> Result<Sample, SourceError> {
    match values {
        [time, pitch, roll, ..] => Ok(Sample::new(time / time_scale, *pitch, *roll)),
        _ => Err(SourceError::Malformed(format!(
            "row {} has {} columns, expected time, pitch and roll",
            row + 1,
            values.len()
        ))),
    }
}

fn check_time_scale(time_scale: f64) -> Result<(), SourceError> {
    if time_scale.is_finite() && time_scale > 0.0 {
        Ok(())
    } else {
        Err(SourceError::Malformed(format!(
            "time scale must be positive, got {}",
            time_scale
        )))
    }
}

/// Optional timestamps as epoch milliseconds.
///
/// Stored start times are computed in floating point by the upload service,
/// so fractional milliseconds are accepted and rounded on read.
mod epoch_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_i64(dt.timestamp_millis()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<f64>::deserialize(deserializer)?;
        match millis {
            None => Ok(None),
            Some(ms) => DateTime::from_timestamp_millis(ms.round() as i64)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {}", ms))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stored_records_json() -> &'static str {
        r#"[
            {
                "file-name": "left-0000001-100.csv",
                "start-time": 1700000000000,
                "data-points": 3,
                "data": "[[0.0, 10.0, 2.0], [0.01, 9.5, 2.5], [0.02, 9.0, 3.0]]"
            },
            {
                "file-name": "right-0000002-200.csv",
                "start-time": 1700000500000.4,
                "data-points": 2,
                "data": "[[0.0, 1.0, -1.0], [0.01, 2.0, -2.0]]"
            }
        ]"#
    }

    #[test]
    fn test_read_csv_nanoseconds() {
        let csv = "1000000000,10.5,-2.0\n1010000000,11.0,-2.5\n";
        let samples = read_samples_csv(csv.as_bytes(), NANOS_PER_SECOND).unwrap();
        assert_eq!(samples.len(), 2);
        assert!((samples[0].time - 1.0).abs() < 1e-12);
        assert!((samples[1].time - 1.01).abs() < 1e-12);
        assert_eq!(samples[1].pitch, 11.0);
        assert_eq!(samples[1].roll, -2.5);
    }

    #[test]
    fn test_read_csv_ignores_extra_columns_and_whitespace() {
        let csv = "0.0, 1.0, 2.0, 99\n0.5 ,3.0,4.0\n";
        let samples = read_samples_csv(csv.as_bytes(), 1.0).unwrap();
        assert_eq!(samples, vec![Sample::new(0.0, 1.0, 2.0), Sample::new(0.5, 3.0, 4.0)]);
    }

    #[test]
    fn test_read_csv_short_row_is_malformed() {
        let csv = "0.0,1.0,2.0\n0.1,1.0\n";
        match read_samples_csv(csv.as_bytes(), 1.0) {
            Err(SourceError::Malformed(msg)) => assert!(msg.contains("row 2")),
            other => panic!("expected malformed row, got {:?}", other),
        }
    }

    #[test]
    fn test_read_csv_non_numeric_is_csv_error() {
        let csv = "time,pitch,roll\n0.0,1.0,2.0\n";
        assert!(matches!(
            read_samples_csv(csv.as_bytes(), 1.0),
            Err(SourceError::Csv(_))
        ));
    }

    #[test]
    fn test_bad_time_scale() {
        assert!(read_samples_csv("0,1,2\n".as_bytes(), 0.0).is_err());
        assert!(read_samples_csv("0,1,2\n".as_bytes(), f64::NAN).is_err());
    }

    #[test]
    fn test_json_rows() {
        let samples = samples_from_json_rows("[[0.0, 1.0, 2.0], [0.1, 3.0, 4.0, 5.0]]").unwrap();
        assert_eq!(samples, vec![Sample::new(0.0, 1.0, 2.0), Sample::new(0.1, 3.0, 4.0)]);
        assert!(matches!(
            samples_from_json_rows("[[0.0, 1.0]]"),
            Err(SourceError::Malformed(_))
        ));
        assert!(matches!(samples_from_json_rows("{}"), Err(SourceError::Json(_))));
    }

    #[test]
    fn test_store_from_json() {
        let store = InMemoryRecordStore::from_json(stored_records_json()).unwrap();
        assert_eq!(store.len(), 2);

        let left = store.get("left-0000001-100.csv").unwrap();
        assert_eq!(left.samples.len(), 3);
        assert_eq!(left.foot_side(), FootSide::Left);
        assert_eq!(
            left.start_time.map(|t| t.timestamp_millis()),
            Some(1_700_000_000_000)
        );

        let right = store.get("right-0000002-200.csv").unwrap();
        assert_eq!(right.foot_side(), FootSide::Right);
        assert_eq!(
            right.start_time.map(|t| t.timestamp_millis()),
            Some(1_700_000_500_000)
        );
    }

    #[test]
    fn test_store_missing_record() {
        let store = InMemoryRecordStore::from_json(stored_records_json()).unwrap();
        assert!(matches!(store.get("nope.csv"), Err(SourceError::NotFound(_))));
    }

    #[test]
    fn test_store_rejects_bad_rows() {
        let json = r#"[{"file-name": "left-x.csv", "data": "[[0.0]]"}]"#;
        match InMemoryRecordStore::from_json(json) {
            Err(SourceError::Malformed(msg)) => assert!(msg.contains("left-x.csv")),
            other => panic!("expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn test_summary_serialization() {
        let recording = Recording::new("left-a.csv", vec![Sample::new(0.0, 1.0, 2.0)])
            .with_start_time(DateTime::from_timestamp_millis(1_700_000_000_123).unwrap());
        let value = serde_json::to_value(recording.summary()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "file-name": "left-a.csv",
                "start-time": 1_700_000_000_123i64,
                "data-points": 1
            })
        );

        let untimed = serde_json::to_value(Recording::new("b.csv", Vec::new()).summary()).unwrap();
        assert_eq!(untimed["start-time"], serde_json::Value::Null);
    }

    #[test]
    fn test_recording_series_normalizes_roll() {
        let recording = Recording::new(
            "right-foot.csv",
            vec![Sample::new(0.0, 1.0, 5.0), Sample::new(0.1, 2.0, -5.0)],
        );
        let series = recording.series(recording.foot_side()).unwrap();
        assert_eq!(series.roll(), &[-5.0, 5.0]);
    }
}
