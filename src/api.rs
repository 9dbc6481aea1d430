//! Request handling for the stored-recording service
//!
//! Maps gateway events onto the record store and the analysis pipeline:
//!
//! - `GET /items` lists stored recordings, newest first
//! - `GET /items/{id}` analyzes one recording and returns its statistics and
//!   average step (never the raw samples)
//!
//! Anything else is a 400. Every response is JSON and carries a permissive
//! CORS header so browser clients can call the service directly.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, SourceError};
use crate::pipeline::analyze_recording;
use crate::source::{RecordStore, RecordSummary};
use crate::types::{GaitReport, GaitStatistics};

const LIST_ROUTE: &str = "/items";
const ITEM_ROUTE: &str = "/items/{id}";

/// Incoming gateway event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    /// `"<METHOD> <route>"`, e.g. `"GET /items/{id}"`
    pub route_key: String,

    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
}

impl ApiRequest {
    pub fn new(route_key: impl Into<String>) -> Self {
        Self {
            route_key: route_key.into(),
            path_parameters: None,
        }
    }

    /// Request for the recording list
    pub fn list_items() -> Self {
        Self::new(format!("GET {}", LIST_ROUTE))
    }

    /// Request for one recording's analysis
    pub fn get_item(id: impl Into<String>) -> Self {
        Self::new(format!("GET {}", ITEM_ROUTE)).with_path_parameter("id", id)
    }

    pub fn with_path_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_parameters
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    fn path_parameter(&self, key: &str) -> Option<&str> {
        self.path_parameters
            .as_ref()
            .and_then(|params| params.get(key))
            .map(String::as_str)
    }
}

/// Outgoing gateway response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON-encoded body
    pub body: String,
}

impl ApiResponse {
    fn new(status_code: u16, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Access-Control-Allow-Origin".to_string(), "*".to_string());
        Self {
            status_code,
            headers,
            body,
        }
    }

    fn json<T: Serialize>(status_code: u16, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(json) => Self::new(status_code, json),
            Err(e) => {
                log::error!("Failed to encode response body: {}", e);
                Self::message(500, "Internal Server Error")
            }
        }
    }

    fn message(status_code: u16, text: &str) -> Self {
        // Encoded as a JSON string so the body always matches the content type
        Self::new(status_code, serde_json::Value::from(text).to_string())
    }

    fn bad_request() -> Self {
        Self::message(400, "Bad Request")
    }

    fn not_found() -> Self {
        Self::message(404, "File not found")
    }
}

/// Dense average-step curve as returned to clients
#[derive(Serialize)]
struct AverageStepBody<'a> {
    time: &'a [f64],
    pitch: &'a [f64],
    roll: &'a [f64],
}

/// Successful item response: summary fields plus statistics
#[derive(Serialize)]
struct ItemBody<'a> {
    #[serde(flatten)]
    summary: &'a RecordSummary,
    #[serde(flatten)]
    statistics: &'a GaitStatistics,
    average_step: AverageStepBody<'a>,
}

impl<'a> ItemBody<'a> {
    fn new(summary: &'a RecordSummary, report: &'a GaitReport) -> Self {
        Self {
            summary,
            statistics: &report.statistics,
            average_step: AverageStepBody {
                time: &report.average_step.time,
                pitch: &report.average_step.pitch,
                roll: &report.average_step.roll,
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    kind: &'a str,
    message: String,
}

/// Item response when the recording exists but could not be analyzed
#[derive(Serialize)]
struct ItemFailureBody<'a> {
    #[serde(flatten)]
    summary: &'a RecordSummary,
    error: ErrorBody<'a>,
}

/// Handle one gateway event against `store`
pub fn handle_request<S>(store: &S, request: &ApiRequest, config: &AnalysisConfig) -> ApiResponse
where
    S: RecordStore + ?Sized,
{
    log::info!("Handling {}", request.route_key);

    let mut parts = request.route_key.split_whitespace();
    let (method, route) = match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(route), None) => (method, route),
        _ => return ApiResponse::bad_request(),
    };

    match (method, route) {
        ("GET", LIST_ROUTE) => list_items(store),
        ("GET", ITEM_ROUTE) => match request.path_parameter("id") {
            Some(id) => get_item(store, id, config),
            None => ApiResponse::bad_request(),
        },
        _ => {
            log::debug!("Unsupported route {}", request.route_key);
            ApiResponse::bad_request()
        }
    }
}

fn list_items<S: RecordStore + ?Sized>(store: &S) -> ApiResponse {
    let mut summaries = store.list();
    summaries.sort_by(|a, b| {
        b.start_time
            .cmp(&a.start_time)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    ApiResponse::json(200, &summaries)
}

fn get_item<S: RecordStore + ?Sized>(store: &S, id: &str, config: &AnalysisConfig) -> ApiResponse {
    let recording = match store.get(id) {
        Ok(recording) => recording,
        Err(SourceError::NotFound(_)) => return ApiResponse::not_found(),
        Err(e) => {
            log::warn!("Could not load {}: {}", id, e);
            let summary = RecordSummary {
                file_name: id.to_string(),
                start_time: None,
                data_points: 0,
            };
            let error = AnalysisError::MalformedInput(e.to_string());
            return failure(&summary, &error);
        }
    };

    let summary = recording.summary();
    match analyze_recording(&recording, recording.foot_side(), config) {
        Ok(report) => ApiResponse::json(200, &ItemBody::new(&summary, &report)),
        Err(e) => {
            log::warn!("Analysis of {} failed: {}", id, e);
            failure(&summary, &e)
        }
    }
}

fn failure(summary: &RecordSummary, error: &AnalysisError) -> ApiResponse {
    let body = ItemFailureBody {
        summary,
        error: ErrorBody {
            kind: error.kind(),
            message: error.to_string(),
        },
    };
    ApiResponse::json(200, &body)
}
