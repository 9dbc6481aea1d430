//! Gait Flux - Step detection and average step profiles from foot-mounted IMU data
//!
//! Flux turns a time-ordered stream of foot orientation samples (pitch and roll
//! in degrees) into gait statistics through a deterministic pipeline:
//! peak/trough detection → step segmentation → step metrics → step averaging
//! → report assembly.
//!
//! ## Modules
//!
//! - **Analysis core**: `peaks`, `segmentation`, `metrics`, `averaging`, `spline`, `report`
//! - **Pipeline**: `analyze` / `GaitAnalyzer` tie the stages together
//! - **Boundary**: `source` (CSV/JSON readers, record store), `encoder` (report
//!   documents) and `api` (stored-recording request handler)

pub mod api;
pub mod averaging;
pub mod config;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod peaks;
pub mod pipeline;
pub mod report;
pub mod segmentation;
pub mod source;
pub mod spline;
pub mod types;

pub use api::{handle_request, ApiRequest, ApiResponse};
pub use config::AnalysisConfig;
pub use encoder::{ReportDocument, ReportEncoder};
pub use error::{AnalysisError, SourceError};
pub use pipeline::{analyze, analyze_recording, detect_steps, GaitAnalyzer};
pub use source::{InMemoryRecordStore, RecordStore, RecordSummary, Recording};
pub use types::{FootSide, GaitReport, Sample, SampleSeries};

/// Gait Flux version embedded in all report documents
pub const GAIT_FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report documents
pub const PRODUCER_NAME: &str = "gait-flux";
