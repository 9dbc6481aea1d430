//! Gait CLI - Command-line interface for Gait Flux
//!
//! Commands:
//! - analyze: Detect steps in a recording and print the gait report
//! - peaks: List detected extrema and steps (diagnostics)
//! - handle: Run the stored-recording request handler against a records file
//! - config: Print the effective analysis configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use gait_flux::encoder::ReportEncoder;
use gait_flux::peaks::{count_kinds, detect_extrema, gaussian_smooth};
use gait_flux::pipeline::{analyze_recording, detect_steps};
use gait_flux::source::{read_samples_csv, NANOS_PER_SECOND};
use gait_flux::types::ExtremumKind;
use gait_flux::{
    handle_request, AnalysisConfig, AnalysisError, ApiRequest, FootSide, InMemoryRecordStore,
    Recording, SourceError, GAIT_FLUX_VERSION,
};

/// Gait - Step detection and averaged step profiles from foot IMU data
#[derive(Parser)]
#[command(name = "gait")]
#[command(author = "Synheart AI Inc")]
#[command(version = GAIT_FLUX_VERSION)]
#[command(about = "Detect gait steps in foot orientation recordings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect steps in a recording and print the gait report
    Analyze {
        /// Input CSV file of time,pitch,roll rows (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Foot that produced the recording (inferred from the file name if omitted)
        #[arg(long)]
        foot: Option<Foot>,

        /// Divide timestamps by this to get seconds
        #[arg(long, default_value_t = NANOS_PER_SECOND)]
        time_scale: f64,

        /// Configuration preset
        #[arg(long, default_value = "batch")]
        preset: Preset,

        /// Load configuration from a JSON file (overrides the preset)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the averaging bucket count
        #[arg(long)]
        buckets: Option<usize>,

        /// Override the peak prominence threshold
        #[arg(long)]
        prominence: Option<f64>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// List detected extrema and steps as CSV (diagnostics)
    Peaks {
        /// Input CSV file of time,pitch,roll rows (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Divide timestamps by this to get seconds
        #[arg(long, default_value_t = NANOS_PER_SECOND)]
        time_scale: f64,

        /// Peak prominence threshold
        #[arg(long, default_value_t = 1.0)]
        prominence: f64,

        /// Also write the Gaussian-smoothed pitch trace to this CSV file
        #[arg(long)]
        smoothed: Option<PathBuf>,

        /// Gaussian sigma in samples for the smoothed trace
        #[arg(long, default_value_t = 2.0)]
        sigma: f64,
    },

    /// Handle one gateway event against a stored-records file
    Handle {
        /// JSON array of stored records
        #[arg(long)]
        records: PathBuf,

        /// Gateway event JSON (use - for stdin)
        #[arg(long)]
        event: PathBuf,

        /// Configuration preset
        #[arg(long, default_value = "server")]
        preset: Preset,
    },

    /// Print the effective analysis configuration as JSON
    Config {
        /// Configuration preset
        #[arg(long, default_value = "server")]
        preset: Preset,

        /// Merge overrides from a JSON file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Foot {
    Left,
    Right,
}

impl From<Foot> for FootSide {
    fn from(foot: Foot) -> Self {
        match foot {
            Foot::Left => FootSide::Left,
            Foot::Right => FootSide::Right,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// On-demand service settings (20 buckets)
    Server,
    /// Offline batch settings (30 buckets)
    Batch,
}

impl Preset {
    fn config(self) -> AnalysisConfig {
        match self {
            Preset::Server => AnalysisConfig::server(),
            Preset::Batch => AnalysisConfig::batch(),
        }
    }
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Single-line JSON report document
    Json,
    /// Pretty-printed JSON report document
    JsonPretty,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), GaitCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            foot,
            time_scale,
            preset,
            config,
            buckets,
            prominence,
            format,
        } => {
            let mut config = load_config(preset, config.as_deref())?;
            if let Some(buckets) = buckets {
                config.bucket_count = buckets;
            }
            if let Some(prominence) = prominence {
                config.prominence_threshold = prominence;
            }
            config.validate()?;
            cmd_analyze(&input, &output, foot, time_scale, &config, format)
        }
        Commands::Peaks {
            input,
            time_scale,
            prominence,
            smoothed,
            sigma,
        } => cmd_peaks(&input, time_scale, prominence, smoothed.as_deref(), sigma),
        Commands::Handle {
            records,
            event,
            preset,
        } => cmd_handle(&records, &event, &preset.config()),
        Commands::Config { preset, config } => {
            let config = load_config(preset, config.as_deref())?;
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    foot: Option<Foot>,
    time_scale: f64,
    config: &AnalysisConfig,
    format: OutputFormat,
) -> Result<(), GaitCliError> {
    let recording = read_recording(input, time_scale)?;
    let side = foot.map(FootSide::from).unwrap_or_else(|| recording.foot_side());

    log::info!(
        "Analyzing {} ({} samples) as {} foot",
        recording.name,
        recording.samples.len(),
        side.as_str()
    );

    let report = analyze_recording(&recording, side, config)?;

    let output_data = match format {
        OutputFormat::Text => report.render_text(),
        OutputFormat::Json => {
            let encoder = ReportEncoder::new();
            let mut json = encoder.encode_to_compact_json(&report, &recording.name, side, recording.samples.len())?;
            json.push('\n');
            json
        }
        OutputFormat::JsonPretty => {
            let encoder = ReportEncoder::new();
            let mut json = encoder.encode_to_json(&report, &recording.name, side, recording.samples.len())?;
            json.push('\n');
            json
        }
    };

    if is_stdio(output) {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_peaks(
    input: &Path,
    time_scale: f64,
    prominence: f64,
    smoothed: Option<&Path>,
    sigma: f64,
) -> Result<(), GaitCliError> {
    let recording = read_recording(input, time_scale)?;
    let series = recording.series(recording.foot_side())?;

    let extrema = detect_extrema(series.pitch(), prominence);
    let points = extrema.merged();
    let config = AnalysisConfig {
        prominence_threshold: prominence,
        ..AnalysisConfig::default()
    };
    let steps = detect_steps(&series, &config);

    let (peak_count, trough_count) = count_kinds(&points);
    log::info!(
        "{} peaks, {} troughs, {} steps",
        peak_count,
        trough_count,
        steps.len()
    );

    let stdout = io::stdout();
    let mut writer = csv::Writer::from_writer(stdout.lock());
    writer.write_record(["index", "time", "pitch", "kind", "step_start"])?;
    for point in &points {
        let kind = match point.kind {
            ExtremumKind::Peak => "peak",
            ExtremumKind::Trough => "trough",
        };
        let opens_step = steps.iter().any(|s| s.start_index == point.index);
        writer.write_record([
            point.index.to_string(),
            series.time()[point.index].to_string(),
            series.pitch()[point.index].to_string(),
            kind.to_string(),
            opens_step.to_string(),
        ])?;
    }
    writer.flush()?;

    if let Some(path) = smoothed {
        let trace = gaussian_smooth(series.pitch(), sigma);
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["time", "pitch", "smoothed_pitch"])?;
        for ((time, pitch), smooth) in series.time().iter().zip(series.pitch()).zip(&trace) {
            writer.write_record([time.to_string(), pitch.to_string(), smooth.to_string()])?;
        }
        writer.flush()?;
    }

    Ok(())
}

fn cmd_handle(records: &Path, event: &Path, config: &AnalysisConfig) -> Result<(), GaitCliError> {
    let store = InMemoryRecordStore::from_path(records)?;
    let event_json = read_text(event)?;
    let request: ApiRequest = serde_json::from_str(&event_json)?;

    let response = handle_request(&store, &request, config);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn load_config(preset: Preset, path: Option<&Path>) -> Result<AnalysisConfig, GaitCliError> {
    match path {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            Ok(AnalysisConfig::from_json(&json)?)
        }
        None => Ok(preset.config()),
    }
}

fn read_recording(input: &Path, time_scale: f64) -> Result<Recording, GaitCliError> {
    let samples = if is_stdio(input) {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        read_samples_csv(buffer.as_slice(), time_scale)?
    } else {
        read_samples_csv(fs::File::open(input)?, time_scale)?
    };

    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stdin".to_string());

    Ok(Recording::new(name, samples))
}

fn read_text(path: &Path) -> Result<String, GaitCliError> {
    if is_stdio(path) {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

// Error types

#[derive(Debug)]
enum GaitCliError {
    Io(io::Error),
    Source(SourceError),
    Analysis(AnalysisError),
    Json(serde_json::Error),
    Csv(csv::Error),
}

impl From<io::Error> for GaitCliError {
    fn from(e: io::Error) -> Self {
        GaitCliError::Io(e)
    }
}

impl From<SourceError> for GaitCliError {
    fn from(e: SourceError) -> Self {
        GaitCliError::Source(e)
    }
}

impl From<AnalysisError> for GaitCliError {
    fn from(e: AnalysisError) -> Self {
        GaitCliError::Analysis(e)
    }
}

impl From<serde_json::Error> for GaitCliError {
    fn from(e: serde_json::Error) -> Self {
        GaitCliError::Json(e)
    }
}

impl From<csv::Error> for GaitCliError {
    fn from(e: csv::Error) -> Self {
        GaitCliError::Csv(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<GaitCliError> for CliError {
    fn from(e: GaitCliError) -> Self {
        match e {
            GaitCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            GaitCliError::Source(e) => CliError {
                code: "SOURCE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Rows must be time,pitch,roll; check --time-scale".to_string()),
            },
            GaitCliError::Analysis(e) => {
                let hint = match &e {
                    AnalysisError::NoStepsDetected(_) => {
                        Some("Try a lower --prominence or check the pitch column".to_string())
                    }
                    AnalysisError::InsufficientStepsForAveraging(_) => {
                        Some("Try fewer --buckets or a longer recording".to_string())
                    }
                    AnalysisError::InvalidConfig(_) => {
                        Some("Run 'gait config' to see valid settings".to_string())
                    }
                    _ => None,
                };
                CliError {
                    code: e.kind().to_uppercase(),
                    message: e.to_string(),
                    hint,
                }
            }
            GaitCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            GaitCliError::Csv(e) => CliError {
                code: "CSV_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
        }
    }
}
