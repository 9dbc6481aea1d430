//! Analyze a synthetic walk and print the batch summary
//!
//! Pass `--csv` to print the generated recording instead (nanosecond
//! timestamps, as written by the foot sensor), which can be fed back through
//! `gait analyze --input -`.

use gait_flux::{analyze, AnalysisConfig, FootSide, Sample, SampleSeries};

const RATE_HZ: f64 = 104.0;

/// Twelve steps with cadence drifting between 0.9 and 1.1 s
fn synthetic_walk() -> Vec<Sample> {
    let mut samples = Vec::new();
    let mut t = 0.0;
    let dt = 1.0 / RATE_HZ;

    // standing still
    while t < 1.0 {
        samples.push(Sample::new(t, 0.0, 0.0));
        t += dt;
    }

    for step in 0..12 {
        let duration = 1.0 + 0.1 * ((step as f64) * 0.9).sin();
        let start = t;
        while t < start + duration {
            let u = (t - start) / duration;
            // heel strike at u = 0, toe-off near u = 0.6, swing back up
            let pitch = if u < 0.6 {
                15.0 - 80.0 * (u / 0.6)
            } else {
                -65.0 + 80.0 * ((u - 0.6) / 0.4)
            };
            let roll = 6.0 * (2.0 * std::f64::consts::PI * u).sin();
            // deterministic jitter well below the prominence threshold
            let jitter = 0.2 * (t * 97.0).sin();
            samples.push(Sample::new(t, pitch + jitter, roll));
            t += dt;
        }
    }

    let end = t + 1.0;
    while t < end {
        samples.push(Sample::new(t, 0.0, 0.0));
        t += dt;
    }

    samples
}

fn main() {
    let samples = synthetic_walk();

    if std::env::args().any(|a| a == "--csv") {
        for s in &samples {
            println!("{:.0},{:.3},{:.3}", s.time * 1e9, s.pitch, s.roll);
        }
        return;
    }

    let series = match SampleSeries::from_samples(&samples) {
        Ok(series) => series.normalize_roll(FootSide::Left),
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };

    match analyze(&series, &AnalysisConfig::batch()) {
        Ok(report) => print!("{}", report.render_text()),
        Err(e) => eprintln!("Error [{}]: {e}", e.kind()),
    }
}
