//! Peak and trough detection
//!
//! Finds local maxima of the pitch signal whose topographic prominence reaches a
//! threshold, and the same for the negated signal (troughs). Detection always
//! runs on the raw signal so detected indices point at real samples; the
//! Gaussian smoother here only produces a diagnostic trace.

use crate::types::{ExtremumPoint, ExtremumKind};

/// Kernel half-width in standard deviations
const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// Peaks and troughs found in one signal, each in ascending index order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extrema {
    pub peaks: Vec<usize>,
    pub troughs: Vec<usize>,
}

impl Extrema {
    pub fn is_empty(&self) -> bool {
        self.peaks.is_empty() && self.troughs.is_empty()
    }

    /// Merge peaks and troughs into one sequence ordered by sample index.
    ///
    /// A sample cannot be both a strict local maximum and a strict local
    /// minimum, so indices never collide in practice. If they ever did, the
    /// stable sort would place the peak first.
    pub fn merged(&self) -> Vec<ExtremumPoint> {
        let mut points: Vec<ExtremumPoint> = self
            .peaks
            .iter()
            .map(|&i| ExtremumPoint::peak(i))
            .chain(self.troughs.iter().map(|&i| ExtremumPoint::trough(i)))
            .collect();
        points.sort_by_key(|p| p.index);
        points
    }
}

/// Detect peaks and troughs in a pitch signal
pub fn detect_extrema(pitch: &[f64], min_prominence: f64) -> Extrema {
    let peaks = find_peaks(pitch, min_prominence);

    let negated: Vec<f64> = pitch.iter().map(|v| -v).collect();
    let troughs = find_peaks(&negated, min_prominence);

    log::debug!(
        "Detected {} peaks and {} troughs in {} samples (prominence >= {})",
        peaks.len(),
        troughs.len(),
        pitch.len(),
        min_prominence
    );

    Extrema { peaks, troughs }
}

/// Indices of local maxima with prominence >= `min_prominence`
pub fn find_peaks(signal: &[f64], min_prominence: f64) -> Vec<usize> {
    let candidates = local_maxima(signal);
    let prominences = peak_prominences(signal, &candidates);

    candidates
        .into_iter()
        .zip(prominences)
        .filter(|&(_, prominence)| prominence >= min_prominence)
        .map(|(index, _)| index)
        .collect()
}

/// Find local maxima, including flat-topped ones.
///
/// A maximum is a sample (or a run of equal samples) whose neighbours on both
/// sides are strictly lower. For a plateau the middle sample is reported,
/// rounding towards the left. The first and last samples are never maxima.
pub fn local_maxima(signal: &[f64]) -> Vec<usize> {
    let mut maxima = Vec::new();
    if signal.len() < 3 {
        return maxima;
    }

    let last = signal.len() - 1;
    let mut i = 1;
    while i < last {
        if signal[i - 1] < signal[i] {
            let mut ahead = i + 1;
            while ahead < last && signal[ahead] == signal[i] {
                ahead += 1;
            }

            if signal[ahead] < signal[i] {
                let left_edge = i;
                let right_edge = ahead - 1;
                maxima.push((left_edge + right_edge) / 2);
                i = ahead;
            }
        }
        i += 1;
    }

    maxima
}

/// Topographic prominence of each peak.
///
/// From the peak, walk outwards on each side until a strictly higher sample or
/// the signal border; the lowest point seen on each side is that side's base.
/// Prominence is the peak height minus the higher of the two bases.
pub fn peak_prominences(signal: &[f64], peaks: &[usize]) -> Vec<f64> {
    peaks
        .iter()
        .map(|&peak| {
            let height = signal[peak];

            let left_base = signal[..=peak]
                .iter()
                .rev()
                .take_while(|&&v| v <= height)
                .fold(height, |acc, &v| acc.min(v));

            let right_base = signal[peak..]
                .iter()
                .take_while(|&&v| v <= height)
                .fold(height, |acc, &v| acc.min(v));

            height - left_base.max(right_base)
        })
        .collect()
}

/// Gaussian-smoothed copy of `signal`.
///
/// The kernel is truncated at four standard deviations and the signal is
/// mirrored at both borders (`d c b a | a b c d | d c b a`).
pub fn gaussian_smooth(signal: &[f64], sigma: f64) -> Vec<f64> {
    if signal.is_empty() || sigma <= 0.0 {
        return signal.to_vec();
    }

    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as isize;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|k| {
            let x = k as f64 / sigma;
            (-0.5 * x * x).exp()
        })
        .collect();
    let total: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= total;
    }

    let n = signal.len() as isize;
    (0..n)
        .map(|i| {
            kernel
                .iter()
                .zip(-radius..=radius)
                .map(|(w, k)| w * signal[reflect_index(i + k, n)])
                .sum()
        })
        .collect()
}

/// Map an out-of-range index back into `0..n` by half-sample reflection
fn reflect_index(index: isize, n: isize) -> usize {
    let period = 2 * n;
    let m = index.rem_euclid(period);
    if m < n {
        m as usize
    } else {
        (period - 1 - m) as usize
    }
}

/// Count how many extrema of each kind a merged sequence contains
pub fn count_kinds(points: &[ExtremumPoint]) -> (usize, usize) {
    points.iter().fold((0, 0), |(peaks, troughs), p| match p.kind {
        ExtremumKind::Peak => (peaks + 1, troughs),
        ExtremumKind::Trough => (peaks, troughs + 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_maxima() {
        let signal = [0.0, 2.0, 0.0, 3.0, 1.0, 4.0, 0.0];
        assert_eq!(local_maxima(&signal), vec![1, 3, 5]);
    }

    #[test]
    fn test_plateau_reports_middle() {
        let signal = [0.0, 1.0, 2.0, 2.0, 2.0, 2.0, 1.0];
        // plateau spans 2..=5, middle rounds left
        assert_eq!(local_maxima(&signal), vec![3]);
    }

    #[test]
    fn test_plateau_touching_border_is_not_a_peak() {
        let signal = [0.0, 1.0, 2.0, 2.0, 2.0];
        assert!(local_maxima(&signal).is_empty());
    }

    #[test]
    fn test_short_signal_has_no_maxima() {
        assert!(local_maxima(&[1.0, 2.0]).is_empty());
        assert!(detect_extrema(&[1.0, 2.0], 1.0).is_empty());
    }

    #[test]
    fn test_prominence_uses_higher_base() {
        // peak at 3 (value 5): left base 1 (up to border), right base 2 (stops at 6)
        let signal = [1.0, 3.0, 2.0, 5.0, 2.0, 6.0, 0.0];
        let peaks = local_maxima(&signal);
        assert_eq!(peaks, vec![1, 3, 5]);

        let prominences = peak_prominences(&signal, &peaks);
        // peak 1: left base 1, right base 2 (stops at 5) -> 3 - 2 = 1
        assert!((prominences[0] - 1.0).abs() < 1e-12);
        // peak 3: left base 1 (walks over 3 and 2 to the border), right base 2 -> 5 - 2 = 3
        assert!((prominences[1] - 3.0).abs() < 1e-12);
        // peak 5: highest point, bases 1 and 0 -> 6 - 1 = 5
        assert!((prominences[2] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_prominence_threshold_is_inclusive() {
        let signal = [0.0, 1.0, 0.0, 0.5, 0.0];
        assert_eq!(find_peaks(&signal, 1.0), vec![1]);
        assert_eq!(find_peaks(&signal, 0.5), vec![1, 3]);
    }

    #[test]
    fn test_flat_line_has_no_extrema() {
        let flat = vec![3.0; 200];
        let extrema = detect_extrema(&flat, 1.0);
        assert!(extrema.is_empty());
        assert!(extrema.merged().is_empty());
    }

    #[test]
    fn test_walk_extrema_alternate() {
        let series = test_support::regular_walk(5);
        let extrema = detect_extrema(series.pitch(), 1.0);
        assert_eq!(extrema.peaks.len(), 6);
        assert_eq!(extrema.troughs.len(), 5);

        let merged = extrema.merged();
        assert_eq!(count_kinds(&merged), (6, 5));
        for (i, point) in merged.iter().enumerate() {
            let expected = if i % 2 == 0 {
                ExtremumKind::Peak
            } else {
                ExtremumKind::Trough
            };
            assert_eq!(point.kind, expected);
        }
        assert!(merged.windows(2).all(|w| w[0].index < w[1].index));
    }

    #[test]
    fn test_gaussian_preserves_constant() {
        let flat = vec![2.5; 30];
        let smoothed = gaussian_smooth(&flat, 2.0);
        for v in smoothed {
            assert!((v - 2.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_gaussian_does_not_shift_detection() {
        let series = test_support::regular_walk(3);
        let before = detect_extrema(series.pitch(), 1.0);
        let _ = gaussian_smooth(series.pitch(), 2.0);
        let after = detect_extrema(series.pitch(), 1.0);
        assert_eq!(before, after);
    }

    #[test]
    fn test_gaussian_smooths_spike() {
        let mut signal = vec![0.0; 21];
        signal[10] = 10.0;
        let smoothed = gaussian_smooth(&signal, 2.0);
        assert!(smoothed[10] < 10.0);
        assert!(smoothed[10] > smoothed[9]);
        assert!((smoothed[9] - smoothed[11]).abs() < 1e-12);
        let total: f64 = smoothed.iter().sum();
        assert!((total - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_reflect_index() {
        assert_eq!(reflect_index(-1, 4), 0);
        assert_eq!(reflect_index(-2, 4), 1);
        assert_eq!(reflect_index(4, 4), 3);
        assert_eq!(reflect_index(5, 4), 2);
        assert_eq!(reflect_index(2, 4), 2);
    }
}
