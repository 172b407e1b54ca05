use std::f64::consts::PI;
use rustfft::num_complex::Complex64;
/// Default ring size, independent of the channel's sampling rate.
pub const DEFAULT_RING_CAPACITY: usize = 256;
/// Below this many buffered samples no spectrum is produced.
pub const DEFAULT_MIN_SAMPLES: usize = 32;
/// Iterative radix-2 Cooley-Tukey FFT, in place.
///
/// Returns `false` (leaving `buf` untouched) when the length is not a power of two.
pub fn fft_in_place(buf: &mut [Complex64]) -> bool {
    let n = buf.len();
    if !n.is_power_of_two() {
        return false;
    }
    if n <= 1 {
        return true;
    }
    let bits = n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> (usize::BITS - bits);
        if j > i {
            buf.swap(i, j);
        }
    }
    let mut len = 2;
    while len <= n {
        let angle = -2.0 * PI / len as f64;
        let step = Complex64::new(angle.cos(), angle.sin());
        for start in (0..n).step_by(len) {
            let mut w = Complex64::new(1.0, 0.0);
            for k in 0..len / 2 {
                let even = buf[start + k];
                let odd = buf[start + k + len / 2] * w;
                buf[start + k] = even + odd;
                buf[start + k + len / 2] = even - odd;
                w *= step;
            }
        }
        len <<= 1;
    }
    true
}
/// Magnitude spectrum of a real signal: zero-padded to the next power of two, first `n/2`
/// bins, each scaled by `1/n`.
pub fn magnitude_spectrum(samples: &[f64]) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let n = samples.len().next_power_of_two();
    let mut buf: Vec<Complex64> = samples.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    buf.resize(n, Complex64::new(0.0, 0.0));
    fft_in_place(&mut buf);
    buf.iter()
        .take(n / 2)
        .map(|c| c.norm() / n as f64)
        .collect()
}
/// Centre frequency in Hz of each of `bin_count` magnitude bins.
pub fn bin_frequencies(bin_count: usize, sample_rate_hz: f64) -> Vec<f64> {
    let n = (bin_count * 2) as f64;
    (0..bin_count)
        .map(|k| k as f64 * sample_rate_hz / n)
        .collect()
}
/// Fixed-capacity ring of the most recent values, overwritten oldest-first.
#[derive(Clone, Debug)]
pub struct SpectrumRing {
    values: Vec<f64>,
    capacity: usize,
    next: usize,
}
impl SpectrumRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: Vec::with_capacity(capacity),
            capacity,
            next: 0,
        }
    }
    pub fn push(&mut self, value: f64) {
        if self.values.len() < self.capacity {
            self.values.push(value);
        } else {
            self.values[self.next] = value;
        }
        self.next = (self.next + 1) % self.capacity;
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    /// Values from oldest to newest.
    pub fn ordered(&self) -> Vec<f64> {
        if self.values.len() < self.capacity {
            return self.values.clone();
        }
        let (newer, older) = self.values.split_at(self.next);
        older.iter().chain(newer).copied().collect()
    }
    pub fn clear(&mut self) {
        self.values.clear();
        self.next = 0;
    }
}
/// Per-channel spectrum source fed with the same samples that go into the trace buffer.
#[derive(Clone, Debug)]
pub struct SpectrumAnalyzer {
    ring: SpectrumRing,
    min_samples: usize,
}
impl SpectrumAnalyzer {
    pub fn new(capacity: usize, min_samples: usize) -> Self {
        Self {
            ring: SpectrumRing::new(capacity),
            min_samples: min_samples.max(2),
        }
    }
    pub fn push(&mut self, value: f64) {
        self.ring.push(value);
    }
    pub fn buffered(&self) -> usize {
        self.ring.len()
    }
    /// Empty until at least `min_samples` values are buffered.
    pub fn spectrum(&self) -> Vec<f64> {
        if self.ring.len() < self.min_samples {
            return Vec::new();
        }
        magnitude_spectrum(&self.ring.ordered())
    }
    pub fn reset(&mut self) {
        self.ring.clear();
    }
}
impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_RING_CAPACITY, DEFAULT_MIN_SAMPLES)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::FftPlanner;
    #[test]
    fn impulse_is_flat() {
        let mut impulse = vec![0.0; 64];
        impulse[0] = 1.0;
        let mags = magnitude_spectrum(&impulse);
        assert_eq!(mags.len(), 32);
        assert!(mags.iter().all(|m| (m - 1.0 / 64.0).abs() < 1e-12));
    }
    #[test]
    fn sine_peaks_at_expected_bin() {
        let fs = 256.0;
        let f = 20.0;
        let mut analyzer = SpectrumAnalyzer::default();
        for i in 0..256 {
            analyzer.push((2.0 * PI * f * i as f64 / fs).sin());
        }
        let mags = analyzer.spectrum();
        assert_eq!(mags.len(), 128);
        let peak_bin = mags
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak_bin, (f * 256.0 / fs).round() as usize);
        assert!((mags[peak_bin] - 0.5).abs() < 1e-9);
    }
    #[test]
    fn matches_reference_fft() {
        let input: Vec<Complex64> = (0..128)
            .map(|i| Complex64::new((i as f64 * 0.37).sin() + 0.1 * i as f64, 0.0))
            .collect();
        let mut ours = input.clone();
        assert!(fft_in_place(&mut ours));
        let mut reference = input;
        FftPlanner::<f64>::new()
            .plan_fft_forward(128)
            .process(&mut reference);
        for (a, b) in ours.iter().zip(&reference) {
            assert!((a - b).norm() < 1e-9);
        }
    }
    #[test]
    fn rejects_non_power_of_two() {
        let mut buf = vec![Complex64::new(1.0, 0.0); 12];
        assert!(!fft_in_place(&mut buf));
        assert!(buf.iter().all(|c| c.re == 1.0));
    }
    #[test]
    fn below_threshold_is_empty_and_irregular_lengths_are_padded() {
        let mut analyzer = SpectrumAnalyzer::new(256, 32);
        for _ in 0..31 {
            analyzer.push(1.0);
        }
        assert!(analyzer.spectrum().is_empty());
        for _ in 0..10 {
            analyzer.push(1.0);
        }
        // 41 samples pad to 64
        assert_eq!(analyzer.spectrum().len(), 32);
    }
    #[test]
    fn ring_overwrites_oldest_first() {
        let mut ring = SpectrumRing::new(4);
        for v in 1..=6 {
            ring.push(v as f64);
        }
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.ordered(), vec![3.0, 4.0, 5.0, 6.0]);
    }
    #[test]
    fn bin_axis_spans_to_nyquist() {
        let freqs = bin_frequencies(128, 256.0);
        assert_eq!(freqs[0], 0.0);
        assert_eq!(freqs[1], 1.0);
        assert_eq!(freqs[127], 127.0);
    }
}
