// src/signal/mod.rs
// Numeric core: per-channel buffers, sweep/overlay transforms, filters and spectra.
pub mod align;
pub mod buffer;
pub mod fft;
pub mod filter;
pub mod sweep;
pub use align::ChannelAligner;
pub use buffer::TimeWindowedBuffer;
pub use fft::{bin_frequencies, magnitude_spectrum, SpectrumAnalyzer};
pub use filter::{
    BiquadCoeffs, BiquadFilter, FilterChain, FilterError, FilterParams, FilterPurpose, FilterType,
};
pub use sweep::{sweep, SweepState};
