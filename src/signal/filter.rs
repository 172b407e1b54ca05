use std::f64::consts::PI;
use thiserror::Error;
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterType {
    Notch,
    Bandpass,
    /// Pass-through with unit coefficients.
    Bypass,
}
/// Which slot of a channel's filter chain a configuration targets. Slots run in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterPurpose {
    /// Mains hum rejection (usually a 50/60 Hz notch).
    Mains,
    /// Band selection for the signal of interest.
    Band,
}
impl FilterPurpose {
    pub const ALL: [FilterPurpose; 2] = [FilterPurpose::Mains, FilterPurpose::Band];
    pub fn slot(self) -> usize {
        match self {
            FilterPurpose::Mains => 0,
            FilterPurpose::Band => 1,
        }
    }
}
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FilterError {
    #[error("filter Q must be greater than zero")]
    NonPositiveQ,
    #[error("filter centre frequency must be greater than zero")]
    NonPositiveFrequency,
    #[error("centre frequency {f0_hz} Hz is not below Nyquist ({nyquist_hz} Hz)")]
    AboveNyquist { f0_hz: f64, nyquist_hz: f64 },
    #[error("filter sample rate must be greater than zero")]
    InvalidSampleRate,
    #[error("filter parameters must be finite")]
    NonFinite,
}
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterParams {
    pub kind: FilterType,
    pub f0_hz: f64,
    pub q: f64,
    pub fs_hz: f64,
}
impl FilterParams {
    pub fn notch(f0_hz: f64, q: f64, fs_hz: f64) -> Self {
        Self {
            kind: FilterType::Notch,
            f0_hz,
            q,
            fs_hz,
        }
    }
    pub fn bandpass(f0_hz: f64, q: f64, fs_hz: f64) -> Self {
        Self {
            kind: FilterType::Bandpass,
            f0_hz,
            q,
            fs_hz,
        }
    }
    pub fn bypass(fs_hz: f64) -> Self {
        Self {
            kind: FilterType::Bypass,
            f0_hz: 0.0,
            q: 0.0,
            fs_hz,
        }
    }
    /// Checks the parameters at the configuration boundary. Bypass has nothing to check.
    pub fn validate(&self) -> Result<(), FilterError> {
        if self.kind == FilterType::Bypass {
            return Ok(());
        }
        if !(self.f0_hz.is_finite() && self.q.is_finite() && self.fs_hz.is_finite()) {
            return Err(FilterError::NonFinite);
        }
        if self.fs_hz <= 0.0 {
            return Err(FilterError::InvalidSampleRate);
        }
        if self.q <= 0.0 {
            return Err(FilterError::NonPositiveQ);
        }
        if self.f0_hz <= 0.0 {
            return Err(FilterError::NonPositiveFrequency);
        }
        let nyquist_hz = self.fs_hz * 0.5;
        if self.f0_hz >= nyquist_hz {
            return Err(FilterError::AboveNyquist {
                f0_hz: self.f0_hz,
                nyquist_hz,
            });
        }
        Ok(())
    }
}
/// Normalised second-order section coefficients (`a0 == 1`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}
impl BiquadCoeffs {
    pub const BYPASS: BiquadCoeffs = BiquadCoeffs {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };
    /// Audio-EQ cookbook design. Expects parameters that passed [`FilterParams::validate`].
    pub fn design(params: &FilterParams) -> Self {
        let omega = 2.0 * PI * params.f0_hz / params.fs_hz;
        let alpha = omega.sin() / (2.0 * params.q);
        let cos_w = omega.cos();
        match params.kind {
            FilterType::Bypass => Self::BYPASS,
            FilterType::Notch => {
                normalize(1.0, -2.0 * cos_w, 1.0, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
            }
            FilterType::Bandpass => {
                normalize(alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
            }
        }
    }
}
fn normalize(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> BiquadCoeffs {
    let a0_inv = 1.0 / a0;
    BiquadCoeffs {
        b0: b0 * a0_inv,
        b1: b1 * a0_inv,
        b2: b2 * a0_inv,
        a1: a1 * a0_inv,
        a2: a2 * a0_inv,
    }
}
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct BiquadHistory {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}
/// Single-channel second-order IIR section, Direct Form 1.
#[derive(Clone, Copy, Debug)]
pub struct BiquadFilter {
    params: FilterParams,
    coeffs: BiquadCoeffs,
    history: BiquadHistory,
}
impl BiquadFilter {
    pub fn new(params: FilterParams) -> Result<Self, FilterError> {
        params.validate()?;
        Ok(Self {
            params,
            coeffs: BiquadCoeffs::design(&params),
            history: BiquadHistory::default(),
        })
    }
    pub fn bypass(fs_hz: f64) -> Self {
        Self {
            params: FilterParams::bypass(fs_hz),
            coeffs: BiquadCoeffs::BYPASS,
            history: BiquadHistory::default(),
        }
    }
    /// Same filter with new coefficients; recurrence history carries over.
    pub fn update_coefficients(self, params: FilterParams) -> Self {
        Self {
            params,
            coeffs: BiquadCoeffs::design(&params),
            history: self.history,
        }
    }
    /// Validates and retunes in place. On error the current configuration stays active.
    pub fn set_params(&mut self, params: FilterParams) -> Result<(), FilterError> {
        params.validate()?;
        *self = self.update_coefficients(params);
        Ok(())
    }
    pub fn params(&self) -> &FilterParams {
        &self.params
    }
    pub fn coeffs(&self) -> &BiquadCoeffs {
        &self.coeffs
    }
    pub fn is_bypass(&self) -> bool {
        self.params.kind == FilterType::Bypass
    }
    #[inline]
    pub fn process(&mut self, x: f64) -> f64 {
        let c = &self.coeffs;
        let h = &mut self.history;
        let y = c.b0 * x + c.b1 * h.x1 + c.b2 * h.x2 - c.a1 * h.y1 - c.a2 * h.y2;
        h.x2 = h.x1;
        h.x1 = x;
        h.y2 = h.y1;
        h.y1 = y;
        y
    }
    pub fn reset(&mut self) {
        self.history = BiquadHistory::default();
    }
}
/// One biquad per [`FilterPurpose`], applied in slot order. Every slot starts as bypass.
#[derive(Clone, Debug)]
pub struct FilterChain {
    sections: [BiquadFilter; 2],
}
impl FilterChain {
    pub fn new(fs_hz: f64) -> Self {
        Self {
            sections: [BiquadFilter::bypass(fs_hz), BiquadFilter::bypass(fs_hz)],
        }
    }
    pub fn set(&mut self, purpose: FilterPurpose, params: FilterParams) -> Result<(), FilterError> {
        self.sections[purpose.slot()].set_params(params)
    }
    pub fn bypass(&mut self, purpose: FilterPurpose) {
        let section = &mut self.sections[purpose.slot()];
        let fs_hz = section.params().fs_hz;
        *section = section.update_coefficients(FilterParams::bypass(fs_hz));
    }
    pub fn get(&self, purpose: FilterPurpose) -> &BiquadFilter {
        &self.sections[purpose.slot()]
    }
    pub fn is_passthrough(&self) -> bool {
        self.sections.iter().all(BiquadFilter::is_bypass)
    }
    #[inline]
    pub fn process_sample(&mut self, mut value: f64) -> f64 {
        for section in &mut self.sections {
            value = section.process(value);
        }
        value
    }
    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }
}
