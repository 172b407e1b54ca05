use std::io::Cursor;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;
use crate::drivers::ScopeError;
use crate::view::{AlignedRow, ChannelSpectrum, SweepView};
#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
    /// Opacity of the previous sweep cycle.
    pub history_alpha: f64,
    pub scanner: RGBColor,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 900,
            height: 400,
            background: RGBColor(10, 10, 10),
            palette: vec![BLUE, RED, GREEN, CYAN, MAGENTA, YELLOW, WHITE],
            history_alpha: 0.35,
            scanner: WHITE,
        }
    }
}
impl PlotStyle {
    fn color(&self, idx: usize) -> RGBColor {
        self.palette
            .get(idx % self.palette.len().max(1))
            .copied()
            .unwrap_or(WHITE)
    }
}
/// Draws the history cycle dimmed, the active cycle on top and a vertical scanner line.
pub fn render_sweep_png(view: &SweepView, style: &PlotStyle) -> Result<Vec<u8>, ScopeError> {
    let Some(scanner) = view.scanner else {
        return Err(ScopeError::Plot("sweep has no samples".into()));
    };
    let (y_min, y_max) = value_bounds(view.active.iter().chain(&view.history).map(|s| s.value));
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .build_cartesian_2d(0f64..view.window_ms as f64, y_min..y_max)?;
        let color = style.color(0);
        let faded = color.mix(style.history_alpha);
        chart.draw_series(LineSeries::new(
            view.history.iter().map(|s| (s.time as f64, s.value)),
            &faded,
        ))?;
        chart.draw_series(LineSeries::new(
            view.active.iter().map(|s| (s.time as f64, s.value)),
            &color,
        ))?;
        let x = scanner as f64;
        chart.draw_series(LineSeries::new(
            vec![(x, y_min), (x, y_max)],
            &style.scanner,
        ))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
pub fn render_spectrum_png(
    spectrum: &ChannelSpectrum,
    style: &PlotStyle,
) -> Result<Vec<u8>, ScopeError> {
    if spectrum.magnitudes.is_empty() {
        return Err(ScopeError::Plot("spectrum has no magnitudes".into()));
    }
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let x_max = spectrum
            .frequencies_hz
            .last()
            .copied()
            .unwrap_or(0.0)
            .max(1e-3);
        let y_max = spectrum
            .magnitudes
            .iter()
            .copied()
            .fold(0.0f64, f64::max)
            .max(1e-3);
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;
        let color = style.color(spectrum.channel.index());
        let series = spectrum
            .frequencies_hz
            .iter()
            .copied()
            .zip(spectrum.magnitudes.iter().copied());
        chart.draw_series(LineSeries::new(series, &color))?;
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
/// Overlays aligned channels; every `None` cell breaks that channel's line.
pub fn render_overlay_png(rows: &[AlignedRow], style: &PlotStyle) -> Result<Vec<u8>, ScopeError> {
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Err(ScopeError::Plot("overlay has no rows".into()));
    };
    let (y_min, y_max) = value_bounds(rows.iter().flat_map(|r| r.values.iter().flatten().copied()));
    let x_min = first.time as f64;
    let x_max = (last.time as f64).max(x_min + 1.0);
    let channel_count = rows.iter().map(|r| r.values.len()).max().unwrap_or(0);
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
        for idx in 0..channel_count {
            let color = style.color(idx);
            for run in contiguous_runs(rows, idx) {
                chart.draw_series(LineSeries::new(run, &color))?;
            }
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn contiguous_runs(rows: &[AlignedRow], idx: usize) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for row in rows {
        match row.values.get(idx).copied().flatten() {
            Some(v) => current.push((row.time as f64, v)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}
fn value_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (min, max) = values.fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min > max {
        return (-50.0, 50.0);
    }
    // avoid a zero-height axis
    let pad = ((max - min) * 0.1).max(1.0);
    (min - pad, max + pad)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ScopeError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| ScopeError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
