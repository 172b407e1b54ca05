use crate::types::Sample;
use crate::view::SweepView;
/// Where the scanner sits for a given newest timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepState {
    pub scanner_position: i64,
    pub cycle_start: i64,
}
impl SweepState {
    pub fn at(latest_time: i64, window_ms: i64) -> Self {
        let scanner_position = latest_time.rem_euclid(window_ms);
        Self {
            scanner_position,
            cycle_start: latest_time.saturating_sub(scanner_position),
        }
    }
}
/// Splits an ordered sample run into the current sweep cycle and the previous one,
/// both remapped onto `[0, window_ms)`.
///
/// `samples` must be sorted by time (a [`TimeWindowedBuffer`](super::TimeWindowedBuffer)
/// snapshot is). Anything older than `latest - window_ms` is ignored.
pub fn sweep(samples: &[Sample], window_ms: i64) -> SweepView {
    let Some(latest) = samples.last().map(|s| s.time) else {
        return SweepView::empty(window_ms);
    };
    if window_ms <= 0 {
        return SweepView::empty(window_ms);
    }
    let state = SweepState::at(latest, window_ms);
    let visible_from = latest.saturating_sub(window_ms);
    let first_visible = samples.partition_point(|s| s.time < visible_from);
    let split = samples.partition_point(|s| s.time < state.cycle_start);
    let remap = |s: &Sample| Sample::new(s.time.rem_euclid(window_ms), s.value);
    let mut history: Vec<Sample> = samples[first_visible..split.max(first_visible)]
        .iter()
        .map(remap)
        .collect();
    let mut active: Vec<Sample> = samples[split..].iter().map(remap).collect();
    // remapping can reorder points that straddle a wrap
    history.sort_by_key(|s| s.time);
    active.sort_by_key(|s| s.time);
    SweepView {
        window_ms,
        active,
        history,
        scanner: Some(state.scanner_position),
        cycle_start: Some(state.cycle_start),
    }
}
