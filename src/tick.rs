// src/tick.rs
// Render-tick scheduling for the engine thread.
use std::time::{Duration, Instant};
/// Decides when the engine should publish a snapshot.
pub trait TickSource {
    /// Returns true when a tick is due at `now`. A due tick is consumed by the call.
    fn poll(&mut self, now: Instant) -> bool;
}
/// Fires at most once per `period`. Missed ticks are not replayed.
pub struct FixedRateTicker {
    period: Duration,
    next_due: Option<Instant>,
}
impl FixedRateTicker {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            next_due: None,
        }
    }
    pub fn from_hz(hz: f64) -> Self {
        let hz = if hz.is_finite() && hz > 0.0 { hz } else { 60.0 };
        Self::new(Duration::from_secs_f64(1.0 / hz))
    }
    pub fn period(&self) -> Duration {
        self.period
    }
}
impl TickSource for FixedRateTicker {
    fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now < due => false,
            _ => {
                self.next_due = Some(now + self.period);
                true
            }
        }
    }
}
/// Ticks only when told to. For tests and offline rendering.
#[derive(Default)]
pub struct ManualTicker {
    pending: usize,
}
impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn fire(&mut self) {
        self.pending += 1;
    }
    pub fn pending(&self) -> usize {
        self.pending
    }
}
impl TickSource for ManualTicker {
    fn poll(&mut self, _now: Instant) -> bool {
        if self.pending == 0 {
            return false;
        }
        self.pending -= 1;
        true
    }
}
/// Fires on every poll.
pub struct EveryPoll;
impl TickSource for EveryPoll {
    fn poll(&mut self, _now: Instant) -> bool {
        true
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn fixed_rate_fires_once_per_period() {
        let mut ticker = FixedRateTicker::new(Duration::from_millis(20));
        let t0 = Instant::now();
        assert!(ticker.poll(t0));
        assert!(!ticker.poll(t0 + Duration::from_millis(5)));
        assert!(!ticker.poll(t0 + Duration::from_millis(19)));
        assert!(ticker.poll(t0 + Duration::from_millis(20)));
        // a long stall yields one tick, not a burst
        assert!(ticker.poll(t0 + Duration::from_millis(200)));
        assert!(!ticker.poll(t0 + Duration::from_millis(201)));
    }
    #[test]
    fn from_hz_falls_back_on_bad_rates() {
        assert_eq!(FixedRateTicker::from_hz(50.0).period(), Duration::from_millis(20));
        assert_eq!(
            FixedRateTicker::from_hz(0.0).period(),
            FixedRateTicker::from_hz(60.0).period()
        );
    }
    #[test]
    fn manual_ticker_counts_fires() {
        let mut ticker = ManualTicker::new();
        let now = Instant::now();
        assert!(!ticker.poll(now));
        ticker.fire();
        ticker.fire();
        assert!(ticker.poll(now));
        assert!(ticker.poll(now));
        assert!(!ticker.poll(now));
    }
}
