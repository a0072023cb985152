/*
[INPUT]:  Reconnect delay parameters (initial, max, factor, jitter)
[OUTPUT]: Successive jittered delays for reconnection attempts
[POS]:    WebSocket layer - reconnect pacing
[UPDATE]: When changing the backoff curve or jitter strategy
*/

use rand::Rng;
use std::time::Duration;

/// Exponential backoff with uniform jitter.
///
/// Delays grow as `delay_initial * factor^n`, capped at `delay_max`, with
/// 0..=jitter_ms of additional random delay so reconnecting sessions do not
/// stampede the token service in lockstep.
#[derive(Debug, Clone)]
pub(crate) struct ExponentialBackoff {
    delay_initial: Duration,
    delay_max: Duration,
    factor: f64,
    jitter_ms: u64,
    current: Duration,
}

impl ExponentialBackoff {
    pub fn new(delay_initial: Duration, delay_max: Duration, factor: f64, jitter_ms: u64) -> Self {
        Self {
            delay_initial,
            delay_max,
            factor,
            jitter_ms,
            current: delay_initial,
        }
    }

    /// Next delay to wait before reconnecting
    pub fn next_duration(&mut self) -> Duration {
        let jitter = rand::thread_rng().gen_range(0..=self.jitter_ms);
        let delay = self.current + Duration::from_millis(jitter);
        let next = self.current.mul_f64(self.factor);
        self.current = next.min(self.delay_max);
        delay
    }

    /// Reset after a connection that reached the streaming phase
    pub fn reset(&mut self) {
        self.current = self.delay_initial;
    }
}
