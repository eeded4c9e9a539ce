//! Three-state circuit breaker (§4.2).

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            State::Closed => "closed",
            State::Open => "open",
            State::HalfOpen => "half-open",
        };
        f.write_str(s)
    }
}

struct Inner {
    state: State,
    consecutive_failures: u32,
    open_since: Option<Instant>,
    half_open_probes_in_flight: u32,
}

/// Configuration for [`CircuitBreaker`].
#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    pub fail_threshold: u32,
    pub timeout: Duration,
    pub half_open_max: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        BreakerConfig {
            fail_threshold: 5,
            timeout: Duration::from_secs(30),
            half_open_max: 1,
        }
    }
}

/// Protects a fallible operation: after `fail_threshold` consecutive
/// failures it stops calling through (`Open`) for `timeout`, then admits a
/// bounded number of probes (`HalfOpen`) to decide whether to close again.
pub struct CircuitBreaker {
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig) -> Self {
        CircuitBreaker {
            config,
            inner: Mutex::new(Inner {
                state: State::Closed,
                consecutive_failures: 0,
                open_since: None,
                half_open_probes_in_flight: 0,
            }),
        }
    }

    fn state_str(&self) -> &'static str {
        match self.inner.lock().state {
            State::Closed => "closed",
            State::Open => "open",
            State::HalfOpen => "half-open",
        }
    }

    /// Current state as the canonical string representation.
    pub fn state(&self) -> &'static str {
        self.state_str()
    }

    /// Decide, while holding the lock only briefly, whether this call is
    /// admitted and under which regime. Returns `None` if rejected.
    fn admit(&self) -> Option<State> {
        let mut inner = self.inner.lock();
        match inner.state {
            State::Closed => Some(State::Closed),
            State::Open => {
                let since = inner.open_since.unwrap_or_else(Instant::now);
                if since.elapsed() >= self.config.timeout {
                    inner.state = State::HalfOpen;
                    inner.half_open_probes_in_flight = 1;
                    Some(State::HalfOpen)
                } else {
                    None
                }
            }
            State::HalfOpen => {
                if inner.half_open_probes_in_flight < self.config.half_open_max {
                    inner.half_open_probes_in_flight += 1;
                    Some(State::HalfOpen)
                } else {
                    None
                }
            }
        }
    }

    fn record_result(&self, regime: State, ok: bool) {
        let mut inner = self.inner.lock();
        match regime {
            State::Closed => {
                if ok {
                    inner.consecutive_failures = 0;
                } else {
                    inner.consecutive_failures += 1;
                    if inner.consecutive_failures >= self.config.fail_threshold {
                        inner.state = State::Open;
                        inner.open_since = Some(Instant::now());
                    }
                }
            }
            State::HalfOpen => {
                inner.half_open_probes_in_flight = inner.half_open_probes_in_flight.saturating_sub(1);
                if ok {
                    inner.state = State::Closed;
                    inner.consecutive_failures = 0;
                    inner.open_since = None;
                } else {
                    inner.state = State::Open;
                    inner.open_since = Some(Instant::now());
                }
            }
            State::Open => {}
        }
    }

    /// Runs `f` if the breaker admits the call; the protected call itself
    /// runs outside the lock.
    pub async fn call<T, F, Fut>(self: &Arc<Self>, f: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let Some(regime) = self.admit() else {
            return Err(Error::CircuitOpen);
        };
        let result = f().await;
        self.record_result(regime, result.is_ok());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(fail_threshold: u32, timeout: Duration) -> Arc<CircuitBreaker> {
        Arc::new(CircuitBreaker::new(BreakerConfig {
            fail_threshold,
            timeout,
            half_open_max: 1,
        }))
    }

    #[tokio::test]
    async fn opens_after_threshold_consecutive_failures() {
        let b = breaker(3, Duration::from_secs(30));
        for _ in 0..3 {
            let _ = b.call(|| async { Err::<(), _>(Error::Other("x".into())) }).await;
        }
        assert_eq!(b.state(), "open");
        let result = b.call(|| async { Ok::<(), Error>(()) }).await;
        assert!(matches!(result, Err(Error::CircuitOpen)));
    }

    #[tokio::test]
    async fn success_resets_consecutive_failures() {
        let b = breaker(3, Duration::from_secs(30));
        let _ = b.call(|| async { Err::<(), _>(Error::Other("x".into())) }).await;
        let _ = b.call(|| async { Ok::<(), Error>(()) }).await;
        let _ = b.call(|| async { Err::<(), _>(Error::Other("x".into())) }).await;
        let _ = b.call(|| async { Err::<(), _>(Error::Other("x".into())) }).await;
        // Only 2 consecutive failures since the reset — still closed.
        assert_eq!(b.state(), "closed");
    }

    #[tokio::test]
    async fn transitions_to_half_open_after_timeout_then_closes_on_success() {
        let b = breaker(1, Duration::from_millis(20));
        let _ = b.call(|| async { Err::<(), _>(Error::Other("x".into())) }).await;
        assert_eq!(b.state(), "open");
        tokio::time::sleep(Duration::from_millis(30)).await;
        let result = b.call(|| async { Ok::<(), Error>(()) }).await;
        assert!(result.is_ok());
        assert_eq!(b.state(), "closed");
    }

    #[tokio::test]
    async fn half_open_probe_failure_reopens_with_reset_timer() {
        let b = breaker(1, Duration::from_millis(20));
        let _ = b.call(|| async { Err::<(), _>(Error::Other("x".into())) }).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        let result = b.call(|| async { Err::<(), _>(Error::Other("still broken".into())) }).await;
        assert!(result.is_err());
        assert_eq!(b.state(), "open");
    }

    #[tokio::test]
    async fn half_open_admits_at_most_configured_probes() {
        let b = Arc::new(CircuitBreaker::new(BreakerConfig {
            fail_threshold: 1,
            timeout: Duration::from_millis(10),
            half_open_max: 1,
        }));
        let _ = b.call(|| async { Err::<(), _>(Error::Other("x".into())) }).await;
        tokio::time::sleep(Duration::from_millis(15)).await;
        // Admit returns HalfOpen for the first caller and flips the shared
        // state; simulate a concurrent second caller by calling admit twice
        // before either completes.
        let first_admit = b.admit();
        let second_admit = b.admit();
        assert!(first_admit.is_some());
        assert!(second_admit.is_none());
    }
}
