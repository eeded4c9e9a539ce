//! Token-bucket rate limiter (§4.2).

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::context::Context;
use crate::error::{Error, Result};

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// A single-tenant token-bucket limiter. `rate` tokens are added per second
/// (lazily, on each call), capped at `burst`. `rate = 0` means the bucket
/// never refills once drained.
pub struct RateLimiter {
    rate: f64,
    burst: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    pub fn new(rate: f64, burst: f64) -> Self {
        let burst = if burst <= 0.0 { 1.0 } else { burst };
        let rate = rate.max(0.0);
        RateLimiter {
            rate,
            burst,
            bucket: Mutex::new(Bucket {
                tokens: burst,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill(&self, bucket: &mut Bucket) {
        if self.rate <= 0.0 {
            bucket.last_refill = Instant::now();
            return;
        }
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.rate).min(self.burst);
        bucket.last_refill = now;
    }

    /// Non-blocking: consumes one token if available.
    pub fn allow(&self) -> bool {
        let mut bucket = self.bucket.lock();
        self.refill(&mut bucket);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Blocks (honouring `ctx` cancellation) until a token is available.
    pub async fn wait(&self, ctx: &Context) -> Result<()> {
        loop {
            ctx.check()?;
            let wait_for = {
                let mut bucket = self.bucket.lock();
                self.refill(&mut bucket);
                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    None
                } else if self.rate <= 0.0 {
                    // Never refills: without a deadline this would hang
                    // forever, so fail fast rather than wait indefinitely.
                    return Err(Error::RateLimited);
                } else {
                    let deficit = 1.0 - bucket.tokens;
                    Some(Duration::from_secs_f64(deficit / self.rate))
                }
            };
            match wait_for {
                None => return Ok(()),
                Some(d) => ctx.sleep(d.max(Duration::from_millis(1))).await?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_drains_burst_then_refuses() {
        let limiter = RateLimiter::new(1.0, 3.0);
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }

    #[test]
    fn zero_rate_never_refills() {
        let limiter = RateLimiter::new(0.0, 1.0);
        assert!(limiter.allow());
        assert!(!limiter.allow());
        std::thread::sleep(Duration::from_millis(20));
        assert!(!limiter.allow());
    }

    #[test]
    fn burst_coerced_to_one_when_nonpositive() {
        let limiter = RateLimiter::new(1.0, 0.0);
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }

    #[tokio::test]
    async fn wait_blocks_until_refill() {
        let limiter = RateLimiter::new(100.0, 1.0);
        let ctx = Context::background();
        limiter.wait(&ctx).await.unwrap();
        let started = Instant::now();
        limiter.wait(&ctx).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(5));
    }

    #[tokio::test]
    async fn wait_returns_cancellation_error() {
        let limiter = RateLimiter::new(0.01, 1.0);
        limiter.allow();
        let ctx = Context::background();
        ctx.cancel();
        let result = limiter.wait(&ctx).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn concurrent_waiters_all_eventually_proceed() {
        use std::sync::Arc;
        let limiter = Arc::new(RateLimiter::new(1000.0, 5.0));
        let mut handles = Vec::new();
        for _ in 0..5 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                let ctx = Context::background();
                limiter.wait(&ctx).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
    }
}
