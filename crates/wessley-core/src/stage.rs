//! Composable pipeline stages: `(Context, In) -> Result<Out>`.
//!
//! A [`Stage`] is any async function with this shape. The combinators in
//! this module build new stages out of existing ones without ever
//! short-circuiting silently — a failed stage's error always reaches the
//! caller unmodified.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::breaker::CircuitBreaker;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::limiter::RateLimiter;

/// A boxed future, used to erase the concrete future type a stage closure
/// returns so stages of different shapes can be composed uniformly.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Object-safe stage trait. `In`/`Out` are owned values passed by move,
/// matching the spec's `(Context, In) -> Result[Out]` contract.
pub trait Stage<In, Out>: Send + Sync {
    fn call<'a>(&'a self, ctx: Context, input: In) -> BoxFuture<'a, Result<Out>>
    where
        In: 'a;
}

/// Blanket impl so any `Fn(Context, In) -> impl Future<Output = Result<Out>>`
/// closure is usable as a `Stage` without a wrapper type.
impl<In, Out, F, Fut> Stage<In, Out> for F
where
    F: Fn(Context, In) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Out>> + Send + 'static,
    In: Send + 'static,
    Out: Send + 'static,
{
    fn call<'a>(&'a self, ctx: Context, input: In) -> BoxFuture<'a, Result<Out>>
    where
        In: 'a,
    {
        Box::pin(self(ctx, input))
    }
}

/// Sequential composition: `A -> B` then `B -> C` gives `A -> C`. If the
/// first stage errors, the second is never invoked.
pub struct Then<S1, S2> {
    first: S1,
    second: S2,
}

impl<S1, S2> Then<S1, S2> {
    pub fn new(first: S1, second: S2) -> Self {
        Then { first, second }
    }
}

impl<A, B, C, S1, S2> Stage<A, C> for Then<S1, S2>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    S1: Stage<A, B>,
    S2: Stage<B, C>,
{
    fn call<'a>(&'a self, ctx: Context, input: A) -> BoxFuture<'a, Result<C>>
    where
        A: 'a,
    {
        Box::pin(async move {
            let ctx2 = ctx.clone();
            let b = self.first.call(ctx, input).await?;
            self.second.call(ctx2, b).await
        })
    }
}

/// Runs `side_effect` for observation (logging, metrics) and returns the
/// input unchanged. Must never alter data or fail the pipeline — a panic in
/// `side_effect` is not caught, by design: `tap` callers are expected to be
/// infallible instrumentation, not business logic.
pub struct Tap<F> {
    side_effect: F,
}

impl<F> Tap<F> {
    pub fn new(side_effect: F) -> Self {
        Tap { side_effect }
    }
}

impl<T, F> Stage<T, T> for Tap<F>
where
    T: Send + Clone + 'static,
    F: Fn(&Context, &T) + Send + Sync,
{
    fn call<'a>(&'a self, ctx: Context, input: T) -> BoxFuture<'a, Result<T>>
    where
        T: 'a,
    {
        (self.side_effect)(&ctx, &input);
        Box::pin(async move { Ok(input) })
    }
}

/// Lifts a pure, assumed-infallible `T -> U` function into a stage. A panic
/// inside `f` is caught and reported as [`Error::Other`] rather than
/// unwinding through the pipeline.
pub struct MapStage<F> {
    f: F,
}

impl<F> MapStage<F> {
    pub fn new(f: F) -> Self {
        MapStage { f }
    }
}

impl<T, U, F> Stage<T, U> for MapStage<F>
where
    T: Send + std::panic::UnwindSafe + 'static,
    U: Send + 'static,
    F: Fn(T) -> U + Send + Sync + std::panic::RefUnwindSafe,
{
    fn call<'a>(&'a self, _ctx: Context, input: T) -> BoxFuture<'a, Result<U>>
    where
        T: 'a,
    {
        let result = std::panic::catch_unwind(|| (self.f)(input));
        Box::pin(async move {
            result.map_err(|_| Error::Other("map_stage: inner function panicked".into()))
        })
    }
}

/// Chunks a `Vec<T>` by `n`, invokes `inner` per chunk, and concatenates the
/// `Ok` outputs. The first `Err` short-circuits the whole batch.
pub struct BatchStage<S> {
    chunk_size: usize,
    inner: S,
}

impl<S> BatchStage<S> {
    pub fn new(chunk_size: usize, inner: S) -> Self {
        BatchStage {
            chunk_size: chunk_size.max(1),
            inner,
        }
    }
}

impl<T, U, S> Stage<Vec<T>, Vec<U>> for BatchStage<S>
where
    T: Send + Clone + 'static,
    U: Send + 'static,
    S: Stage<Vec<T>, Vec<U>>,
{
    fn call<'a>(&'a self, ctx: Context, input: Vec<T>) -> BoxFuture<'a, Result<Vec<U>>>
    where
        Vec<T>: 'a,
    {
        Box::pin(async move {
            let mut out = Vec::with_capacity(input.len());
            for chunk in input.chunks(self.chunk_size) {
                let produced = self.inner.call(ctx.clone(), chunk.to_vec()).await?;
                out.extend(produced);
            }
            Ok(out)
        })
    }
}

/// Retry options. See `spec.md` §4.1/§8 for the exact backoff law this
/// implements: `min(initial_wait * 2^k, max_wait)`, optionally jittered by
/// `uniform(0.5, 1.5)`.
#[derive(Debug, Clone, Copy)]
pub struct RetryOptions {
    pub max_attempts: u32,
    pub initial_wait: Duration,
    pub max_wait: Duration,
    pub jitter: bool,
}

impl Default for RetryOptions {
    fn default() -> Self {
        RetryOptions {
            max_attempts: 3,
            initial_wait: Duration::from_secs(3),
            max_wait: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryOptions {
    /// The backoff duration before retry attempt `attempt_index` (0-based).
    pub fn wait_for(&self, attempt_index: u32) -> Duration {
        let pow = 2u32.saturating_pow(attempt_index);
        let scaled = self.initial_wait.saturating_mul(pow);
        let capped = scaled.min(self.max_wait);
        if self.jitter {
            let factor = rand::thread_rng().gen_range(0.5..1.5);
            capped.mul_f64(factor)
        } else {
            capped
        }
    }
}

/// Repeatedly invokes `attempt_fn(ctx)` until it succeeds or `max_attempts`
/// is exhausted. Cancellation during the backoff sleep aborts immediately
/// with [`Error::Cancelled`] and no further attempts.
pub async fn retry<T, F, Fut>(ctx: &Context, opts: RetryOptions, attempt_fn: F) -> Result<T>
where
    F: Fn(Context) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = opts.max_attempts.max(1);
    let mut last_err = Error::Other("retry: max_attempts is zero".into());
    for attempt in 0..max_attempts {
        ctx.check()?;
        match attempt_fn(ctx.clone()).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                last_err = err;
                let is_last = attempt + 1 == max_attempts;
                if is_last {
                    break;
                }
                let wait = opts.wait_for(attempt);
                ctx.sleep(wait).await?;
            }
        }
    }
    Err(last_err)
}

/// Acquires a rate-limit token (blocking up to the context deadline) before
/// invoking `inner`.
pub struct LimiterStage<S> {
    limiter: Arc<RateLimiter>,
    inner: S,
}

impl<S> LimiterStage<S> {
    pub fn new(limiter: Arc<RateLimiter>, inner: S) -> Self {
        LimiterStage { limiter, inner }
    }
}

impl<T, U, S> Stage<T, U> for LimiterStage<S>
where
    T: Send + 'static,
    U: Send + 'static,
    S: Stage<T, U>,
{
    fn call<'a>(&'a self, ctx: Context, input: T) -> BoxFuture<'a, Result<U>>
    where
        T: 'a,
    {
        Box::pin(async move {
            self.limiter.wait(&ctx).await?;
            self.inner.call(ctx, input).await
        })
    }
}

/// Wraps execution of `inner` in a [`CircuitBreaker`].
pub struct BreakerStage<S> {
    breaker: Arc<CircuitBreaker>,
    inner: S,
}

impl<S> BreakerStage<S> {
    pub fn new(breaker: Arc<CircuitBreaker>, inner: S) -> Self {
        BreakerStage { breaker, inner }
    }
}

impl<T, U, S> Stage<T, U> for BreakerStage<S>
where
    T: Send + 'static,
    U: Send + 'static,
    S: Stage<T, U>,
{
    fn call<'a>(&'a self, ctx: Context, input: T) -> BoxFuture<'a, Result<U>>
    where
        T: 'a,
    {
        Box::pin(async move {
            self.breaker.clone().call(|| self.inner.call(ctx.clone(), input)).await
        })
    }
}

/// Bounded-concurrency map preserving input order, `T -> Result<U>` variant.
/// `n_workers == 0` means unbounded (one task per element).
pub async fn par_map_result<T, U, F, Fut>(n_workers: usize, items: Vec<T>, f: F) -> Vec<Result<U>>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<U>> + Send + 'static,
{
    use futures::stream::{self, StreamExt};

    let f = Arc::new(f);
    let concurrency = if n_workers == 0 { items.len().max(1) } else { n_workers };
    stream::iter(items.into_iter())
        .map(|item| {
            let f = f.clone();
            async move { f(item).await }
        })
        .buffered(concurrency)
        .collect::<Vec<_>>()
        .await
}

/// Infallible convenience wrapper over [`par_map_result`] for pure mapping
/// functions.
pub async fn par_map<T, U, F, Fut>(n_workers: usize, items: Vec<T>, f: F) -> Vec<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = U> + Send + 'static,
{
    use futures::stream::{self, StreamExt};

    let f = Arc::new(f);
    let concurrency = if n_workers == 0 { items.len().max(1) } else { n_workers };
    stream::iter(items.into_iter())
        .map(|item| {
            let f = f.clone();
            async move { f(item).await }
        })
        .buffered(concurrency)
        .collect::<Vec<_>>()
        .await
}
