//! Result/Stage pipeline combinators, resilience primitives, and the shared
//! error type used by every Wessley crate.

pub mod breaker;
pub mod constants;
pub mod context;
pub mod error;
pub mod limiter;
pub mod stage;

pub use breaker::{BreakerConfig, CircuitBreaker};
pub use context::Context;
pub use error::{Error, Result, ValidationKind};
pub use limiter::RateLimiter;
pub use stage::{
    par_map, par_map_result, retry, BatchStage, BoxFuture, BreakerStage, LimiterStage, MapStage,
    RetryOptions, Stage, Tap, Then,
};
