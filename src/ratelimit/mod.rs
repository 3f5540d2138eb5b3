//! Rate limiting module
//!
//! Provides sliding-window request rate limiting keyed by opaque strings.

mod limiter;

pub use limiter::{RateLimiter, RateLimiterStats};
