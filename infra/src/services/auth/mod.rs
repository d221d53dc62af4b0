//! Authentication-related infrastructure services

pub mod rate_limiter;

#[cfg(test)]
mod tests;

pub use rate_limiter::RedisRateLimiter;
