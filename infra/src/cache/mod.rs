//! Cache module for Redis-backed state
//!
//! Holds the Redis client and the stores that keep short-lived auth state in
//! Redis: outstanding OTP records and revoked tokens. Every key carries the
//! configured prefix and a TTL, so nothing needs periodic cleanup.

pub mod otp_store;
pub mod redis_client;
pub mod token_denylist;


pub use otp_store::RedisOtpStore;
pub use redis_client::RedisClient;
pub use token_denylist::RedisTokenDenylist;

pub use pa_shared::config::cache::CacheConfig;
