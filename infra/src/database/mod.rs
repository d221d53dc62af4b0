//! Database module - MySQL implementations using SQLx
//!
//! Connection pool management, embedded migrations and the user/profile
//! repositories backing the identity store.

pub mod connection;
pub mod mysql;


pub use connection::{DatabasePool, PoolStatistics};
pub use mysql::{MySqlProfileRepository, MySqlUserRepository};
