//! Role resolution: which profile a verified phone activates

mod resolver;

#[cfg(test)]
mod tests;

pub use resolver::{Resolution, RoleResolver};
