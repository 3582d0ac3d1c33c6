//! Concrete backends for the bus abstractions

pub mod json;
pub mod redis;

#[cfg(test)]
pub mod mock;
