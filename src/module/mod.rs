//! Runnable modules containing each bundling multiple services and providing a unified configuration

pub mod options;

pub mod broadcaster;
pub mod image;
pub mod todo;
