//! Utility modules: configuration, logging and source positions

pub mod config;
pub mod logger;
pub mod span;
