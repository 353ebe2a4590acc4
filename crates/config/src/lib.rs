//! Configuration module for audiomirror
//!
//! Handles loading the optional configuration file and environment variable overrides.

pub mod config;

pub use config::*;
