//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the wall core:
//! - Logging and tracing infrastructure
//! - Configuration management (builder, TOML files, environment overrides)
//!
//! ## Overview
//!
//! Crates that read configuration (auth, discovery, the service façade) take
//! their settings from [`config::AppConfig`]; everything logs through
//! `tracing` and is set up once by [`logging::init_logging`].

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
