//! # Songshift Common Library
//!
//! Shared code for the songshift workspace:
//! - Common error type
//! - TOML bootstrap configuration and config file discovery
//! - User-agent string for outbound HTTP clients

pub mod config;
pub mod error;

pub use error::{Error, Result};
