//! Shared types, errors, and configuration for Bursar.
//!
//! This crate provides common types used across all other crates:
//! - Money helpers for minor-unit tolerances
//! - Typed IDs for type-safe entity references
//! - Application-wide error types and the error taxonomy
//! - Configuration management with explicit reload

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, ConfigHandle, PostingPolicy, ReconciliationConfig};
pub use error::{AppError, AppResult, ErrorKind};
