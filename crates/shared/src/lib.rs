//! Shared types and configuration for Tally.
//!
//! This crate provides common types used across all other crates:
//! - Money amounts with decimal precision and a fixed rounding rule
//! - Typed IDs for type-safe entity references
//! - Caller role sets
//! - Configuration management

pub mod config;
pub mod types;

pub use config::{AppConfig, EngineConfig, PeriodConfig};
