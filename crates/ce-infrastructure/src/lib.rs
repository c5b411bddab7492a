//! # Infrastructure Layer
//!
//! Cross-cutting concerns: configuration loading, logging, the temp-file
//! workspace, and the bootstrap wiring that assembles providers, stores and
//! services into an application context.

/// Application wiring
pub mod bootstrap;
/// Configuration types and loader
pub mod config;
/// Structured logging with tracing
pub mod logging;
/// Temp-file workspace service
pub mod workspace;
