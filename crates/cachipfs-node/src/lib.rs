//! cachipfs-node - HTTP gateway and CLI for the CachIPFS node
//!
//! This library provides:
//! - `web`: axum router for the content route and health check
//! - `serve`: listener, graceful shutdown and signal handling
//! - `commands`: one-shot add/probe/get/config commands
//! - `settings`: file config to store client config
//! - `telemetry`: tracing subscriber with optional OTLP export

pub mod commands;
pub mod serve;
pub mod settings;
pub mod telemetry;
pub mod web;
