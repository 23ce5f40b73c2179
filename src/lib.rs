//! printwatch - Live 3D printer telemetry
//!
//! This library polls a printer REST backend for live telemetry of the
//! selected printer, tracks connection staleness, and suspends polling after
//! repeated failures until the operator retries or sends a command.

pub mod cli;
pub mod client;
pub mod config;
pub mod logging;
pub mod poller;
pub mod registry;
pub mod telemetry;
