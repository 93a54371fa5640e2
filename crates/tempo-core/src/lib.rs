//! Tempo Core - Foundational types for the Tempo frame-timing engine
//!
//! This crate provides the types the other Tempo crates depend on:
//! - `Clock` - Injectable millisecond time source (`SystemClock`, `ManualClock`)
//! - `SampleWindow` - Paired log/graph ring buffers for one metric
//! - `StatsConfig` - Display thresholds and overlay options
//! - Error types and Result alias

mod clock;
mod config;
mod error;
mod sample;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::StatsConfig;
pub use error::{Result, TempoError};
pub use sample::{SampleWindow, WindowSummary, MIN_SAMPLE_MAX};
