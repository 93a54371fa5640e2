//! Tempo Timing - Per-frame CPU and GPU measurement
//!
//! - `TimerQueryContext` - the query-capable GPU context the tracker drives
//! - `GpuQueryTracker` - fire-and-poll pool of in-flight timer queries
//! - `CpuProfiler` / `MarkerTimeline` - named-marker CPU bracketing

mod context;
mod cpu;
mod gpu;

pub use context::{NullContext, TimerQueryContext};
pub use cpu::{ClockTimeline, CpuProfiler, MarkerTimeline};
pub use gpu::{GpuPoll, GpuQueryTracker, NS_TO_MS};
