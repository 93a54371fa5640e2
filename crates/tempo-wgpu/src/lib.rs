//! Tempo wgpu - GPU timing through wgpu timestamp queries
//!
//! - `WgpuTimerContext` - `TimerQueryContext` over a device and queue
//! - `HeadlessSource` - obtain a timing-capable offscreen device

mod context;
mod source;

pub use context::{WgpuQuery, WgpuTimerContext, TIMER_FEATURES};
pub use source::{request_timer_device, HeadlessSource, TimerDeviceError};
