//! Tempo Overlay - Frame pacing, aggregation and display
//!
//! `Stats` ties the CPU profiler and GPU query tracker to a pair of sample
//! windows and pushes smoothed numbers to `Panel` sinks:
//! - `Stats` / `StatsSnapshot` - the per-frame/per-tick engine
//! - `Panel`, `PanelFactory`, `TextPanel` - display sinks
//! - `PanelLayout` - placement and minimal-mode cycling
//! - `InitTarget`, `ContextSource` - binding to a GPU context

mod layout;
mod panel;
mod stats;
mod target;

pub use layout::PanelLayout;
pub use panel::{Panel, PanelFactory, PanelKind, PanelPlacement, PanelSize, TextPanel};
pub use stats::{Stats, StatsSnapshot};
pub use target::{ContextSource, InitTarget, ReadyContext};
