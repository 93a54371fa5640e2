//! Panel placement and visibility

use crate::panel::{PanelPlacement, PanelSize};
use tempo_core::StatsConfig;

/// Decides where each panel goes and which ones are shown
///
/// Full mode lines the panels up along one axis. Minimal mode stacks them at the
/// origin and shows only the selected one, advanced by [`cycle`](Self::cycle).
#[derive(Debug, Clone)]
pub struct PanelLayout {
    minimal: bool,
    horizontal: bool,
    mode: usize,
    /// Panel explicitly selected with `show_panel`; all panels shown when `None`
    shown: Option<usize>,
}

impl PanelLayout {
    pub fn new(config: &StatsConfig) -> Self {
        Self {
            minimal: config.minimal,
            horizontal: config.horizontal,
            mode: config.mode,
            shown: config.minimal.then_some(config.mode),
        }
    }

    /// Placement of the panel at `index`
    pub fn placement(&self, index: usize, size: PanelSize) -> PanelPlacement {
        let visible = self.shown.map_or(true, |shown| shown == index);
        if self.minimal {
            return PanelPlacement {
                visible,
                x: 0.0,
                y: 0.0,
            };
        }

        let offset = index as f64;
        let (x, y) = if self.horizontal {
            (offset * size.width / size.pixel_ratio, 0.0)
        } else {
            (0.0, offset * size.height / size.pixel_ratio)
        };
        PanelPlacement { visible, x, y }
    }

    /// Show only the panel at `id`
    pub fn show_panel(&mut self, id: usize) {
        self.shown = Some(id);
        self.mode = id;
    }

    /// Advance to the next of `panel_count` panels (the minimal-mode click action)
    ///
    /// Does nothing outside minimal mode.
    pub fn cycle(&mut self, panel_count: usize) -> usize {
        if self.minimal && panel_count > 0 {
            self.show_panel((self.mode + 1) % panel_count);
        }
        self.mode
    }

    /// Index of the selected panel
    pub fn mode(&self) -> usize {
        self.mode
    }

    /// Drop the selection if it points at a panel that was removed
    pub fn forget_panel(&mut self, index: usize) {
        if self.mode == index || self.shown == Some(index) {
            self.mode = 0;
            self.shown = self.minimal.then_some(0);
        }
    }
}
