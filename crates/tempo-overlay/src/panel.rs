//! Panel sinks that display one metric each

use std::collections::VecDeque;

/// The three metrics the overlay can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    /// Frames per second
    Fps,
    /// CPU milliseconds per tick
    Cpu,
    /// GPU milliseconds per tick
    Gpu,
}

impl PanelKind {
    /// Slot in the overlay, which also drives the panel's layout offset
    pub fn index(self) -> usize {
        match self {
            Self::Fps => 0,
            Self::Cpu => 1,
            Self::Gpu => 2,
        }
    }

    /// Label drawn next to the value
    pub fn label(self) -> &'static str {
        match self {
            Self::Fps => "FPS",
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
        }
    }

    /// Foreground colour
    pub fn foreground(self) -> &'static str {
        match self {
            Self::Fps => "#0ff",
            Self::Cpu => "#0f0",
            Self::Gpu => "#ff0",
        }
    }

    /// Background colour
    pub fn background(self) -> &'static str {
        match self {
            Self::Fps => "#002",
            Self::Cpu => "#020",
            Self::Gpu => "#220",
        }
    }
}

/// Pixel footprint of a panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelSize {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl Default for PanelSize {
    fn default() -> Self {
        Self {
            width: 90.0,
            height: 48.0,
            pixel_ratio: 1.0,
        }
    }
}

/// Where a panel sits and whether it is shown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelPlacement {
    pub visible: bool,
    pub x: f64,
    pub y: f64,
}

/// Display sink for one metric
///
/// Receives a readout value, a graph value and the maxima to scale each against,
/// and redraws itself.
pub trait Panel {
    /// Label of the metric
    fn name(&self) -> &str;

    /// Redraw with new values, formatting the readout with `decimals` places
    fn update(&mut self, value: f64, graph_value: f64, max_value: f64, max_graph: f64, decimals: u32);

    fn size(&self) -> PanelSize {
        PanelSize::default()
    }

    /// Move or hide the panel
    fn place(&mut self, _placement: PanelPlacement) {}
}

/// Builds the panel for a metric when the overlay needs one
pub trait PanelFactory {
    fn create(&mut self, kind: PanelKind) -> Box<dyn Panel>;
}

impl<F> PanelFactory for F
where
    F: FnMut(PanelKind) -> Box<dyn Panel>,
{
    fn create(&mut self, kind: PanelKind) -> Box<dyn Panel> {
        self(kind)
    }
}

const GRAPH_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Terminal panel: a text readout plus a scrolling block-glyph graph
pub struct TextPanel {
    name: String,
    readout: String,
    graph: VecDeque<f64>,
    graph_width: usize,
    min_seen: f64,
    max_seen: f64,
    placement: PanelPlacement,
    updates: u64,
}

impl TextPanel {
    pub fn new(name: impl Into<String>, graph_width: usize) -> Self {
        Self {
            name: name.into(),
            readout: String::new(),
            graph: VecDeque::with_capacity(graph_width),
            graph_width,
            min_seen: f64::INFINITY,
            max_seen: 0.0,
            placement: PanelPlacement {
                visible: true,
                x: 0.0,
                y: 0.0,
            },
            updates: 0,
        }
    }

    /// Panel labelled for `kind` with a 30-column graph
    pub fn for_kind(kind: PanelKind) -> Self {
        Self::new(kind.label(), 30)
    }

    /// Last formatted readout, e.g. `"60 FPS (58-61)"`
    pub fn readout(&self) -> &str {
        &self.readout
    }

    /// Graph history as bar glyphs, oldest first
    pub fn graph_line(&self) -> String {
        self.graph
            .iter()
            .map(|ratio| {
                let level = (ratio * (GRAPH_GLYPHS.len() - 1) as f64).round() as usize;
                GRAPH_GLYPHS[level.min(GRAPH_GLYPHS.len() - 1)]
            })
            .collect()
    }

    /// Readout and graph on one line
    pub fn render(&self) -> String {
        format!("{:<24} {}", self.readout, self.graph_line())
    }

    /// Number of updates received
    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn placement(&self) -> PanelPlacement {
        self.placement
    }
}

impl Panel for TextPanel {
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, value: f64, graph_value: f64, _max_value: f64, max_graph: f64, decimals: u32) {
        self.min_seen = self.min_seen.min(value);
        self.max_seen = self.max_seen.max(value);
        let d = decimals as usize;
        self.readout = format!(
            "{:.d$} {} ({:.d$}-{:.d$})",
            value,
            self.name,
            self.min_seen,
            self.max_seen,
            d = d
        );

        let ratio = if max_graph > 0.0 {
            (graph_value / max_graph).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.graph.push_back(ratio);
        while self.graph.len() > self.graph_width {
            self.graph.pop_front();
        }
        self.updates += 1;
    }

    fn place(&mut self, placement: PanelPlacement) {
        self.placement = placement;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_slots() {
        assert_eq!(PanelKind::Fps.index(), 0);
        assert_eq!(PanelKind::Cpu.index(), 1);
        assert_eq!(PanelKind::Gpu.index(), 2);
        assert_eq!(PanelKind::Gpu.label(), "GPU");
        assert_eq!(PanelKind::Cpu.foreground(), "#0f0");
    }

    #[test]
    fn test_text_panel_readout() {
        let mut panel = TextPanel::for_kind(PanelKind::Fps);
        panel.update(60.0, 60.0, 100.0, 100.0, 0);
        panel.update(58.4, 58.4, 100.0, 100.0, 0);
        assert_eq!(panel.readout(), "58 FPS (58-60)");
        assert_eq!(panel.updates(), 2);
    }

    #[test]
    fn test_text_panel_precision() {
        let mut panel = TextPanel::for_kind(PanelKind::Cpu);
        panel.update(1.23456, 1.0, 2.0, 2.0, 2);
        assert_eq!(panel.readout(), "1.23 CPU (1.23-1.23)");
    }

    #[test]
    fn test_graph_scrolls_and_scales() {
        let mut panel = TextPanel::new("GPU", 3);
        for value in [0.0, 1.0, 2.0, 4.0] {
            panel.update(value, value, 4.0, 4.0, 1);
        }
        assert_eq!(panel.graph_line(), "▃▅█");
    }

    #[test]
    fn test_graph_clamps_above_max() {
        let mut panel = TextPanel::new("CPU", 4);
        panel.update(10.0, 10.0, 1.0, 1.0, 1);
        assert_eq!(panel.graph_line(), "█");
    }

    #[test]
    fn test_closure_factory() {
        let mut factory = |kind: PanelKind| -> Box<dyn Panel> { Box::new(TextPanel::for_kind(kind)) };
        let panel = factory.create(PanelKind::Gpu);
        assert_eq!(panel.name(), "GPU");
    }
}
