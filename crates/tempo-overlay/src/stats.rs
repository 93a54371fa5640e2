//! Frame pacing and aggregation

use crate::layout::PanelLayout;
use crate::panel::{Panel, PanelFactory, PanelKind};
use crate::target::{ContextSource, InitTarget};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use tempo_core::{Clock, Result, SampleWindow, StatsConfig, SystemClock, TempoError};
use tempo_timing::{ClockTimeline, CpuProfiler, GpuQueryTracker, NullContext, TimerQueryContext};

const CPU_STARTED: &str = "cpu-started";
const CPU_FINISHED: &str = "cpu-finished";
const CPU_DURATION: &str = "cpu-duration";

/// Interval between fps readouts
const FPS_INTERVAL_MS: f64 = 1000.0;
/// Fixed scale of the fps panel
const FPS_PANEL_MAX: f64 = 100.0;

/// Copy of the engine's numbers, safe to hand to another thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// CPU time folded in by the last `update`
    pub cpu_ms: f64,
    /// GPU time folded in by the last `update`; `None` when no query completed
    /// that tick (no context, still in flight, or discarded as disjoint)
    pub gpu_ms: Option<f64>,
    /// Last computed frame rate
    pub fps: Option<f64>,
    pub cpu_average_ms: f64,
    pub cpu_max_ms: f64,
    pub gpu_average_ms: f64,
    pub gpu_max_ms: f64,
    /// GPU queries awaiting readback
    pub pending_gpu_queries: usize,
    /// GPU results dropped over the engine's lifetime because of a disjoint clock
    pub discarded_gpu_queries: u64,
    pub gpu_supported: bool,
}

/// The performance overlay engine
///
/// Call [`begin`](Self::begin) and [`end`](Self::end) around each rendered frame
/// and [`update`](Self::update) once per display tick. CPU/GPU panels refresh
/// `logs_per_second` times a second; the fps panel once a second.
pub struct Stats<C: TimerQueryContext = NullContext> {
    config: StatsConfig,
    clock: Rc<dyn Clock>,
    cpu: CpuProfiler,
    gpu: Option<GpuQueryTracker<C>>,
    cpu_window: SampleWindow,
    gpu_window: SampleWindow,
    panel_factory: Box<dyn PanelFactory>,
    panels: Vec<(PanelKind, Box<dyn Panel>)>,
    layout: PanelLayout,
    renderer_bound: bool,

    begin_time: f64,
    prev_fps_time: f64,
    prev_display_time: f64,
    frames: u32,
    render_count: u64,
    total_cpu_ms: f64,
    total_gpu_ms: f64,

    last_cpu_ms: f64,
    last_gpu_ms: Option<f64>,
    last_fps: Option<f64>,
    discarded_gpu_queries: u64,
}

impl<C: TimerQueryContext> Stats<C> {
    /// Create an overlay timed by the system clock
    pub fn new(config: StatsConfig, panel_factory: impl PanelFactory + 'static) -> Self {
        Self::with_clock(config, Rc::new(SystemClock::new()), panel_factory)
    }

    /// Create an overlay timed by `clock`
    ///
    /// An invalid configuration is replaced by the defaults.
    pub fn with_clock(
        config: StatsConfig,
        clock: Rc<dyn Clock>,
        panel_factory: impl PanelFactory + 'static,
    ) -> Self {
        let cpu = CpuProfiler::new(Box::new(ClockTimeline::new(clock.clone())));
        Self::with_profiler(config, clock, cpu, panel_factory)
    }

    /// Create an overlay with an explicit CPU profiler
    pub fn with_profiler(
        config: StatsConfig,
        clock: Rc<dyn Clock>,
        cpu: CpuProfiler,
        panel_factory: impl PanelFactory + 'static,
    ) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                log::warn!("{}; falling back to default overlay settings", e);
                StatsConfig::default()
            }
        };

        let now = clock.now_ms();
        let mut stats = Self {
            cpu_window: SampleWindow::new(config.samples_log, config.samples_graph),
            gpu_window: SampleWindow::new(config.samples_log, config.samples_graph),
            layout: PanelLayout::new(&config),
            config,
            clock,
            cpu,
            gpu: None,
            panel_factory: Box::new(panel_factory),
            panels: Vec::new(),
            renderer_bound: false,
            begin_time: now,
            prev_fps_time: now,
            prev_display_time: now,
            frames: 0,
            render_count: 0,
            total_cpu_ms: 0.0,
            total_gpu_ms: 0.0,
            last_cpu_ms: 0.0,
            last_gpu_ms: None,
            last_fps: None,
            discarded_gpu_queries: 0,
        };
        stats.add_panel(PanelKind::Fps);
        stats.add_panel(PanelKind::Cpu);
        stats
    }

    /// Bind the overlay to a GPU context
    ///
    /// Failures are logged and returned but never fatal: the overlay keeps
    /// measuring CPU time and frame rate without a context.
    pub fn init<S>(&mut self, target: Option<InitTarget<S>>) -> Result<()>
    where
        S: ContextSource<Context = C>,
    {
        let Some(target) = target else {
            log::error!("Stats: no context target was provided");
            return Err(TempoError::MissingTarget);
        };

        let is_renderer = matches!(target, InitTarget::Renderer(_));
        if is_renderer && self.renderer_bound {
            log::warn!("Stats: a renderer is already bound; ignoring the second one");
            return Ok(());
        }

        let kind = target.describe();
        let context = match target {
            InitTarget::Context(context) => context,
            InitTarget::Surface(mut source) | InitTarget::Renderer(mut source) => {
                source.acquire_context().inspect_err(|e| {
                    log::error!("Stats: unable to obtain a context from the {}: {}", kind, e);
                })?
            }
        };

        if is_renderer {
            self.renderer_bound = true;
        }
        self.bind_context(context);
        Ok(())
    }

    fn bind_context(&mut self, context: C) {
        if self.gpu.take().is_some() {
            log::debug!("Stats: replacing the bound context; in-flight queries are dropped");
        }

        let tracker = GpuQueryTracker::new(context);
        if !tracker.is_supported() {
            log::info!("Stats: context has no timer-query support; GPU panel disabled");
            self.remove_panel(PanelKind::Gpu);
            return;
        }

        if self.panel(PanelKind::Gpu).is_none() {
            self.add_panel(PanelKind::Gpu);
        }
        self.gpu = Some(tracker);
    }

    fn add_panel(&mut self, kind: PanelKind) {
        let panel = self.panel_factory.create(kind);
        self.panels.push((kind, panel));
        self.relayout();
    }

    fn remove_panel(&mut self, kind: PanelKind) {
        let count = self.panels.len();
        self.panels.retain(|(k, _)| *k != kind);
        if self.panels.len() == count {
            return;
        }

        if kind == PanelKind::Gpu {
            self.gpu_window.clear();
        }
        self.layout.forget_panel(kind.index());
        self.relayout();
    }

    fn relayout(&mut self) {
        for (kind, panel) in self.panels.iter_mut() {
            let placement = self.layout.placement(kind.index(), panel.size());
            panel.place(placement);
        }
    }

    /// Start measuring a frame
    pub fn begin(&mut self) {
        self.cpu.begin_frame(CPU_STARTED);
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.begin_frame();
        }
    }

    /// Finish measuring a frame
    pub fn end(&mut self) {
        self.render_count += 1;
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.end_frame();
        }
    }

    /// Run `draw` as one measured frame
    pub fn instrument<T>(&mut self, draw: impl FnOnce() -> T) -> T {
        self.begin();
        let out = draw();
        self.end();
        out
    }

    /// Fold this tick's measurements in and refresh panels that are due
    pub fn update(&mut self) {
        self.last_gpu_ms = None;
        if let Some(gpu) = self.gpu.as_mut() {
            let poll = gpu.poll_completed();
            self.total_gpu_ms += poll.elapsed_ms;
            self.discarded_gpu_queries += poll.discarded as u64;
            if poll.has_samples() {
                self.last_gpu_ms = Some(self.total_gpu_ms);
            }
            gpu.reset_render_count();
        }

        self.cpu.end_frame(CPU_STARTED, CPU_FINISHED, CPU_DURATION);
        self.total_cpu_ms += self.cpu.take_accumulated();

        self.cpu_window.push(self.total_cpu_ms);
        self.gpu_window.push(self.total_gpu_ms);
        self.last_cpu_ms = self.total_cpu_ms;

        self.render_count = 0;
        self.total_cpu_ms = 0.0;
        self.total_gpu_ms = 0.0;

        self.begin_time = self.tick();
    }

    /// Advance the frame counter and push whatever the thresholds allow
    fn tick(&mut self) -> f64 {
        self.frames += 1;
        let now = self.clock.now_ms();

        if now >= self.prev_display_time + self.config.display_interval_ms() {
            self.push_window(PanelKind::Cpu);
            self.push_window(PanelKind::Gpu);
            self.prev_display_time = now;
        }

        if now >= self.prev_fps_time + FPS_INTERVAL_MS {
            let fps = self.frames as f64 * 1000.0 / (now - self.prev_fps_time);
            if let Some(panel) = self.panel_mut(PanelKind::Fps) {
                panel.update(fps, fps, FPS_PANEL_MAX, FPS_PANEL_MAX, 0);
            }
            self.last_fps = Some(fps);
            self.prev_fps_time = now;
            self.frames = 0;
        }

        now
    }

    fn push_window(&mut self, kind: PanelKind) {
        let window = match kind {
            PanelKind::Cpu => &self.cpu_window,
            PanelKind::Gpu => &self.gpu_window,
            PanelKind::Fps => return,
        };
        let Some(summary) = window.summary() else {
            return;
        };
        let precision = self.config.precision;
        if let Some(panel) = self.panel_mut(kind) {
            panel.update(
                summary.average,
                summary.graph_average,
                summary.max,
                summary.graph_max,
                precision,
            );
        }
    }

    /// Show only the panel at `id`
    pub fn show_panel(&mut self, id: usize) {
        self.layout.show_panel(id);
        self.relayout();
    }

    /// Click action: in minimal mode, show the next panel
    pub fn cycle_panel(&mut self) -> usize {
        let mode = self.layout.cycle(self.panels.len());
        self.relayout();
        mode
    }

    pub fn panel(&self, kind: PanelKind) -> Option<&dyn Panel> {
        self.panels
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, panel)| &**panel)
    }

    fn panel_mut(&mut self, kind: PanelKind) -> Option<&mut Box<dyn Panel>> {
        self.panels
            .iter_mut()
            .find(|(k, _)| *k == kind)
            .map(|(_, panel)| panel)
    }

    /// Kinds of the panels currently attached, in display order
    pub fn panel_kinds(&self) -> Vec<PanelKind> {
        self.panels.iter().map(|(kind, _)| *kind).collect()
    }

    /// Copy out the current numbers
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cpu_ms: self.last_cpu_ms,
            gpu_ms: self.last_gpu_ms,
            fps: self.last_fps,
            cpu_average_ms: self.cpu_window.average(),
            cpu_max_ms: self.cpu_window.max(),
            gpu_average_ms: self.gpu_window.average(),
            gpu_max_ms: self.gpu_window.max(),
            pending_gpu_queries: self.gpu.as_ref().map_or(0, |gpu| gpu.pending_len()),
            discarded_gpu_queries: self.discarded_gpu_queries,
            gpu_supported: self.gpu.is_some(),
        }
    }

    pub fn config(&self) -> &StatsConfig {
        &self.config
    }

    pub fn cpu_window(&self) -> &SampleWindow {
        &self.cpu_window
    }

    pub fn gpu_window(&self) -> &SampleWindow {
        &self.gpu_window
    }

    /// The GPU tracker, present once a query-capable context is bound
    pub fn gpu(&self) -> Option<&GpuQueryTracker<C>> {
        self.gpu.as_ref()
    }

    pub fn gpu_mut(&mut self) -> Option<&mut GpuQueryTracker<C>> {
        self.gpu.as_mut()
    }

    /// Frames ended since the last `update`
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Time of the last `update`
    pub fn begin_time(&self) -> f64 {
        self.begin_time
    }

    /// Index of the selected panel
    pub fn mode(&self) -> usize {
        self.layout.mode()
    }

    /// Whether a renderer target has been bound
    pub fn is_renderer_bound(&self) -> bool {
        self.renderer_bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::TextPanel;
    use tempo_core::ManualClock;

    fn text_stats(clock: &ManualClock, config: StatsConfig) -> Stats {
        Stats::with_clock(config, Rc::new(clock.clone()), |kind: PanelKind| -> Box<dyn Panel> {
            Box::new(TextPanel::for_kind(kind))
        })
    }

    #[test]
    fn test_starts_with_fps_and_cpu_panels() {
        let clock = ManualClock::new();
        let stats = text_stats(&clock, StatsConfig::default());
        assert_eq!(stats.panel_kinds(), vec![PanelKind::Fps, PanelKind::Cpu]);
        assert!(!stats.snapshot().gpu_supported);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let clock = ManualClock::new();
        let stats = text_stats(
            &clock,
            StatsConfig {
                samples_log: 0,
                ..StatsConfig::default()
            },
        );
        assert_eq!(stats.config(), &StatsConfig::default());
    }

    #[test]
    fn test_missing_target_is_reported() {
        let clock = ManualClock::new();
        let mut stats = text_stats(&clock, StatsConfig::default());
        let err = stats
            .init::<crate::ReadyContext<NullContext>>(None)
            .unwrap_err();
        assert!(matches!(err, TempoError::MissingTarget));
        assert!(stats.gpu().is_none());
    }

    #[test]
    fn test_context_without_queries_stays_cpu_only() {
        let clock = ManualClock::new();
        let mut stats = text_stats(&clock, StatsConfig::default());
        stats.init(Some(InitTarget::context(NullContext))).unwrap();
        assert!(stats.gpu().is_none());
        assert_eq!(stats.panel_kinds().len(), 2);
    }

    #[test]
    fn test_cpu_time_lands_in_window() {
        let clock = ManualClock::new();
        let mut stats = text_stats(&clock, StatsConfig::default());

        stats.begin();
        clock.advance(3.0);
        stats.end();
        stats.update();

        assert_eq!(stats.cpu_window().len(), 1);
        assert!((stats.snapshot().cpu_ms - 3.0).abs() < 1e-10);
        assert_eq!(stats.snapshot().gpu_ms, None);
        assert_eq!(stats.render_count(), 0);
    }

    #[test]
    fn test_instrument_brackets_frame() {
        let clock = ManualClock::new();
        let mut stats = text_stats(&clock, StatsConfig::default());
        let value = stats.instrument(|| {
            clock.advance(2.0);
            7
        });
        assert_eq!(value, 7);
        assert_eq!(stats.render_count(), 1);
        stats.update();
        assert!((stats.snapshot().cpu_ms - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_begin_time_follows_update() {
        let clock = ManualClock::starting_at(500.0);
        let mut stats = text_stats(&clock, StatsConfig::default());
        assert_eq!(stats.begin_time(), 500.0);
        clock.advance(12.0);
        stats.update();
        assert_eq!(stats.begin_time(), 512.0);
    }

    #[test]
    fn test_cycle_panel_in_minimal_mode() {
        let clock = ManualClock::new();
        let mut stats = text_stats(
            &clock,
            StatsConfig {
                minimal: true,
                ..StatsConfig::default()
            },
        );
        assert_eq!(stats.mode(), 0);
        assert_eq!(stats.cycle_panel(), 1);
        assert_eq!(stats.cycle_panel(), 0);
    }
}
