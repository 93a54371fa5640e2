//! Run command - a paced render loop measured by the overlay

use super::load_config;
use anyhow::{Context, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tempo_overlay::{InitTarget, Panel, PanelKind, PanelPlacement, Stats, TextPanel};
use tempo_timing::{NullContext, TimerQueryContext};
use tempo_wgpu::{HeadlessSource, WgpuTimerContext};

pub struct RunArgs {
    pub frames: u32,
    pub work_ms: f64,
    pub target_fps: u32,
    pub config: Option<String>,
    pub wgpu: bool,
    pub minimal: bool,
    pub json: bool,
}

/// Latest rendered line and visibility of each panel, keyed by slot
type Board = Rc<RefCell<BTreeMap<usize, (String, bool)>>>;

/// Text panel that publishes its line to the shared board
struct ConsolePanel {
    kind: PanelKind,
    inner: TextPanel,
    board: Board,
    visible: bool,
}

impl ConsolePanel {
    fn publish(&self) {
        self.board
            .borrow_mut()
            .insert(self.kind.index(), (self.inner.render(), self.visible));
    }
}

impl Panel for ConsolePanel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn update(&mut self, value: f64, graph_value: f64, max_value: f64, max_graph: f64, decimals: u32) {
        self.inner.update(value, graph_value, max_value, max_graph, decimals);
        self.publish();
    }

    fn place(&mut self, placement: PanelPlacement) {
        self.visible = placement.visible;
        self.inner.place(placement);
        self.publish();
    }
}

fn console_factory(board: Board) -> impl FnMut(PanelKind) -> Box<dyn Panel> {
    move |kind| {
        Box::new(ConsolePanel {
            kind,
            inner: TextPanel::for_kind(kind),
            board: board.clone(),
            visible: true,
        })
    }
}

fn print_board(board: &Board) {
    for (line, visible) in board.borrow().values() {
        if *visible && !line.is_empty() {
            println!("  {}", line);
        }
    }
    println!();
}

pub fn run(args: RunArgs) -> Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if args.minimal {
        config.minimal = true;
    }
    let board: Board = Rc::default();

    println!(
        "Rendering {} frames at {} fps with {:.1}ms of CPU work each",
        args.frames, args.target_fps, args.work_ms
    );

    let snapshot = if args.wgpu {
        let mut stats: Stats<WgpuTimerContext> = Stats::new(config, console_factory(board.clone()));
        if let Err(e) = stats.init(Some(InitTarget::Renderer(HeadlessSource))) {
            log::warn!("Continuing without GPU timing: {}", e);
        }
        let target = stats.gpu().map(|gpu| ClearTarget::new(gpu.context().device()));
        if target.is_none() {
            println!("GPU timing unavailable; measuring CPU and frame rate only");
        }

        drive(&mut stats, &args, &board, |context| {
            if let (Some(context), Some(target)) = (context, target.as_ref()) {
                target.clear(context);
            }
        });
        stats.snapshot()
    } else {
        let mut stats: Stats<NullContext> = Stats::new(config, console_factory(board.clone()));
        drive(&mut stats, &args, &board, |_| {});
        stats.snapshot()
    };

    print_board(&board);

    if args.json {
        let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
        println!("{}", json);
    }

    Ok(())
}

fn drive<C: TimerQueryContext>(
    stats: &mut Stats<C>,
    args: &RunArgs,
    board: &Board,
    mut render: impl FnMut(Option<&C>),
) {
    let frame_budget = Duration::from_secs_f64(1.0 / args.target_fps.max(1) as f64);
    let work = Duration::from_secs_f64(args.work_ms.max(0.0) / 1000.0);
    let mut last_fps = None;

    for _ in 0..args.frames {
        let frame_start = Instant::now();

        stats.begin();
        spin_for(work);
        render(stats.gpu().map(|gpu| gpu.context()));
        stats.end();
        stats.update();

        let fps = stats.snapshot().fps;
        if fps != last_fps {
            last_fps = fps;
            print_board(board);
            if stats.config().minimal {
                stats.cycle_panel();
            }
        }

        if let Some(rest) = frame_budget.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }
}

/// Busy-wait so the work shows up as CPU time
fn spin_for(duration: Duration) {
    let until = Instant::now() + duration;
    while Instant::now() < until {
        std::hint::spin_loop();
    }
}

/// Offscreen texture cleared once per frame to give the GPU something to time
struct ClearTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl ClearTarget {
    const SIZE: u32 = 512;

    fn new(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Tempo Clear Target"),
            size: wgpu::Extent3d {
                width: Self::SIZE,
                height: Self::SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }

    fn clear(&self, context: &WgpuTimerContext) {
        let mut encoder = context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Tempo Clear Encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Tempo Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.1,
                            g: 0.1,
                            b: 0.15,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        context.queue().submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_panel_publishes_to_board() {
        let board: Board = Rc::default();
        let mut factory = console_factory(board.clone());
        let mut panel = factory(PanelKind::Cpu);

        panel.update(4.0, 4.0, 8.0, 8.0, 2);
        let (line, visible) = board.borrow()[&PanelKind::Cpu.index()].clone();
        assert!(line.contains("CPU"));
        assert!(visible);

        panel.place(PanelPlacement {
            visible: false,
            x: 0.0,
            y: 0.0,
        });
        assert!(!board.borrow()[&PanelKind::Cpu.index()].1);
    }
}
