//! Timer queries on top of wgpu timestamp writes

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tempo_timing::TimerQueryContext;

/// Device features a context needs to time arbitrary stretches of the queue
pub const TIMER_FEATURES: wgpu::Features =
    wgpu::Features::TIMESTAMP_QUERY.union(wgpu::Features::TIMESTAMP_QUERY_INSIDE_ENCODERS);

/// Begin + end timestamp, 8 bytes each
const QUERY_BYTES: u64 = 2 * std::mem::size_of::<u64>() as u64;

/// Released queries kept for reuse
const MAX_FREE_QUERIES: usize = 32;

const STATE_IDLE: u8 = 0;
const STATE_MAPPING: u8 = 1;
const STATE_READY: u8 = 2;
const STATE_FAILED: u8 = 3;

/// One frame's timer query: a two-slot query set plus its readback buffers
pub struct WgpuQuery {
    query_set: wgpu::QuerySet,
    resolve_buffer: wgpu::Buffer,
    readback_buffer: wgpu::Buffer,
    state: Arc<AtomicU8>,
}

impl WgpuQuery {
    fn new(device: &wgpu::Device) -> Self {
        let query_set = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some("tempo_timer_queries"),
            ty: wgpu::QueryType::Timestamp,
            count: 2,
        });

        let resolve_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tempo_timer_resolve"),
            size: QUERY_BYTES,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let readback_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tempo_timer_readback"),
            size: QUERY_BYTES,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            query_set,
            resolve_buffer,
            readback_buffer,
            state: Arc::new(AtomicU8::new(STATE_IDLE)),
        }
    }

    fn state(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }
}

/// Whether a query's readback has finished
///
/// A failed readback re-raises `disjoint` so the check that follows drops this
/// query even if an earlier query already consumed the flag.
fn settle(state: &AtomicU8, disjoint: &AtomicBool) -> bool {
    match state.load(Ordering::Acquire) {
        STATE_READY => true,
        STATE_FAILED => {
            disjoint.store(true, Ordering::Release);
            true
        }
        _ => false,
    }
}

/// [`TimerQueryContext`] over a wgpu device and queue
///
/// Timestamps are written from small command buffers submitted straight to the
/// queue, so a query brackets everything submitted between `begin_query` and
/// `end_query`. Readback goes through `map_async`; availability is checked with a
/// non-blocking device poll.
pub struct WgpuTimerContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    supported: bool,
    timestamp_period: f32,
    free: Vec<WgpuQuery>,
    /// Set when a readback fails; cleared when read
    disjoint: Arc<AtomicBool>,
}

impl WgpuTimerContext {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let supported = device.features().contains(TIMER_FEATURES);
        if !supported {
            log::info!("Device lacks {:?}; GPU timing disabled", TIMER_FEATURES);
        }
        let timestamp_period = queue.get_timestamp_period();

        Self {
            device,
            queue,
            supported,
            timestamp_period,
            free: Vec::new(),
            disjoint: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Nanoseconds per timestamp tick
    pub fn timestamp_period(&self) -> f32 {
        self.timestamp_period
    }

    fn timestamp_encoder(&self, query: &WgpuQuery, index: u32, label: &str) -> wgpu::CommandEncoder {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) });
        encoder.write_timestamp(&query.query_set, index);
        encoder
    }
}

impl TimerQueryContext for WgpuTimerContext {
    type Query = WgpuQuery;

    fn supports_timer_queries(&self) -> bool {
        self.supported
    }

    fn create_query(&mut self) -> Option<WgpuQuery> {
        if !self.supported {
            return None;
        }
        let query = self.free.pop().unwrap_or_else(|| WgpuQuery::new(&self.device));
        query.state.store(STATE_IDLE, Ordering::Release);
        Some(query)
    }

    fn begin_query(&mut self, query: &WgpuQuery) {
        let encoder = self.timestamp_encoder(query, 0, "Tempo Timer Begin");
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn end_query(&mut self, query: &WgpuQuery) {
        let mut encoder = self.timestamp_encoder(query, 1, "Tempo Timer End");
        encoder.resolve_query_set(&query.query_set, 0..2, &query.resolve_buffer, 0);
        encoder.copy_buffer_to_buffer(
            &query.resolve_buffer,
            0,
            &query.readback_buffer,
            0,
            QUERY_BYTES,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        query.state.store(STATE_MAPPING, Ordering::Release);
        let state = query.state.clone();
        let disjoint = self.disjoint.clone();
        query
            .readback_buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| match result {
                Ok(()) => state.store(STATE_READY, Ordering::Release),
                Err(_) => {
                    state.store(STATE_FAILED, Ordering::Release);
                    disjoint.store(true, Ordering::Release);
                }
            });
    }

    fn is_result_available(&mut self, query: &WgpuQuery) -> bool {
        if query.state() == STATE_MAPPING {
            let _ = self.device.poll(wgpu::Maintain::Poll);
        }
        settle(&query.state, &self.disjoint)
    }

    fn is_disjoint(&mut self) -> bool {
        self.disjoint.swap(false, Ordering::AcqRel)
    }

    fn query_result_ns(&mut self, query: &WgpuQuery) -> u64 {
        if query.state() != STATE_READY {
            return 0;
        }

        let ticks = {
            let data = query.readback_buffer.slice(..).get_mapped_range();
            let start: u64 = bytemuck::pod_read_unaligned(&data[0..8]);
            let end: u64 = bytemuck::pod_read_unaligned(&data[8..16]);
            end.saturating_sub(start)
        };
        query.readback_buffer.unmap();
        query.state.store(STATE_IDLE, Ordering::Release);

        (ticks as f64 * self.timestamp_period as f64) as u64
    }

    fn delete_query(&mut self, query: WgpuQuery) {
        match query.state() {
            STATE_READY => query.readback_buffer.unmap(),
            // The map callback still owns the buffer; let it drop with the query
            STATE_MAPPING => return,
            _ => {}
        }
        if self.free.len() < MAX_FREE_QUERIES {
            query.state.store(STATE_IDLE, Ordering::Release);
            self.free.push(query);
        }
    }
}
