//! In-flight GPU timer-query tracking

use crate::context::TimerQueryContext;
use std::collections::VecDeque;

/// Nanoseconds to milliseconds
pub const NS_TO_MS: f64 = 1e-6;

/// Outcome of one [`GpuQueryTracker::poll_completed`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GpuPoll {
    /// Summed elapsed time of the queries consumed this pass, in ms
    pub elapsed_ms: f64,
    /// Queries whose time was accumulated
    pub completed: usize,
    /// Queries dropped because the GPU clock was disjoint
    pub discarded: usize,
    /// Queries still waiting on the GPU after this pass
    pub pending: usize,
}

impl GpuPoll {
    /// Whether at least one valid measurement landed this pass
    pub fn has_samples(&self) -> bool {
        self.completed > 0
    }
}

/// Owns a timer-query context and the queries it has in flight
///
/// One query per frame: `begin_frame` opens it, `end_frame` closes it and queues
/// it for readback, `poll_completed` drains whatever the GPU has finished. At most
/// one query is active at any time.
pub struct GpuQueryTracker<C: TimerQueryContext> {
    context: C,
    supported: bool,
    active: Option<C::Query>,
    pending: VecDeque<C::Query>,
    render_count: u64,
}

impl<C: TimerQueryContext> GpuQueryTracker<C> {
    pub fn new(context: C) -> Self {
        let supported = context.supports_timer_queries();
        if !supported {
            log::debug!("Timer queries unavailable; GPU time will read zero");
        }
        Self {
            context,
            supported,
            active: None,
            pending: VecDeque::new(),
            render_count: 0,
        }
    }

    /// Open a query for the frame about to be rendered
    ///
    /// A query left open by a missing `end_frame` is closed and queued first.
    pub fn begin_frame(&mut self) {
        if !self.supported {
            return;
        }

        if let Some(query) = self.active.take() {
            log::trace!("Closing GPU query left open by the previous frame");
            self.context.end_query(&query);
            self.pending.push_back(query);
        }

        match self.context.create_query() {
            Some(query) => {
                self.context.begin_query(&query);
                self.active = Some(query);
            }
            None => log::debug!("Context refused to create a timer query"),
        }
    }

    /// Close the active query and queue it for readback
    pub fn end_frame(&mut self) {
        self.render_count += 1;

        if let Some(query) = self.active.take() {
            self.context.end_query(&query);
            self.pending.push_back(query);
        }
    }

    /// Consume every finished query without waiting on the GPU
    ///
    /// Pending queries are visited oldest first. Unfinished ones keep their place in
    /// the queue. Once the context reports a disjoint clock during a pass, every
    /// finished query in the rest of that pass is released without being counted.
    pub fn poll_completed(&mut self) -> GpuPoll {
        let mut poll = GpuPoll::default();
        if !self.supported {
            return poll;
        }

        let mut disjoint = false;
        for _ in 0..self.pending.len() {
            let Some(query) = self.pending.pop_front() else {
                break;
            };

            if !self.context.is_result_available(&query) {
                self.pending.push_back(query);
                continue;
            }

            disjoint |= self.context.is_disjoint();
            if disjoint {
                log::trace!("Discarding GPU query measured across a disjoint clock");
                poll.discarded += 1;
            } else {
                let elapsed_ns = self.context.query_result_ns(&query);
                poll.elapsed_ms += elapsed_ns as f64 * NS_TO_MS;
                poll.completed += 1;
            }
            self.context.delete_query(query);
        }

        poll.pending = self.pending.len();
        poll
    }

    /// Whether the context can time GPU work
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    /// Whether a query is currently accumulating GPU time
    pub fn has_active(&self) -> bool {
        self.active.is_some()
    }

    /// Closed queries awaiting readback
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Frames closed since the counter was last reset
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn reset_render_count(&mut self) {
        self.render_count = 0;
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }
}
