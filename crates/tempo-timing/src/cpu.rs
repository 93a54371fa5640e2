//! CPU frame bracketing with named time markers

use std::collections::HashMap;
use std::rc::Rc;
use tempo_core::Clock;

/// A high-resolution timeline that records named marks and measures between them
pub trait MarkerTimeline {
    /// Record the current time under `name`, replacing an older mark of that name
    fn mark(&mut self, name: &str);

    /// Store and return the milliseconds between two marks, `None` if either is missing
    fn measure(&mut self, name: &str, start_mark: &str, end_mark: &str) -> Option<f64>;
}

/// [`MarkerTimeline`] reading an injected [`Clock`]
pub struct ClockTimeline {
    clock: Rc<dyn Clock>,
    marks: HashMap<String, f64>,
    measures: HashMap<String, f64>,
}

impl ClockTimeline {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            marks: HashMap::new(),
            measures: HashMap::new(),
        }
    }

    /// Time of a recorded mark
    pub fn mark_time(&self, name: &str) -> Option<f64> {
        self.marks.get(name).copied()
    }

    /// Most recent duration stored under a measure name
    pub fn last_measure(&self, name: &str) -> Option<f64> {
        self.measures.get(name).copied()
    }
}

impl MarkerTimeline for ClockTimeline {
    fn mark(&mut self, name: &str) {
        let now = self.clock.now_ms();
        self.marks.insert(name.to_string(), now);
    }

    fn measure(&mut self, name: &str, start_mark: &str, end_mark: &str) -> Option<f64> {
        let start = self.marks.get(start_mark)?;
        let end = self.marks.get(end_mark)?;
        let duration = end - start;
        self.measures.insert(name.to_string(), duration);
        Some(duration)
    }
}

/// Measures the CPU side of a frame between a start and an end marker
///
/// Without a timeline every call is a no-op and the accumulated time stays zero.
pub struct CpuProfiler {
    timeline: Option<Box<dyn MarkerTimeline>>,
    profiling: bool,
    accumulated_ms: f64,
}

impl CpuProfiler {
    pub fn new(timeline: Box<dyn MarkerTimeline>) -> Self {
        Self {
            timeline: Some(timeline),
            profiling: false,
            accumulated_ms: 0.0,
        }
    }

    /// A profiler with no timing facility
    pub fn unavailable() -> Self {
        Self {
            timeline: None,
            profiling: false,
            accumulated_ms: 0.0,
        }
    }

    /// Place the start marker unless a bracket is already open
    pub fn begin_frame(&mut self, start_marker: &str) {
        if self.profiling {
            return;
        }
        if let Some(timeline) = self.timeline.as_mut() {
            timeline.mark(start_marker);
            self.profiling = true;
        }
    }

    /// Close the open bracket and add its duration to the accumulator
    pub fn end_frame(&mut self, start_marker: &str, end_marker: &str, measure_name: &str) {
        if !self.profiling {
            return;
        }
        let Some(timeline) = self.timeline.as_mut() else {
            return;
        };

        timeline.mark(end_marker);
        match timeline.measure(measure_name, start_marker, end_marker) {
            Some(duration) => self.accumulated_ms += duration,
            None => log::debug!("No '{}' marker to measure '{}' from", start_marker, measure_name),
        }
        self.profiling = false;
    }

    /// Return the accumulated time and reset it
    pub fn take_accumulated(&mut self) -> f64 {
        std::mem::take(&mut self.accumulated_ms)
    }

    pub fn accumulated_ms(&self) -> f64 {
        self.accumulated_ms
    }

    /// Whether a bracket is open
    pub fn is_profiling(&self) -> bool {
        self.profiling
    }

    /// Whether a timing facility is present
    pub fn is_available(&self) -> bool {
        self.timeline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_core::ManualClock;

    fn profiler(clock: &ManualClock) -> CpuProfiler {
        CpuProfiler::new(Box::new(ClockTimeline::new(Rc::new(clock.clone()))))
    }

    #[test]
    fn test_bracket_accumulates_duration() {
        let clock = ManualClock::new();
        let mut cpu = profiler(&clock);

        cpu.begin_frame("start");
        assert!(cpu.is_profiling());
        clock.advance(4.25);
        cpu.end_frame("start", "end", "frame");

        assert!(!cpu.is_profiling());
        assert!((cpu.accumulated_ms() - 4.25).abs() < 1e-10);
    }

    #[test]
    fn test_nested_begin_keeps_first_marker() {
        let clock = ManualClock::new();
        let mut cpu = profiler(&clock);

        cpu.begin_frame("start");
        clock.advance(3.0);
        cpu.begin_frame("start");
        clock.advance(2.0);
        cpu.end_frame("start", "end", "frame");

        assert!((cpu.accumulated_ms() - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_end_without_begin_is_noop() {
        let clock = ManualClock::new();
        let mut cpu = profiler(&clock);
        clock.advance(10.0);
        cpu.end_frame("start", "end", "frame");
        assert_eq!(cpu.accumulated_ms(), 0.0);
    }

    #[test]
    fn test_take_resets() {
        let clock = ManualClock::new();
        let mut cpu = profiler(&clock);
        cpu.begin_frame("start");
        clock.advance(1.5);
        cpu.end_frame("start", "end", "frame");

        assert!((cpu.take_accumulated() - 1.5).abs() < 1e-10);
        assert_eq!(cpu.accumulated_ms(), 0.0);
    }

    #[test]
    fn test_unavailable_profiler_stays_zero() {
        let mut cpu = CpuProfiler::unavailable();
        assert!(!cpu.is_available());
        cpu.begin_frame("start");
        assert!(!cpu.is_profiling());
        cpu.end_frame("start", "end", "frame");
        assert_eq!(cpu.take_accumulated(), 0.0);
    }

    #[test]
    fn test_clock_timeline_measure() {
        let clock = ManualClock::starting_at(100.0);
        let mut timeline = ClockTimeline::new(Rc::new(clock.clone()));
        timeline.mark("a");
        clock.advance(7.0);
        timeline.mark("b");

        assert_eq!(timeline.measure("a-b", "a", "b"), Some(7.0));
        assert_eq!(timeline.last_measure("a-b"), Some(7.0));
        assert_eq!(timeline.mark_time("a"), Some(100.0));
        assert_eq!(timeline.measure("missing", "a", "zzz"), None);
    }
}
