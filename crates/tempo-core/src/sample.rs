//! Paired log/graph sample windows

use std::collections::VecDeque;

/// Floor applied to window maxima so graph scaling never divides by zero
pub const MIN_SAMPLE_MAX: f64 = 0.01;

/// Averages and maxima of a window, in the order a panel consumes them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSummary {
    /// Average over the log window
    pub average: f64,
    /// Average over the graph window
    pub graph_average: f64,
    /// Maximum over the log window
    pub max: f64,
    /// Maximum over the graph window
    pub graph_max: f64,
}

/// Two FIFO sample buffers fed by the same pushes
///
/// The long `logs` window smooths the readout, the short `graph` window feeds the
/// scrolling graph. Each evicts its own oldest sample independently.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    logs: VecDeque<f64>,
    graph: VecDeque<f64>,
    samples_log: usize,
    samples_graph: usize,
}

impl SampleWindow {
    /// Create an empty window with the given capacities
    pub fn new(samples_log: usize, samples_graph: usize) -> Self {
        Self {
            logs: VecDeque::with_capacity(samples_log + 1),
            graph: VecDeque::with_capacity(samples_graph + 1),
            samples_log,
            samples_graph,
        }
    }

    /// Append a sample to both sequences, evicting the oldest on overflow
    pub fn push(&mut self, value: f64) {
        self.logs.push_back(value);
        if self.logs.len() > self.samples_log {
            self.logs.pop_front();
        }

        self.graph.push_back(value);
        if self.graph.len() > self.samples_graph {
            self.graph.pop_front();
        }
    }

    /// Mean of the log window
    ///
    /// Divides by `min(len, samples_log)`: a true running mean while the window
    /// fills, the configured capacity once it is full.
    pub fn average(&self) -> f64 {
        mean(&self.logs, self.samples_log)
    }

    /// Mean of the graph window, same rule as [`average`](Self::average)
    pub fn graph_average(&self) -> f64 {
        mean(&self.graph, self.samples_graph)
    }

    /// Largest sample in the log window, never below [`MIN_SAMPLE_MAX`]
    pub fn max(&self) -> f64 {
        floored_max(&self.logs)
    }

    /// Largest sample in the graph window, never below [`MIN_SAMPLE_MAX`]
    pub fn graph_max(&self) -> f64 {
        floored_max(&self.graph)
    }

    /// Everything a panel needs, or `None` while nothing has been logged
    pub fn summary(&self) -> Option<WindowSummary> {
        if self.logs.is_empty() {
            return None;
        }
        Some(WindowSummary {
            average: self.average(),
            graph_average: self.graph_average(),
            max: self.max(),
            graph_max: self.graph_max(),
        })
    }

    /// Number of retained log samples
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    /// Number of retained graph samples
    pub fn graph_len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Configured log capacity
    pub fn samples_log(&self) -> usize {
        self.samples_log
    }

    /// Configured graph capacity
    pub fn samples_graph(&self) -> usize {
        self.samples_graph
    }

    /// Log samples, oldest first
    pub fn logs(&self) -> impl Iterator<Item = f64> + '_ {
        self.logs.iter().copied()
    }

    /// Graph samples, oldest first
    pub fn graph(&self) -> impl Iterator<Item = f64> + '_ {
        self.graph.iter().copied()
    }

    /// Drop all samples, keeping capacities
    pub fn clear(&mut self) {
        self.logs.clear();
        self.graph.clear();
    }
}

fn mean(samples: &VecDeque<f64>, capacity: usize) -> f64 {
    let count = samples.len().min(capacity);
    if count == 0 {
        return 0.0;
    }
    samples.iter().sum::<f64>() / count as f64
}

fn floored_max(samples: &VecDeque<f64>) -> f64 {
    samples.iter().copied().fold(MIN_SAMPLE_MAX, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_window() {
        let window = SampleWindow::new(100, 10);
        assert!(window.is_empty());
        assert_eq!(window.average(), 0.0);
        assert_eq!(window.max(), MIN_SAMPLE_MAX);
        assert!(window.summary().is_none());
    }

    #[test]
    fn test_independent_eviction() {
        let mut window = SampleWindow::new(5, 2);
        for i in 0..4 {
            window.push(i as f64);
        }
        assert_eq!(window.len(), 4);
        assert_eq!(window.graph_len(), 2);
        assert_eq!(window.logs().collect::<Vec<_>>(), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(window.graph().collect::<Vec<_>>(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_oldest_evicted_first() {
        let mut window = SampleWindow::new(3, 3);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            window.push(v);
        }
        assert_eq!(window.logs().collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_warmup_average_is_running_mean() {
        let mut window = SampleWindow::new(100, 10);
        window.push(2.0);
        window.push(4.0);
        assert!((window.average() - 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_full_window_divides_by_capacity() {
        let mut window = SampleWindow::new(4, 2);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0] {
            window.push(v);
        }
        // logs = [3, 4, 5, 6]
        assert!((window.average() - 4.5).abs() < 1e-10);
        // graph = [5, 6]
        assert!((window.graph_average() - 5.5).abs() < 1e-10);
    }

    #[test]
    fn test_max_floor_with_zero_samples() {
        let mut window = SampleWindow::new(10, 5);
        window.push(0.0);
        window.push(0.0);
        assert_eq!(window.max(), MIN_SAMPLE_MAX);
        assert_eq!(window.graph_max(), MIN_SAMPLE_MAX);
    }

    #[test]
    fn test_summary_matches_accessors() {
        let mut window = SampleWindow::new(10, 2);
        for v in [1.0, 7.0, 2.0] {
            window.push(v);
        }
        let summary = window.summary().unwrap();
        assert!((summary.average - 10.0 / 3.0).abs() < 1e-10);
        assert!((summary.graph_average - 4.5).abs() < 1e-10);
        assert_eq!(summary.max, 7.0);
        assert_eq!(summary.graph_max, 7.0);
    }

    #[test]
    fn test_graph_max_only_sees_graph_window() {
        let mut window = SampleWindow::new(10, 2);
        for v in [9.0, 1.0, 2.0] {
            window.push(v);
        }
        assert_eq!(window.max(), 9.0);
        assert_eq!(window.graph_max(), 2.0);
    }

    #[test]
    fn test_clear() {
        let mut window = SampleWindow::new(10, 2);
        window.push(3.0);
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.graph_len(), 0);
        assert_eq!(window.samples_log(), 10);
    }

    proptest! {
        #[test]
        fn proptest_lengths_bounded_and_fifo(
            samples_log in 1usize..40,
            samples_graph in 1usize..20,
            values in prop::collection::vec(0.0f64..1000.0, 0..200),
        ) {
            let mut window = SampleWindow::new(samples_log, samples_graph);
            for (i, value) in values.iter().enumerate() {
                window.push(*value);
                prop_assert!(window.len() <= samples_log);
                prop_assert!(window.graph_len() <= samples_graph);

                let pushed = &values[..=i];
                let expected_logs = &pushed[pushed.len().saturating_sub(samples_log)..];
                let expected_graph = &pushed[pushed.len().saturating_sub(samples_graph)..];
                prop_assert_eq!(window.logs().collect::<Vec<_>>(), expected_logs.to_vec());
                prop_assert_eq!(window.graph().collect::<Vec<_>>(), expected_graph.to_vec());
            }
        }

        #[test]
        fn proptest_average_is_sum_over_min_count_capacity(
            samples_log in 1usize..40,
            values in prop::collection::vec(0.0f64..1000.0, 1..120),
        ) {
            let mut window = SampleWindow::new(samples_log, 10);
            for value in &values {
                window.push(*value);
                let sum: f64 = window.logs().sum();
                let expected = sum / window.len().min(samples_log) as f64;
                prop_assert!((window.average() - expected).abs() < 1e-9);
            }
        }
    }
}
