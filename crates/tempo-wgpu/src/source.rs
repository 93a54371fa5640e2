//! Device acquisition for timer-query contexts

use crate::context::{WgpuTimerContext, TIMER_FEATURES};
use tempo_core::TempoError;
use tempo_overlay::ContextSource;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TimerDeviceError {
    #[error("Failed to get adapter")]
    AdapterNotFound,
    #[error("Failed to create device: {0}")]
    DeviceCreation(String),
}

impl From<TimerDeviceError> for TempoError {
    fn from(err: TimerDeviceError) -> Self {
        TempoError::ContextUnavailable(err.to_string())
    }
}

/// Request a device with timestamp queries enabled when the adapter offers them
///
/// Adapters without them still yield a device; the resulting context simply
/// reports no timer-query support.
pub async fn request_timer_device(
    instance: &wgpu::Instance,
    compatible_surface: Option<&wgpu::Surface<'_>>,
) -> Result<(wgpu::Device, wgpu::Queue), TimerDeviceError> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface,
            force_fallback_adapter: false,
        })
        .await
        .ok_or(TimerDeviceError::AdapterNotFound)?;

    let required_features = adapter.features() & TIMER_FEATURES;
    if !required_features.contains(TIMER_FEATURES) {
        log::info!(
            "Adapter '{}' does not offer timestamp queries",
            adapter.get_info().name
        );
    }

    adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Tempo Timer Device"),
                required_features,
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        )
        .await
        .map_err(|e| TimerDeviceError::DeviceCreation(e.to_string()))
}

fn default_instance() -> wgpu::Instance {
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    })
}

/// Creates an offscreen device with no surface attached
#[derive(Default)]
pub struct HeadlessSource;

impl ContextSource for HeadlessSource {
    type Context = WgpuTimerContext;

    fn acquire_context(&mut self) -> tempo_core::Result<WgpuTimerContext> {
        let instance = default_instance();
        let (device, queue) = pollster::block_on(request_timer_device(&instance, None))?;
        Ok(WgpuTimerContext::new(device, queue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempo_timing::{GpuQueryTracker, TimerQueryContext};

    #[test]
    fn test_timer_features_cover_both_flags() {
        assert!(TIMER_FEATURES.contains(wgpu::Features::TIMESTAMP_QUERY));
        assert!(TIMER_FEATURES.contains(wgpu::Features::TIMESTAMP_QUERY_INSIDE_ENCODERS));
    }

    #[test]
    fn test_device_error_maps_to_context_unavailable() {
        let err: TempoError = TimerDeviceError::AdapterNotFound.into();
        assert!(matches!(err, TempoError::ContextUnavailable(_)));
    }

    /// Runs only where an adapter exists; machines without a GPU skip the body
    #[test]
    fn test_headless_queries_complete() {
        let Ok(context) = HeadlessSource.acquire_context() else {
            return;
        };
        if !context.supports_timer_queries() {
            return;
        }

        let mut tracker = GpuQueryTracker::new(context);
        tracker.begin_frame();
        tracker.end_frame();
        assert_eq!(tracker.pending_len(), 1);

        let _ = tracker
            .context()
            .device()
            .poll(wgpu::Maintain::Wait);
        let poll = tracker.poll_completed();
        assert_eq!(poll.completed + poll.discarded, 1);
        assert_eq!(tracker.pending_len(), 0);
        assert!(poll.elapsed_ms >= 0.0);
    }
}
