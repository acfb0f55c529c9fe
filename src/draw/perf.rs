use crate::draw::render::DirtyRect;
use std::collections::VecDeque;
use std::time::Duration;

pub const DRAW_PERF_DEBUG_ENV: &str = "FREEHAND_PERF_DEBUG";
const DEFAULT_WINDOW_SIZE: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RasterPerfSnapshot {
    pub enabled: bool,
    pub avg_ms: f64,
    pub worst_ms: f64,
    pub p95_ms: f64,
    pub dirty_pixels_last: u64,
    pub samples: usize,
}

/// Rolling window of per-move compositing costs.
#[derive(Debug, Clone)]
pub struct RasterPerfStats {
    enabled: bool,
    window_size: usize,
    raster_ms_window: VecDeque<f64>,
    dirty_pixels_last: u64,
}

impl Default for RasterPerfStats {
    fn default() -> Self {
        Self::new(perf_debug_from_env(), DEFAULT_WINDOW_SIZE)
    }
}

impl RasterPerfStats {
    pub fn new(enabled: bool, rolling_window: usize) -> Self {
        Self {
            enabled,
            window_size: rolling_window.max(1),
            raster_ms_window: VecDeque::with_capacity(rolling_window.max(1)),
            dirty_pixels_last: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        self.reset();
    }

    pub fn reset(&mut self) {
        self.raster_ms_window.clear();
        self.dirty_pixels_last = 0;
    }

    pub fn record(&mut self, elapsed: Duration, dirty: Option<DirtyRect>) {
        if !self.enabled {
            return;
        }
        if self.raster_ms_window.len() == self.window_size {
            self.raster_ms_window.pop_front();
        }
        self.raster_ms_window.push_back(elapsed.as_secs_f64() * 1000.0);
        self.dirty_pixels_last = dirty
            .map(|d| d.width.max(0) as u64 * d.height.max(0) as u64)
            .unwrap_or(0);
    }

    pub fn snapshot(&self) -> RasterPerfSnapshot {
        if !self.enabled || self.raster_ms_window.is_empty() {
            return RasterPerfSnapshot {
                enabled: self.enabled,
                ..RasterPerfSnapshot::default()
            };
        }
        let samples = self.raster_ms_window.len();
        let sum: f64 = self.raster_ms_window.iter().sum();
        let mut sorted: Vec<f64> = self.raster_ms_window.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        let p95_index = ((samples as f64 * 0.95).ceil() as usize).clamp(1, samples) - 1;
        RasterPerfSnapshot {
            enabled: true,
            avg_ms: sum / samples as f64,
            worst_ms: sorted[samples - 1],
            p95_ms: sorted[p95_index],
            dirty_pixels_last: self.dirty_pixels_last,
            samples,
        }
    }
}

pub fn perf_debug_from_env() -> bool {
    std::env::var(DRAW_PERF_DEBUG_ENV)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
