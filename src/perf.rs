//! Frame-rate watchdog.
//!
//! Frame times are low-pass filtered every frame; once per tick the filtered
//! rate is recorded and judged against a floor. Persistent slowness first asks
//! the caller to drop an optional effect and, when there is nothing left to
//! drop, to stop rendering altogether.

use std::collections::VecDeque;

use instant::Duration;

use crate::config::PerformanceOptions;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Not enough records yet.
    Collecting,
    Healthy,
    /// Too slow; disable an optional effect.
    Degrade,
    /// Too slow with nothing left to disable.
    Abort,
}

#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    filtered_frame_millis: f32,
    records: VecDeque<f32>,
    window: usize,
    min_records: usize,
    min_fps: f32,
}

impl PerformanceMonitor {
    pub fn new(options: &PerformanceOptions) -> Self {
        Self {
            filtered_frame_millis: 0.0,
            records: VecDeque::with_capacity(options.window),
            window: options.window.max(1),
            min_records: options.min_records.max(1),
            min_fps: options.min_fps,
        }
    }

    pub fn record_frame(&mut self, dt: Duration) {
        let frame = dt.as_secs_f32() * 1000.0;
        self.filtered_frame_millis += (frame - self.filtered_frame_millis) / 2.0;
    }

    pub fn fps(&self) -> f32 {
        if self.filtered_frame_millis <= 0.0 {
            return f32::INFINITY;
        }
        1000.0 / self.filtered_frame_millis
    }

    /// Records the current rate and judges the recent window.
    pub fn sample(&mut self, can_degrade: bool) -> Verdict {
        self.records.push_front(self.fps());
        self.records.truncate(self.window);
        if self.records.len() < self.min_records {
            return Verdict::Collecting;
        }
        let mean = self.records.iter().sum::<f32>() / self.records.len() as f32;
        if mean >= self.min_fps {
            return Verdict::Healthy;
        }
        self.records.clear();
        if can_degrade {
            Verdict::Degrade
        } else {
            Verdict::Abort
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &f32> {
        self.records.iter()
    }
}
