//! # Frame statistics
//!
//! Tracks a rolling window of frame times together with the simulation step
//! count and the draw calls of the last frame, and logs a one-line summary
//! every report interval.
//!
//! ```rust
//! use event_horizon::performance::FrameStats;
//!
//! let mut stats = FrameStats::new();
//!
//! // In your main loop
//! stats.begin_frame();
//! // ... tick, submit, present ...
//! stats.end_frame(1, 3);
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Aggregated statistics over the current window
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSummary {
    pub fps: f32,
    /// Average frame time in milliseconds
    pub frame_time_ms: f32,
    pub min_frame_time_ms: f32,
    pub max_frame_time_ms: f32,
    /// Total simulation steps so far
    pub steps: u64,
    /// Draw calls issued in the last frame
    pub draw_calls: usize,
}

pub struct FrameStats {
    /// Ring buffer of recent frame times
    frame_times: VecDeque<Duration>,
    max_samples: usize,
    frame_start: Option<Instant>,
    steps: u64,
    draw_calls: usize,
    last_report: Instant,
    report_interval: Duration,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::with_config(120, Duration::from_secs(5))
    }

    pub fn with_config(max_samples: usize, report_interval: Duration) -> Self {
        let max_samples = max_samples.max(1);
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples,
            frame_start: None,
            steps: 0,
            draw_calls: 0,
            last_report: Instant::now(),
            report_interval,
        }
    }

    /// Mark the beginning of a frame
    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// Mark the end of a frame, logging a summary when the report interval
    /// has elapsed
    pub fn end_frame(&mut self, steps: u64, draw_calls: usize) -> Option<FrameSummary> {
        let start = self.frame_start.take()?;
        self.record_frame(start.elapsed(), steps, draw_calls);

        if self.last_report.elapsed() < self.report_interval {
            return None;
        }
        self.last_report = Instant::now();

        let summary = self.summary()?;
        log::info!(
            "{:.1} fps, frame {:.2}ms (min {:.2}ms, max {:.2}ms), {} steps, {} draw calls",
            summary.fps,
            summary.frame_time_ms,
            summary.min_frame_time_ms,
            summary.max_frame_time_ms,
            summary.steps,
            summary.draw_calls
        );
        Some(summary)
    }

    /// Adds one frame sample
    fn record_frame(&mut self, frame_time: Duration, steps: u64, draw_calls: usize) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time);
        self.steps = steps;
        self.draw_calls = draw_calls;
    }

    /// Statistics over the current window, `None` before the first frame
    pub fn summary(&self) -> Option<FrameSummary> {
        let min_time = self.frame_times.iter().min()?;
        let max_time = self.frame_times.iter().max()?;

        let total_time: Duration = self.frame_times.iter().sum();
        let frame_time_ms = total_time.as_secs_f32() * 1000.0 / self.frame_times.len() as f32;

        Some(FrameSummary {
            fps: if frame_time_ms > 0.0 {
                1000.0 / frame_time_ms
            } else {
                0.0
            },
            frame_time_ms,
            min_frame_time_ms: min_time.as_secs_f32() * 1000.0,
            max_frame_time_ms: max_time.as_secs_f32() * 1000.0,
            steps: self.steps,
            draw_calls: self.draw_calls,
        })
    }

}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_over_window() {
        let mut stats = FrameStats::with_config(3, Duration::from_secs(60));
        assert!(stats.summary().is_none());

        stats.record_frame(Duration::from_millis(100), 1, 10);
        stats.record_frame(Duration::from_millis(10), 2, 10);
        stats.record_frame(Duration::from_millis(20), 3, 10);
        stats.record_frame(Duration::from_millis(30), 4, 12);

        let summary = stats.summary().unwrap();
        assert!((summary.frame_time_ms - 20.0).abs() < 1e-3);
        assert!((summary.fps - 50.0).abs() < 1e-2);
        assert!((summary.min_frame_time_ms - 10.0).abs() < 1e-3);
        assert!((summary.max_frame_time_ms - 30.0).abs() < 1e-3);
        assert_eq!(summary.steps, 4);
        assert_eq!(summary.draw_calls, 12);
    }

    #[test]
    fn test_end_frame_without_begin_is_ignored() {
        let mut stats = FrameStats::with_config(8, Duration::ZERO);
        assert!(stats.end_frame(1, 1).is_none());
        assert!(stats.summary().is_none());
    }

    #[test]
    fn test_reports_when_interval_elapsed() {
        let mut stats = FrameStats::with_config(8, Duration::ZERO);
        stats.begin_frame();
        let summary = stats.end_frame(7, 3).unwrap();
        assert_eq!(summary.steps, 7);
        assert_eq!(summary.draw_calls, 3);
    }
}
