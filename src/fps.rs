// Frame rate measurement for the frame loop
use std::time::{Duration, Instant};

/// Average frame rate over fixed reporting windows
pub struct FpsCounter {
    /// When the current window started
    last_report: Instant,
    /// Frames since last report
    frame_count: u32,
    /// Last calculated FPS
    current_fps: f64,
    report_interval: Duration,
}

impl FpsCounter {
    pub fn new(report_interval: Duration) -> Self {
        Self {
            last_report: Instant::now(),
            frame_count: 0,
            current_fps: 0.0,
            report_interval,
        }
    }

    /// Call once per presented frame
    /// Returns Some(fps) when a reporting window closes
    pub fn tick(&mut self) -> Option<f64> {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> Option<f64> {
        self.frame_count += 1;

        let elapsed = now.saturating_duration_since(self.last_report);
        if elapsed >= self.report_interval {
            self.current_fps = self.frame_count as f64 / elapsed.as_secs_f64();
            self.frame_count = 0;
            self.last_report = now;
            Some(self.current_fps)
        } else {
            None
        }
    }

    /// Get the last calculated FPS
    pub fn fps(&self) -> f64 {
        self.current_fps
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}
