use std::collections::VecDeque;
use std::time::{Duration, Instant};

const FPS_WINDOW: usize = 30;

/// Frame pacing and a smoothed frame-rate readout.
pub struct FrameTimer {
    frame_duration: Duration,
    next_frame: Instant,
    last_frame: Option<Instant>,
    samples: VecDeque<f32>,
}

impl FrameTimer {
    pub fn new(target_fps: u32) -> Self {
        Self {
            frame_duration: Duration::from_secs_f64(1.0 / target_fps.max(1) as f64),
            next_frame: Instant::now(),
            last_frame: None,
            samples: VecDeque::with_capacity(FPS_WINDOW),
        }
    }

    /// When the next frame is due. If it already is, schedules the one after
    /// and returns true.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now >= self.next_frame {
            self.next_frame = now + self.frame_duration;
            true
        } else {
            false
        }
    }

    pub fn next_frame(&self) -> Instant {
        self.next_frame
    }

    /// Mark the start of a frame and return the seconds since the last one.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let dt = match self.last_frame {
            Some(last) => now.duration_since(last).as_secs_f32(),
            None => self.frame_duration.as_secs_f32(),
        };
        self.last_frame = Some(now);
        self.record(dt);
        dt
    }

    fn record(&mut self, dt: f32) {
        if self.samples.len() == FPS_WINDOW {
            self.samples.pop_front();
        }
        self.samples.push_back(dt);
    }

    /// Frames per second averaged over the last 30 frames.
    pub fn fps(&self) -> u32 {
        let total: f32 = self.samples.iter().sum();
        if total <= 0.0 {
            return 0;
        }
        (self.samples.len() as f32 / total).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_averages_recent_frames() {
        let mut timer = FrameTimer::new(60);
        assert_eq!(timer.fps(), 0);
        for _ in 0..FPS_WINDOW {
            timer.record(1.0 / 60.0);
        }
        assert_eq!(timer.fps(), 60);

        // Old samples fall out of the window.
        for _ in 0..FPS_WINDOW {
            timer.record(1.0 / 20.0);
        }
        assert_eq!(timer.fps(), 20);
    }

    #[test]
    fn tick_reports_elapsed_time() {
        let mut timer = FrameTimer::new(60);
        let start = Instant::now();
        let first = timer.tick(start);
        assert!((first - 1.0 / 60.0).abs() < 1e-4);
        let dt = timer.tick(start + Duration::from_millis(50));
        assert!((dt - 0.05).abs() < 1e-4);
    }

    #[test]
    fn poll_caps_the_frame_rate() {
        let mut timer = FrameTimer::new(60);
        let start = Instant::now() + Duration::from_millis(1);
        assert!(timer.poll(start));
        assert!(!timer.poll(start + Duration::from_millis(5)));
        assert!(timer.poll(start + Duration::from_millis(17)));
        assert!(timer.next_frame() > start + Duration::from_millis(17));
    }
}
