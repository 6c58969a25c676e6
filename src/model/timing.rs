use std::time::{Duration, Instant};

/// Wall-clock delta between consecutive frame starts
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self { last: now }
    }

    /// Seconds since the previous tick
    pub fn tick(&mut self, now: Instant) -> f32 {
        let delta = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        delta
    }
}

/// Counts frames and reports them once per interval.
#[derive(Debug, Clone, Copy)]
pub struct FpsCounter {
    frames: u32,
    interval_start: Instant,
    interval: Duration,
}

impl FpsCounter {
    pub fn new(now: Instant, interval: Duration) -> Self {
        Self {
            frames: 0,
            interval_start: now,
            interval,
        }
    }

    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Count one frame. Returns the number of frames in the interval once at
    /// least `interval` has elapsed, and starts a new interval.
    pub fn record_frame(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        if now.saturating_duration_since(self.interval_start) >= self.interval {
            let frames = self.frames;
            self.frames = 0;
            self.interval_start = now;
            Some(frames)
        } else {
            None
        }
    }
}

pub fn fps_title(frames: u32) -> String {
    format!("FPS: {frames}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_reports_elapsed_seconds() {
        let start = Instant::now();
        let mut clock = FrameClock::new(start);
        let delta = clock.tick(start + Duration::from_millis(250));
        assert!((delta - 0.25).abs() < 1e-6);
        let delta = clock.tick(start + Duration::from_millis(300));
        assert!((delta - 0.05).abs() < 1e-6);
    }

    #[test]
    fn fps_counter_reports_after_one_second_and_resets() {
        let start = Instant::now();
        let mut fps = FpsCounter::new(start, Duration::from_secs(1));
        for i in 1..60 {
            assert_eq!(fps.record_frame(start + Duration::from_millis(i * 16)), None);
        }
        assert_eq!(fps.frames(), 59);

        let reported = fps.record_frame(start + Duration::from_millis(1000));
        assert_eq!(reported, Some(60));
        assert_eq!(fps.frames(), 0);

        // new interval starts at the report time
        assert_eq!(fps.record_frame(start + Duration::from_millis(1500)), None);
        assert_eq!(fps.record_frame(start + Duration::from_millis(2000)), Some(2));
    }

    #[test]
    fn title_format() {
        assert_eq!(fps_title(144), "FPS: 144");
    }
}
