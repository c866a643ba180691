// Coarse frame-rate cap: a fixed delay between the starts of consecutive frames.
// The event loop sleeps with ControlFlow::WaitUntil(next_deadline()).

use std::time::{Duration, Instant};

pub struct FramePacer {
    frame_delay: Duration,
    last_frame: Option<Instant>,
}

impl FramePacer {
    pub fn new(frame_delay: Duration) -> Self {
        Self {
            frame_delay,
            last_frame: None,
        }
    }

    /// When the next frame may start. `None` before the first frame.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.last_frame.map(|t| t + self.frame_delay)
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next_deadline().is_none_or(|deadline| now >= deadline)
    }

    /// Mark the start of a frame. A frame that starts early, because the
    /// window system asked for a redraw before the delay ran out, still
    /// proceeds; it is only logged. Returns whether the frame was on time.
    pub fn begin_frame(&mut self, now: Instant) -> bool {
        let on_time = self.is_due(now);
        if !on_time {
            log::trace!("frame started before the {:?} delay elapsed", self.frame_delay);
        }
        self.last_frame = Some(now);
        on_time
    }
}

/// Frame-time figures for the last full second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTimes {
    pub fps: u32,
    pub avg_ms: f32,
    pub min_ms: f32,
    pub max_ms: f32,
}

/// Rolls per-frame durations up into once-a-second `FrameTimes`.
pub struct FrameTimer {
    last_frame: Option<Instant>,
    window_start: Instant,
    count: u32,
    sum_ms: f32,
    min_ms: f32,
    max_ms: f32,
    latest: FrameTimes,
}

impl FrameTimer {
    pub fn new(now: Instant) -> Self {
        Self {
            last_frame: None,
            window_start: now,
            count: 0,
            sum_ms: 0.0,
            min_ms: f32::MAX,
            max_ms: 0.0,
            latest: FrameTimes::default(),
        }
    }

    pub fn latest(&self) -> FrameTimes {
        self.latest
    }

    /// Record a frame starting at `now`. Returns fresh figures once a
    /// second has passed since the previous roll-up.
    pub fn record(&mut self, now: Instant) -> Option<FrameTimes> {
        if let Some(last) = self.last_frame {
            let ms = (now - last).as_secs_f32() * 1000.0;
            self.sum_ms += ms;
            self.min_ms = self.min_ms.min(ms);
            self.max_ms = self.max_ms.max(ms);
        }
        self.last_frame = Some(now);
        self.count += 1;

        if (now - self.window_start).as_secs_f32() < 1.0 {
            return None;
        }

        let intervals = self.count.saturating_sub(1).max(1) as f32;
        self.latest = FrameTimes {
            fps: self.count,
            avg_ms: self.sum_ms / intervals,
            min_ms: if self.min_ms == f32::MAX { 0.0 } else { self.min_ms },
            max_ms: self.max_ms,
        };
        self.window_start = now;
        self.count = 0;
        self.sum_ms = 0.0;
        self.min_ms = f32::MAX;
        self.max_ms = 0.0;
        Some(self.latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_is_due_immediately() {
        let pacer = FramePacer::new(Duration::from_millis(7));
        assert!(pacer.is_due(Instant::now()));
        assert!(pacer.next_deadline().is_none());
    }

    #[test]
    fn deadline_follows_last_frame() {
        let mut pacer = FramePacer::new(Duration::from_millis(7));
        let start = Instant::now();
        assert!(pacer.begin_frame(start));

        assert_eq!(pacer.next_deadline(), Some(start + Duration::from_millis(7)));
        assert!(!pacer.is_due(start + Duration::from_millis(3)));
        assert!(pacer.is_due(start + Duration::from_millis(7)));
    }

    #[test]
    fn early_frame_still_proceeds() {
        let mut pacer = FramePacer::new(Duration::from_millis(7));
        let start = Instant::now();
        pacer.begin_frame(start);

        let early = start + Duration::from_millis(1);
        assert!(!pacer.begin_frame(early));
        assert_eq!(pacer.next_deadline(), Some(early + Duration::from_millis(7)));
    }

    #[test]
    fn timer_rolls_up_once_a_second() {
        let start = Instant::now();
        let mut timer = FrameTimer::new(start);
        let step = Duration::from_millis(100);

        let mut rolled = None;
        for i in 0..=10 {
            if let Some(times) = timer.record(start + step * i) {
                rolled = Some((i, times));
            }
        }

        let (at, times) = rolled.unwrap();
        assert_eq!(at, 10);
        assert_eq!(times.fps, 11);
        assert!((times.avg_ms - 100.0).abs() < 0.5);
        assert!((times.min_ms - 100.0).abs() < 0.5);
        assert!((times.max_ms - 100.0).abs() < 0.5);
        assert_eq!(timer.latest(), times);
    }

    #[test]
    fn timer_is_quiet_within_a_second() {
        let start = Instant::now();
        let mut timer = FrameTimer::new(start);
        assert!(timer.record(start).is_none());
        assert!(timer.record(start + Duration::from_millis(500)).is_none());
        assert_eq!(timer.latest(), FrameTimes::default());
    }
}
