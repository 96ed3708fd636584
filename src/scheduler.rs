//! Fixed-step frame loop control: decides how many simulation steps each
//! rendered frame owes and paces frames to the configured cap.

use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

/// Physics constants are tuned per 60 Hz frame.
pub const SIM_STEP: Duration = Duration::from_nanos(16_666_667);

/// Frame caps the loop accepts.
pub const FPS_RANGE: RangeInclusive<u32> = 10..=240;

/// Longest real time a single frame may account for.
const MAX_FRAME_TIME: Duration = Duration::from_millis(50);

pub struct FrameScheduler {
    frame: Duration,
    step: Duration,
    running: bool,
    last: Instant,
    accum: Duration,
    frames: u32,
    fps_timer: Instant,
    fps: f32,
}

impl FrameScheduler {
    pub fn new(fps_cap: u32, now: Instant) -> Self {
        let fps = fps_cap.clamp(*FPS_RANGE.start(), *FPS_RANGE.end());
        Self {
            frame: Duration::from_secs_f32(1.0 / fps as f32),
            step: SIM_STEP,
            running: false,
            last: now,
            accum: Duration::ZERO,
            frames: 0,
            fps_timer: now,
            fps: 0.0,
        }
    }

    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step.max(Duration::from_micros(100));
        self
    }

    pub fn frame_budget(&self) -> Duration {
        self.frame
    }

    pub fn start(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.running = true;
        self.last = now;
        self.accum = Duration::ZERO;
        log::debug!("scheduler started");
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.accum = Duration::ZERO;
            log::debug!("scheduler stopped");
        }
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.running {
            self.stop();
        } else {
            self.start(now);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Number of fixed steps due at `now`. Always 0 while stopped.
    pub fn advance(&mut self, now: Instant) -> u32 {
        self.count_frame(now);
        if !self.running {
            return 0;
        }
        let real_dt = now.saturating_duration_since(self.last).min(MAX_FRAME_TIME);
        self.last = now;
        self.accum = self.accum.saturating_add(real_dt);

        let mut steps = 0;
        while self.accum >= self.step {
            self.accum -= self.step;
            steps += 1;
        }
        steps
    }

    fn count_frame(&mut self, now: Instant) {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.fps_timer);
        if elapsed >= Duration::from_millis(500) {
            self.fps = self.frames as f32 / elapsed.as_secs_f32();
            self.fps_timer = now;
            self.frames = 0;
        }
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Sleep out the rest of the frame that began at `frame_start`.
    pub fn pace(&self, frame_start: Instant) {
        spin_sleep(frame_start + self.frame);
    }
}

fn spin_sleep(end: Instant) {
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
