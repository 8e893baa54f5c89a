//! Frame clock for the host loop.
//!
//! The simulation core never reads the wall clock itself; the host samples a
//! [`FrameClock`] once per frame and passes the resulting [`FrameTime`] down.
//!
//! # Example
//!
//! ```ignore
//! use swarmfield::clock::FrameClock;
//!
//! let mut clock = FrameClock::new();
//! loop {
//!     let frame = clock.tick();
//!     sim.frame(frame)?;
//! }
//! ```

use std::time::{Duration, Instant};

/// Time values sampled once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds of simulated time since the clock started.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
    /// Frames ticked so far, starting at 1 for the first tick.
    pub frame: u64,
}

impl FrameTime {
    pub fn new(elapsed: f32, delta: f32, frame: u64) -> Self {
        Self { elapsed, delta, frame }
    }
}

/// Produces a [`FrameTime`] per frame from wall time or a fixed step.
#[derive(Debug)]
pub struct FrameClock {
    last_frame: Instant,
    now: FrameTime,
    /// Fixed delta for deterministic stepping; `None` uses wall time.
    fixed_delta: Option<f32>,
    time_scale: f32,
    paused: bool,
    fps: f32,
    fps_frames: u64,
    fps_since: Instant,
    fps_interval: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            now: FrameTime::default(),
            fixed_delta: None,
            time_scale: 1.0,
            paused: false,
            fps: 0.0,
            fps_frames: 0,
            fps_since: now,
            fps_interval: Duration::from_millis(500),
        }
    }

    /// Clock that advances by exactly `delta` seconds per tick.
    pub fn fixed(delta: f32) -> Self {
        let mut clock = Self::new();
        clock.fixed_delta = Some(delta);
        clock
    }

    /// Advance one frame.
    ///
    /// While paused the frame counter still advances but `delta` is 0 and
    /// `elapsed` holds still.
    pub fn tick(&mut self) -> FrameTime {
        let wall = Instant::now();
        let raw = wall.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = wall;

        let delta = if self.paused {
            0.0
        } else {
            self.fixed_delta.unwrap_or(raw) * self.time_scale
        };
        self.now = FrameTime::new(self.now.elapsed + delta, delta, self.now.frame + 1);

        let window = wall.duration_since(self.fps_since);
        if window >= self.fps_interval {
            self.fps = (self.now.frame - self.fps_frames) as f32 / window.as_secs_f32();
            self.fps_frames = self.now.frame;
            self.fps_since = wall;
        }

        self.now
    }

    /// The most recent tick.
    #[inline]
    pub fn now(&self) -> FrameTime {
        self.now
    }

    /// Wall-clock frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Multiplier on delta time. Negative values clamp to 0.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
