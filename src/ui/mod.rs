//! Frame timing, pause control and per-frame input for the boids window
//!
//! This module provides:
//! - Frame pacing against the configured target frame rate
//! - Rolling FPS tracking for the window title
//! - Collection of pointer, scroll and click input between frames

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::physics::area::AreaEffect;
use crate::physics::{Bounds, Position};

/// Frame deltas above this are clamped so a stalled frame doesn't teleport the flock.
pub const MAX_FRAME_TIME: f64 = 0.1;

const HISTORY_LEN: usize = 60;

/// Tracks frame deltas and the deadline of the next frame
pub struct Clock {
    /// Time of the last tick
    last_time: Instant,
    /// Recent frame deltas in seconds
    dt_history: VecDeque<f64>,
    target_fps: f64,
    frame_interval: Duration,
    next_frame: Instant,
}

impl Clock {
    pub fn new(target_fps: f64) -> Self {
        Self::starting_at(target_fps, Instant::now())
    }

    pub fn starting_at(target_fps: f64, now: Instant) -> Self {
        let frame_interval = Duration::from_secs_f64(1.0 / target_fps);
        Self {
            last_time: now,
            dt_history: VecDeque::with_capacity(HISTORY_LEN),
            target_fps,
            frame_interval,
            next_frame: now + frame_interval,
        }
    }

    /// Records a frame at `now` and returns the clamped delta in seconds.
    pub fn tick(&mut self, now: Instant) -> f64 {
        let dt = now.saturating_duration_since(self.last_time).as_secs_f64();
        self.last_time = now;

        if self.dt_history.len() == HISTORY_LEN {
            self.dt_history.pop_front();
        }
        self.dt_history.push_back(dt);

        self.next_frame += self.frame_interval;
        // Skip frames we can no longer make instead of bursting to catch up.
        if self.next_frame < now {
            self.next_frame = now + self.frame_interval;
        }

        dt.min(MAX_FRAME_TIME)
    }

    /// Whether the next frame should be produced at `now`.
    pub fn frame_due(&self, now: Instant) -> bool {
        now >= self.next_frame
    }

    pub fn next_deadline(&self) -> Instant {
        self.next_frame
    }

    pub fn get_dt_millis(&self) -> f64 {
        self.dt_history
            .back()
            .copied()
            .unwrap_or(1.0 / self.target_fps)
            * 1000.0
    }

    pub fn get_avg_framerate(&self) -> f64 {
        if self.dt_history.is_empty() {
            return self.target_fps;
        }
        let avg_dt: f64 = self.dt_history.iter().sum::<f64>() / self.dt_history.len() as f64;
        if avg_dt > 0.0 {
            1.0 / avg_dt
        } else {
            self.target_fps
        }
    }
}

pub struct Loop {
    pub pause: bool,
}

impl Loop {
    pub fn new() -> Self {
        Self { pause: false }
    }

    pub fn toggle_pause(&mut self) {
        self.pause = !self.pause;
    }
}

impl Default for Loop {
    fn default() -> Self {
        Self::new()
    }
}

/// Input gathered from window events between two frames.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Pointer location in simulation coordinates, `None` outside the window
    pub pointer: Option<Position>,
    /// Scroll notches since the last frame, positive grows the area
    pub scroll: f32,
    /// Whether the toggle button was pressed since the last frame
    pub clicked: bool,
}

impl FrameInput {
    /// Applies this frame's input to the area effect and clears the edge-triggered parts.
    pub fn apply(&mut self, area: &mut AreaEffect) {
        area.set_center(self.pointer);
        if self.scroll != 0.0 {
            area.scroll(self.scroll);
        }
        if self.clicked {
            area.toggle_mode();
        }
        self.scroll = 0.0;
        self.clicked = false;
    }
}

/// Maps a pointer location on a `surface_width` x `surface_height` surface
/// onto the simulation plane, which is stretched over the whole surface.
pub fn surface_to_simulation(
    x: f64,
    y: f64,
    surface_width: u32,
    surface_height: u32,
    bounds: &Bounds,
) -> Option<Position> {
    if surface_width == 0 || surface_height == 0 {
        return None;
    }
    Some(Position::new(
        (x / surface_width as f64) as f32 * bounds.width,
        (y / surface_height as f64) as f32 * bounds.height,
    ))
}
