//! Trajectory for one target.
//!
//! A [`MotionPlan`] is fixed when the engine picks a target up: start,
//! destination, duration and curve never change while it runs.

use std::time::Duration;

use glider_platform_core::Point;

use crate::config::Configuration;
use crate::easing::{shaped, EasingKind};

/// Time to cover `distance` pixels at `speed`.
///
/// `pixels_per_ms_per_speed` scales the speed setting: at speed `s` the
/// cursor covers `s * pixels_per_ms_per_speed` pixels per millisecond.
pub fn motion_duration(distance: f64, speed: u32, pixels_per_ms_per_speed: f64) -> Duration {
    let rate = f64::from(speed.max(1)) * pixels_per_ms_per_speed;
    if !distance.is_finite() || distance <= 0.0 || !rate.is_finite() || rate <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(distance / rate / 1_000.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPlan {
    start: Point,
    end: Point,
    duration: Duration,
    easing: EasingKind,
    strength: u8,
}

impl MotionPlan {
    /// Plan a move from `start` to `end` under `config`.
    ///
    /// Non-smooth configurations produce a zero-length plan: one step
    /// straight to `end`.
    pub fn new(
        start: Point,
        end: Point,
        config: &Configuration,
        pixels_per_ms_per_speed: f64,
    ) -> Self {
        let duration = if config.smooth() {
            motion_duration(start.distance_to(end), config.speed(), pixels_per_ms_per_speed)
        } else {
            Duration::ZERO
        };
        Self {
            start,
            end,
            duration,
            easing: config.easing(),
            strength: config.strength(),
        }
    }

    /// Limit the total duration.
    pub fn capped(mut self, cap: Duration) -> Self {
        self.duration = self.duration.min(cap);
        self
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Fraction of the plan completed after `elapsed`, in `[0, 1]`.
    pub fn progress(&self, elapsed: Duration) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Rounded cursor position at `progress`. Exactly `end` once complete.
    pub fn position_at(&self, progress: f64) -> Point {
        if progress >= 1.0 {
            return self.end;
        }
        let f = shaped(self.easing, self.strength, progress);
        let lerp = |a: i32, b: i32| {
            let v = a as f64 + (b as f64 - a as f64) * f;
            v.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
        };
        Point::new(lerp(self.start.x, self.end.x), lerp(self.start.y, self.end.y))
    }

    /// The positions the engine sends when every tick lands exactly on
    /// schedule. Consecutive duplicates are skipped; the last entry is
    /// always `end`.
    pub fn sampled(&self, tick: Duration) -> Vec<Point> {
        let tick = tick.max(Duration::from_millis(1));
        let mut points: Vec<Point> = Vec::new();
        let mut elapsed = Duration::ZERO;
        loop {
            elapsed += tick;
            let progress = self.progress(elapsed);
            let point = self.position_at(progress);
            if progress >= 1.0 || points.last() != Some(&point) {
                points.push(point);
            }
            if progress >= 1.0 {
                return points;
            }
        }
    }
}
