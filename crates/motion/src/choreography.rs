//! Button choreography around pointer motion.
//!
//! Every `button_down` issued here is matched by a `button_up` on every
//! exit path, including shutdown in the middle of a drag.

use std::time::{Duration, Instant};

use glider_common::clock::TickPacer;
use glider_platform_core::{MouseButton, Point, PointerDriver};
use serde::{Deserialize, Serialize};

use crate::config::Configuration;
use crate::engine::{glide, read_position, Halt, Interrupt};
use crate::plan::MotionPlan;

/// A press-move-release request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoldRequest {
    pub target: Point,
    pub button: MouseButton,
    /// Upper bound on the whole gesture, measured from the press.
    pub duration: Duration,
}

/// How a `hold_and_move` ended. The button is released in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldOutcome {
    /// The cursor reached the target within the time limit.
    Completed,
    /// The time limit elapsed first.
    TimedOut,
    /// The engine shut down mid-gesture.
    Cancelled,
}

impl std::fmt::Display for HoldOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            HoldOutcome::Completed => "completed",
            HoldOutcome::TimedOut => "timed out",
            HoldOutcome::Cancelled => "cancelled",
        })
    }
}

/// Press and release `button` without moving.
///
/// The release is attempted even when the press fails.
pub(crate) fn click<D>(driver: &mut D, button: MouseButton)
where
    D: PointerDriver + ?Sized,
{
    if let Err(e) = driver.button_down(button) {
        tracing::warn!(error = %e, %button, "Button press failed, releasing anyway");
    }
    match driver.button_up(button) {
        Ok(()) => tracing::debug!(%button, "Clicked"),
        Err(e) => tracing::warn!(error = %e, %button, "Button release failed"),
    }
}

/// Releases the held button when dropped.
struct HeldButton<'a, D: PointerDriver + ?Sized> {
    driver: &'a mut D,
    button: MouseButton,
}

impl<'a, D: PointerDriver + ?Sized> HeldButton<'a, D> {
    fn press(driver: &'a mut D, button: MouseButton) -> Self {
        if let Err(e) = driver.button_down(button) {
            tracing::warn!(error = %e, %button, "Button press failed, continuing with the drag");
        }
        Self { driver, button }
    }
}

impl<D: PointerDriver + ?Sized> Drop for HeldButton<'_, D> {
    fn drop(&mut self) {
        if let Err(e) = self.driver.button_up(self.button) {
            tracing::error!(error = %e, button = %self.button, "Button release failed");
        }
    }
}

/// Wait until `until`, checking for cancellation once per tick.
fn dwell<F>(pacer: TickPacer, until: Instant, interrupted: &mut F) -> Result<(), Halt>
where
    F: FnMut() -> Option<Interrupt>,
{
    loop {
        if let Some(reason) = interrupted() {
            return Err(Halt::Interrupted(reason));
        }
        let now = Instant::now();
        if now >= until {
            return Ok(());
        }
        std::thread::sleep(pacer.period().min(until - now));
    }
}

/// Press `request.button`, settle, glide to `request.target`, release.
///
/// The settle time is the configuration's `hold_time_ms`, bounded by half
/// the request duration so the glide always keeps at least the other half.
/// The glide is planned to land one tick before the request duration runs
/// out and is cut off when it does.
pub(crate) fn hold_and_move<D, F>(
    driver: &mut D,
    request: HoldRequest,
    config: &Configuration,
    pacer: TickPacer,
    pixels_per_ms_per_speed: f64,
    mut interrupted: F,
) -> HoldOutcome
where
    D: PointerDriver + ?Sized,
    F: FnMut() -> Option<Interrupt>,
{
    let HoldRequest {
        target,
        button,
        duration,
    } = request;

    let held = HeldButton::press(driver, button);
    let pressed_at = Instant::now();
    let deadline = pressed_at + duration;
    let settle = Duration::from_millis(u64::from(config.hold_time_ms())).min(duration / 2);

    let result = dwell(pacer, pressed_at + settle, &mut interrupted).and_then(|()| {
        let start = read_position(&mut *held.driver, pacer, Some(deadline), &mut interrupted)?;
        let remaining = deadline
            .saturating_duration_since(Instant::now())
            .saturating_sub(pacer.period());
        let plan = MotionPlan::new(start, target, config, pixels_per_ms_per_speed).capped(remaining);
        tracing::debug!(%button, %start, %target, duration = ?plan.duration(), "Dragging");
        glide(&mut *held.driver, pacer, &plan, Some(deadline), &mut interrupted)
    });
    drop(held);

    let outcome = match result {
        Ok(()) => HoldOutcome::Completed,
        Err(Halt::TimedOut) => HoldOutcome::TimedOut,
        Err(Halt::Interrupted(_)) => HoldOutcome::Cancelled,
    };
    tracing::debug!(%button, %target, %outcome, "Hold and move finished");
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::EasingKind;
    use glider_platform_core::{DriverCall, VirtualPointer};

    fn fast_config(hold_time_ms: i32) -> Configuration {
        Configuration::new(50, hold_time_ms, 100, EasingKind::Linear, true).unwrap()
    }

    fn button_calls(driver: &VirtualPointer) -> Vec<DriverCall> {
        driver
            .calls()
            .into_iter()
            .filter(|c| !matches!(c, DriverCall::SetPosition(_)))
            .collect()
    }

    #[test]
    fn test_click_presses_then_releases() {
        let mut driver = VirtualPointer::new(Point::new(5, 5));
        click(&mut driver, MouseButton::Right);
        assert_eq!(
            driver.calls(),
            vec![
                DriverCall::ButtonDown(MouseButton::Right),
                DriverCall::ButtonUp(MouseButton::Right)
            ]
        );
        assert!(driver.positions().is_empty());
    }

    #[test]
    fn test_click_releases_after_failed_press() {
        let mut driver = VirtualPointer::new(Point::new(5, 5));
        driver.fail_button_downs(1);
        click(&mut driver, MouseButton::Left);
        assert_eq!(driver.calls(), vec![DriverCall::ButtonUp(MouseButton::Left)]);
    }

    #[test]
    fn test_hold_and_move_completes() {
        let mut driver = VirtualPointer::new(Point::new(0, 0));
        let request = HoldRequest {
            target: Point::new(200, 100),
            button: MouseButton::Left,
            duration: Duration::from_secs(5),
        };

        let outcome = hold_and_move(
            &mut driver,
            request,
            &fast_config(1),
            TickPacer::from_millis(1),
            1.0,
            || None,
        );

        assert_eq!(outcome, HoldOutcome::Completed);
        assert_eq!(driver.current(), Point::new(200, 100));
        assert_eq!(
            button_calls(&driver),
            vec![
                DriverCall::ButtonDown(MouseButton::Left),
                DriverCall::ButtonUp(MouseButton::Left)
            ]
        );
        assert_eq!(driver.calls().last(), Some(&DriverCall::ButtonUp(MouseButton::Left)));
        assert!(driver.pressed().is_empty());
    }

    #[test]
    fn test_hold_and_move_times_out_and_releases() {
        let mut driver = VirtualPointer::new(Point::new(0, 0));
        // Every move fails, so the final step can never land.
        driver.fail_moves(u32::MAX);
        let request = HoldRequest {
            target: Point::new(50, 50),
            button: MouseButton::Middle,
            duration: Duration::from_millis(30),
        };

        let outcome = hold_and_move(
            &mut driver,
            request,
            &fast_config(1),
            TickPacer::from_millis(1),
            1.0,
            || None,
        );

        assert_eq!(outcome, HoldOutcome::TimedOut);
        assert!(driver.pressed().is_empty());
        assert_eq!(
            button_calls(&driver).last(),
            Some(&DriverCall::ButtonUp(MouseButton::Middle))
        );
    }

    #[test]
    fn test_hold_and_move_cancelled_mid_move_releases() {
        let mut driver = VirtualPointer::new(Point::new(0, 0));
        let request = HoldRequest {
            target: Point::new(10_000, 0),
            button: MouseButton::Left,
            duration: Duration::from_secs(10),
        };
        let slow = Configuration::new(50, 1, 1, EasingKind::Linear, true).unwrap();
        let mut checks = 0;

        let outcome = hold_and_move(
            &mut driver,
            request,
            &slow,
            TickPacer::from_millis(1),
            0.1,
            || {
                checks += 1;
                (checks > 20).then_some(Interrupt::ShuttingDown)
            },
        );

        assert_eq!(outcome, HoldOutcome::Cancelled);
        assert_ne!(driver.current(), Point::new(10_000, 0));
        assert!(driver.pressed().is_empty());
        assert_eq!(
            button_calls(&driver),
            vec![
                DriverCall::ButtonDown(MouseButton::Left),
                DriverCall::ButtonUp(MouseButton::Left)
            ]
        );
    }

    #[test]
    fn test_settle_is_bounded_by_duration() {
        let mut driver = VirtualPointer::new(Point::new(0, 0));
        let request = HoldRequest {
            target: Point::new(0, 0),
            button: MouseButton::Left,
            duration: Duration::from_millis(20),
        };
        let started = Instant::now();

        hold_and_move(
            &mut driver,
            request,
            &fast_config(60_000),
            TickPacer::from_millis(1),
            1.0,
            || None,
        );

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(driver.pressed().is_empty());
    }

    #[test]
    fn test_short_drag_still_glides_after_settle() {
        let mut driver = VirtualPointer::new(Point::new(0, 0));
        // Hold time equals the whole window and the natural glide is far longer.
        let config = Configuration::new(50, 100, 1, EasingKind::Linear, true).unwrap();
        let request = HoldRequest {
            target: Point::new(800, 0),
            button: MouseButton::Left,
            duration: Duration::from_millis(100),
        };

        let outcome = hold_and_move(
            &mut driver,
            request,
            &config,
            TickPacer::from_millis(1),
            1.0,
            || None,
        );

        assert_ne!(outcome, HoldOutcome::Cancelled);
        let positions = driver.positions();
        assert!(positions.len() > 1, "drag jumped straight to {positions:?}");
        assert!(positions[0].x < 800);
        if outcome == HoldOutcome::Completed {
            assert_eq!(driver.current(), Point::new(800, 0));
        }
        assert!(driver.pressed().is_empty());
    }
}
