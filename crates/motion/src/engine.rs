//! The motion loop.
//!
//! One background thread owns the pointer driver. It drains the target
//! queue while the engine is running, executes immediate commands between
//! targets, and is the only code that ever touches the driver.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Select, Sender, TryRecvError};
use glider_common::clock::TickPacer;
use glider_platform_core::{MouseButton, Point, PointerDriver};

use crate::choreography::{self, HoldOutcome, HoldRequest};
use crate::config::ConfigStore;
use crate::lifecycle::EngineState;
use crate::plan::MotionPlan;
use crate::queue::{MovementTarget, TargetQueue};

/// State shared between the public engine handle and the motion loop.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) queue: TargetQueue,
    pub(crate) config: ConfigStore,
    state: AtomicU8,
    completed: AtomicU64,
}

impl Shared {
    pub(crate) fn new(config: ConfigStore) -> Self {
        Self {
            queue: TargetQueue::new(),
            config,
            state: AtomicU8::new(EngineState::Idle as u8),
            completed: AtomicU64::new(0),
        }
    }

    pub(crate) fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn set_state(&self, state: EngineState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    pub(crate) fn targets_completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    fn target_interrupt(&self) -> Option<Interrupt> {
        match self.state() {
            EngineState::Running => None,
            EngineState::Idle => Some(Interrupt::Stopped),
            EngineState::ShuttingDown => Some(Interrupt::ShuttingDown),
        }
    }

    fn shutdown_interrupt(&self) -> Option<Interrupt> {
        (self.state() == EngineState::ShuttingDown).then_some(Interrupt::ShuttingDown)
    }
}

/// Messages from the engine handle to the motion loop.
pub(crate) enum Control {
    /// Re-check the engine state.
    Wake,
    /// Exit the loop.
    Shutdown,
    Command(Command),
}

/// Driver work executed by the loop between targets.
pub(crate) enum Command {
    MoveTo {
        point: Point,
        reply: Sender<()>,
    },
    MoveBy {
        dx: i32,
        dy: i32,
        reply: Sender<()>,
    },
    Click {
        button: MouseButton,
        reply: Sender<()>,
    },
    HoldAndMove {
        request: HoldRequest,
        reply: Sender<HoldOutcome>,
    },
}

/// Why a movement stopped before arriving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Interrupt {
    /// `stop_movement` was called. The target is resumable.
    Stopped,
    /// The engine is shutting down. Nothing resumes.
    ShuttingDown,
}

/// A movement that ended without arriving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Halt {
    Interrupted(Interrupt),
    TimedOut,
}

/// Read the cursor position, retrying once per tick on driver failure.
pub(crate) fn read_position<D, F>(
    driver: &mut D,
    pacer: TickPacer,
    deadline: Option<Instant>,
    mut interrupted: F,
) -> Result<Point, Halt>
where
    D: PointerDriver + ?Sized,
    F: FnMut() -> Option<Interrupt>,
{
    loop {
        if let Some(reason) = interrupted() {
            return Err(Halt::Interrupted(reason));
        }
        let tick = Instant::now();
        match driver.position() {
            Ok(point) => return Ok(point),
            Err(e) => tracing::warn!(error = %e, "Failed to read cursor position, retrying next tick"),
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Halt::TimedOut);
        }
        pacer.sleep_remainder(tick);
    }
}

/// Drive the cursor along `plan`, one step per tick.
///
/// A failed `set_position` skips that tick; the next tick recomputes the
/// position from elapsed time. The final step is always exactly
/// `plan.end()` and is retried until it succeeds.
pub(crate) fn glide<D, F>(
    driver: &mut D,
    pacer: TickPacer,
    plan: &MotionPlan,
    deadline: Option<Instant>,
    mut interrupted: F,
) -> Result<(), Halt>
where
    D: PointerDriver + ?Sized,
    F: FnMut() -> Option<Interrupt>,
{
    let began = Instant::now();
    let mut last_sent: Option<Point> = None;

    loop {
        if let Some(reason) = interrupted() {
            return Err(Halt::Interrupted(reason));
        }

        let tick = Instant::now();
        let progress = plan.progress(tick.saturating_duration_since(began));
        let point = plan.position_at(progress);
        let done = progress >= 1.0;

        if done || last_sent != Some(point) {
            match driver.set_position(point) {
                Ok(()) => {
                    last_sent = Some(point);
                    if done {
                        return Ok(());
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, %point, "Pointer move failed, skipping tick");
                }
            }
        }

        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Halt::TimedOut);
        }
        pacer.sleep_remainder(tick);
    }
}

/// The background loop and the driver it owns.
pub(crate) struct MotionWorker {
    driver: Box<dyn PointerDriver>,
    shared: Arc<Shared>,
    control_rx: Receiver<Control>,
    pacer: TickPacer,
    pixels_per_ms_per_speed: f64,
}

impl MotionWorker {
    pub(crate) fn new(
        driver: Box<dyn PointerDriver>,
        shared: Arc<Shared>,
        control_rx: Receiver<Control>,
        tick: Duration,
        pixels_per_ms_per_speed: f64,
    ) -> Self {
        Self {
            driver,
            shared,
            control_rx,
            pacer: TickPacer::new(tick),
            pixels_per_ms_per_speed,
        }
    }

    /// Run until shutdown. Consumes the worker; the driver is released on return.
    pub(crate) fn run(mut self) {
        tracing::info!(driver = %self.driver.name(), tick = ?self.pacer.period(), "Motion loop started");

        loop {
            if self.shared.state() == EngineState::ShuttingDown {
                break;
            }

            // Immediate commands take priority over queued targets.
            match self.control_rx.try_recv() {
                Ok(msg) => {
                    if self.handle_control(msg).is_break() {
                        break;
                    }
                    continue;
                }
                Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            if self.shared.state() != EngineState::Running {
                match self.control_rx.recv() {
                    Ok(msg) => {
                        if self.handle_control(msg).is_break() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
                continue;
            }

            match self.shared.queue.take_next() {
                Some(target) => self.run_target(target),
                None => self.wait_for_work(),
            }
        }

        tracing::info!(
            driver = %self.driver.name(),
            completed = self.shared.targets_completed(),
            "Motion loop stopped, releasing pointer driver"
        );
    }

    /// Block until a target is enqueued or a control message arrives.
    fn wait_for_work(&self) {
        let mut select = Select::new();
        select.recv(self.shared.queue.receiver());
        select.recv(&self.control_rx);
        select.ready();
    }

    fn handle_control(&mut self, msg: Control) -> ControlFlow<()> {
        match msg {
            Control::Wake => ControlFlow::Continue(()),
            Control::Shutdown => ControlFlow::Break(()),
            Control::Command(command) => {
                self.execute(command);
                ControlFlow::Continue(())
            }
        }
    }

    fn clamp(&mut self, point: Point) -> Point {
        match self.driver.desktop_bounds() {
            Some(bounds) => bounds.clamp(point),
            None => point,
        }
    }

    fn run_target(&mut self, target: MovementTarget) {
        let (unfinished, halt) = match self.begin_target(target) {
            Ok((start, end)) => match self.glide_target(start, end) {
                Ok(()) => {
                    self.shared.completed.fetch_add(1, Ordering::SeqCst);
                    self.shared.queue.finish(None);
                    tracing::debug!(?target, %end, "Completed movement");
                    return;
                }
                // Keep the resolved destination so a relative delta is applied once.
                Err(halt) => (MovementTarget::absolute(end.x, end.y), halt),
            },
            Err(halt) => (target, halt),
        };

        match halt {
            Halt::Interrupted(Interrupt::Stopped) => {
                self.shared.queue.finish(Some(unfinished));
                tracing::debug!(
                    ?target,
                    ?unfinished,
                    "Movement paused, target kept at the head of the queue"
                );
            }
            Halt::Interrupted(Interrupt::ShuttingDown) | Halt::TimedOut => {
                self.shared.queue.finish(None);
                tracing::debug!(?target, "Movement abandoned");
            }
        }
    }

    /// Read the start position and resolve the clamped destination.
    fn begin_target(&mut self, target: MovementTarget) -> Result<(Point, Point), Halt> {
        let shared = Arc::clone(&self.shared);
        let start = read_position(&mut *self.driver, self.pacer, None, || {
            shared.target_interrupt()
        })?;
        Ok((start, self.clamp(target.resolve(start))))
    }

    fn glide_target(&mut self, start: Point, end: Point) -> Result<(), Halt> {
        let shared = Arc::clone(&self.shared);

        // One snapshot per target: later config changes only affect later targets.
        let snapshot = self.shared.config.snapshot();
        let plan = MotionPlan::new(start, end, &snapshot.config, self.pixels_per_ms_per_speed);
        tracing::debug!(
            %start,
            %end,
            duration = ?plan.duration(),
            easing = %snapshot.config.easing(),
            config_version = snapshot.version,
            "Starting movement"
        );

        glide(&mut *self.driver, self.pacer, &plan, None, || {
            shared.target_interrupt()
        })?;
        Ok(())
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::MoveTo { point, reply } => {
                let point = self.clamp(point);
                self.warp(point);
                reply.send(()).ok();
            }
            Command::MoveBy { dx, dy, reply } => {
                match self.driver.position() {
                    Ok(from) => {
                        let point = self.clamp(from.offset(dx, dy));
                        self.warp(point);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, dx, dy, "Failed to read cursor position for relative move");
                    }
                }
                reply.send(()).ok();
            }
            Command::Click { button, reply } => {
                choreography::click(&mut *self.driver, button);
                reply.send(()).ok();
            }
            Command::HoldAndMove { request, reply } => {
                let request = HoldRequest {
                    target: self.clamp(request.target),
                    ..request
                };
                let config = self.shared.config.current();
                let shared = Arc::clone(&self.shared);
                let outcome = choreography::hold_and_move(
                    &mut *self.driver,
                    request,
                    &config,
                    self.pacer,
                    self.pixels_per_ms_per_speed,
                    || shared.shutdown_interrupt(),
                );
                reply.send(outcome).ok();
            }
        }
    }

    fn warp(&mut self, point: Point) {
        match self.driver.set_position(point) {
            Ok(()) => tracing::debug!(%point, "Cursor set"),
            Err(e) => tracing::warn!(error = %e, %point, "Failed to set cursor position"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::easing::EasingKind;
    use glider_platform_core::VirtualPointer;

    fn plan(start: Point, end: Point) -> MotionPlan {
        let config = Configuration::new(50, 100, 100, EasingKind::Linear, true).unwrap();
        MotionPlan::new(start, end, &config, 1.0)
    }

    #[test]
    fn test_glide_arrives_exactly() {
        let mut driver = VirtualPointer::new(Point::new(0, 0));
        let plan = plan(Point::new(0, 0), Point::new(1000, 333));

        let result = glide(&mut driver, TickPacer::from_millis(1), &plan, None, || None);

        assert_eq!(result, Ok(()));
        assert_eq!(driver.positions().last(), Some(&Point::new(1000, 333)));
        assert_eq!(driver.current(), Point::new(1000, 333));
    }

    #[test]
    fn test_glide_skips_failed_ticks_and_still_arrives() {
        let mut driver = VirtualPointer::new(Point::new(0, 0));
        driver.fail_moves(3);
        let plan = plan(Point::new(0, 0), Point::new(500, 0));

        let result = glide(&mut driver, TickPacer::from_millis(1), &plan, None, || None);

        assert_eq!(result, Ok(()));
        assert_eq!(driver.current(), Point::new(500, 0));
    }

    #[test]
    fn test_glide_stops_when_interrupted() {
        let mut driver = VirtualPointer::new(Point::new(0, 0));
        let plan = plan(Point::new(0, 0), Point::new(500, 0));
        let mut ticks = 0;

        let result = glide(&mut driver, TickPacer::from_millis(1), &plan, None, || {
            ticks += 1;
            (ticks > 1).then_some(Interrupt::Stopped)
        });

        assert_eq!(result, Err(Halt::Interrupted(Interrupt::Stopped)));
        assert!(driver.positions().len() <= 1);
        assert_ne!(driver.current(), Point::new(500, 0));
    }

    #[test]
    fn test_glide_times_out_when_final_step_keeps_failing() {
        let mut driver = VirtualPointer::new(Point::new(0, 0));
        driver.fail_moves(u32::MAX);
        let plan = plan(Point::new(0, 0), Point::new(10, 0));
        let deadline = Instant::now() + Duration::from_millis(20);

        let result = glide(&mut driver, TickPacer::from_millis(1), &plan, Some(deadline), || None);

        assert_eq!(result, Err(Halt::TimedOut));
    }

    #[test]
    fn test_read_position_retries() {
        let mut driver = VirtualPointer::new(Point::new(9, 9));
        driver.fail_reads(2);
        let point = read_position(&mut driver, TickPacer::from_millis(1), None, || None);
        assert_eq!(point, Ok(Point::new(9, 9)));
    }
}
