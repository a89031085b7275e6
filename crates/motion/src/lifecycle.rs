//! Engine lifecycle and the public operation surface.
//!
//! [`MotionEngine`] owns a driver factory and, once initialized, a runtime:
//! the shared queue and configuration, the control channel, and the motion
//! thread. Lifecycle transitions are serialized by one lock; everything else
//! goes through the runtime without it.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossbeam_channel::Sender;
use glider_common::config::EngineSettings;
use glider_common::error::{GliderError, GliderResult};
use glider_common::logging::{self, LogLevel};
use glider_platform_core::{MouseButton, Point, PointerDriver};
use serde::{Deserialize, Serialize};

use crate::choreography::{HoldOutcome, HoldRequest};
use crate::config::{ConfigStore, Configuration, Preset};
use crate::engine::{Command, Control, MotionWorker, Shared};

/// Motion loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Holding; queued targets are retained.
    Idle = 0,
    /// Draining the queue.
    Running = 1,
    /// Shut down, or on the way there.
    ShuttingDown = 2,
}

impl EngineState {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            0 => EngineState::Idle,
            1 => EngineState::Running,
            _ => EngineState::ShuttingDown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EngineState::Idle => "idle",
            EngineState::Running => "running",
            EngineState::ShuttingDown => "shutting_down",
        }
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Point-in-time view of a running engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub state: EngineState,
    pub pending_targets: usize,
    pub config_version: u64,
    pub targets_completed: u64,
    pub initialized_at: DateTime<Utc>,
}

/// Builds a fresh driver for each `initialize`.
pub type DriverFactory = Box<dyn FnMut() -> GliderResult<Box<dyn PointerDriver>> + Send>;

struct Runtime {
    shared: Arc<Shared>,
    control_tx: Sender<Control>,
    worker: Mutex<Option<JoinHandle<()>>>,
    initialized_at: DateTime<Utc>,
}

impl Runtime {
    fn wake(&self) {
        // The loop may already be gone; the state change is what matters.
        self.control_tx.send(Control::Wake).ok();
    }
}

/// A smooth pointer motion engine.
///
/// Every method takes `&self`; share the engine between threads with an
/// `Arc`. Dropping the engine shuts it down.
pub struct MotionEngine {
    tick: Duration,
    pixels_per_ms_per_speed: f64,
    initial: Preset,
    /// Guards lifecycle transitions and owns the driver factory.
    transitions: Mutex<DriverFactory>,
    runtime: RwLock<Option<Arc<Runtime>>>,
}

impl std::fmt::Debug for MotionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionEngine")
            .field("tick", &self.tick)
            .field("pixels_per_ms_per_speed", &self.pixels_per_ms_per_speed)
            .field("initial", &self.initial)
            .field("state", &self.state())
            .finish()
    }
}

impl MotionEngine {
    /// Create an engine. No driver is acquired until [`initialize`](Self::initialize).
    pub fn new(settings: &EngineSettings, factory: DriverFactory) -> GliderResult<Self> {
        settings.validate()?;
        let initial = settings
            .preset
            .parse::<Preset>()
            .map_err(|e| GliderError::config(format!("engine.preset: {e}")))?;
        Ok(Self {
            tick: Duration::from_millis(settings.tick_ms),
            pixels_per_ms_per_speed: settings.pixels_per_ms_per_speed,
            initial,
            transitions: Mutex::new(factory),
            runtime: RwLock::new(None),
        })
    }

    /// Create an engine that hands a clone of `driver` to every runtime.
    pub fn with_driver<D>(settings: &EngineSettings, driver: D) -> GliderResult<Self>
    where
        D: PointerDriver + Clone + 'static,
    {
        Self::new(
            settings,
            Box::new(move || Ok(Box::new(driver.clone()) as Box<dyn PointerDriver>)),
        )
    }

    fn transitions(&self) -> MutexGuard<'_, DriverFactory> {
        self.transitions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn runtime(&self) -> Option<Arc<Runtime>> {
        self.runtime
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The runtime, if it accepts work.
    fn live(&self) -> GliderResult<Arc<Runtime>> {
        let runtime = self
            .runtime()
            .ok_or_else(|| GliderError::lifecycle("engine is not initialized"))?;
        if runtime.shared.state() == EngineState::ShuttingDown {
            return Err(GliderError::lifecycle("engine has been shut down"));
        }
        Ok(runtime)
    }

    /// Acquire a driver and start the motion loop in `Idle`.
    ///
    /// A no-op while already initialized. After [`shutdown`](Self::shutdown)
    /// this builds a fresh runtime: new driver, preset configuration, empty
    /// queue.
    pub fn initialize(&self) -> GliderResult<()> {
        let mut factory = self.transitions();

        if let Some(runtime) = self.runtime() {
            if runtime.shared.state() != EngineState::ShuttingDown {
                tracing::debug!("Engine already initialized");
                return Ok(());
            }
        }

        let driver = (*factory)()?;
        let driver_name = driver.name().to_string();
        let shared = Arc::new(Shared::new(ConfigStore::new(self.initial.configuration())));
        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        let worker = MotionWorker::new(
            driver,
            Arc::clone(&shared),
            control_rx,
            self.tick,
            self.pixels_per_ms_per_speed,
        );

        let handle = std::thread::Builder::new()
            .name("glider-motion".into())
            .spawn(move || worker.run())?;

        *self.runtime.write().unwrap_or_else(|e| e.into_inner()) = Some(Arc::new(Runtime {
            shared,
            control_tx,
            worker: Mutex::new(Some(handle)),
            initialized_at: Utc::now(),
        }));

        tracing::info!(driver = %driver_name, preset = %self.initial, "Engine initialized");
        Ok(())
    }

    /// Stop the motion loop, drop pending targets, and release the driver.
    ///
    /// Blocks until the loop has exited. A no-op when not initialized or
    /// already shut down.
    pub fn shutdown(&self) -> GliderResult<()> {
        let _guard = self.transitions();

        let Some(runtime) = self.runtime() else {
            return Ok(());
        };
        if runtime.shared.state() == EngineState::ShuttingDown {
            return Ok(());
        }

        runtime.shared.set_state(EngineState::ShuttingDown);
        let dropped = runtime.shared.queue.clear();
        runtime.control_tx.send(Control::Shutdown).ok();

        let handle = runtime
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("Motion loop panicked");
            }
        }

        tracing::info!(dropped_targets = dropped, "Engine shut down");
        Ok(())
    }

    /// Begin draining the queue.
    pub fn start_movement(&self) -> GliderResult<()> {
        let _guard = self.transitions();
        let runtime = self.live()?;
        if runtime.shared.state() == EngineState::Running {
            return Ok(());
        }
        runtime.shared.set_state(EngineState::Running);
        runtime.wake();
        tracing::info!(pending = runtime.shared.queue.len(), "Movement started");
        Ok(())
    }

    /// Hold. The target in flight is abandoned and will be the first one
    /// resumed; the rest of the queue is untouched.
    pub fn stop_movement(&self) -> GliderResult<()> {
        let _guard = self.transitions();
        let runtime = self.live()?;
        if runtime.shared.state() == EngineState::Idle {
            return Ok(());
        }
        runtime.shared.set_state(EngineState::Idle);
        runtime.wake();
        tracing::info!(pending = runtime.shared.queue.len(), "Movement stopped");
        Ok(())
    }

    pub fn enqueue_absolute(&self, x: i32, y: i32) -> GliderResult<()> {
        self.live()?.shared.queue.enqueue_absolute(x, y);
        Ok(())
    }

    /// Queue a move by `(dx, dy)` from wherever the cursor is when the
    /// engine reaches it.
    pub fn enqueue_relative(&self, dx: i32, dy: i32) -> GliderResult<()> {
        self.live()?.shared.queue.enqueue_relative(dx, dy);
        Ok(())
    }

    /// Send a command to the motion loop and wait for its reply.
    fn request<T>(&self, build: impl FnOnce(Sender<T>) -> Command) -> GliderResult<T> {
        let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
        {
            let runtime = self.live()?;
            runtime
                .control_tx
                .send(Control::Command(build(reply_tx)))
                .map_err(|_| GliderError::lifecycle("motion loop is not running"))?;
        }
        reply_rx
            .recv()
            .map_err(|_| GliderError::lifecycle("engine shut down before the command ran"))
    }

    /// Warp the cursor to `(x, y)` with no easing.
    pub fn set_cursor_abs(&self, x: i32, y: i32) -> GliderResult<()> {
        let point = Point::new(x, y);
        self.request(|reply| Command::MoveTo { point, reply })
    }

    /// Warp the cursor by `(dx, dy)` with no easing.
    pub fn set_cursor_rel(&self, dx: i32, dy: i32) -> GliderResult<()> {
        self.request(|reply| Command::MoveBy { dx, dy, reply })
    }

    pub fn click(&self, button: MouseButton) -> GliderResult<()> {
        self.request(|reply| Command::Click { button, reply })
    }

    /// Press `button`, glide to `(x, y)`, release.
    ///
    /// The gesture is bounded by `duration_ms` from the press. The button is
    /// released on every path, including a concurrent [`shutdown`](Self::shutdown).
    pub fn hold_and_move(
        &self,
        x: i32,
        y: i32,
        button: MouseButton,
        duration_ms: i32,
    ) -> GliderResult<HoldOutcome> {
        if duration_ms <= 0 {
            return Err(GliderError::validation(
                "duration_ms",
                format!("must be positive, got {duration_ms}"),
            ));
        }
        let request = HoldRequest {
            target: Point::new(x, y),
            button,
            duration: Duration::from_millis(duration_ms as u64),
        };
        self.request(|reply| Command::HoldAndMove { request, reply })
    }

    /// Replace the configuration after validating every field.
    ///
    /// `easing` is the numeric easing id (1 linear .. 5 exponential). On
    /// failure the previous configuration is left untouched.
    pub fn set_config(
        &self,
        strength: i32,
        hold_time_ms: i32,
        speed: i32,
        easing: i32,
        smooth: bool,
    ) -> GliderResult<()> {
        let runtime = self.live()?;
        let config = Configuration::from_ids(strength, hold_time_ms, speed, easing, smooth)
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected configuration");
                e
            })?;
        let version = runtime.shared.config.replace(config);
        tracing::info!(?config, version, "Configuration updated");
        Ok(())
    }

    /// Install an already validated configuration.
    pub fn replace_config(&self, config: Configuration) -> GliderResult<()> {
        let version = self.live()?.shared.config.replace(config);
        tracing::info!(?config, version, "Configuration updated");
        Ok(())
    }

    /// Change only the speed.
    pub fn set_mouse_speed(&self, speed: i32) -> GliderResult<()> {
        let runtime = self.live()?;
        let version = runtime
            .shared
            .config
            .update(|config| config.with_speed(speed))
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected speed");
                e
            })?;
        tracing::info!(speed, version, "Speed updated");
        Ok(())
    }

    /// Install preset `id` (1 default, 2 fast, 3 smooth).
    pub fn apply_preset(&self, id: i32) -> GliderResult<()> {
        let preset = Preset::try_from(id)
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected preset");
                e
            })?;
        self.apply(preset)
    }

    pub fn apply(&self, preset: Preset) -> GliderResult<()> {
        let version = self.live()?.shared.config.apply_preset(preset);
        tracing::info!(%preset, version, "Preset applied");
        Ok(())
    }

    /// The active configuration.
    pub fn config(&self) -> GliderResult<Configuration> {
        Ok(self.live()?.shared.config.current())
    }

    /// Set the global log verbosity (0 none, 1 error, 2 info, 3 debug).
    ///
    /// Does not require an initialized engine.
    pub fn set_logging_level(&self, level: i32) -> GliderResult<()> {
        logging::set_log_level(LogLevel::try_from(level)?)
    }

    /// Current state, or `None` before the first `initialize`.
    pub fn state(&self) -> Option<EngineState> {
        self.runtime().map(|runtime| runtime.shared.state())
    }

    pub fn status(&self) -> GliderResult<EngineStatus> {
        let runtime = self
            .runtime()
            .ok_or_else(|| GliderError::lifecycle("engine is not initialized"))?;
        let shared = &runtime.shared;
        Ok(EngineStatus {
            state: shared.state(),
            pending_targets: shared.queue.len(),
            config_version: shared.config.snapshot().version,
            targets_completed: shared.targets_completed(),
            initialized_at: runtime.initialized_at,
        })
    }

    /// Wait until every queued target has been completed.
    ///
    /// Returns `false` if `timeout` elapses first, which is what happens
    /// while the engine is `Idle` with targets pending.
    pub fn flush(&self, timeout: Duration) -> GliderResult<bool> {
        let runtime = self.live()?;
        let deadline = Instant::now() + timeout;
        loop {
            if runtime.shared.queue.is_drained() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Drop for MotionEngine {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::warn!(error = %e, "Shutdown on drop failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glider_platform_core::VirtualPointer;

    fn engine() -> (MotionEngine, VirtualPointer) {
        let pointer = VirtualPointer::new(Point::new(0, 0));
        let settings = EngineSettings {
            tick_ms: 1,
            pixels_per_ms_per_speed: 1.0,
            ..EngineSettings::default()
        };
        let engine = MotionEngine::with_driver(&settings, pointer.clone()).unwrap();
        (engine, pointer)
    }

    #[test]
    fn test_state_transitions() {
        let (engine, _) = engine();
        assert_eq!(engine.state(), None);

        engine.initialize().unwrap();
        assert_eq!(engine.state(), Some(EngineState::Idle));
        engine.start_movement().unwrap();
        assert_eq!(engine.state(), Some(EngineState::Running));
        engine.stop_movement().unwrap();
        assert_eq!(engine.state(), Some(EngineState::Idle));
        engine.shutdown().unwrap();
        assert_eq!(engine.state(), Some(EngineState::ShuttingDown));
    }

    #[test]
    fn test_operations_before_initialize_fail() {
        let (engine, _) = engine();
        assert!(engine.enqueue_absolute(1, 1).unwrap_err().is_lifecycle());
        assert!(engine.start_movement().unwrap_err().is_lifecycle());
        assert!(engine.config().unwrap_err().is_lifecycle());
        assert!(engine.status().unwrap_err().is_lifecycle());
        // Shutdown of a never-initialized engine is a no-op.
        engine.shutdown().unwrap();
    }

    #[test]
    fn test_unknown_preset_in_settings_is_config_error() {
        let settings = EngineSettings {
            preset: "turbo".into(),
            ..EngineSettings::default()
        };
        let err = MotionEngine::with_driver(&settings, VirtualPointer::default()).unwrap_err();
        assert!(matches!(err, GliderError::Config { .. }));
    }

    #[test]
    fn test_failed_factory_leaves_engine_uninitialized() {
        let engine = MotionEngine::new(
            &EngineSettings::default(),
            Box::new(|| -> GliderResult<Box<dyn PointerDriver>> {
                Err(GliderError::driver("no display"))
            }),
        )
        .unwrap();
        assert!(engine.initialize().unwrap_err().is_driver());
        assert_eq!(engine.state(), None);
    }

    #[test]
    fn test_status_reports_pending_and_version() {
        let (engine, _) = engine();
        engine.initialize().unwrap();
        engine.enqueue_absolute(10, 10).unwrap();
        engine.enqueue_relative(5, 5).unwrap();
        engine.apply_preset(2).unwrap();

        let status = engine.status().unwrap();
        assert_eq!(status.state, EngineState::Idle);
        assert_eq!(status.pending_targets, 2);
        assert_eq!(status.config_version, 1);
        assert_eq!(status.targets_completed, 0);
        assert!(status.initialized_at <= Utc::now());
    }

    #[test]
    fn test_flush_times_out_while_idle() {
        let (engine, _) = engine();
        engine.initialize().unwrap();
        engine.enqueue_absolute(10, 10).unwrap();
        assert!(!engine.flush(Duration::from_millis(20)).unwrap());
        engine.start_movement().unwrap();
        assert!(engine.flush(Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn test_log_level_validation() {
        let (engine, _) = engine();
        assert!(engine.set_logging_level(4).unwrap_err().is_validation());
        assert!(engine.set_logging_level(-1).is_err());
        engine.set_logging_level(2).unwrap();
    }
}
