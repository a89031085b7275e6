//! Glider Motion - smooth programmatic pointer motion.
//!
//! Callers enqueue absolute or relative targets; a single background loop
//! glides the cursor to each one along an eased trajectory, and
//! choreographs button presses around that motion.
//!
//! ```no_run
//! use glider_common::config::EngineSettings;
//! use glider_motion::MotionEngine;
//! use glider_platform_core::{Point, VirtualPointer};
//!
//! # fn main() -> glider_common::GliderResult<()> {
//! let engine = MotionEngine::with_driver(&EngineSettings::default(), VirtualPointer::new(Point::new(0, 0)))?;
//! engine.initialize()?;
//! engine.enqueue_absolute(800, 600)?;
//! engine.start_movement()?;
//! # Ok(())
//! # }
//! ```

pub mod choreography;
pub mod config;
pub mod easing;
mod engine;
pub mod lifecycle;
pub mod plan;
pub mod queue;

pub use choreography::{HoldOutcome, HoldRequest};
pub use config::{ConfigSnapshot, ConfigStore, Configuration, Preset};
pub use easing::EasingKind;
pub use lifecycle::{DriverFactory, EngineState, EngineStatus, MotionEngine};
pub use plan::MotionPlan;
pub use queue::{MovementTarget, TargetKind, TargetQueue};
