//! Subcommand implementations and the engine setup they share.

pub mod check;
pub mod click;
pub mod config;
pub mod drag;
pub mod interactive;
pub mod move_to;
pub mod presets;

use glider_common::config::EngineSettings;
use glider_common::error::GliderResult;
use glider_motion::{Configuration, EasingKind, MotionEngine};
use glider_platform_core::{DesktopBounds, Point, PointerDriver, VirtualPointer};
use glider_platform_linux::XdotoolDriver;

/// Command-line tweaks applied on top of the starting preset.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub easing: Option<EasingKind>,
    pub strength: Option<i32>,
    pub speed: Option<i32>,
}

impl Overrides {
    fn is_empty(&self) -> bool {
        self.easing.is_none() && self.strength.is_none() && self.speed.is_none()
    }

    /// Install the overridden configuration, validating it as a whole.
    pub fn apply(&self, engine: &MotionEngine) -> anyhow::Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let current = engine.config()?;
        let config = Configuration::new(
            self.strength.unwrap_or(i32::from(current.strength())),
            current.hold_time_ms() as i32,
            self.speed.unwrap_or(current.speed() as i32),
            self.easing.unwrap_or(current.easing()),
            current.smooth(),
        )?;
        engine.replace_config(config)?;
        Ok(())
    }
}

/// An initialized engine plus, for dry runs, a handle on the fake pointer.
pub struct Session {
    pub engine: MotionEngine,
    pub pointer: Option<VirtualPointer>,
}

impl Session {
    pub fn open(settings: &EngineSettings, dry_run: bool) -> anyhow::Result<Self> {
        let (engine, pointer) = if dry_run {
            let pointer = VirtualPointer::new(Point::new(960, 540))
                .with_bounds(DesktopBounds::new(0, 0, 1920, 1080));
            (MotionEngine::with_driver(settings, pointer.clone())?, Some(pointer))
        } else {
            let engine = MotionEngine::new(
                settings,
                Box::new(|| -> GliderResult<Box<dyn PointerDriver>> {
                    Ok(Box::new(XdotoolDriver::new()?))
                }),
            )?;
            (engine, None)
        };
        engine.initialize()?;
        Ok(Self { engine, pointer })
    }

    /// Report where a dry run left the cursor.
    pub fn print_dry_run_summary(&self) {
        if let Some(pointer) = &self.pointer {
            println!(
                "[dry-run] {} driver calls, cursor at {}, buttons held: {}",
                pointer.calls().len(),
                pointer.current(),
                pointer.pressed().len()
            );
        }
    }
}
