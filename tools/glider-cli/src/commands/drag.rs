//! Press, glide, release.

use glider_common::config::EngineSettings;
use glider_platform_core::MouseButton;

use super::Session;

pub fn run(
    settings: &EngineSettings,
    dry_run: bool,
    x: i32,
    y: i32,
    button: MouseButton,
    duration_ms: i32,
) -> anyhow::Result<()> {
    let session = Session::open(settings, dry_run)?;
    let outcome = session.engine.hold_and_move(x, y, button, duration_ms)?;
    println!("Dragged with {button} to ({x}, {y}): {outcome}");
    session.print_dry_run_summary();
    session.engine.shutdown()?;
    Ok(())
}
