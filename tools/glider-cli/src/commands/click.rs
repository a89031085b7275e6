//! Click a button in place.

use glider_common::config::EngineSettings;
use glider_platform_core::MouseButton;

use super::Session;

pub fn run(settings: &EngineSettings, dry_run: bool, button: MouseButton) -> anyhow::Result<()> {
    let session = Session::open(settings, dry_run)?;
    session.engine.click(button)?;
    println!("Clicked {button}");
    session.print_dry_run_summary();
    session.engine.shutdown()?;
    Ok(())
}
