//! Glide the cursor to a single target.

use std::time::Duration;

use glider_common::config::EngineSettings;

use super::{Overrides, Session};

pub fn run(
    settings: &EngineSettings,
    dry_run: bool,
    x: i32,
    y: i32,
    relative: bool,
    overrides: Overrides,
) -> anyhow::Result<()> {
    let session = Session::open(settings, dry_run)?;
    let engine = &session.engine;
    overrides.apply(engine)?;

    let config = engine.config()?;
    println!(
        "Moving {} ({x}, {y}) with {} easing, strength {}, speed {}",
        if relative { "by" } else { "to" },
        config.easing(),
        config.strength(),
        config.speed()
    );

    if relative {
        engine.enqueue_relative(x, y)?;
    } else {
        engine.enqueue_absolute(x, y)?;
    }
    engine.start_movement()?;

    if !engine.flush(Duration::from_secs(120))? {
        anyhow::bail!("Movement did not finish within 120s");
    }

    session.print_dry_run_summary();
    engine.shutdown()?;
    Ok(())
}
