//! Print the built-in presets.

use glider_motion::Preset;

pub fn run() -> anyhow::Result<()> {
    println!(
        "{:<4} {:<8} {:>8} {:>8} {:>6}  {:<12} {}",
        "id", "name", "strength", "hold ms", "speed", "easing", "smooth"
    );
    println!("{}", "-".repeat(60));
    for preset in Preset::ALL {
        let c = preset.configuration();
        println!(
            "{:<4} {:<8} {:>8} {:>8} {:>6}  {:<12} {}",
            preset as i32,
            preset.name(),
            c.strength(),
            c.hold_time_ms(),
            c.speed(),
            c.easing().name(),
            if c.smooth() { "yes" } else { "no" }
        );
    }
    Ok(())
}
