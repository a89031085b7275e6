//! Check system capabilities.

use glider_platform_core::{virtual_desktop_bounds, DisplayServer};
use glider_platform_linux::detect_display_server;

pub fn run() -> anyhow::Result<()> {
    println!("Glider System Check");
    println!("{}", "=".repeat(50));

    // Display server
    let ds = detect_display_server();
    match ds {
        DisplayServer::Wayland => println!("[WARN] Display server: Wayland (XWayland only)"),
        DisplayServer::X11 => println!("[OK] Display server: X11"),
        _ => println!("[WARN] Display server: Unknown"),
    }

    // Check monitors
    match glider_platform_linux::detect_monitors() {
        Ok(monitors) => {
            println!("[OK] Monitors detected: {}", monitors.len());
            for m in &monitors {
                println!(
                    "     {} {}x{}+{}+{} {}",
                    m.name,
                    m.width,
                    m.height,
                    m.x,
                    m.y,
                    if m.primary { "(primary)" } else { "" }
                );
            }
            let bounds = virtual_desktop_bounds(&monitors);
            println!(
                "     Desktop: {}x{} at ({}, {})",
                bounds.width, bounds.height, bounds.x, bounds.y
            );
        }
        Err(e) => println!("[WARN] Monitor detection failed: {e}"),
    }

    // Check permissions
    let capabilities = glider_platform_linux::permissions::check_capabilities();
    println!();
    glider_platform_linux::permissions::print_capability_report(&capabilities);

    println!();
    if capabilities.iter().any(|c| c.is_blocking()) {
        println!("Some required capabilities are missing. See above for fixes.");
    } else {
        println!("All required capabilities are available. Glider is ready.");
    }

    Ok(())
}
