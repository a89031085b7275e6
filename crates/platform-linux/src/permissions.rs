//! Capability detection and guidance for Linux.
//!
//! Glider injects pointer input through `xdotool`, which needs an X11
//! display (native or XWayland).

use std::process::Command;

use glider_platform_core::DisplayServer;

use crate::display::detect_display_server;

/// A system capability that Glider may need.
#[derive(Debug, Clone)]
pub struct Capability {
    pub name: String,
    pub description: String,
    pub available: bool,
    pub required: bool,
    pub fix_instructions: Option<String>,
}

impl Capability {
    /// Whether a missing capability blocks the pointer driver.
    pub fn is_blocking(&self) -> bool {
        self.required && !self.available
    }
}

/// Check all capabilities and report status.
pub fn check_capabilities() -> Vec<Capability> {
    vec![
        check_display_access(),
        check_xdotool(),
        check_xrandr(),
        check_native_x11(),
    ]
}

/// Whether `program` can be spawned with `args` and exits successfully.
pub fn command_available(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn check_display_access() -> Capability {
    let available = std::env::var("DISPLAY").is_ok();

    Capability {
        name: "X11 Display".to_string(),
        description: "X11 or XWayland display to send pointer events to".to_string(),
        available,
        required: true,
        fix_instructions: if !available {
            Some("Run inside a graphical session, or set DISPLAY (e.g. DISPLAY=:0)".to_string())
        } else {
            None
        },
    }
}

fn check_xdotool() -> Capability {
    let available = command_available("xdotool", &["version"]);

    Capability {
        name: "xdotool".to_string(),
        description: "Pointer movement and button injection".to_string(),
        available,
        required: true,
        fix_instructions: if !available {
            Some("Install xdotool: sudo apt install xdotool".to_string())
        } else {
            None
        },
    }
}

fn check_xrandr() -> Capability {
    let available = command_available("xrandr", &["--version"]);

    Capability {
        name: "xrandr".to_string(),
        description: "Monitor layout, used to keep targets on screen".to_string(),
        available,
        required: false, // targets are not clamped without it
        fix_instructions: if !available {
            Some("Install xrandr: sudo apt install x11-xserver-utils".to_string())
        } else {
            None
        },
    }
}

fn check_native_x11() -> Capability {
    let wayland = detect_display_server() == DisplayServer::Wayland;

    Capability {
        name: "Native X11 Session".to_string(),
        description: "Under Wayland only XWayland windows see injected pointer motion"
            .to_string(),
        available: !wayland,
        required: false,
        fix_instructions: if wayland {
            Some("Log in with an X11 session for desktop-wide pointer control".to_string())
        } else {
            None
        },
    }
}

/// Print a user-friendly capability report.
pub fn print_capability_report(capabilities: &[Capability]) {
    println!("Glider System Capabilities:");
    println!("{}", "-".repeat(60));

    for cap in capabilities {
        let status = if cap.available {
            "[OK]"
        } else if cap.required {
            "[MISSING - REQUIRED]"
        } else {
            "[MISSING - OPTIONAL]"
        };

        println!("  {} {}: {}", status, cap.name, cap.description);

        if let Some(ref fix) = cap.fix_instructions {
            println!("    Fix: {fix}");
        }
    }
}
