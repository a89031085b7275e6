//! Display server and monitor layout detection.

use std::process::Command;

use glider_common::error::{GliderError, GliderResult};
use glider_platform_core::{DisplayServer, MonitorInfo};

/// Detect connected monitors through `xrandr --query`.
pub fn detect_monitors() -> GliderResult<Vec<MonitorInfo>> {
    tracing::debug!("Detecting monitors");

    let output = Command::new("xrandr")
        .arg("--query")
        .output()
        .map_err(|e| {
            GliderError::platform(format!(
                "failed to run xrandr: {e}. Install with: sudo apt install x11-xserver-utils"
            ))
        })?;

    if !output.status.success() {
        return Err(GliderError::platform(format!(
            "xrandr exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let monitors = parse_xrandr(&String::from_utf8_lossy(&output.stdout));
    if monitors.is_empty() {
        return Err(GliderError::platform("xrandr reported no active monitors"));
    }
    tracing::debug!(count = monitors.len(), "Detected monitors");
    Ok(monitors)
}

/// Parse the connected outputs of `xrandr --query`.
///
/// Outputs that are connected but switched off carry no geometry and are
/// skipped.
pub fn parse_xrandr(stdout: &str) -> Vec<MonitorInfo> {
    stdout
        .lines()
        .filter(|line| !line.starts_with(char::is_whitespace))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            if fields.next()? != "connected" {
                return None;
            }
            let rest: Vec<&str> = fields.collect();
            let primary = rest.first() == Some(&"primary");
            let (width, height, x, y) = rest.iter().find_map(|f| parse_geometry(f))?;
            Some(MonitorInfo {
                name: name.to_string(),
                width,
                height,
                x,
                y,
                primary,
            })
        })
        .collect()
}

/// `WxH+X+Y`, where the offsets may be negative (`+-1920`).
fn parse_geometry(field: &str) -> Option<(u32, u32, i32, i32)> {
    let (size, offsets) = field.split_once('+')?;
    let (w, h) = size.split_once('x')?;
    let (x, y) = offsets.split_once('+')?;
    Some((w.parse().ok()?, h.parse().ok()?, x.parse().ok()?, y.parse().ok()?))
}

/// Detect the current display server.
pub fn detect_display_server() -> DisplayServer {
    if std::env::var("WAYLAND_DISPLAY").is_ok() {
        DisplayServer::Wayland
    } else if std::env::var("DISPLAY").is_ok() {
        DisplayServer::X11
    } else {
        DisplayServer::Unknown
    }
}
