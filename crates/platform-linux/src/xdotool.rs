//! Pointer driver backed by the `xdotool` command.
//!
//! Each driver call runs one `xdotool` process. That is slow compared to
//! talking to the X server directly, but well within a 10 ms motion tick.

use std::process::Command;

use glider_common::error::{GliderError, GliderResult};
use glider_platform_core::{
    virtual_desktop_bounds, DesktopBounds, DisplayServer, MouseButton, Point, PointerDriver,
};

use crate::display::{detect_display_server, detect_monitors};

/// Drives the X11 pointer through `xdotool`.
#[derive(Debug, Clone)]
pub struct XdotoolDriver {
    program: String,
    display: Option<String>,
    /// `None` until the first lookup; then the detected bounds, if any.
    bounds: Option<Option<DesktopBounds>>,
}

impl XdotoolDriver {
    /// Connect to the display named by `$DISPLAY`.
    pub fn new() -> GliderResult<Self> {
        let display = std::env::var("DISPLAY").ok();
        if display.is_none() {
            return Err(missing_display_error(detect_display_server()));
        }
        let driver = Self {
            program: "xdotool".to_string(),
            display,
            bounds: None,
        };
        driver.run(&["version"]).map_err(|e| {
            GliderError::platform(format!(
                "{e}. Install with: sudo apt install xdotool"
            ))
        })?;
        Ok(driver)
    }

    fn run(&self, args: &[&str]) -> GliderResult<String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        if let Some(display) = &self.display {
            cmd.env("DISPLAY", display);
        }

        let output = cmd
            .output()
            .map_err(|e| GliderError::driver(format!("failed to run {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(GliderError::driver(format!(
                "{} {} exited with {}: {}",
                self.program,
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// X11 button number.
fn x11_button(button: MouseButton) -> &'static str {
    match button {
        MouseButton::Left => "1",
        MouseButton::Middle => "2",
        MouseButton::Right => "3",
    }
}

/// Parse `xdotool getmouselocation --shell` output.
pub fn parse_mouse_location(stdout: &str) -> Option<Point> {
    let mut x = None;
    let mut y = None;
    for line in stdout.lines() {
        if let Some(val) = line.strip_prefix("X=") {
            x = val.trim().parse::<i32>().ok();
        } else if let Some(val) = line.strip_prefix("Y=") {
            y = val.trim().parse::<i32>().ok();
        }
    }
    Some(Point::new(x?, y?))
}

impl PointerDriver for XdotoolDriver {
    fn name(&self) -> &str {
        "xdotool"
    }

    fn position(&mut self) -> GliderResult<Point> {
        let stdout = self.run(&["getmouselocation", "--shell"])?;
        parse_mouse_location(&stdout).ok_or_else(|| {
            GliderError::driver(format!("unexpected getmouselocation output: {stdout:?}"))
        })
    }

    fn set_position(&mut self, point: Point) -> GliderResult<()> {
        self.run(&["mousemove", &point.x.to_string(), &point.y.to_string()])?;
        Ok(())
    }

    fn button_down(&mut self, button: MouseButton) -> GliderResult<()> {
        self.run(&["mousedown", x11_button(button)])?;
        Ok(())
    }

    fn button_up(&mut self, button: MouseButton) -> GliderResult<()> {
        self.run(&["mouseup", x11_button(button)])?;
        Ok(())
    }

    fn desktop_bounds(&mut self) -> Option<DesktopBounds> {
        if let Some(bounds) = self.bounds {
            return bounds;
        }
        let bounds = match detect_monitors() {
            Ok(monitors) => Some(virtual_desktop_bounds(&monitors)),
            Err(e) => {
                tracing::warn!(error = %e, "Monitor detection failed, targets will not be clamped");
                None
            }
        };
        self.bounds = Some(bounds);
        bounds
    }
}

/// Why there is no X display to drive.
fn missing_display_error(server: DisplayServer) -> GliderError {
    match server {
        DisplayServer::Wayland => GliderError::unsupported(
            "Wayland session without XWayland: xdotool cannot inject pointer input",
        ),
        _ => GliderError::platform("DISPLAY is not set; an X11 (or XWayland) session is required"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_display_on_pure_wayland_is_unsupported() {
        assert!(missing_display_error(DisplayServer::Wayland).is_unsupported());
        let err = missing_display_error(DisplayServer::Unknown);
        assert!(!err.is_unsupported());
        assert!(matches!(err, GliderError::Platform { .. }));
    }

    #[test]
    fn test_parse_mouse_location() {
        let out = "X=812\nY=-40\nSCREEN=0\nWINDOW=60817411\n";
        assert_eq!(parse_mouse_location(out), Some(Point::new(812, -40)));
        assert_eq!(parse_mouse_location("SCREEN=0\n"), None);
    }

    #[test]
    fn test_x11_button_numbers() {
        assert_eq!(x11_button(MouseButton::Left), "1");
        assert_eq!(x11_button(MouseButton::Middle), "2");
        assert_eq!(x11_button(MouseButton::Right), "3");
    }

    #[test]
    fn test_missing_program_is_driver_error() {
        let mut driver = XdotoolDriver {
            program: "glider-no-such-xdotool".to_string(),
            display: None,
            bounds: Some(None),
        };
        assert!(driver.position().unwrap_err().is_driver());
        assert!(driver.button_up(MouseButton::Left).unwrap_err().is_driver());
        assert_eq!(driver.desktop_bounds(), None);
    }
}
