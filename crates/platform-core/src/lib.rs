//! Glider platform core contracts.
//!
//! This crate contains the pointer driver contract and the cross-platform
//! display data structures used by the motion engine without coupling to a
//! concrete OS backend.

pub mod virtual_pointer;

use std::str::FromStr;

use glider_common::error::{GliderError, GliderResult};
use serde::{Deserialize, Serialize};

pub use virtual_pointer::{DriverCall, VirtualPointer};

/// A cursor position in virtual desktop pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// This point moved by a delta, saturating at the integer range.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Euclidean distance in pixels.
    pub fn distance_to(self, other: Point) -> f64 {
        let dx = other.x as f64 - self.x as f64;
        let dy = other.y as f64 - self.y as f64;
        dx.hypot(dy)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left = 1,
    Right = 2,
    Middle = 3,
}

impl MouseButton {
    pub fn name(self) -> &'static str {
        match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        }
    }
}

impl TryFrom<i32> for MouseButton {
    type Error = GliderError;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(MouseButton::Left),
            2 => Ok(MouseButton::Right),
            3 => Ok(MouseButton::Middle),
            other => Err(GliderError::validation(
                "button",
                format!("expected 1 (left), 2 (right) or 3 (middle), got {other}"),
            )),
        }
    }
}

impl FromStr for MouseButton {
    type Err = GliderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            other => match other.parse::<i32>() {
                Ok(id) => MouseButton::try_from(id),
                Err(_) => Err(GliderError::validation(
                    "button",
                    format!("unknown button '{s}'"),
                )),
            },
        }
    }
}

impl std::fmt::Display for MouseButton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The OS-boundary collaborator that reads and moves the cursor and
/// presses buttons.
///
/// Every call may fail. Implementations are owned by a single thread at a
/// time, so they need `Send` but not `Sync`.
pub trait PointerDriver: Send {
    /// Driver name for logging.
    fn name(&self) -> &str;

    /// Current cursor position.
    fn position(&mut self) -> GliderResult<Point>;

    /// Move the cursor to an absolute position.
    fn set_position(&mut self, point: Point) -> GliderResult<()>;

    /// Press a button.
    fn button_down(&mut self, button: MouseButton) -> GliderResult<()>;

    /// Release a button.
    fn button_up(&mut self, button: MouseButton) -> GliderResult<()>;

    /// Virtual desktop bounds, when the driver knows them.
    fn desktop_bounds(&mut self) -> Option<DesktopBounds> {
        None
    }
}

/// Information about a connected monitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorInfo {
    /// Monitor name/identifier.
    pub name: String,
    /// Resolution in physical pixels.
    pub width: u32,
    pub height: u32,
    /// Position in the virtual desktop (pixels).
    pub x: i32,
    pub y: i32,
    /// Whether this monitor is primary.
    pub primary: bool,
}

/// Display server / platform family the driver talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayServer {
    Wayland,
    X11,
    Windows,
    MacOS,
    #[default]
    Unknown,
}

/// Rectangle covering every connected monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl DesktopBounds {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Clamp a point into the desktop. Right and bottom edges are exclusive.
    pub fn clamp(&self, point: Point) -> Point {
        let max_x = last_coordinate(self.x, self.width);
        let max_y = last_coordinate(self.y, self.height);
        Point::new(point.x.clamp(self.x, max_x), point.y.clamp(self.y, max_y))
    }

    pub fn contains(&self, point: Point) -> bool {
        self.clamp(point) == point
    }
}

/// Last pixel of an axis, saturating at `i32::MAX`. Never below `origin`.
fn last_coordinate(origin: i32, extent: u32) -> i32 {
    let last = i64::from(origin) + i64::from(extent.max(1)) - 1;
    i32::try_from(last).unwrap_or(i32::MAX)
}

/// Compute virtual desktop bounds that include all connected monitors.
pub fn virtual_desktop_bounds(monitors: &[MonitorInfo]) -> DesktopBounds {
    if monitors.is_empty() {
        return DesktopBounds::new(0, 0, 1920, 1080);
    }

    let min_x = monitors.iter().map(|m| m.x).min().unwrap_or(0);
    let min_y = monitors.iter().map(|m| m.y).min().unwrap_or(0);
    let max_x = monitors
        .iter()
        .map(|m| i64::from(m.x) + i64::from(m.width))
        .max()
        .unwrap_or(1920);
    let max_y = monitors
        .iter()
        .map(|m| i64::from(m.y) + i64::from(m.height))
        .max()
        .unwrap_or(1080);

    let width = u32::try_from((max_x - i64::from(min_x)).max(1)).unwrap_or(u32::MAX);
    let height = u32::try_from((max_y - i64::from(min_y)).max(1)).unwrap_or(u32::MAX);
    DesktopBounds::new(min_x, min_y, width, height)
}
