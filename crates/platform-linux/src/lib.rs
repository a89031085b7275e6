//! Glider Linux Platform Integration
//!
//! Platform-specific implementations for Linux:
//! - **Pointer Driver:** cursor and button injection through `xdotool`
//! - **Display Detection:** monitor layout from `xrandr`
//! - **Permissions:** capability detection and user guidance

pub mod display;
pub mod permissions;
pub mod xdotool;

pub use display::*;
pub use xdotool::XdotoolDriver;
