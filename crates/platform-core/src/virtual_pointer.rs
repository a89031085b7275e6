//! In-memory pointer driver.
//!
//! `VirtualPointer` keeps a cursor position and button state in memory and
//! records every successful call. Clones share the same state, so a test (or
//! a dry-run session) can hand one clone to the engine and inspect another.
//! Failures can be scheduled per operation to exercise error paths.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use glider_common::error::{GliderError, GliderResult};

use crate::{DesktopBounds, MouseButton, Point, PointerDriver};

/// A successful driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverCall {
    SetPosition(Point),
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
}

#[derive(Debug, Default)]
struct VirtualState {
    position: Point,
    bounds: Option<DesktopBounds>,
    pressed: HashSet<MouseButton>,
    calls: Vec<DriverCall>,
    fail_reads: u32,
    fail_moves: u32,
    fail_downs: u32,
    fail_ups: u32,
}

/// Shared-state in-memory pointer.
#[derive(Debug, Clone, Default)]
pub struct VirtualPointer {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualPointer {
    /// Create a virtual pointer with the cursor at `start`.
    pub fn new(start: Point) -> Self {
        let pointer = Self::default();
        pointer.lock().position = start;
        pointer
    }

    /// Report the given desktop bounds to the engine.
    pub fn with_bounds(self, bounds: DesktopBounds) -> Self {
        self.lock().bounds = Some(bounds);
        self
    }

    fn lock(&self) -> MutexGuard<'_, VirtualState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Cursor position, without going through the driver contract.
    pub fn current(&self) -> Point {
        self.lock().position
    }

    /// Move the cursor behind the engine's back (simulates the user).
    pub fn warp(&self, point: Point) {
        self.lock().position = point;
    }

    /// Every successful call so far, in order.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().calls.clone()
    }

    /// Positions passed to successful `set_position` calls, in order.
    pub fn positions(&self) -> Vec<Point> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                DriverCall::SetPosition(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Buttons currently held down.
    pub fn pressed(&self) -> Vec<MouseButton> {
        let mut pressed: Vec<_> = self.lock().pressed.iter().copied().collect();
        pressed.sort_by_key(|b| *b as u8);
        pressed
    }

    /// Fail the next `n` position reads.
    pub fn fail_reads(&self, n: u32) {
        self.lock().fail_reads = n;
    }

    /// Fail the next `n` `set_position` calls.
    pub fn fail_moves(&self, n: u32) {
        self.lock().fail_moves = n;
    }

    /// Fail the next `n` `button_down` calls.
    pub fn fail_button_downs(&self, n: u32) {
        self.lock().fail_downs = n;
    }

    /// Fail the next `n` `button_up` calls.
    pub fn fail_button_ups(&self, n: u32) {
        self.lock().fail_ups = n;
    }
}

fn take_failure(counter: &mut u32, what: &str) -> GliderResult<()> {
    if *counter > 0 {
        *counter -= 1;
        return Err(GliderError::driver(format!("injected {what} failure")));
    }
    Ok(())
}

impl PointerDriver for VirtualPointer {
    fn name(&self) -> &str {
        "virtual"
    }

    fn position(&mut self) -> GliderResult<Point> {
        let mut state = self.lock();
        take_failure(&mut state.fail_reads, "position read")?;
        Ok(state.position)
    }

    fn set_position(&mut self, point: Point) -> GliderResult<()> {
        let mut state = self.lock();
        take_failure(&mut state.fail_moves, "set_position")?;
        state.position = point;
        state.calls.push(DriverCall::SetPosition(point));
        Ok(())
    }

    fn button_down(&mut self, button: MouseButton) -> GliderResult<()> {
        let mut state = self.lock();
        take_failure(&mut state.fail_downs, "button_down")?;
        state.pressed.insert(button);
        state.calls.push(DriverCall::ButtonDown(button));
        Ok(())
    }

    fn button_up(&mut self, button: MouseButton) -> GliderResult<()> {
        let mut state = self.lock();
        take_failure(&mut state.fail_ups, "button_up")?;
        state.pressed.remove(&button);
        state.calls.push(DriverCall::ButtonUp(button));
        Ok(())
    }

    fn desktop_bounds(&mut self) -> Option<DesktopBounds> {
        self.lock().bounds
    }
}
