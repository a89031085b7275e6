//! Pending movement targets.
//!
//! Producers push into an unbounded channel; the engine loop is the only
//! consumer. A target the engine abandons on `stop_movement` goes back into
//! a one-slot front buffer so it is the next one dequeued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crossbeam_channel::{Receiver, Sender};
use glider_platform_core::Point;
use serde::{Deserialize, Serialize};

/// How a target's coordinates are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Destination coordinates.
    Absolute,
    /// Delta from the cursor position at the moment the engine picks the target up.
    Relative,
}

/// A queued movement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementTarget {
    pub kind: TargetKind,
    pub x: i32,
    pub y: i32,
}

impl MovementTarget {
    pub const fn absolute(x: i32, y: i32) -> Self {
        Self {
            kind: TargetKind::Absolute,
            x,
            y,
        }
    }

    pub const fn relative(dx: i32, dy: i32) -> Self {
        Self {
            kind: TargetKind::Relative,
            x: dx,
            y: dy,
        }
    }

    /// Destination when the cursor currently sits at `from`.
    pub fn resolve(&self, from: Point) -> Point {
        match self.kind {
            TargetKind::Absolute => Point::new(self.x, self.y),
            TargetKind::Relative => from.offset(self.x, self.y),
        }
    }
}

/// Unbounded FIFO of movement targets.
#[derive(Debug)]
pub struct TargetQueue {
    tx: Sender<MovementTarget>,
    rx: Receiver<MovementTarget>,
    front: Mutex<Option<MovementTarget>>,
    in_flight: AtomicBool,
}

impl TargetQueue {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            front: Mutex::new(None),
            in_flight: AtomicBool::new(false),
        }
    }

    fn front(&self) -> MutexGuard<'_, Option<MovementTarget>> {
        self.front.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn enqueue(&self, target: MovementTarget) {
        // The queue owns both ends, so the channel can never be disconnected.
        self.tx.send(target).ok();
        tracing::debug!(?target, "Enqueued target");
    }

    pub fn enqueue_absolute(&self, x: i32, y: i32) {
        self.enqueue(MovementTarget::absolute(x, y));
    }

    pub fn enqueue_relative(&self, dx: i32, dy: i32) {
        self.enqueue(MovementTarget::relative(dx, dy));
    }

    /// Take the next target without blocking.
    pub fn dequeue(&self) -> Option<MovementTarget> {
        if let Some(target) = self.front().take() {
            return Some(target);
        }
        self.rx.try_recv().ok()
    }

    /// Take the next target for the engine loop and mark it in flight.
    ///
    /// The mark is set before the target leaves the queue, so `is_drained`
    /// never sees it in neither place.
    pub(crate) fn take_next(&self) -> Option<MovementTarget> {
        self.in_flight.store(true, Ordering::SeqCst);
        let target = self.dequeue();
        if target.is_none() {
            self.in_flight.store(false, Ordering::SeqCst);
        }
        target
    }

    /// Finish the in-flight target, putting `unfinished` back at the head.
    ///
    /// Only the consumer calls this, right after `take_next`, so the front
    /// slot is always free. The restore and the in-flight clear happen under the front lock,
    /// which `is_drained` also holds.
    pub(crate) fn finish(&self, unfinished: Option<MovementTarget>) {
        let mut front = self.front();
        if let Some(target) = unfinished {
            debug_assert!(front.is_none(), "front slot already occupied");
            *front = Some(target);
        }
        self.in_flight.store(false, Ordering::SeqCst);
    }

    /// No target is pending or in flight.
    pub(crate) fn is_drained(&self) -> bool {
        let front = self.front();
        front.is_none() && self.rx.is_empty() && !self.in_flight.load(Ordering::SeqCst)
    }

    /// Consumer end, for blocking waits alongside other channels.
    pub(crate) fn receiver(&self) -> &Receiver<MovementTarget> {
        &self.rx
    }

    /// Discard every pending target. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut dropped = usize::from(self.front().take().is_some());
        dropped += self.rx.try_iter().count();
        dropped
    }

    pub fn len(&self) -> usize {
        self.rx.len() + usize::from(self.front().is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TargetQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fifo_order() {
        let queue = TargetQueue::new();
        queue.enqueue_absolute(1, 1);
        queue.enqueue_relative(-5, 5);
        queue.enqueue_absolute(1, 1);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.dequeue(), Some(MovementTarget::absolute(1, 1)));
        assert_eq!(queue.dequeue(), Some(MovementTarget::relative(-5, 5)));
        // Duplicates are kept
        assert_eq!(queue.dequeue(), Some(MovementTarget::absolute(1, 1)));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_restored_target_comes_first() {
        let queue = TargetQueue::new();
        queue.enqueue_absolute(10, 10);
        queue.enqueue_absolute(20, 20);

        let first = queue.take_next().unwrap();
        queue.finish(Some(first));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dequeue(), Some(MovementTarget::absolute(10, 10)));
        assert_eq!(queue.dequeue(), Some(MovementTarget::absolute(20, 20)));
    }

    #[test]
    fn test_drained_only_after_in_flight_target_finishes() {
        let queue = TargetQueue::new();
        assert!(queue.is_drained());
        queue.enqueue_absolute(10, 10);
        assert!(!queue.is_drained());

        let target = queue.take_next().unwrap();
        assert!(queue.is_empty());
        assert!(!queue.is_drained(), "taken target is still in flight");

        queue.finish(Some(target));
        assert!(!queue.is_drained(), "paused target is pending again");
        assert_eq!(queue.take_next(), Some(target));
        queue.finish(None);
        assert!(queue.is_drained());

        assert_eq!(queue.take_next(), None);
        assert!(queue.is_drained());
    }

    #[test]
    fn test_drained_check_never_misses_a_paused_target() {
        let queue = Arc::new(TargetQueue::new());
        let last_round = Arc::new(AtomicBool::new(false));
        queue.enqueue_absolute(1, 2);
        let consumer = {
            let queue = Arc::clone(&queue);
            let last_round = Arc::clone(&last_round);
            std::thread::spawn(move || {
                for _ in 0..2_000 {
                    let target = queue.take_next().unwrap();
                    queue.finish(Some(target));
                }
                let target = queue.take_next().unwrap();
                last_round.store(true, Ordering::SeqCst);
                queue.finish(None);
                target
            })
        };

        while !consumer.is_finished() {
            if queue.is_drained() {
                assert!(last_round.load(Ordering::SeqCst), "drained while a target was paused");
            }
        }
        assert_eq!(consumer.join().unwrap(), MovementTarget::absolute(1, 2));
        assert!(queue.is_drained());
    }

    #[test]
    fn test_clear_drops_everything() {
        let queue = TargetQueue::new();
        for i in 0..5 {
            queue.enqueue_absolute(i, i);
        }
        let first = queue.take_next().unwrap();
        queue.finish(Some(first));

        assert_eq!(queue.clear(), 5);
        assert!(queue.is_empty());
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn test_relative_resolves_against_given_position() {
        let target = MovementTarget::relative(-200, 50);
        assert_eq!(target.resolve(Point::new(500, 500)), Point::new(300, 550));
        let target = MovementTarget::absolute(3, 4);
        assert_eq!(target.resolve(Point::new(500, 500)), Point::new(3, 4));
    }

    #[test]
    fn test_concurrent_producers_keep_per_producer_order() {
        let queue = Arc::new(TargetQueue::new());
        let handles: Vec<_> = (0..4)
            .map(|producer| {
                let queue = Arc::clone(&queue);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        queue.enqueue_absolute(producer, i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut last = [-1i32; 4];
        let mut total = 0;
        while let Some(target) = queue.dequeue() {
            let producer = target.x as usize;
            assert!(target.y > last[producer]);
            last[producer] = target.y;
            total += 1;
        }
        assert_eq!(total, 1000);
    }
}
