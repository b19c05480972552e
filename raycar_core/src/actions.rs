// raycar_core/src/actions.rs

//! Control intents produced by an external input collector.
//!
//! The collector writes into a [`SharedActionState`] whenever press/release
//! events arrive. The simulation takes one [`ActionState`] snapshot per tick;
//! every flag, including the one-shot reset, is read in a single atomic
//! operation so a tick never observes a torn set of flags.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

/// A named control intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Accelerate,
    Reverse,
    SteerLeft,
    SteerRight,
    Brake,
    Boost,
    /// One-shot: fires once per key-down edge.
    Reset,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Accelerate,
        Action::Reverse,
        Action::SteerLeft,
        Action::SteerRight,
        Action::Brake,
        Action::Boost,
        Action::Reset,
    ];

    /// Bit used for the held state of this action. For `Reset` this is the
    /// "key is down" bit used for edge detection, not the pending event.
    const fn bit(self) -> u8 {
        match self {
            Action::Accelerate => 1 << 0,
            Action::Reverse => 1 << 1,
            Action::SteerLeft => 1 << 2,
            Action::SteerRight => 1 << 3,
            Action::Brake => 1 << 4,
            Action::Boost => 1 << 5,
            Action::Reset => 1 << 6,
        }
    }
}

const RESET_PENDING: u8 = 1 << 7;

/// A discrete press/release event as delivered by an input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputEvent {
    Pressed(Action),
    Released(Action),
}

/// The held control intents for one tick, plus the one-shot reset event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionState {
    pub accelerate: bool,
    pub reverse: bool,
    pub steer_left: bool,
    pub steer_right: bool,
    pub brake: bool,
    pub boost: bool,
    /// True for exactly one snapshot after a reset key-down edge.
    pub reset: bool,
}

impl ActionState {
    /// Nothing held, no reset.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Builder-style helper that marks `action` as held (or requests a reset).
    pub fn with(mut self, action: Action) -> Self {
        match action {
            Action::Accelerate => self.accelerate = true,
            Action::Reverse => self.reverse = true,
            Action::SteerLeft => self.steer_left = true,
            Action::SteerRight => self.steer_right = true,
            Action::Brake => self.brake = true,
            Action::Boost => self.boost = true,
            Action::Reset => self.reset = true,
        }
        self
    }

    pub fn is_active(&self, action: Action) -> bool {
        match action {
            Action::Accelerate => self.accelerate,
            Action::Reverse => self.reverse,
            Action::SteerLeft => self.steer_left,
            Action::SteerRight => self.steer_right,
            Action::Brake => self.brake,
            Action::Boost => self.boost,
            Action::Reset => self.reset,
        }
    }

    fn from_bits(bits: u8) -> Self {
        Self {
            accelerate: bits & Action::Accelerate.bit() != 0,
            reverse: bits & Action::Reverse.bit() != 0,
            steer_left: bits & Action::SteerLeft.bit() != 0,
            steer_right: bits & Action::SteerRight.bit() != 0,
            brake: bits & Action::Brake.bit() != 0,
            boost: bits & Action::Boost.bit() != 0,
            reset: bits & RESET_PENDING != 0,
        }
    }
}

/// The single cross-boundary mutable structure between the input collector
/// and the simulation. Safe to share behind an `Arc` across threads.
#[derive(Debug, Default)]
pub struct SharedActionState {
    bits: AtomicU8,
}

impl SharedActionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, action: Action) {
        let bit = action.bit();
        if action == Action::Reset {
            // Latch a pending reset only on the up -> down transition.
            let _ = self
                .bits
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                    (bits & bit == 0).then_some(bits | bit | RESET_PENDING)
                });
        } else {
            self.bits.fetch_or(bit, Ordering::AcqRel);
        }
    }

    pub fn release(&self, action: Action) {
        self.bits.fetch_and(!action.bit(), Ordering::AcqRel);
    }

    pub fn apply(&self, event: InputEvent) {
        match event {
            InputEvent::Pressed(action) => self.press(action),
            InputEvent::Released(action) => self.release(action),
        }
    }

    /// Drops every held flag. A pending reset survives until it is consumed.
    pub fn release_all(&self) {
        self.bits.fetch_and(RESET_PENDING, Ordering::AcqRel);
    }

    /// Reads all flags and consumes the pending reset in one atomic operation.
    pub fn snapshot(&self) -> ActionState {
        ActionState::from_bits(self.bits.fetch_and(!RESET_PENDING, Ordering::AcqRel))
    }

    /// Reads all flags without consuming the pending reset.
    pub fn peek(&self) -> ActionState {
        ActionState::from_bits(self.bits.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn held_flags_track_press_and_release() {
        let shared = SharedActionState::new();
        shared.press(Action::Accelerate);
        shared.press(Action::SteerLeft);
        let snap = shared.snapshot();
        assert!(snap.accelerate && snap.steer_left);
        assert!(!snap.reverse && !snap.reset);

        shared.release(Action::SteerLeft);
        let snap = shared.snapshot();
        assert!(snap.accelerate);
        assert!(!snap.steer_left);
    }

    #[test]
    fn reset_is_consumed_at_most_once_per_press() {
        let shared = SharedActionState::new();
        shared.press(Action::Reset);
        // Key repeat while held must not re-arm the event.
        shared.press(Action::Reset);

        assert!(shared.snapshot().reset);
        assert!(!shared.snapshot().reset);

        shared.release(Action::Reset);
        assert!(!shared.snapshot().reset);

        shared.apply(InputEvent::Pressed(Action::Reset));
        assert!(shared.peek().reset);
        assert!(shared.snapshot().reset);
        assert!(!shared.snapshot().reset);
    }

    #[test]
    fn release_all_keeps_pending_reset() {
        let shared = SharedActionState::new();
        shared.press(Action::Boost);
        shared.press(Action::Reset);
        shared.release_all();
        let snap = shared.snapshot();
        assert!(!snap.boost);
        assert!(snap.reset);
    }

    #[test]
    fn concurrent_writers_never_lose_the_reset_edge() {
        let shared = Arc::new(SharedActionState::new());
        let writer = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for _ in 0..1000 {
                    shared.press(Action::Accelerate);
                    shared.release(Action::Accelerate);
                }
                shared.press(Action::Reset);
            })
        };
        writer.join().expect("writer thread panicked");

        let resets = (0..3).filter(|_| shared.snapshot().reset).count();
        assert_eq!(resets, 1);
    }

    #[test]
    fn builder_matches_queries() {
        let state = ActionState::idle()
            .with(Action::Brake)
            .with(Action::Boost);
        for action in Action::ALL {
            let expected = matches!(action, Action::Brake | Action::Boost);
            assert_eq!(state.is_active(action), expected, "{action:?}");
        }
    }
}
