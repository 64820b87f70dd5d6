// Pick-clock countdown.
//
// A tick-driven state machine with no thread of its own. The session loop
// calls `PickClock::tick` once per second while it runs.
//
//   Idle -> Running -> (Expired | Idle)

use serde::{Deserialize, Serialize};

pub const DEFAULT_PICK_SECONDS: u32 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockState {
    Idle,
    Running,
    Expired,
}

/// Threshold warnings emitted on the way down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockAlert {
    ThirtySeconds,
    FifteenSeconds,
    /// Emitted every second from 5 down to 1.
    FinalSeconds(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockEvent {
    Tick { remaining_seconds: u32 },
    Alert(ClockAlert),
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickClock {
    state: ClockState,
    remaining: u32,
}

impl Default for PickClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PickClock {
    pub fn new() -> Self {
        Self {
            state: ClockState::Idle,
            remaining: 0,
        }
    }

    /// Start (or restart) the countdown.
    pub fn start(&mut self, seconds: u32) {
        self.remaining = seconds.max(1);
        self.state = ClockState::Running;
    }

    /// Cancel immediately. Safe to call in any state. Returns whether a
    /// running countdown was cancelled.
    pub fn clear(&mut self) -> bool {
        let was_running = self.is_running();
        self.state = ClockState::Idle;
        self.remaining = 0;
        was_running
    }

    /// Advance one second.
    pub fn tick(&mut self) -> Vec<ClockEvent> {
        if !self.is_running() {
            return Vec::new();
        }
        self.remaining = self.remaining.saturating_sub(1);
        let mut events = vec![ClockEvent::Tick {
            remaining_seconds: self.remaining,
        }];
        match self.remaining {
            0 => {
                self.state = ClockState::Expired;
                events.push(ClockEvent::Expired);
            }
            30 => events.push(ClockEvent::Alert(ClockAlert::ThirtySeconds)),
            15 => events.push(ClockEvent::Alert(ClockAlert::FifteenSeconds)),
            n @ 1..=5 => events.push(ClockEvent::Alert(ClockAlert::FinalSeconds(n))),
            _ => {}
        }
        events
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}
