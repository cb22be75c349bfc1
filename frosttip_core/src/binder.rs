use std::time::Duration;

use tracing::debug;

/// Identifies one armed delay timer. Tokens are never reused within a binder,
/// so an expiry that raced its own cancellation shows up as stale and is
/// dropped instead of resurrecting a dismissed tooltip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No overlay, no timer.
    Idle,
    /// The pointer is over the trigger and the delay timer is running.
    Pending(TimerToken),
    /// The overlay is mounted and viewport listeners are attached.
    Visible,
}

/// What the host must do after feeding an input to the binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a one-shot timer for `delay`. Any previously armed timer is
    /// superseded and must be cancelled.
    Arm { token: TimerToken, delay: Duration },
    /// Cancel the pending timer without showing.
    Disarm(TimerToken),
    /// Mount the overlay, sample geometry, attach viewport listeners.
    Show,
    /// Remove the overlay and detach viewport listeners.
    Hide,
    /// Nothing to do.
    None,
}

/// Show/hide state machine for a single trigger.
///
/// The binder never touches timers or widgets itself; it only decides. The
/// host executes the returned [`Command`] and reports timer expiries back via
/// [`HoverBinder::timer_fired`]. Arming always supersedes the previous timer,
/// so at most one is outstanding at any point.
#[derive(Debug)]
pub struct HoverBinder {
    phase: Phase,
    delay: Duration,
    timers_armed: u64,
}

impl HoverBinder {
    pub fn new(delay: Duration) -> Self {
        Self {
            phase: Phase::Idle,
            delay,
            timers_armed: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_visible(&self) -> bool {
        self.phase == Phase::Visible
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// The pointer entered the trigger: arm the delay timer. A zero delay
    /// still goes through the timer path so behavior is uniform.
    pub fn pointer_enter(&mut self) -> Command {
        match self.phase {
            Phase::Idle | Phase::Pending(_) => {
                self.timers_armed += 1;
                let token = TimerToken(self.timers_armed);
                self.phase = Phase::Pending(token);
                debug!(?token, delay = ?self.delay, "arming hover delay");
                Command::Arm {
                    token,
                    delay: self.delay,
                }
            }
            Phase::Visible => Command::None,
        }
    }

    /// The pointer left the trigger: cancel a running timer or dismiss the
    /// overlay, whichever applies.
    pub fn pointer_leave(&mut self) -> Command {
        match self.phase {
            Phase::Idle => Command::None,
            Phase::Pending(token) => {
                self.phase = Phase::Idle;
                debug!(?token, "pointer left before delay expired");
                Command::Disarm(token)
            }
            Phase::Visible => {
                self.phase = Phase::Idle;
                Command::Hide
            }
        }
    }

    /// A delay timer expired. Only the currently armed token may transition
    /// to `Visible`; anything else is a superseded or cancelled timer.
    pub fn timer_fired(&mut self, token: TimerToken) -> Command {
        match self.phase {
            Phase::Pending(armed) if armed == token => {
                self.phase = Phase::Visible;
                Command::Show
            }
            _ => {
                debug!(?token, "dropping stale hover timer");
                Command::None
            }
        }
    }

    /// Mandatory cleanup on unmount: cancel the timer if armed, detach if
    /// visible. Safe to call repeatedly.
    pub fn teardown(&mut self) -> Command {
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => Command::None,
            Phase::Pending(token) => Command::Disarm(token),
            Phase::Visible => Command::Hide,
        }
    }
}

/// Delay is configuration with no caller-visible error channel: negative
/// values clamp to zero instead of being rejected.
pub fn delay_from_millis(millis: i64) -> Duration {
    Duration::from_millis(millis.max(0) as u64)
}
