//! Check scheduler - debounce and at-most-one-in-flight discipline.
//!
//! The scheduler is a pure state machine. Inputs are edits, timer expiry and
//! check completions; outputs are [`Effect`]s the engine carries out. Every
//! cycle gets a fresh [`Epoch`], and timers or completions from an older
//! epoch are ignored.
//!
//! | State      | Edit                         | Debounce fires (own epoch)       | Check finishes (own epoch)     |
//! |------------|------------------------------|----------------------------------|--------------------------------|
//! | `Idle`     | arm timer, `Pending`         | -                                | -                              |
//! | `Pending`  | re-arm timer, `Pending`      | blank: `Idle`; else `InFlight`   | -                              |
//! | `InFlight` | cancel, arm timer, `Stale`   | -                                | apply/discard/fail, `Idle`     |
//! | `Stale`    | re-arm timer, `Stale`        | `InFlight`                       | orphan settles: `Pending`      |

use std::fmt;
use std::time::Duration;

use crate::error::CheckerError;

/// Identifies one edit-to-result cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Epoch(pub u64);

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing armed, nothing outstanding.
    Idle,
    /// Debounce timer armed for `epoch`.
    Pending { epoch: Epoch },
    /// Request for `epoch` outstanding against `snapshot`.
    InFlight { epoch: Epoch, snapshot: String },
    /// An edit arrived while `orphan` was in flight. The orphan has been
    /// cancelled but has not reported back; a timer is armed for `pending`.
    Stale { pending: Epoch, orphan: Epoch },
}

/// Side effects requested by a transition, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Disarm the current debounce timer.
    CancelDebounce,
    /// Signal cancellation to the request of `epoch`. Do not wait for it.
    CancelCheck { epoch: Epoch },
    /// Drop every displayed suggestion and repaint plain text.
    ClearSuggestions,
    ArmDebounce { epoch: Epoch, delay: Duration },
    /// Send `text` to the checker.
    IssueCheck { epoch: Epoch, text: String },
    /// Status should read "Checking...".
    Checking,
    /// Blank text: status back to "Ready".
    Ready,
}

/// How a request ended, as reported by the task that ran it.
#[derive(Debug, Clone, Copy)]
pub enum Completion<'a> {
    Succeeded,
    Cancelled,
    Failed(&'a CheckerError),
}

impl<'a, T> From<&'a Result<T, CheckerError>> for Completion<'a> {
    fn from(result: &'a Result<T, CheckerError>) -> Self {
        match result {
            Ok(_) => Completion::Succeeded,
            Err(CheckerError::Cancelled) => Completion::Cancelled,
            Err(e) => Completion::Failed(e),
        }
    }
}

/// What to do with a finished request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Current and authoritative: normalize, resolve and replace the set.
    Apply,
    /// Superseded by a newer edit or computed against other text. Drop it.
    Discard,
    /// Cancellation acknowledged. Silent.
    Cancelled,
    /// Surface this message; leave the set empty.
    Failed(String),
}

#[derive(Debug)]
pub struct CheckScheduler {
    state: SchedulerState,
    debounce: Duration,
    last_epoch: u64,
}

impl CheckScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: SchedulerState::Idle,
            debounce,
            last_epoch: 0,
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn is_idle(&self) -> bool {
        self.state == SchedulerState::Idle
    }

    fn next_epoch(&mut self) -> Epoch {
        self.last_epoch += 1;
        Epoch(self.last_epoch)
    }

    /// The text changed (or a re-check was requested).
    ///
    /// Always clears the displayed set and arms a new debounce timer; an
    /// outstanding request is cancelled first.
    pub fn on_text_changed(&mut self) -> Vec<Effect> {
        let epoch = self.next_epoch();
        let mut effects = Vec::with_capacity(3);

        let next = match std::mem::replace(&mut self.state, SchedulerState::Idle) {
            SchedulerState::Idle => SchedulerState::Pending { epoch },
            SchedulerState::Pending { .. } => {
                effects.push(Effect::CancelDebounce);
                SchedulerState::Pending { epoch }
            }
            SchedulerState::InFlight { epoch: orphan, .. } => {
                effects.push(Effect::CancelCheck { epoch: orphan });
                SchedulerState::Stale {
                    pending: epoch,
                    orphan,
                }
            }
            SchedulerState::Stale { orphan, .. } => {
                effects.push(Effect::CancelDebounce);
                SchedulerState::Stale {
                    pending: epoch,
                    orphan,
                }
            }
        };

        effects.push(Effect::ClearSuggestions);
        effects.push(Effect::ArmDebounce {
            epoch,
            delay: self.debounce,
        });

        tracing::debug!("Scheduler: edit -> {:?}", next);
        self.state = next;
        effects
    }

    /// The debounce timer for `epoch` fired; `text` is the current live text.
    pub fn on_debounce_elapsed(&mut self, epoch: Epoch, text: &str) -> Vec<Effect> {
        let armed = match self.state {
            SchedulerState::Pending { epoch: e } | SchedulerState::Stale { pending: e, .. } => e,
            _ => {
                tracing::debug!("Scheduler: ignoring timer {} in {:?}", epoch, self.state);
                return Vec::new();
            }
        };
        if armed != epoch {
            tracing::debug!("Scheduler: ignoring superseded timer {}", epoch);
            return Vec::new();
        }

        if text.trim().is_empty() {
            tracing::debug!("Scheduler: blank text, skipping check {}", epoch);
            self.state = SchedulerState::Idle;
            return vec![Effect::ClearSuggestions, Effect::Ready];
        }

        tracing::debug!("Scheduler: issuing check {} (text_len={})", epoch, text.len());
        self.state = SchedulerState::InFlight {
            epoch,
            snapshot: text.to_string(),
        };
        vec![
            Effect::Checking,
            Effect::IssueCheck {
                epoch,
                text: text.to_string(),
            },
        ]
    }

    /// A request finished. `snapshot` is the text it was issued against and
    /// `live_text` the text now displayed.
    pub fn on_check_finished(
        &mut self,
        epoch: Epoch,
        snapshot: &str,
        live_text: &str,
        completion: Completion<'_>,
    ) -> Verdict {
        let current = matches!(self.state, SchedulerState::InFlight { epoch: e, .. } if e == epoch);

        if !current {
            if let SchedulerState::Stale { pending, orphan } = self.state {
                if orphan == epoch {
                    self.state = SchedulerState::Pending { epoch: pending };
                }
            }
            return match completion {
                Completion::Cancelled => Verdict::Cancelled,
                _ => {
                    tracing::debug!("Scheduler: discarding superseded result {}", epoch);
                    Verdict::Discard
                }
            };
        }

        self.state = SchedulerState::Idle;

        if let Completion::Cancelled = completion {
            return Verdict::Cancelled;
        }
        if snapshot != live_text {
            tracing::debug!("Scheduler: text drifted under result {}, discarding", epoch);
            return Verdict::Discard;
        }
        match completion {
            Completion::Succeeded => Verdict::Apply,
            Completion::Failed(e) => Verdict::Failed(e.to_string()),
            Completion::Cancelled => Verdict::Cancelled,
        }
    }

    /// Stop everything. Returns effects that disarm timers and cancel any
    /// outstanding request.
    pub fn shutdown(&mut self) -> Vec<Effect> {
        match std::mem::replace(&mut self.state, SchedulerState::Idle) {
            SchedulerState::Idle => Vec::new(),
            SchedulerState::Pending { .. } => vec![Effect::CancelDebounce],
            SchedulerState::InFlight { epoch, .. } => vec![Effect::CancelCheck { epoch }],
            SchedulerState::Stale { orphan, .. } => vec![
                Effect::CancelDebounce,
                Effect::CancelCheck { epoch: orphan },
            ],
        }
    }
}
