//! Device lifecycle state machine.
//!
//! The machine tracks the [`DeviceState`] the supervisory framework sees,
//! together with a human-readable status line and a bounded transition
//! history.
//!
//! # Valid Transitions
//!
//! - ON → OFF (turn-off command)
//! - ON → FAULT (connection fault during an operation)
//!
//! Leaving `OFF` or `FAULT` is never a plain transition. It only happens
//! through [`StateMachine::restart`], which the device calls at the end of
//! every initialization, successful or not.
//!
//! # Examples
//!
//! ```
//! use pinlink_core::DeviceState;
//! use pinlink_device::StateMachine;
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), DeviceState::Fault);
//!
//! machine.restart(DeviceState::On, "The device is in ON state.");
//! machine.transition_to(DeviceState::Off, "Device turned off").unwrap();
//!
//! assert!(machine.transition_to(DeviceState::Fault, "lost").is_err());
//! ```

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use pinlink_core::{DeviceState, Error, Result};
use serde::Serialize;
use tracing::info;

/// Maximum number of state transitions to keep in history.
const MAX_HISTORY_SIZE: usize = 100;

/// Status line of a device that has not completed an initialization yet.
pub const NOT_INITIALIZED: &str = "not initialized";

/// Status line of a device in `state` when no fault reason applies.
pub fn status_for(state: DeviceState) -> String {
    format!("The device is in {state} state.")
}

/// A single recorded state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    pub from: DeviceState,
    pub to: DeviceState,

    /// Wall-clock time of the change.
    pub at: DateTime<Utc>,

    /// Why the change happened; becomes the status line.
    pub reason: String,
}

impl StateTransition {
    fn new(from: DeviceState, to: DeviceState, reason: String) -> Self {
        Self {
            from,
            to,
            at: Utc::now(),
            reason,
        }
    }
}

/// Lifecycle state, status line and transition history of one device.
#[derive(Debug)]
pub struct StateMachine {
    current_state: DeviceState,

    /// Status text shown to operators.
    status: String,

    /// Recent transitions, oldest first (limited to MAX_HISTORY_SIZE).
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a machine in `FAULT` with the status "not initialized".
    pub fn new() -> Self {
        Self {
            current_state: DeviceState::Fault,
            status: NOT_INITIALIZED.to_string(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> DeviceState {
        self.current_state
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Move to `new_state`, validating the transition.
    ///
    /// # Errors
    /// Returns `Error::InvalidStateTransition` and leaves the machine
    /// untouched if the transition is not allowed from the current state.
    pub fn transition_to(
        &mut self,
        new_state: DeviceState,
        reason: impl Into<String>,
    ) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state,
                to: new_state,
            });
        }

        Ok(self.perform_state_change(new_state, reason.into()))
    }

    /// Force the machine into `outcome` at the end of an initialization.
    ///
    /// Valid from any state, including `outcome` itself: a repeated
    /// successful init is recorded as ON → ON.
    pub fn restart(&mut self, outcome: DeviceState, reason: impl Into<String>) -> StateTransition {
        self.perform_state_change(outcome, reason.into())
    }

    fn perform_state_change(&mut self, new_state: DeviceState, reason: String) -> StateTransition {
        let transition = StateTransition::new(self.current_state, new_state, reason);
        info!(
            from = %transition.from,
            to = %transition.to,
            reason = %transition.reason,
            "Device state changed"
        );

        self.current_state = new_state;
        self.status = transition.reason.clone();

        self.history.push_back(transition.clone());
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        transition
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
