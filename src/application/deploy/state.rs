//! Deploy state machine
//!
//! Tracks the current state, rejects edges `DeployState` does not allow, and
//! reports every transition to the event sink.

use std::sync::Arc;

use tracing::info;

use crate::domain::ports::{DeployEvent, DeployEventSink};
use crate::domain::value_objects::DeployState;
use crate::error::{DeployError, DeployResult};

pub struct DeployStateMachine {
    state: DeployState,
    history: Vec<DeployState>,
    events: Arc<dyn DeployEventSink>,
}

impl DeployStateMachine {
    pub fn new(events: Arc<dyn DeployEventSink>) -> Self {
        Self {
            state: DeployState::Idle,
            history: vec![DeployState::Idle],
            events,
        }
    }

    pub fn state(&self) -> DeployState {
        self.state
    }

    /// Every state visited, starting with `Idle`
    pub fn history(&self) -> &[DeployState] {
        &self.history
    }

    pub fn advance(&mut self, to: DeployState) -> DeployResult<()> {
        let from = self.state;
        if !from.can_transition_to(to) {
            return Err(DeployError::InvalidTransition { from, to });
        }
        info!(from = %from, to = %to, "deploy state");
        self.state = to;
        self.history.push(to);
        self.events.on_event(DeployEvent::StateChanged { from, to });
        Ok(())
    }

    /// Move to `Failed`; no-op once terminal
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            let _ = self.advance(DeployState::Failed);
        }
    }
}
