//! Run/stop state machine for the polling loop.
//!
//! ```text
//! Idle | Stopped  --start-->             Running --issue--> StepInFlight
//! StepInFlight    --ok, cycle continues--> Running (delay, then issue)
//! StepInFlight    --cycle complete-->    Stopped
//! StepInFlight    --request failed-->    Stopped
//! Running | StepInFlight --user stop-->  Stopped
//! ```
//!
//! Each issued step gets its own cancellation token; only the most recent one
//! is tracked, so a user stop cancels at most one request. A run counter
//! distinguishes tickets from an earlier run after a stop/start pair.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Idle,
    Running,
    StepInFlight,
    Stopped,
}

impl LoopState {
    pub fn is_active(self) -> bool {
        matches!(self, LoopState::Running | LoopState::StepInFlight)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    User,
    CycleComplete,
    Failed,
}

/// Permission to perform one step request.
#[derive(Debug, Clone)]
pub struct StepTicket {
    run: u64,
    seq: u64,
    token: CancellationToken,
}

impl StepTicket {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug)]
pub struct LoopController {
    state: LoopState,
    run: u64,
    seq: u64,
    current: Option<CancellationToken>,
    stop_reason: Option<StopReason>,
    step_delay: Duration,
}

impl LoopController {
    pub fn new(step_delay: Duration) -> Self {
        Self {
            state: LoopState::Idle,
            run: 0,
            seq: 0,
            current: None,
            stop_reason: None,
            step_delay,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    pub fn step_delay(&self) -> Duration {
        self.step_delay
    }

    /// Total step requests issued across all runs.
    pub fn steps_issued(&self) -> u64 {
        self.seq
    }

    /// Starts a run and issues its first step. A no-op while a run is active.
    pub fn start(&mut self) -> Option<StepTicket> {
        if self.state.is_active() {
            debug!(state = ?self.state, "start ignored; loop already running");
            return None;
        }
        self.run += 1;
        self.stop_reason = None;
        self.state = LoopState::Running;
        Some(self.issue())
    }

    /// User stop. Cancels the latest token; nothing further is scheduled.
    pub fn stop(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        if let Some(token) = self.current.take() {
            token.cancel();
        }
        self.state = LoopState::Stopped;
        self.stop_reason = Some(StopReason::User);
        true
    }

    /// Whether a completed request may touch the view: it must be the step
    /// currently in flight, from the current run, and not cancelled.
    pub fn accepts(&self, ticket: &StepTicket) -> bool {
        self.state == LoopState::StepInFlight
            && ticket.run == self.run
            && ticket.seq == self.seq
            && !ticket.token.is_cancelled()
    }

    /// Records a reconciled response.
    pub fn finish_step(&mut self, cycle_complete: bool) {
        if cycle_complete {
            self.current = None;
            self.state = LoopState::Stopped;
            self.stop_reason = Some(StopReason::CycleComplete);
        } else {
            self.state = LoopState::Running;
        }
    }

    pub fn fail(&mut self) {
        self.current = None;
        self.state = LoopState::Stopped;
        self.stop_reason = Some(StopReason::Failed);
    }

    /// Issues the follow-up step after the inter-step delay, unless the run
    /// that produced `previous` has since been stopped or replaced.
    pub fn next_step(&mut self, previous: &StepTicket) -> Option<StepTicket> {
        if self.state != LoopState::Running
            || previous.run != self.run
            || previous.token.is_cancelled()
        {
            return None;
        }
        Some(self.issue())
    }

    fn issue(&mut self) -> StepTicket {
        let token = CancellationToken::new();
        self.current = Some(token.clone());
        self.seq += 1;
        self.state = LoopState::StepInFlight;
        StepTicket {
            run: self.run,
            seq: self.seq,
            token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> LoopController {
        LoopController::new(Duration::from_millis(800))
    }

    #[test]
    fn start_issues_first_step() {
        let mut c = controller();
        assert_eq!(c.state(), LoopState::Idle);
        let t = c.start().unwrap();
        assert_eq!(c.state(), LoopState::StepInFlight);
        assert!(c.accepts(&t));
        assert_eq!(c.steps_issued(), 1);
    }

    #[test]
    fn reentrant_start_is_noop() {
        let mut c = controller();
        let t = c.start().unwrap();
        assert!(c.start().is_none());
        c.finish_step(false);
        assert_eq!(c.state(), LoopState::Running);
        assert!(c.start().is_none());
        assert_eq!(c.steps_issued(), 1);
        assert!(c.next_step(&t).is_some());
    }

    #[test]
    fn stop_cancels_in_flight_token() {
        let mut c = controller();
        let t = c.start().unwrap();
        assert!(c.stop());
        assert!(t.is_cancelled());
        assert!(!c.accepts(&t));
        assert_eq!(c.state(), LoopState::Stopped);
        assert_eq!(c.stop_reason(), Some(StopReason::User));
        assert!(!c.stop());
    }

    #[test]
    fn stop_during_delay_prevents_next_step() {
        let mut c = controller();
        let t = c.start().unwrap();
        c.finish_step(false);
        c.stop();
        assert!(c.next_step(&t).is_none());
    }

    #[test]
    fn stale_ticket_from_previous_run_is_rejected() {
        let mut c = controller();
        let old = c.start().unwrap();
        c.stop();
        let fresh = c.start().unwrap();
        assert!(!c.accepts(&old));
        assert!(c.accepts(&fresh));
        assert_ne!(old.run(), fresh.run());
    }

    #[test]
    fn completion_and_failure_stop_without_cancelling() {
        let mut c = controller();
        let t = c.start().unwrap();
        c.finish_step(true);
        assert_eq!(c.stop_reason(), Some(StopReason::CycleComplete));
        assert!(!t.is_cancelled());
        assert!(c.next_step(&t).is_none());

        let t = c.start().unwrap();
        c.fail();
        assert_eq!(c.state(), LoopState::Stopped);
        assert_eq!(c.stop_reason(), Some(StopReason::Failed));
        assert!(c.next_step(&t).is_none());
    }
}
