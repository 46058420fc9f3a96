//! All mutable client state in one place: view index, sink, loop controller
//! and display mode. Front ends hold one session behind `Rc<RefCell<_>>` and
//! only borrow it between awaits.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::LoopConfig;
use crate::controller::{LoopController, LoopState, StepTicket, StopReason};
use crate::error::ApiError;
use crate::genome::DisplayMode;
use crate::protocol::{CycleCompleteEvent, StepResult};
use crate::reconcile::{self, ReconcileReport, SinkIndex};
use crate::sink::ViewSink;

/// What the loop should do after a step request finished.
#[derive(Debug, Clone, PartialEq)]
pub enum StepDisposition {
    /// Cancelled or superseded; nothing was touched.
    Discarded,
    Continue {
        delay: Duration,
        report: ReconcileReport,
    },
    CycleComplete(CycleCompletion),
    Failed(ApiError),
}

/// Everything needed to persist and announce a finished cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleCompletion {
    pub cycle_index: Option<i64>,
    pub summary: Vec<Value>,
    pub organisms: Vec<Value>,
}

impl CycleCompletion {
    pub fn event(&self) -> CycleCompleteEvent {
        CycleCompleteEvent {
            cycle: self.cycle_index,
            summary: self.summary.clone(),
        }
    }
}

pub struct SimulationSession<V: ViewSink> {
    index: SinkIndex<V>,
    sink: V,
    controller: LoopController,
    display_mode: DisplayMode,
    cycles_completed: u64,
}

impl<V: ViewSink> SimulationSession<V> {
    pub fn new(index: SinkIndex<V>, sink: V, config: &LoopConfig) -> Self {
        Self {
            index,
            sink,
            controller: LoopController::new(config.step_delay()),
            display_mode: config.display_mode,
            cycles_completed: 0,
        }
    }

    pub fn index(&self) -> &SinkIndex<V> {
        &self.index
    }

    pub fn sink(&self) -> &V {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut V {
        &mut self.sink
    }

    pub fn state(&self) -> LoopState {
        self.controller.state()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.controller.stop_reason()
    }

    pub fn steps_issued(&self) -> u64 {
        self.controller.steps_issued()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn is_running(&self) -> bool {
        self.controller.state().is_active()
    }

    pub fn start(&mut self) -> Option<StepTicket> {
        let ticket = self.controller.start()?;
        info!(run = ticket.run(), "simulation loop started");
        Some(ticket)
    }

    /// User stop. No persistence happens for a stopped run.
    pub fn stop(&mut self) -> bool {
        let stopped = self.controller.stop();
        if stopped {
            info!("simulation loop stopped by user");
        }
        stopped
    }

    /// Handles a finished step request. Reconciliation (including level totals)
    /// completes here, before any further step can be issued.
    pub fn complete_step(
        &mut self,
        ticket: &StepTicket,
        outcome: Result<StepResult, ApiError>,
    ) -> StepDisposition {
        if !self.controller.accepts(ticket) {
            debug!(seq = ticket.seq(), "discarding response for cancelled step");
            return StepDisposition::Discarded;
        }

        let step = match outcome {
            Ok(step) => step,
            Err(e) => {
                self.controller.fail();
                error!(error = %e, "simulation step failed; loop stopped");
                self.sink.loop_failed(&e);
                return StepDisposition::Failed(e);
            }
        };

        let report = reconcile::apply_step(&mut self.index, &mut self.sink, self.display_mode, &step);
        self.controller.finish_step(step.cycle_complete);

        if step.cycle_complete {
            self.cycles_completed += 1;
            info!(cycle = ?step.cycle_index, "simulation cycle complete");
            StepDisposition::CycleComplete(CycleCompletion {
                cycle_index: step.cycle_index,
                summary: step.cycle_summary,
                organisms: step.organisms,
            })
        } else {
            StepDisposition::Continue {
                delay: self.controller.step_delay(),
                report,
            }
        }
    }

    pub fn next_step(&mut self, previous: &StepTicket) -> Option<StepTicket> {
        self.controller.next_step(previous)
    }

    pub fn notify_cycle_complete(&mut self, event: &CycleCompleteEvent) {
        self.sink.cycle_complete(event);
    }

    /// Switches the global genome display mode and re-renders every organism
    /// from its cached genome and trait names.
    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
        reconcile::rerender_genomes(&self.index, &mut self.sink, mode);
    }

    pub fn toggle_display_mode(&mut self) -> DisplayMode {
        let mode = self.display_mode.toggled();
        self.set_display_mode(mode);
        mode
    }
}
