//! The rendering boundary.
//!
//! Everything the synchronization loop shows goes through [`ViewSink`]. The
//! browser build implements it on top of DOM elements; [`crate::memory`]
//! implements it in memory for the headless client and for tests.

use std::rc::Rc;

use crate::error::ApiError;
use crate::protocol::CycleCompleteEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Col,
}

impl Axis {
    pub fn data_key(self) -> &'static str {
        match self {
            Axis::Row => "row",
            Axis::Col => "col",
        }
    }

    pub fn attribute(self) -> &'static str {
        match self {
            Axis::Row => "data-row",
            Axis::Col => "data-col",
        }
    }

    /// Style custom property consumed by the grid layout.
    pub fn css_property(self) -> &'static str {
        match self {
            Axis::Row => "--row",
            Axis::Col => "--col",
        }
    }
}

/// Per-step cues on a sprite. Set when the delta carries them, removed when
/// it does not, so a cue never outlives the step that reported it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransientFlag {
    CaughtPrey,
    CycleStep,
    CanMove,
}

impl TransientFlag {
    pub const ALL: [TransientFlag; 3] = [
        TransientFlag::CaughtPrey,
        TransientFlag::CycleStep,
        TransientFlag::CanMove,
    ];

    pub fn data_key(self) -> &'static str {
        match self {
            TransientFlag::CaughtPrey => "caughtPrey",
            TransientFlag::CycleStep => "cycleStep",
            TransientFlag::CanMove => "canMove",
        }
    }

    pub fn attribute(self) -> &'static str {
        match self {
            TransientFlag::CaughtPrey => "data-caught-prey",
            TransientFlag::CycleStep => "data-cycle-step",
            TransientFlag::CanMove => "data-can-move",
        }
    }
}

pub trait ViewSink {
    type Organism;
    type Level;

    fn set_position(&mut self, organism: &Self::Organism, axis: Axis, value: f64);
    fn set_flag(&mut self, organism: &Self::Organism, flag: TransientFlag, value: &str);
    fn clear_flag(&mut self, organism: &Self::Organism, flag: TransientFlag);
    fn set_population(&mut self, organism: &Self::Organism, population: i64);
    fn set_genome(&mut self, organism: &Self::Organism, text: &str);
    fn hide_panel(&mut self, organism: &Self::Organism);
    /// Permanent for the rest of the session.
    fn remove_sprite(&mut self, organism: &Self::Organism);
    fn set_level_total(&mut self, level: &Self::Level, total: i64);
    fn cycle_complete(&mut self, event: &CycleCompleteEvent);

    /// Operator channel for a run that stopped on an error.
    fn loop_failed(&mut self, error: &ApiError) {
        let _ = error;
    }

    /// Outside code to tell when a run ends. It is called after the session
    /// borrow is released, so it may call back into the client.
    fn listener(&self) -> Option<Rc<dyn LoopListener>> {
        None
    }
}

/// Page scripts and other integrations that react to the end of a run.
pub trait LoopListener {
    fn cycle_complete(&self, event: &CycleCompleteEvent);

    fn loop_failed(&self, error: &ApiError) {
        let _ = error;
    }
}
