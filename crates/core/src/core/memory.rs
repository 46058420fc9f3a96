//! In-memory [`ViewSink`] used by the headless client and the tests.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;

use crate::error::ApiError;
use crate::protocol::CycleCompleteEvent;
use crate::sink::{Axis, LoopListener, TransientFlag, ViewSink};

#[derive(Debug, Clone, PartialEq)]
pub struct OrganismView {
    pub row: Option<f64>,
    pub col: Option<f64>,
    pub flags: BTreeMap<TransientFlag, String>,
    pub population_text: Option<String>,
    pub genome_text: Option<String>,
    pub panel_hidden: bool,
    pub sprite_present: bool,
}

impl Default for OrganismView {
    fn default() -> Self {
        Self {
            row: None,
            col: None,
            flags: BTreeMap::new(),
            population_text: None,
            genome_text: None,
            panel_hidden: false,
            sprite_present: true,
        }
    }
}

/// Handles are the ids themselves.
#[derive(Default)]
pub struct MemorySink {
    organisms: HashMap<String, OrganismView>,
    level_totals: HashMap<String, i64>,
    events: Vec<CycleCompleteEvent>,
    failures: Vec<String>,
    mutations: u64,
    listener: Option<Rc<dyn LoopListener>>,
}

impl fmt::Debug for MemorySink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySink")
            .field("organisms", &self.organisms.len())
            .field("events", &self.events.len())
            .field("failures", &self.failures)
            .field("mutations", &self.mutations)
            .finish_non_exhaustive()
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listener(mut self, listener: Rc<dyn LoopListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn organism(&self, id: &str) -> Option<&OrganismView> {
        self.organisms.get(id)
    }

    pub fn level_total(&self, id: &str) -> Option<i64> {
        self.level_totals.get(id).copied()
    }

    pub fn events(&self) -> &[CycleCompleteEvent] {
        &self.events
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Count of organism and level writes, used to assert that nothing was
    /// touched. Events and failures are not counted.
    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    fn view_mut(&mut self, id: &str) -> &mut OrganismView {
        self.mutations += 1;
        self.organisms.entry_ref(id).or_default()
    }
}

impl ViewSink for MemorySink {
    type Organism = String;
    type Level = String;

    fn set_position(&mut self, organism: &String, axis: Axis, value: f64) {
        let view = self.view_mut(organism);
        match axis {
            Axis::Row => view.row = Some(value),
            Axis::Col => view.col = Some(value),
        }
    }

    fn set_flag(&mut self, organism: &String, flag: TransientFlag, value: &str) {
        self.view_mut(organism).flags.insert(flag, value.to_string());
    }

    fn clear_flag(&mut self, organism: &String, flag: TransientFlag) {
        self.view_mut(organism).flags.remove(&flag);
    }

    fn set_population(&mut self, organism: &String, population: i64) {
        self.view_mut(organism).population_text = Some(population.to_string());
    }

    fn set_genome(&mut self, organism: &String, text: &str) {
        self.view_mut(organism).genome_text = Some(text.to_string());
    }

    fn hide_panel(&mut self, organism: &String) {
        self.view_mut(organism).panel_hidden = true;
    }

    fn remove_sprite(&mut self, organism: &String) {
        self.view_mut(organism).sprite_present = false;
    }

    fn set_level_total(&mut self, level: &String, total: i64) {
        self.mutations += 1;
        self.level_totals.insert(level.clone(), total);
    }

    fn cycle_complete(&mut self, event: &CycleCompleteEvent) {
        self.events.push(event.clone());
    }

    fn loop_failed(&mut self, error: &ApiError) {
        self.failures.push(error.to_string());
    }

    fn listener(&self) -> Option<Rc<dyn LoopListener>> {
        self.listener.clone()
    }
}
