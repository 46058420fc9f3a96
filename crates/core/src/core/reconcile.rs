//! Applies one step response to the view index and its sink.

use tracing::debug;

use crate::genome::{format_genome, DisplayMode};
use crate::index::{OrganismEntry, ViewIndex};
use crate::protocol::{OrganismDelta, StepResult};
use crate::sink::{Axis, TransientFlag, ViewSink};

pub type SinkIndex<V> = ViewIndex<<V as ViewSink>::Organism, <V as ViewSink>::Level>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub applied: usize,
    /// Entries with no usable id.
    pub malformed: usize,
    /// Ids not present in the page layout.
    pub unknown: usize,
    /// Deltas for organisms already extinct.
    pub ignored_extinct: usize,
    pub newly_extinct: usize,
}

/// Order: per-delta sprite and panel updates, then extinctions, then a full
/// recomputation of every level total.
pub fn apply_step<V: ViewSink>(
    index: &mut SinkIndex<V>,
    sink: &mut V,
    mode: DisplayMode,
    step: &StepResult,
) -> ReconcileReport {
    let mut report = ReconcileReport::default();

    for raw in &step.organisms {
        let Some(delta) = OrganismDelta::from_json(raw) else {
            report.malformed += 1;
            continue;
        };
        let Some(entry) = index.lookup_organism_mut(&delta.id) else {
            report.unknown += 1;
            continue;
        };
        if entry.state.is_extinct() {
            report.ignored_extinct += 1;
            continue;
        }
        apply_sprite(sink, &entry.handles, &delta);
        apply_panel(sink, entry, &delta, mode);
        report.applied += 1;
    }

    for id in &step.extinct {
        let Some(entry) = index.lookup_organism_mut(id) else {
            continue;
        };
        if entry.state.is_extinct() {
            continue;
        }
        entry.state.mark_extinct();
        sink.set_population(&entry.handles, 0);
        sink.hide_panel(&entry.handles);
        sink.remove_sprite(&entry.handles);
        report.newly_extinct += 1;
    }

    refresh_level_totals(index, sink);

    debug!(
        applied = report.applied,
        unknown = report.unknown,
        malformed = report.malformed,
        newly_extinct = report.newly_extinct,
        "reconciled step"
    );
    report
}

fn apply_sprite<V: ViewSink>(sink: &mut V, handles: &V::Organism, delta: &OrganismDelta) {
    // Absent coordinates mean "unchanged".
    if let Some(row) = delta.row {
        sink.set_position(handles, Axis::Row, row);
    }
    if let Some(col) = delta.col {
        sink.set_position(handles, Axis::Col, col);
    }

    for flag in TransientFlag::ALL {
        let value = match flag {
            TransientFlag::CaughtPrey => delta.caught_prey.map(|v| v.to_string()),
            TransientFlag::CycleStep => delta.cycle_step.map(|s| s.to_string()),
            TransientFlag::CanMove => delta.can_move.map(|v| v.to_string()),
        };
        match value {
            Some(v) => sink.set_flag(handles, flag, &v),
            None => sink.clear_flag(handles, flag),
        }
    }
}

fn apply_panel<V: ViewSink>(
    sink: &mut V,
    entry: &mut OrganismEntry<V::Organism>,
    delta: &OrganismDelta,
    mode: DisplayMode,
) {
    if let Some(population) = delta.population {
        entry.state.population = Some(population);
        sink.set_population(&entry.handles, population);
    }

    let genome_changed = delta.average_genome.is_some();
    if let Some(genome) = &delta.average_genome {
        entry.state.last_average_genome = Some(genome.clone());
    }
    // Names are only replaced when the server sends them.
    if let Some(names) = &delta.trait_names {
        entry.state.last_trait_names = Some(names.clone());
    }
    if genome_changed
        || (delta.trait_names.is_some() && entry.state.last_average_genome.is_some())
    {
        render_genome(sink, entry, mode);
    }
}

pub(crate) fn render_genome<V: ViewSink>(
    sink: &mut V,
    entry: &OrganismEntry<V::Organism>,
    mode: DisplayMode,
) {
    let text = format_genome(
        entry.state.last_average_genome.as_deref(),
        entry.state.last_trait_names.as_deref(),
        mode,
    );
    sink.set_genome(&entry.handles, &text);
}

/// Re-renders every organism's genome text from cached state, e.g. after the
/// display mode changes. Extinct organisms keep their last text.
pub fn rerender_genomes<V: ViewSink>(index: &SinkIndex<V>, sink: &mut V, mode: DisplayMode) {
    for entry in index.organisms() {
        if entry.state.is_extinct() {
            continue;
        }
        render_genome(sink, entry, mode);
    }
}

pub fn refresh_level_totals<V: ViewSink>(index: &mut SinkIndex<V>, sink: &mut V) {
    index.recompute_totals();
    for level in index.all_levels() {
        sink.set_level_total(&level.handles, level.aggregate.total_population);
    }
}
