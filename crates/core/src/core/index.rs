//! Arena of per-organism and per-level view state, keyed by id.
//!
//! The index is built once from the static page layout through
//! [`ViewIndexBuilder`]; membership never changes afterwards. Handles are opaque
//! to this module (`O` for organisms, `L` for levels) and belong to the view
//! sink that renders them.

use hashbrown::HashMap;

use crate::error::LayoutError;

#[derive(Debug, Clone, PartialEq)]
pub struct OrganismViewState {
    pub id: String,
    pub level_id: String,
    /// `None` means never reported, which is different from extinct.
    pub population: Option<i64>,
    pub last_average_genome: Option<Vec<f64>>,
    pub last_trait_names: Option<Vec<Option<String>>>,
    extinct: bool,
}

impl OrganismViewState {
    pub fn new(id: impl Into<String>, level_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            level_id: level_id.into(),
            population: None,
            last_average_genome: None,
            last_trait_names: None,
            extinct: false,
        }
    }

    pub fn is_extinct(&self) -> bool {
        self.extinct
    }

    pub(crate) fn mark_extinct(&mut self) {
        self.extinct = true;
        self.population = Some(0);
    }

    /// Population that counts towards the level total.
    pub fn counted_population(&self) -> Option<i64> {
        if self.extinct {
            None
        } else {
            self.population
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrophicLevelAggregate {
    pub level_id: String,
    pub total_population: i64,
}

#[derive(Debug)]
pub struct OrganismEntry<O> {
    pub handles: O,
    pub state: OrganismViewState,
}

#[derive(Debug)]
pub struct LevelEntry<L> {
    pub handles: L,
    pub aggregate: TrophicLevelAggregate,
    members: Vec<usize>,
}

impl<L> LevelEntry<L> {
    pub fn id(&self) -> &str {
        &self.aggregate.level_id
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

pub struct ViewIndexBuilder<O, L> {
    organisms: Vec<OrganismEntry<O>>,
    levels: Vec<LevelEntry<L>>,
    organism_slots: HashMap<String, usize>,
    level_slots: HashMap<String, usize>,
}

impl<O, L> ViewIndexBuilder<O, L> {
    pub fn new() -> Self {
        Self {
            organisms: Vec::new(),
            levels: Vec::new(),
            organism_slots: HashMap::new(),
            level_slots: HashMap::new(),
        }
    }

    pub fn register_level(&mut self, level_id: &str, handles: L) -> Result<(), LayoutError> {
        if self.level_slots.contains_key(level_id) {
            return Err(LayoutError::DuplicateLevel(level_id.to_string()));
        }
        self.level_slots
            .insert(level_id.to_string(), self.levels.len());
        self.levels.push(LevelEntry {
            handles,
            aggregate: TrophicLevelAggregate {
                level_id: level_id.to_string(),
                total_population: 0,
            },
            members: Vec::new(),
        });
        Ok(())
    }

    /// The level must already be registered. Returns the fresh state so the
    /// caller can seed values rendered into the initial page.
    pub fn register_organism(
        &mut self,
        organism_id: &str,
        handles: O,
        level_id: &str,
    ) -> Result<&mut OrganismViewState, LayoutError> {
        if self.organism_slots.contains_key(organism_id) {
            return Err(LayoutError::DuplicateOrganism(organism_id.to_string()));
        }
        let Some(&level_slot) = self.level_slots.get(level_id) else {
            return Err(LayoutError::UnknownLevel {
                organism: organism_id.to_string(),
                level: level_id.to_string(),
            });
        };

        let slot = self.organisms.len();
        self.organism_slots.insert(organism_id.to_string(), slot);
        self.levels[level_slot].members.push(slot);
        self.organisms.push(OrganismEntry {
            handles,
            state: OrganismViewState::new(organism_id, level_id),
        });
        Ok(&mut self.organisms[slot].state)
    }

    pub fn build(self) -> ViewIndex<O, L> {
        let mut index = ViewIndex {
            organisms: self.organisms,
            levels: self.levels,
            organism_slots: self.organism_slots,
            level_slots: self.level_slots,
        };
        index.recompute_totals();
        index
    }
}

impl<O, L> Default for ViewIndexBuilder<O, L> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ViewIndex<O, L> {
    organisms: Vec<OrganismEntry<O>>,
    levels: Vec<LevelEntry<L>>,
    organism_slots: HashMap<String, usize>,
    level_slots: HashMap<String, usize>,
}

impl<O, L> ViewIndex<O, L> {
    /// Unknown ids are expected (the server may reference removed entities)
    /// and simply return `None`.
    pub fn lookup_organism(&self, id: &str) -> Option<&OrganismEntry<O>> {
        self.organism_slots.get(id).map(|&slot| &self.organisms[slot])
    }

    pub fn lookup_organism_mut(&mut self, id: &str) -> Option<&mut OrganismEntry<O>> {
        let slot = *self.organism_slots.get(id)?;
        Some(&mut self.organisms[slot])
    }

    pub fn lookup_level(&self, id: &str) -> Option<&LevelEntry<L>> {
        self.level_slots.get(id).map(|&slot| &self.levels[slot])
    }

    /// Levels in registration order.
    pub fn all_levels(&self) -> impl Iterator<Item = &LevelEntry<L>> {
        self.levels.iter()
    }

    /// Members in registration order; empty for an unknown level.
    pub fn members_of<'a>(&'a self, level_id: &str) -> impl Iterator<Item = &'a OrganismEntry<O>> {
        let members: &[usize] = match self.level_slots.get(level_id) {
            Some(&slot) => &self.levels[slot].members,
            None => &[],
        };
        members.iter().map(move |&m| &self.organisms[m])
    }

    pub fn organisms(&self) -> impl Iterator<Item = &OrganismEntry<O>> {
        self.organisms.iter()
    }

    pub fn organisms_mut(&mut self) -> impl Iterator<Item = &mut OrganismEntry<O>> {
        self.organisms.iter_mut()
    }

    pub fn organism_count(&self) -> usize {
        self.organisms.len()
    }

    /// Full recomputation from member state; totals are never adjusted
    /// incrementally. Saturates instead of overflowing on absurd counts.
    pub fn recompute_totals(&mut self) {
        let organisms = &self.organisms;
        for level in &mut self.levels {
            level.aggregate.total_population = level
                .members
                .iter()
                .filter_map(|&m| organisms[m].state.counted_population())
                .fold(0i64, i64::saturating_add);
        }
    }
}
