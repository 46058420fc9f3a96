//! Static page layout: trophic levels and the organisms placed in them.
//!
//! The server renders this structure into the page; the browser build reads it
//! back from DOM attributes, the headless client from a JSON file.

use serde::{Deserialize, Serialize};

use crate::error::LayoutError;
use crate::index::{ViewIndex, ViewIndexBuilder};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpec {
    #[serde(default)]
    pub levels: Vec<LevelLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub organisms: Vec<OrganismLayout>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganismLayout {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub row: Option<i64>,
    #[serde(default)]
    pub col: Option<i64>,
    /// Population rendered into the initial page, if any.
    #[serde(default)]
    pub population: Option<i64>,
    #[serde(default, alias = "trait_names")]
    pub trait_names: Option<Vec<String>>,
}

impl LayoutSpec {
    pub fn from_json(text: &str) -> Result<Self, LayoutError> {
        serde_json::from_str(text).map_err(|e| LayoutError::Invalid(e.to_string()))
    }

    pub fn organism_count(&self) -> usize {
        self.levels.iter().map(|l| l.organisms.len()).sum()
    }

    /// Registers every level and organism, asking the caller for the handles
    /// of each, and seeds the initial population and trait names.
    pub fn build_index<O, L>(
        &self,
        mut level_handles: impl FnMut(&LevelLayout) -> L,
        mut organism_handles: impl FnMut(&LevelLayout, &OrganismLayout) -> O,
    ) -> Result<ViewIndex<O, L>, LayoutError> {
        let mut builder = ViewIndexBuilder::new();
        for level in &self.levels {
            builder.register_level(&level.id, level_handles(level))?;
        }
        for level in &self.levels {
            for organism in &level.organisms {
                let state = builder.register_organism(
                    &organism.id,
                    organism_handles(level, organism),
                    &level.id,
                )?;
                state.population = organism.population;
                state.last_trait_names = organism
                    .trait_names
                    .as_ref()
                    .map(|names| names.iter().cloned().map(Some).collect());
            }
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OCEAN: &str = r#"{
        "levels": [
            {"id": "producers", "name": "Primary Producers", "organisms": [
                {"id": "kelp", "name": "Kelp", "row": 2, "col": 3, "population": 90,
                 "traitNames": ["Camouflage", "Metabolism"]},
                {"id": "phytoplankton", "name": "Phytoplankton"}
            ]},
            {"id": "apex", "name": "Apex", "organisms": [
                {"id": "orca", "name": "Orca", "population": 4}
            ]}
        ]
    }"#;

    #[test]
    fn builds_index_with_seeded_state() {
        let layout = LayoutSpec::from_json(OCEAN).unwrap();
        assert_eq!(layout.organism_count(), 3);
        let index = layout
            .build_index(|l| l.id.clone(), |_, o| o.id.clone())
            .unwrap();
        let kelp = index.lookup_organism("kelp").unwrap();
        assert_eq!(kelp.handles, "kelp");
        assert_eq!(kelp.state.population, Some(90));
        assert_eq!(
            kelp.state.last_trait_names,
            Some(vec![Some("Camouflage".into()), Some("Metabolism".into())])
        );
        assert_eq!(
            index.lookup_level("producers").unwrap().aggregate.total_population,
            90
        );
        assert_eq!(index.lookup_level("apex").unwrap().aggregate.total_population, 4);
    }

    #[test]
    fn accepts_server_preset_spelling() {
        let layout = LayoutSpec::from_json(
            r#"{"levels": [{"id": "apex", "organisms": [
                {"id": "apex-1", "name": "Orca Pod", "share": 1.0,
                 "trait_names": ["Sonar Precision", "Bite Force"]}
            ]}]}"#,
        )
        .unwrap();
        let orca = &layout.levels[0].organisms[0];
        assert_eq!(orca.trait_names.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let layout = LayoutSpec::from_json(
            r#"{"levels": [{"id": "a", "organisms": [{"id": "x"}, {"id": "x"}]}]}"#,
        )
        .unwrap();
        let err = layout.build_index(|_| (), |_, _| ()).unwrap_err();
        assert_eq!(err, LayoutError::DuplicateOrganism("x".into()));
    }

    #[test]
    fn malformed_json_is_reported() {
        assert!(matches!(
            LayoutSpec::from_json("{levels: "),
            Err(LayoutError::Invalid(_))
        ));
    }
}
