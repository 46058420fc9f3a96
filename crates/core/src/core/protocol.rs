//! Wire types for the simulation endpoints.
//!
//! The step payload is decoded leniently: missing arrays are empty, and
//! wrongly-typed scalars count as absent instead of failing the whole response.
//! Organism entries are kept as raw JSON so they can be forwarded to the save
//! endpoint verbatim, including fields this client does not interpret.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const STEP_PATH: &str = "/api/simulation/step";
pub const SAVE_PATH: &str = "/api/simulation/save";
pub const RESET_PATH: &str = "/api/simulation/reset";

/// Name of the DOM event fired once per completed cycle.
pub const CYCLE_COMPLETE_EVENT: &str = "simulation:cycleComplete";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    #[serde(default, deserialize_with = "lenient::list")]
    pub organisms: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::ids")]
    pub extinct: Vec<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub cycle_complete: bool,
    #[serde(default, deserialize_with = "lenient::list")]
    pub cycle_summary: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub cycle_index: Option<i64>,
}

impl StepResult {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Entries without a usable `id` are skipped.
    pub fn deltas(&self) -> impl Iterator<Item = OrganismDelta> + '_ {
        self.organisms.iter().filter_map(OrganismDelta::from_json)
    }
}

/// Partial state for one organism within a step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrganismDelta {
    pub id: String,
    pub row: Option<f64>,
    pub col: Option<f64>,
    pub caught_prey: Option<bool>,
    pub cycle_step: Option<i64>,
    pub can_move: Option<bool>,
    pub population: Option<i64>,
    /// Non-numeric entries become `NaN` so they keep their position.
    pub average_genome: Option<Vec<f64>>,
    pub trait_names: Option<Vec<Option<String>>>,
}

impl OrganismDelta {
    pub fn from_json(v: &Value) -> Option<Self> {
        let obj = v.as_object()?;
        let id = obj.get("id").and_then(lenient::id_of)?;
        Some(Self {
            id,
            row: obj.get("row").and_then(lenient::number_of),
            col: obj.get("col").and_then(lenient::number_of),
            caught_prey: obj.get("caughtPrey").and_then(Value::as_bool),
            cycle_step: obj.get("cycleStep").and_then(lenient::integer_of),
            can_move: obj.get("canMove").and_then(Value::as_bool),
            population: obj.get("population").and_then(lenient::integer_of),
            average_genome: obj.get("averageGenome").and_then(lenient::genome_of),
            trait_names: obj.get("traitNames").and_then(lenient::labels_of),
        })
    }
}

/// Body of `POST /api/simulation/save`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub cycle: i64,
    pub summary: Vec<Value>,
    pub organisms: Vec<Value>,
}

/// Detail of the [`CYCLE_COMPLETE_EVENT`] notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleCompleteEvent {
    pub cycle: Option<i64>,
    pub summary: Vec<Value>,
}

/// Counts derived from a cycle summary, for logs and headless reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleDigest {
    pub records: usize,
    pub hunters_fed: usize,
    pub prey_caught: usize,
    pub total_catches: i64,
}

impl CycleDigest {
    pub fn from_summary(summary: &[Value]) -> Self {
        let mut digest = CycleDigest::default();
        for record in summary {
            let Some(obj) = record.as_object() else {
                continue;
            };
            digest.records += 1;
            if obj.get("caughtPrey").and_then(Value::as_bool) == Some(true) {
                digest.hunters_fed += 1;
            }
            if obj.get("wasCaught").and_then(Value::as_bool) == Some(true) {
                digest.prey_caught += 1;
            }
            digest.total_catches += obj
                .get("caughtPreyCount")
                .and_then(lenient::integer_of)
                .unwrap_or(0);
        }
        digest
    }
}

pub(crate) mod lenient {
    use super::*;

    pub(crate) fn list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Value>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => items,
            _ => Vec::new(),
        })
    }

    pub(crate) fn ids<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(list(d)?.iter().filter_map(id_of).collect())
    }

    pub(crate) fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        Ok(Value::deserialize(d)?.as_bool().unwrap_or(false))
    }

    pub(crate) fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(integer_of(&Value::deserialize(d)?))
    }

    pub(crate) fn id_of(v: &Value) -> Option<String> {
        match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Numbers, or strings that parse as numbers. Anything else is absent.
    pub(crate) fn number_of(v: &Value) -> Option<f64> {
        let n = match v {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    pub(crate) fn integer_of(v: &Value) -> Option<i64> {
        if let Some(i) = v.as_i64() {
            return Some(i);
        }
        let n = number_of(v)?;
        (n.fract() == 0.0 && n.abs() < i64::MAX as f64).then_some(n as i64)
    }

    pub(crate) fn genome_of(v: &Value) -> Option<Vec<f64>> {
        let items = v.as_array()?;
        Some(
            items
                .iter()
                .map(|item| number_of(item).unwrap_or(f64::NAN))
                .collect(),
        )
    }

    pub(crate) fn labels_of(v: &Value) -> Option<Vec<Option<String>>> {
        let items = v.as_array()?;
        Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) if !s.is_empty() => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_default_to_empty() {
        let step = StepResult::from_json("{}").unwrap();
        assert!(step.organisms.is_empty());
        assert!(step.extinct.is_empty());
        assert!(!step.cycle_complete);
        assert!(step.cycle_summary.is_empty());
        assert_eq!(step.cycle_index, None);
    }

    #[test]
    fn wrongly_typed_fields_are_tolerated() {
        let step = StepResult::from_json(
            r#"{"organisms": null, "extinct": "kelp", "cycleComplete": "yes",
                "cycleSummary": {"a": 1}, "cycleIndex": "3"}"#,
        )
        .unwrap();
        assert!(step.organisms.is_empty());
        assert!(step.extinct.is_empty());
        assert!(!step.cycle_complete);
        assert!(step.cycle_summary.is_empty());
        assert_eq!(step.cycle_index, Some(3));
    }

    #[test]
    fn delta_reads_server_shape() {
        let raw = json!({
            "id": "orca",
            "row": 4,
            "col": "7",
            "caughtPrey": true,
            "caughtPreyCount": 2,
            "cycleStep": 11,
            "canMove": false,
            "population": 18,
            "averageGenome": [0.25, "0.5", null],
            "traitNames": ["Speed", "", null]
        });
        let d = OrganismDelta::from_json(&raw).unwrap();
        assert_eq!(d.id, "orca");
        assert_eq!(d.row, Some(4.0));
        assert_eq!(d.col, Some(7.0));
        assert_eq!(d.caught_prey, Some(true));
        assert_eq!(d.cycle_step, Some(11));
        assert_eq!(d.can_move, Some(false));
        assert_eq!(d.population, Some(18));
        let genome = d.average_genome.unwrap();
        assert_eq!(&genome[..2], &[0.25, 0.5]);
        assert!(genome[2].is_nan());
        assert_eq!(
            d.trait_names.unwrap(),
            vec![Some("Speed".to_string()), None, None]
        );
    }

    #[test]
    fn delta_without_id_is_skipped() {
        let step = StepResult {
            organisms: vec![json!({"row": 1}), json!("kelp"), json!({"id": 42})],
            ..StepResult::default()
        };
        let ids: Vec<String> = step.deltas().map(|d| d.id).collect();
        assert_eq!(ids, vec!["42".to_string()]);
    }

    #[test]
    fn non_numeric_position_is_absent() {
        let d = OrganismDelta::from_json(&json!({"id": "a", "row": null, "col": "left"})).unwrap();
        assert_eq!(d.row, None);
        assert_eq!(d.col, None);
    }

    #[test]
    fn digest_counts_summary_records() {
        let summary = vec![
            json!({"id": "orca", "caughtPrey": true, "caughtPreyCount": 3, "wasCaught": false}),
            json!({"id": "seal", "caughtPrey": true, "caughtPreyCount": 1, "wasCaught": true}),
            json!({"id": "kelp", "caughtPrey": false, "wasCaught": true}),
            json!(null),
        ];
        let digest = CycleDigest::from_summary(&summary);
        assert_eq!(digest.records, 3);
        assert_eq!(digest.hunters_fed, 2);
        assert_eq!(digest.prey_caught, 2);
        assert_eq!(digest.total_catches, 4);
    }
}
