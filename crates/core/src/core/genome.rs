//! Average-genome display strings.
//!
//! A genome arrives as a vector of gene-expression values in `[0, 1]`. It is
//! shown either as exact numbers or as two-letter genotype symbols, and the
//! choice is one global [`DisplayMode`].

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::fmt::fmt_fixed;

pub const GENOME_PREFIX: &str = "Avg genome: ";
pub const GENE_SEPARATOR: &str = " | ";
pub const MISSING_VALUE: &str = "n/a";
pub const DEFAULT_TRAIT_LABELS: [&str; 4] = ["Trait 1", "Trait 2", "Trait 3", "Trait 4"];

/// Values at or above this are homozygous dominant.
pub const DOMINANT_THRESHOLD: f64 = 0.75;
/// Values strictly above this (and below [`DOMINANT_THRESHOLD`]) are heterozygous.
pub const RECESSIVE_THRESHOLD: f64 = 0.25;

const NUMERIC_DECIMALS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Numeric,
    Genotype,
}

impl DisplayMode {
    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Numeric => "numeric",
            DisplayMode::Genotype => "genotype",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Numeric => DisplayMode::Genotype,
            DisplayMode::Genotype => DisplayMode::Numeric,
        }
    }

    pub fn parse(v: &str) -> Option<Self> {
        match v.trim().to_ascii_lowercase().as_str() {
            "numeric" | "exact" | "number" => Some(DisplayMode::Numeric),
            "genotype" | "letters" | "alleles" => Some(DisplayMode::Genotype),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genotype {
    HomozygousDominant,
    Heterozygous,
    HomozygousRecessive,
}

impl Genotype {
    /// No clamping: out-of-range values still land in one of the three bins,
    /// and `NaN` (which fails every comparison) is recessive.
    pub fn classify(v: f64) -> Self {
        if v >= DOMINANT_THRESHOLD {
            Genotype::HomozygousDominant
        } else if v > RECESSIVE_THRESHOLD && v < DOMINANT_THRESHOLD {
            Genotype::Heterozygous
        } else {
            Genotype::HomozygousRecessive
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Genotype::HomozygousDominant => "TT",
            Genotype::Heterozygous => "Tt",
            Genotype::HomozygousRecessive => "tt",
        }
    }
}

/// Label for gene `index`: a non-empty server-provided name, else the default
/// list, else a synthesized `Trait {index + 1}`.
pub fn trait_label(index: usize, names: Option<&[Option<String>]>) -> Cow<'_, str> {
    let provided = names
        .and_then(|names| names.get(index))
        .and_then(|name| name.as_deref())
        .filter(|name| !name.is_empty());
    if let Some(name) = provided {
        return Cow::Borrowed(name);
    }
    match DEFAULT_TRAIT_LABELS.get(index) {
        Some(label) => Cow::Borrowed(*label),
        None => Cow::Owned(format!("Trait {}", index + 1)),
    }
}

pub fn format_value(v: f64, mode: DisplayMode) -> Cow<'static, str> {
    match mode {
        DisplayMode::Numeric => match fmt_fixed(v, NUMERIC_DECIMALS) {
            Some(s) => Cow::Owned(s),
            None => Cow::Borrowed(MISSING_VALUE),
        },
        DisplayMode::Genotype => Cow::Borrowed(Genotype::classify(v).symbol()),
    }
}

/// Renders the full panel line, e.g. `Avg genome: Beak: 0.333`.
pub fn format_genome(
    genome: Option<&[f64]>,
    names: Option<&[Option<String>]>,
    mode: DisplayMode,
) -> String {
    let genome = match genome {
        Some(g) if !g.is_empty() => g,
        _ => return format!("{GENOME_PREFIX}{MISSING_VALUE}"),
    };

    let parts: Vec<String> = genome
        .iter()
        .enumerate()
        .map(|(i, &v)| format!("{}: {}", trait_label(i, names), format_value(v, mode)))
        .collect();
    format!("{GENOME_PREFIX}{}", parts.join(GENE_SEPARATOR))
}
