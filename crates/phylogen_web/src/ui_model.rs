//! Page contract and helpers that should be available on both wasm and native.
//!
//! Keeping these out of the wasm-only `web` module allows us to unit-test the
//! attribute parsing on the host.

use phylogen::config::{LoopConfig, DEFAULT_STEP_DELAY_MS};
use phylogen::error::ApiError;
use phylogen::fmt::fmt_trimmed;
use phylogen::genome::DisplayMode;

/// Container of one trophic level; the attribute value is the level id.
pub const LEVEL_SELECTOR: &str = "[data-trophic-level]";
pub const LEVEL_ID_ATTR: &str = "data-trophic-level";
pub const LEVEL_NAME_ATTR: &str = "data-level-name";
/// Text node for the level's aggregate population, inside the level container.
pub const LEVEL_TOTAL_SELECTOR: &str = "[data-level-total]";

/// Organism summary panel, inside its level container.
pub const PANEL_SELECTOR: &str = "[data-organism-panel]";
pub const PANEL_ID_ATTR: &str = "data-organism-panel";
pub const POPULATION_SELECTOR: &str = "[data-population]";
pub const GENOME_SELECTOR: &str = "[data-genome]";
/// JSON array or comma separated list of trait names.
pub const TRAIT_NAMES_ATTR: &str = "data-trait-names";

/// Sprite on the grid; the attribute value is the organism id.
pub const SPRITE_ATTR: &str = "data-organism-sprite";

pub const TOGGLE_SELECTOR: &str = "#simulation-toggle";
pub const GENOME_MODE_SELECTOR: &str = "#genome-mode-toggle";
pub const STATUS_SELECTOR: &str = "[data-simulation-status]";

/// Optional `<body>` attributes.
pub const STEP_DELAY_ATTR: &str = "data-step-delay-ms";
pub const GENOME_MODE_ATTR: &str = "data-genome-mode";

const CSS_DECIMALS: usize = 3;

pub fn sprite_selector(organism_id: &str) -> String {
    let mut escaped = String::with_capacity(organism_id.len());
    for c in organism_id.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("[{SPRITE_ATTR}=\"{escaped}\"]")
}

/// Population as rendered into the initial page.
pub fn parse_population(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

pub fn parse_trait_names(attr: &str) -> Option<Vec<String>> {
    let attr = attr.trim();
    if attr.is_empty() {
        return None;
    }
    if attr.starts_with('[') {
        return serde_json::from_str(attr).ok();
    }
    Some(attr.split(',').map(|s| s.trim().to_string()).collect())
}

/// Loop settings from the page, falling back to the defaults.
pub fn loop_config(step_delay: Option<&str>, genome_mode: Option<&str>) -> LoopConfig {
    LoopConfig {
        step_delay_ms: step_delay
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_STEP_DELAY_MS),
        display_mode: genome_mode
            .and_then(DisplayMode::parse)
            .unwrap_or_default(),
        ..LoopConfig::default()
    }
}

pub fn toggle_label(running: bool) -> &'static str {
    if running {
        "Stop simulation"
    } else {
        "Run simulation"
    }
}

pub fn genome_mode_label(mode: DisplayMode) -> String {
    // The button offers the other mode.
    match mode.toggled() {
        DisplayMode::Numeric => "Show exact values".to_string(),
        DisplayMode::Genotype => "Show genotypes".to_string(),
    }
}

/// Value for a `data-row`/`--row` style position. Avoids float `format!` on wasm.
pub fn css_number(v: f64) -> String {
    fmt_trimmed(v, CSS_DECIMALS)
}

pub fn failure_message(error: &ApiError) -> String {
    format!("Simulation stopped: {error}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_selector_escapes_quotes() {
        assert_eq!(sprite_selector("kelp"), r#"[data-organism-sprite="kelp"]"#);
        assert_eq!(sprite_selector(r#"a"b"#), r#"[data-organism-sprite="a\"b"]"#);
    }

    #[test]
    fn trait_names_accept_json_and_csv() {
        assert_eq!(
            parse_trait_names(r#"["Camouflage", "Speed"]"#),
            Some(vec!["Camouflage".to_string(), "Speed".to_string()])
        );
        assert_eq!(
            parse_trait_names("Camouflage, Speed"),
            Some(vec!["Camouflage".to_string(), "Speed".to_string()])
        );
        assert_eq!(parse_trait_names("  "), None);
        assert_eq!(parse_trait_names("[1, 2"), None);
    }

    #[test]
    fn page_config_falls_back_to_defaults() {
        let cfg = loop_config(Some("250"), Some("genotype"));
        assert_eq!(cfg.step_delay_ms, 250);
        assert_eq!(cfg.display_mode, DisplayMode::Genotype);

        let cfg = loop_config(Some("soon"), None);
        assert_eq!(cfg, LoopConfig::default());
    }

    #[test]
    fn labels() {
        assert_eq!(toggle_label(true), "Stop simulation");
        assert_eq!(toggle_label(false), "Run simulation");
        assert_eq!(genome_mode_label(DisplayMode::Numeric), "Show genotypes");
        assert_eq!(genome_mode_label(DisplayMode::Genotype), "Show exact values");
    }

    #[test]
    fn css_numbers_are_trimmed() {
        assert_eq!(css_number(3.0), "3");
        assert_eq!(css_number(2.25), "2.25");
        assert_eq!(parse_population(" 42 "), Some(42));
        assert_eq!(parse_population("lots"), None);
    }
}
