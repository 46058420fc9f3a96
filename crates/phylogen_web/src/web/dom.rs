use std::collections::HashMap;
use std::rc::Rc;

use phylogen::error::ApiError;
use phylogen::layout::{LayoutSpec, LevelLayout, OrganismLayout};
use phylogen::protocol::{CycleCompleteEvent, CYCLE_COMPLETE_EVENT};
use phylogen::sink::{Axis, LoopListener, TransientFlag, ViewSink};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CustomEvent, CustomEventInit, Document, Element, HtmlElement};

use crate::ui_model;

#[derive(Debug, Clone, Default)]
pub(super) struct OrganismHandles {
    sprite: Option<Element>,
    panel: Option<Element>,
    population: Option<Element>,
    genome: Option<Element>,
}

#[derive(Debug, Clone, Default)]
pub(super) struct LevelHandles {
    total: Option<Element>,
}

/// Layout read from the server-rendered page, with the elements behind it.
pub(super) struct ScannedPage {
    pub layout: LayoutSpec,
    pub levels: HashMap<String, LevelHandles>,
    pub organisms: HashMap<String, OrganismHandles>,
}

fn elements(root: &Element, selector: &str) -> Result<Vec<Element>, String> {
    let list = root
        .query_selector_all(selector)
        .map_err(|_| format!("invalid selector {selector}"))?;
    Ok((0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect())
}

fn first(root: &Element, selector: &str) -> Option<Element> {
    root.query_selector(selector).ok().flatten()
}

/// Reads trophic levels, organism panels and sprites once at startup.
pub(super) fn scan_page(document: &Document) -> Result<ScannedPage, String> {
    let body: Element = document.body().ok_or("document has no body")?.into();
    let mut page = ScannedPage {
        layout: LayoutSpec::default(),
        levels: HashMap::new(),
        organisms: HashMap::new(),
    };

    for level_el in elements(&body, ui_model::LEVEL_SELECTOR)? {
        let Some(level_id) = level_el.get_attribute(ui_model::LEVEL_ID_ATTR) else {
            continue;
        };
        let mut level = LevelLayout {
            id: level_id.clone(),
            name: level_el
                .get_attribute(ui_model::LEVEL_NAME_ATTR)
                .unwrap_or_default(),
            organisms: Vec::new(),
        };

        for panel in elements(&level_el, ui_model::PANEL_SELECTOR)? {
            let Some(id) = panel.get_attribute(ui_model::PANEL_ID_ATTR) else {
                continue;
            };
            let population = first(&panel, ui_model::POPULATION_SELECTOR);
            level.organisms.push(OrganismLayout {
                id: id.clone(),
                name: String::new(),
                row: None,
                col: None,
                population: population
                    .as_ref()
                    .and_then(|el| el.text_content())
                    .and_then(|t| ui_model::parse_population(&t)),
                trait_names: panel
                    .get_attribute(ui_model::TRAIT_NAMES_ATTR)
                    .and_then(|a| ui_model::parse_trait_names(&a)),
            });
            let sprite = document
                .query_selector(&ui_model::sprite_selector(&id))
                .ok()
                .flatten();
            page.organisms.insert(
                id,
                OrganismHandles {
                    sprite,
                    genome: first(&panel, ui_model::GENOME_SELECTOR),
                    population,
                    panel: Some(panel),
                },
            );
        }

        page.levels.insert(
            level_id,
            LevelHandles {
                total: first(&level_el, ui_model::LEVEL_TOTAL_SELECTOR),
            },
        );
        page.layout.levels.push(level);
    }
    Ok(page)
}

/// Fires `simulation:cycleComplete` on the document. Listeners run
/// synchronously and may press the toggle again.
struct DocumentEvents {
    document: Document,
}

impl LoopListener for DocumentEvents {
    fn cycle_complete(&self, event: &CycleCompleteEvent) {
        let detail = serde_json::to_string(event)
            .ok()
            .and_then(|json| js_sys::JSON::parse(&json).ok())
            .unwrap_or(JsValue::NULL);
        let init = CustomEventInit::new();
        init.set_detail(&detail);
        match CustomEvent::new_with_event_init_dict(CYCLE_COMPLETE_EVENT, &init) {
            Ok(ev) => {
                let _ = self.document.dispatch_event(&ev);
            }
            Err(_) => web_sys::console::error_1(&"failed to create cycle event".into()),
        }
    }
}

/// [`ViewSink`] over the live DOM.
pub(super) struct DomSink {
    events: Rc<DocumentEvents>,
    toggle: Option<Element>,
    status: Option<Element>,
}

impl DomSink {
    pub fn new(document: Document) -> Self {
        Self {
            toggle: document.query_selector(ui_model::TOGGLE_SELECTOR).ok().flatten(),
            status: document.query_selector(ui_model::STATUS_SELECTOR).ok().flatten(),
            events: Rc::new(DocumentEvents { document }),
        }
    }

    pub fn set_running(&self, running: bool) {
        if let Some(button) = &self.toggle {
            button.set_text_content(Some(ui_model::toggle_label(running)));
        }
        if running {
            self.set_status("");
        }
    }

    fn set_status(&self, text: &str) {
        if let Some(status) = &self.status {
            status.set_text_content(Some(text));
        }
    }
}

impl ViewSink for DomSink {
    type Organism = OrganismHandles;
    type Level = LevelHandles;

    fn set_position(&mut self, organism: &OrganismHandles, axis: Axis, value: f64) {
        let Some(sprite) = &organism.sprite else {
            return;
        };
        let text = ui_model::css_number(value);
        let _ = sprite.set_attribute(axis.attribute(), &text);
        if let Some(el) = sprite.dyn_ref::<HtmlElement>() {
            let _ = el.style().set_property(axis.css_property(), &text);
        }
    }

    fn set_flag(&mut self, organism: &OrganismHandles, flag: TransientFlag, value: &str) {
        if let Some(sprite) = &organism.sprite {
            let _ = sprite.set_attribute(flag.attribute(), value);
        }
    }

    fn clear_flag(&mut self, organism: &OrganismHandles, flag: TransientFlag) {
        if let Some(sprite) = &organism.sprite {
            let _ = sprite.remove_attribute(flag.attribute());
        }
    }

    fn set_population(&mut self, organism: &OrganismHandles, population: i64) {
        if let Some(el) = &organism.population {
            el.set_text_content(Some(&population.to_string()));
        }
    }

    fn set_genome(&mut self, organism: &OrganismHandles, text: &str) {
        if let Some(el) = &organism.genome {
            el.set_text_content(Some(text));
        }
    }

    fn hide_panel(&mut self, organism: &OrganismHandles) {
        if let Some(panel) = &organism.panel {
            let _ = panel.set_attribute("hidden", "");
        }
    }

    fn remove_sprite(&mut self, organism: &OrganismHandles) {
        if let Some(sprite) = &organism.sprite {
            sprite.remove();
        }
    }

    fn set_level_total(&mut self, level: &LevelHandles, total: i64) {
        if let Some(el) = &level.total {
            el.set_text_content(Some(&total.to_string()));
        }
    }

    fn cycle_complete(&mut self, _event: &CycleCompleteEvent) {
        self.set_running(false);
    }

    fn loop_failed(&mut self, error: &ApiError) {
        let message = ui_model::failure_message(error);
        web_sys::console::error_1(&message.as_str().into());
        self.set_running(false);
        self.set_status(&message);
    }

    fn listener(&self) -> Option<Rc<dyn LoopListener>> {
        let events: Rc<dyn LoopListener> = self.events.clone();
        Some(events)
    }
}
