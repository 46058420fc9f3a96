use phylogen::client::SimulationClient;
use phylogen::genome::DisplayMode;
use phylogen::session::SimulationSession;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element};

use crate::ui_model;

mod dom;
mod fetch;
mod runtime;

use dom::DomSink;
use fetch::FetchApi;
use runtime::BrowserLoop;

type Client = SimulationClient<DomSink, FetchApi, BrowserLoop>;

pub fn start() {
    if let Err(e) = boot() {
        web_sys::console::error_1(&format!("simulation client: {e}").into());
    }
}

fn boot() -> Result<(), String> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;

    let body = document.body();
    let attr = |name: &str| body.as_ref().and_then(|b| b.get_attribute(name));
    let config = ui_model::loop_config(
        attr(ui_model::STEP_DELAY_ATTR).as_deref(),
        attr(ui_model::GENOME_MODE_ATTR).as_deref(),
    );

    let dom::ScannedPage {
        layout,
        mut levels,
        mut organisms,
    } = dom::scan_page(&document)?;
    let index = layout
        .build_index(
            |level| levels.remove(&level.id).unwrap_or_default(),
            |_, organism| organisms.remove(&organism.id).unwrap_or_default(),
        )
        .map_err(|e| e.to_string())?;

    let sink = DomSink::new(document.clone());
    let session = SimulationSession::new(index, sink, &config);
    let api = FetchApi::new(config.endpoints.clone());
    let client: Client = SimulationClient::new(session, api, BrowserLoop);

    // Stale history from an earlier page load is cleared without waiting.
    client.reset_history();
    client.session().borrow().sink().set_running(false);

    wire_toggle(&document, &client)?;
    wire_genome_mode(&document, &client, config.display_mode)?;
    Ok(())
}

fn on_click(el: &Element, handler: impl FnMut() + 'static) -> Result<(), String> {
    let cb = Closure::wrap(Box::new(handler) as Box<dyn FnMut()>);
    el.add_event_listener_with_callback("click", cb.as_ref().unchecked_ref())
        .map_err(|_| "failed to attach click handler".to_string())?;
    // Handlers live as long as the page.
    cb.forget();
    Ok(())
}

fn wire_toggle(document: &Document, client: &Client) -> Result<(), String> {
    let Some(button) = document.query_selector(ui_model::TOGGLE_SELECTOR).ok().flatten() else {
        web_sys::console::warn_1(&"no simulation toggle on this page".into());
        return Ok(());
    };
    let client = client.clone();
    on_click(&button, move || {
        let running = client.toggle();
        client.session().borrow().sink().set_running(running);
    })
}

fn wire_genome_mode(
    document: &Document,
    client: &Client,
    initial: DisplayMode,
) -> Result<(), String> {
    let Some(button) = document
        .query_selector(ui_model::GENOME_MODE_SELECTOR)
        .ok()
        .flatten()
    else {
        return Ok(());
    };
    button.set_text_content(Some(&ui_model::genome_mode_label(initial)));
    let client = client.clone();
    let label_target = button.clone();
    on_click(&button, move || {
        let mode = client.toggle_display_mode();
        label_target.set_text_content(Some(&ui_model::genome_mode_label(mode)));
    })
}
