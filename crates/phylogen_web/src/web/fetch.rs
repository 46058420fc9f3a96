use std::future::Future;
use std::pin::pin;
use std::rc::Rc;

use futures::future::{select, Either};
use phylogen::api::SimulationApi;
use phylogen::config::Endpoints;
use phylogen::error::ApiError;
use phylogen::protocol::{SaveRequest, StepResult};
use tokio_util::sync::CancellationToken;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, AbortSignal, Request, RequestInit, Response};

/// `fetch` transport against the page's own origin.
#[derive(Debug, Clone)]
pub(super) struct FetchApi {
    endpoints: Rc<Endpoints>,
}

impl FetchApi {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints: Rc::new(endpoints),
        }
    }
}

fn js_message(v: &JsValue) -> String {
    if let Some(e) = v.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    v.as_string().unwrap_or_else(|| "unknown error".to_string())
}

/// POSTs to `url` and returns the response body as text.
async fn post(url: &str, json: Option<&str>, signal: Option<&AbortSignal>) -> Result<String, ApiError> {
    let opts = RequestInit::new();
    opts.set_method("POST");
    if let Some(body) = json {
        opts.set_body(&JsValue::from_str(body));
    }
    if let Some(signal) = signal {
        opts.set_signal(Some(signal));
    }
    let request = Request::new_with_str_and_init(url, &opts)
        .map_err(|e| ApiError::transport(url, js_message(&e)))?;
    if json.is_some() {
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|e| ApiError::transport(url, js_message(&e)))?;
    }

    let window = web_sys::window().ok_or_else(|| ApiError::transport(url, "no window"))?;
    let value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| ApiError::transport(url, js_message(&e)))?;
    let response: Response = value
        .dyn_into()
        .map_err(|_| ApiError::transport(url, "fetch did not return a Response"))?;
    if !response.ok() {
        return Err(ApiError::Status {
            endpoint: url.to_string(),
            status: response.status(),
        });
    }

    let text = response
        .text()
        .map_err(|e| ApiError::transport(url, js_message(&e)))?;
    let text = JsFuture::from(text)
        .await
        .map_err(|e| ApiError::transport(url, js_message(&e)))?;
    text.as_string()
        .ok_or_else(|| ApiError::decode(url, "response body is not text"))
}

impl SimulationApi for FetchApi {
    fn step(&self, cancel: &CancellationToken) -> impl Future<Output = Result<StepResult, ApiError>> {
        let endpoints = Rc::clone(&self.endpoints);
        let cancel = cancel.clone();
        async move {
            let url = endpoints.step.as_str();
            let controller = AbortController::new().map_err(|e| ApiError::transport(url, js_message(&e)))?;
            let signal = controller.signal();
            let request = pin!(post(url, None, Some(&signal)));
            let cancelled = pin!(cancel.cancelled());
            let text = match select(request, cancelled).await {
                Either::Left((text, _)) => text?,
                Either::Right(_) => {
                    controller.abort();
                    return Err(ApiError::Cancelled);
                }
            };
            StepResult::from_json(&text).map_err(|e| ApiError::decode(url, e))
        }
    }

    fn save(&self, request: &SaveRequest) -> impl Future<Output = Result<(), ApiError>> {
        let endpoints = Rc::clone(&self.endpoints);
        let body = serde_json::to_string(request);
        async move {
            let url = endpoints.save.as_str();
            let body = body.map_err(|e| ApiError::decode(url, e))?;
            post(url, Some(&body), None).await.map(drop)
        }
    }

    fn reset(&self) -> impl Future<Output = Result<(), ApiError>> {
        let endpoints = Rc::clone(&self.endpoints);
        async move { post(endpoints.reset.as_str(), None, None).await.map(drop) }
    }
}
