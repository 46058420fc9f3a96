use std::future::Future;
use std::time::Duration;

use phylogen::api::EventLoop;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

/// Browser event loop: `setTimeout` for delays, `spawn_local` for detached work.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct BrowserLoop;

impl EventLoop for BrowserLoop {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        let ms = duration.as_millis().min(i32::MAX as u128) as i32;
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().map(|w| {
                w.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
                    .is_ok()
            });
            if scheduled != Some(true) {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        async move {
            let _ = JsFuture::from(promise).await;
        }
    }

    fn spawn_detached<F>(&self, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        wasm_bindgen_futures::spawn_local(task);
    }
}
