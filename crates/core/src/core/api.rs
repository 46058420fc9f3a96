//! Seams to the outside world: the simulation server and the event loop.
//!
//! Both are implemented twice, once for the browser (fetch + `setTimeout` +
//! `spawn_local`) and once for the native client (reqwest + tokio `LocalSet`).
//! Neither implementation needs `Send`: everything runs on one thread.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::ApiError;
use crate::protocol::{SaveRequest, StepResult};

pub trait SimulationApi {
    /// `POST /api/simulation/step`. Implementations should abort the request
    /// when `cancel` fires; the loop drops the response either way.
    fn step(&self, cancel: &CancellationToken) -> impl Future<Output = Result<StepResult, ApiError>>;

    /// `POST /api/simulation/save`. The response body is ignored.
    fn save(&self, request: &SaveRequest) -> impl Future<Output = Result<(), ApiError>>;

    /// `POST /api/simulation/reset`. The response body is ignored.
    fn reset(&self) -> impl Future<Output = Result<(), ApiError>>;
}

pub trait EventLoop {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;

    /// Runs `task` to completion without the caller awaiting it.
    fn spawn_detached<F>(&self, task: F)
    where
        F: Future<Output = ()> + 'static;
}
