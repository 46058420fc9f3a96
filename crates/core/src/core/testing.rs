//! Shared fixtures for the async loop tests: a scripted server and a tokio
//! event loop. Run inside a `LocalSet` with paused time.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::api::{EventLoop, SimulationApi};
use crate::config::LoopConfig;
use crate::error::ApiError;
use crate::layout::LayoutSpec;
use crate::memory::MemorySink;
use crate::protocol::{SaveRequest, StepResult, SAVE_PATH};
use crate::session::SimulationSession;

pub const LATENCY: Duration = Duration::from_millis(100);

#[derive(Default)]
struct Server {
    script: RefCell<VecDeque<Result<StepResult, ApiError>>>,
    step_calls: Cell<usize>,
    saves: RefCell<Vec<SaveRequest>>,
    save_calls: Cell<usize>,
    reset_calls: Cell<usize>,
    fail_saves: Cell<bool>,
}

/// Answers each step after [`LATENCY`] with the next scripted result, or an
/// empty mid-cycle step once the script runs out.
#[derive(Clone, Default)]
pub struct ScriptedApi {
    server: Rc<Server>,
}

impl ScriptedApi {
    pub fn new(script: impl IntoIterator<Item = Result<StepResult, ApiError>>) -> Self {
        let api = Self::default();
        api.server.script.borrow_mut().extend(script);
        api
    }

    pub fn failing_saves(self) -> Self {
        self.server.fail_saves.set(true);
        self
    }

    pub fn step_calls(&self) -> usize {
        self.server.step_calls.get()
    }

    pub fn save_calls(&self) -> usize {
        self.server.save_calls.get()
    }

    pub fn reset_calls(&self) -> usize {
        self.server.reset_calls.get()
    }

    pub fn saves(&self) -> Vec<SaveRequest> {
        self.server.saves.borrow().clone()
    }
}

impl SimulationApi for ScriptedApi {
    fn step(&self, _cancel: &CancellationToken) -> impl Future<Output = Result<StepResult, ApiError>> {
        let server = Rc::clone(&self.server);
        server.step_calls.set(server.step_calls.get() + 1);
        async move {
            tokio::time::sleep(LATENCY).await;
            let next = server.script.borrow_mut().pop_front();
            next.unwrap_or_else(|| Ok(StepResult::default()))
        }
    }

    fn save(&self, request: &SaveRequest) -> impl Future<Output = Result<(), ApiError>> {
        let server = Rc::clone(&self.server);
        server.save_calls.set(server.save_calls.get() + 1);
        let request = request.clone();
        async move {
            tokio::time::sleep(LATENCY).await;
            if server.fail_saves.get() {
                return Err(ApiError::Status {
                    endpoint: SAVE_PATH.into(),
                    status: 503,
                });
            }
            server.saves.borrow_mut().push(request);
            Ok(())
        }
    }

    fn reset(&self) -> impl Future<Output = Result<(), ApiError>> {
        let server = Rc::clone(&self.server);
        server.reset_calls.set(server.reset_calls.get() + 1);
        async move { Ok(()) }
    }
}

#[derive(Clone, Copy, Default)]
pub struct TokioLoop;

impl EventLoop for TokioLoop {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        tokio::time::sleep(duration)
    }

    fn spawn_detached<F>(&self, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        tokio::task::spawn_local(task);
    }
}

pub fn ocean_session() -> SimulationSession<MemorySink> {
    ocean_session_with(MemorySink::new())
}

pub fn ocean_session_with(sink: MemorySink) -> SimulationSession<MemorySink> {
    let layout = LayoutSpec::from_json(
        r#"{"levels": [
            {"id": "producers", "organisms": [{"id": "kelp", "population": 80}]},
            {"id": "apex", "organisms": [{"id": "orca", "population": 4}]}
        ]}"#,
    )
    .unwrap();
    let index = layout
        .build_index(|l| l.id.clone(), |_, o| o.id.clone())
        .unwrap();
    SimulationSession::new(index, sink, &LoopConfig::default())
}

pub fn ocean_step(cycle_complete: bool, cycle_index: Option<i64>) -> StepResult {
    StepResult {
        organisms: vec![
            json!({"id": "kelp", "row": 1, "col": 2, "population": 75, "averageGenome": [0.8, 0.2]}),
            json!({"id": "orca", "row": 4, "col": 4, "caughtPrey": true, "population": 5}),
        ],
        cycle_complete,
        cycle_summary: if cycle_complete {
            vec![json!({"id": "orca", "caughtPrey": true, "caughtPreyCount": 2})]
        } else {
            Vec::new()
        },
        cycle_index,
        ..StepResult::default()
    }
}

/// Lets detached tasks (saves, resets) run to completion.
pub async fn settle() {
    tokio::time::sleep(Duration::from_secs(5)).await;
}
