//! The polling task: one async function per run, with the step ticket's
//! cancellation token threaded through every await.

use std::cell::RefCell;
use std::pin::pin;
use std::rc::Rc;

use futures::future::{select, Either};

use crate::api::{EventLoop, SimulationApi};
use crate::controller::StepTicket;
use crate::error::ApiError;
use crate::persistence::PersistenceClient;
use crate::session::{SimulationSession, StepDisposition};
use crate::sink::{LoopListener, ViewSink};

#[derive(Debug, Clone, PartialEq)]
pub enum LoopExit {
    /// User stop, or the run was replaced by a newer one.
    Stopped,
    CycleComplete { cycle: Option<i64> },
    Failed(ApiError),
}

/// Drives one run until it stops. The session is borrowed only between awaits,
/// so a stop from an event handler can land while a request is pending.
pub async fn run_loop<V, A, E>(
    session: &RefCell<SimulationSession<V>>,
    api: &A,
    runtime: &E,
    persistence: &PersistenceClient<A>,
    first: StepTicket,
) -> LoopExit
where
    V: ViewSink,
    A: SimulationApi + Clone + 'static,
    E: EventLoop,
{
    let mut ticket = first;
    loop {
        let outcome = {
            let request = pin!(api.step(ticket.token()));
            let cancelled = pin!(ticket.token().cancelled());
            match select(request, cancelled).await {
                Either::Left((outcome, _)) => outcome,
                Either::Right(_) => Err(ApiError::Cancelled),
            }
        };

        let disposition = session.borrow_mut().complete_step(&ticket, outcome);
        match disposition {
            StepDisposition::Discarded => return LoopExit::Stopped,
            StepDisposition::Failed(e) => {
                if let Some(listener) = session_listener(session) {
                    listener.loop_failed(&e);
                }
                return LoopExit::Failed(e);
            }
            StepDisposition::CycleComplete(done) => {
                let event = done.event();
                persistence.save(runtime, done.cycle_index, done.summary, done.organisms);
                session.borrow_mut().notify_cycle_complete(&event);
                if let Some(listener) = session_listener(session) {
                    listener.cycle_complete(&event);
                }
                return LoopExit::CycleComplete { cycle: event.cycle };
            }
            StepDisposition::Continue { delay, .. } => {
                {
                    let sleep = pin!(runtime.sleep(delay));
                    let cancelled = pin!(ticket.token().cancelled());
                    // Either way the controller decides below.
                    let _ = select(sleep, cancelled).await;
                }
                let next = session.borrow_mut().next_step(&ticket);
                match next {
                    Some(next) => ticket = next,
                    None => return LoopExit::Stopped,
                }
            }
        }
    }
}

/// Clones the listener out so no borrow is held while it runs.
fn session_listener<V: ViewSink>(session: &RefCell<SimulationSession<V>>) -> Option<Rc<dyn LoopListener>> {
    session.borrow().sink().listener()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::task::LocalSet;
    use tokio::time::Instant;

    use super::*;
    use crate::controller::{LoopState, StopReason};
    use crate::memory::MemorySink;
    use crate::protocol::CycleCompleteEvent;
    use crate::testing::{
        ocean_session, ocean_session_with, ocean_step, settle, ScriptedApi, TokioLoop, LATENCY,
    };

    #[derive(Default)]
    struct Failures(RefCell<Vec<String>>);

    impl LoopListener for Failures {
        fn cycle_complete(&self, _event: &CycleCompleteEvent) {}

        fn loop_failed(&self, error: &ApiError) {
            self.0.borrow_mut().push(error.to_string());
        }
    }

    async fn drive(api: &ScriptedApi, session: &RefCell<SimulationSession<MemorySink>>) -> LoopExit {
        let persistence = PersistenceClient::new(api.clone());
        let first = session.borrow_mut().start().unwrap();
        run_loop(session, api, &TokioLoop, &persistence, first).await
    }

    #[tokio::test(start_paused = true)]
    async fn next_step_follows_after_the_delay() {
        LocalSet::new()
            .run_until(async {
                let api = ScriptedApi::new([Ok(ocean_step(false, None)), Ok(ocean_step(true, Some(1)))]);
                let session = RefCell::new(ocean_session());
                let started = Instant::now();

                drive(&api, &session).await;

                let elapsed = started.elapsed();
                assert!(elapsed >= LATENCY * 2 + Duration::from_millis(800));
                assert!(elapsed < LATENCY * 2 + Duration::from_millis(900));
                assert_eq!(api.step_calls(), 2);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn completed_cycle_stops_and_saves_once() {
        LocalSet::new()
            .run_until(async {
                let api = ScriptedApi::new([Ok(ocean_step(false, None)), Ok(ocean_step(true, Some(7)))]);
                let session = RefCell::new(ocean_session());

                assert_eq!(drive(&api, &session).await, LoopExit::CycleComplete { cycle: Some(7) });
                settle().await;

                assert_eq!(api.step_calls(), 2);
                let saves = api.saves();
                assert_eq!(saves.len(), 1);
                assert_eq!(saves[0].cycle, 7);
                assert_eq!(saves[0].organisms, ocean_step(true, Some(7)).organisms);
                assert_eq!(saves[0].summary.len(), 1);

                let s = session.borrow();
                assert_eq!(s.state(), LoopState::Stopped);
                assert_eq!(s.stop_reason(), Some(StopReason::CycleComplete));
                assert_eq!(s.sink().events().len(), 1);
                assert_eq!(s.sink().events()[0].cycle, Some(7));
                assert_eq!(s.sink().level_total("apex"), Some(5));
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn missing_cycle_index_skips_the_save() {
        LocalSet::new()
            .run_until(async {
                let api = ScriptedApi::new([Ok(ocean_step(true, None))]);
                let session = RefCell::new(ocean_session());

                assert_eq!(drive(&api, &session).await, LoopExit::CycleComplete { cycle: None });
                settle().await;

                assert_eq!(api.save_calls(), 0);
                assert_eq!(session.borrow().sink().events().len(), 1);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn failure_stops_without_retry() {
        LocalSet::new()
            .run_until(async {
                let err = ApiError::Status {
                    endpoint: "/api/simulation/step".into(),
                    status: 500,
                };
                let api = ScriptedApi::new([Err(err.clone())]);
                let session = RefCell::new(ocean_session());

                assert_eq!(drive(&api, &session).await, LoopExit::Failed(err));
                settle().await;

                assert_eq!(api.step_calls(), 1);
                assert_eq!(api.save_calls(), 0);
                let s = session.borrow();
                assert_eq!(s.stop_reason(), Some(StopReason::Failed));
                assert_eq!(s.sink().failures().len(), 1);
                assert_eq!(s.sink().mutations(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn failure_reaches_the_listener() {
        LocalSet::new()
            .run_until(async {
                let api = ScriptedApi::new([Err(ApiError::transport("/api/simulation/step", "connection reset"))]);
                let failures = Rc::new(Failures::default());
                let session = RefCell::new(ocean_session_with(MemorySink::new().with_listener(failures.clone())));

                assert!(matches!(drive(&api, &session).await, LoopExit::Failed(_)));
                assert_eq!(failures.0.borrow().len(), 1);
                assert_eq!(session.borrow().sink().failures().len(), 1);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_while_in_flight_discards_the_response() {
        LocalSet::new()
            .run_until(async {
                let api = ScriptedApi::new([Ok(ocean_step(false, None))]);
                let session = RefCell::new(ocean_session());

                let stopper = async {
                    tokio::time::sleep(LATENCY / 2).await;
                    session.borrow_mut().stop();
                };
                let (exit, ()) = tokio::join!(drive(&api, &session), stopper);

                assert_eq!(exit, LoopExit::Stopped);
                settle().await;
                assert_eq!(api.step_calls(), 1);
                let s = session.borrow();
                assert_eq!(s.stop_reason(), Some(StopReason::User));
                assert_eq!(s.sink().mutations(), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_the_delay_issues_nothing_more() {
        LocalSet::new()
            .run_until(async {
                let api = ScriptedApi::new([Ok(ocean_step(false, None))]);
                let session = RefCell::new(ocean_session());

                let stopper = async {
                    tokio::time::sleep(LATENCY + Duration::from_millis(300)).await;
                    session.borrow_mut().stop();
                };
                let started = Instant::now();
                let (exit, ()) = tokio::join!(drive(&api, &session), stopper);

                assert_eq!(exit, LoopExit::Stopped);
                assert!(started.elapsed() < LATENCY + Duration::from_millis(800));
                settle().await;
                assert_eq!(api.step_calls(), 1);
                assert_eq!(session.borrow().sink().level_total("producers"), Some(75));
            })
            .await;
    }
}
