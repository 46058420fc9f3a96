//! Front-end facade: owns the shared session plus the transport and event
//! loop, and wires user actions (start, stop, toggle, mode switch) to them.

use std::cell::RefCell;
use std::rc::Rc;

use crate::api::{EventLoop, SimulationApi};
use crate::driver::{run_loop, LoopExit};
use crate::genome::DisplayMode;
use crate::persistence::PersistenceClient;
use crate::session::SimulationSession;
use crate::sink::ViewSink;

pub struct SimulationClient<V: ViewSink, A, E> {
    session: Rc<RefCell<SimulationSession<V>>>,
    api: A,
    runtime: E,
    persistence: PersistenceClient<A>,
}

impl<V: ViewSink, A: Clone, E: Clone> Clone for SimulationClient<V, A, E> {
    fn clone(&self) -> Self {
        Self {
            session: Rc::clone(&self.session),
            api: self.api.clone(),
            runtime: self.runtime.clone(),
            persistence: self.persistence.clone(),
        }
    }
}

impl<V, A, E> SimulationClient<V, A, E>
where
    V: ViewSink + 'static,
    A: SimulationApi + Clone + 'static,
    E: EventLoop + Clone + 'static,
{
    pub fn new(session: SimulationSession<V>, api: A, runtime: E) -> Self {
        Self {
            session: Rc::new(RefCell::new(session)),
            persistence: PersistenceClient::new(api.clone()),
            api,
            runtime,
        }
    }

    pub fn session(&self) -> &Rc<RefCell<SimulationSession<V>>> {
        &self.session
    }

    /// Startup call: clears stale persisted history without blocking.
    pub fn reset_history(&self) {
        self.persistence.reset(&self.runtime);
    }

    /// Starts a run on a detached task. Returns `false` if one was already
    /// running.
    pub fn start(&self) -> bool {
        let Some(ticket) = self.session.borrow_mut().start() else {
            return false;
        };
        let this = self.clone();
        self.runtime.spawn_detached(async move {
            run_loop(&this.session, &this.api, &this.runtime, &this.persistence, ticket).await;
        });
        true
    }

    /// Starts a run and waits for it to end. `None` if one was already running.
    pub async fn run(&self) -> Option<LoopExit> {
        let ticket = self.session.borrow_mut().start()?;
        Some(run_loop(&self.session, &self.api, &self.runtime, &self.persistence, ticket).await)
    }

    pub fn stop(&self) -> bool {
        self.session.borrow_mut().stop()
    }

    /// The run/stop button. Returns whether the loop is running afterwards.
    pub fn toggle(&self) -> bool {
        if self.session.borrow().is_running() {
            self.stop();
            false
        } else {
            self.start()
        }
    }

    pub fn set_display_mode(&self, mode: DisplayMode) {
        self.session.borrow_mut().set_display_mode(mode);
    }

    pub fn toggle_display_mode(&self) -> DisplayMode {
        self.session.borrow_mut().toggle_display_mode()
    }
}
