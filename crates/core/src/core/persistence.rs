//! Best-effort save/reset calls. Nothing here is awaited by the polling loop
//! and no failure is retried.

use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{EventLoop, SimulationApi};
use crate::protocol::SaveRequest;

#[derive(Debug, Clone)]
pub struct PersistenceClient<A> {
    api: A,
}

impl<A> PersistenceClient<A>
where
    A: SimulationApi + Clone + 'static,
{
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Persists a finished cycle. Without a cycle index the run is treated as
    /// incomplete and nothing is sent. Returns whether a write was scheduled.
    pub fn save<E: EventLoop>(
        &self,
        runtime: &E,
        cycle_index: Option<i64>,
        summary: Vec<Value>,
        organisms: Vec<Value>,
    ) -> bool {
        let Some(cycle) = cycle_index else {
            debug!("no cycle index; skipping save");
            return false;
        };
        let request = SaveRequest {
            cycle,
            summary,
            organisms,
        };
        let api = self.api.clone();
        runtime.spawn_detached(async move {
            match api.save(&request).await {
                Ok(()) => debug!(cycle, "cycle saved"),
                Err(e) => warn!(cycle, error = %e, "failed to save cycle"),
            }
        });
        true
    }

    /// Clears persisted history once at startup.
    pub fn reset<E: EventLoop>(&self, runtime: &E) {
        let api = self.api.clone();
        runtime.spawn_detached(async move {
            match api.reset().await {
                Ok(()) => debug!("simulation history reset"),
                Err(e) => warn!(error = %e, "failed to reset simulation history"),
            }
        });
    }
}
