//! # phylogen
//!
//! Client-side core for a server-driven ecological simulation.
//!
//! The server owns the simulation. This crate owns everything the client does
//! with it: a view index over the static layout, reconciliation of step
//! responses into view mutations, genome display formatting, the polling loop
//! and the best-effort persistence calls.
//!
//! Rendering goes through the [`sink::ViewSink`] trait, so the same logic
//! drives the browser DOM (`phylogen_web`) and the headless native client
//! (`phylogen_cli`).
//!
//! ## Quick Start
//!
//! ```
//! use phylogen::prelude::*;
//!
//! let layout = LayoutSpec::from_json(
//!     r#"{"levels": [{"id": "apex", "organisms": [{"id": "orca", "population": 4}]}]}"#,
//! )
//! .unwrap();
//! let index = layout.build_index(|l| l.id.clone(), |_, o| o.id.clone()).unwrap();
//! let mut session = SimulationSession::new(index, MemorySink::new(), &LoopConfig::default());
//!
//! let ticket = session.start().unwrap();
//! let step = StepResult::from_json(
//!     r#"{"organisms": [{"id": "orca", "population": 6, "averageGenome": [0.9]}]}"#,
//! )
//! .unwrap();
//! session.complete_step(&ticket, Ok(step));
//!
//! assert_eq!(session.sink().level_total("apex"), Some(6));
//! ```
//!
//! ## Modules
//!
//! - [`index`]: organism and trophic level lookup
//! - [`reconcile`]: step response to view mutations
//! - [`genome`]: genome display formatting
//! - [`controller`]: polling loop state machine
//! - [`driver`] / [`client`]: the async loop and its front-end facade
//! - [`persistence`]: save/reset calls

#[path = "core/api.rs"]
pub mod api;

#[path = "core/client.rs"]
pub mod client;

#[path = "core/config.rs"]
pub mod config;

#[path = "core/controller.rs"]
pub mod controller;

#[path = "core/driver.rs"]
pub mod driver;

#[path = "core/error.rs"]
pub mod error;

#[path = "core/fmt.rs"]
pub mod fmt;

#[path = "core/genome.rs"]
pub mod genome;

#[path = "core/index.rs"]
pub mod index;

#[path = "core/layout.rs"]
pub mod layout;

#[path = "core/memory.rs"]
pub mod memory;

#[path = "core/persistence.rs"]
pub mod persistence;

#[path = "core/protocol.rs"]
pub mod protocol;

#[path = "core/reconcile.rs"]
pub mod reconcile;

#[path = "core/session.rs"]
pub mod session;

#[path = "core/sink.rs"]
pub mod sink;

#[cfg(test)]
#[path = "core/testing.rs"]
mod testing;

/// Prelude module for convenient imports.
///
/// ```
/// use phylogen::prelude::*;
/// ```
pub mod prelude {
    pub use crate::api::{EventLoop, SimulationApi};
    pub use crate::client::SimulationClient;
    pub use crate::config::{Endpoints, LoopConfig};
    pub use crate::controller::{LoopState, StopReason};
    pub use crate::driver::LoopExit;
    pub use crate::error::{ApiError, LayoutError};
    pub use crate::genome::DisplayMode;
    pub use crate::index::{ViewIndex, ViewIndexBuilder};
    pub use crate::layout::LayoutSpec;
    pub use crate::memory::MemorySink;
    pub use crate::protocol::{CycleCompleteEvent, CycleDigest, SaveRequest, StepResult};
    pub use crate::session::SimulationSession;
    pub use crate::sink::ViewSink;
}
