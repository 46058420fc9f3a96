//! Phylogen headless client
//!
//! Drives the simulation server from the command line:
//! - Loads the page layout (trophic levels and organisms) from JSON
//! - Polls the step endpoint until each cycle completes
//! - Saves every completed cycle
//! - Logs a digest of each cycle and the per-level population totals
//!
//! Config locations:
//! - Linux: ~/.config/phylogen/
//! - Windows: %APPDATA%\phylogen\
//! - MacOS: ~/Library/Application Support/phylogen/

use std::fs;

use phylogen::client::SimulationClient;
use phylogen::driver::LoopExit;
use phylogen::layout::LayoutSpec;
use phylogen::memory::MemorySink;
use phylogen::protocol::CycleDigest;
use phylogen::session::SimulationSession;
use tokio::task::LocalSet;
use tracing::{debug, error, info, warn};

mod config;
mod http;
mod paths;
mod runtime;

use config::ClientConfig;
use http::HttpApi;
use paths::AppPaths;
use runtime::TokioLoop;

type Client = SimulationClient<MemorySink, HttpApi, TokioLoop>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let paths = AppPaths::new()?;
    let cfg = ClientConfig::load(&paths)?;
    if let Some(file) = ClientConfig::first_run_file(&paths, |key| std::env::var(key).ok()) {
        if let Err(e) = paths.ensure() {
            warn!("{}", e);
        } else if let Err(e) = ClientConfig::default().write(&file) {
            warn!("Could not write default config: {}", e);
        }
    }

    let layout_path = cfg.layout_path(&paths);
    let text = fs::read_to_string(&layout_path)
        .map_err(|e| format!("Failed to read layout {}: {}", layout_path.display(), e))?;
    let layout = LayoutSpec::from_json(&text)?;
    let index = layout.build_index(|l| l.id.clone(), |_, o| o.id.clone())?;
    info!(
        levels = layout.levels.len(),
        organisms = layout.organism_count(),
        "Layout loaded from {}",
        layout_path.display()
    );

    let api = HttpApi::new(&cfg)?;
    info!("Simulation server: {}", cfg.server_url);
    let runtime = TokioLoop::new();
    let session = SimulationSession::new(index, MemorySink::new(), &cfg.polling);
    let client = SimulationClient::new(session, api, runtime.clone());

    LocalSet::new()
        .run_until(async {
            let outcome = run(&client, &cfg).await;
            // Let the last save land before exiting.
            runtime.drain().await;
            outcome
        })
        .await
}

async fn run(client: &Client, cfg: &ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.reset_on_start {
        client.reset_history();
    }

    // Ctrl-C stops the loop like the page's stop button: no save for the
    // unfinished cycle.
    {
        let client = client.clone();
        tokio::task::spawn_local(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C: stopping simulation loop");
                client.stop();
            }
        });
    }

    let mut completed = 0u32;
    loop {
        match client.run().await {
            Some(LoopExit::CycleComplete { cycle }) => {
                completed += 1;
                report_cycle(&client.session().borrow(), cycle);
                if cfg.cycles != 0 && completed >= cfg.cycles {
                    break;
                }
            }
            Some(LoopExit::Stopped) | None => break,
            Some(LoopExit::Failed(e)) => {
                error!("Simulation loop failed: {}", e);
                return Err(e.into());
            }
        }
    }
    info!(cycles = completed, "Simulation client finished");
    Ok(())
}

fn report_cycle(session: &SimulationSession<MemorySink>, cycle: Option<i64>) {
    let digest = session
        .sink()
        .events()
        .last()
        .map(|e| CycleDigest::from_summary(&e.summary))
        .unwrap_or_default();
    info!(
        cycle = ?cycle,
        organisms = digest.records,
        hunters_fed = digest.hunters_fed,
        prey_caught = digest.prey_caught,
        catches = digest.total_catches,
        "Cycle complete"
    );

    for level in session.index().all_levels() {
        info!(
            level = level.id(),
            members = level.member_count(),
            total = level.aggregate.total_population,
            "Trophic level"
        );
    }
    for organism in session.index().organisms() {
        let view = session.sink().organism(&organism.state.id);
        debug!(
            organism = %organism.state.id,
            extinct = organism.state.is_extinct(),
            population = ?organism.state.population,
            genome = view.and_then(|v| v.genome_text.as_deref()).unwrap_or(""),
            "Organism"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phylogen::config::LoopConfig;
    use phylogen::protocol::StepResult;
    use phylogen::session::StepDisposition;

    const OCEAN: &str = include_str!("../../../demos/ocean_layout.json");

    #[test]
    fn demo_layout_builds() {
        let layout = LayoutSpec::from_json(OCEAN).unwrap();
        assert_eq!(layout.levels.len(), 5);
        assert_eq!(layout.organism_count(), 9);
        let index = layout.build_index(|l| l.id.clone(), |_, o| o.id.clone()).unwrap();
        assert_eq!(index.members_of("apex").count(), 1);
    }

    #[test]
    fn cycle_report_reads_the_last_event() {
        let layout = LayoutSpec::from_json(OCEAN).unwrap();
        let index = layout.build_index(|l| l.id.clone(), |_, o| o.id.clone()).unwrap();
        let mut session = SimulationSession::new(index, MemorySink::new(), &LoopConfig::default());
        let ticket = session.start().unwrap();
        let step = StepResult::from_json(
            r#"{"organisms": [{"id": "apex-1", "population": 3}],
                "cycleComplete": true, "cycleIndex": 1,
                "cycleSummary": [{"id": "apex-1", "caughtPrey": true, "caughtPreyCount": 2}]}"#,
        )
        .unwrap();
        let StepDisposition::CycleComplete(done) = session.complete_step(&ticket, Ok(step)) else {
            panic!("expected cycle completion");
        };
        session.notify_cycle_complete(&done.event());
        report_cycle(&session, done.cycle_index);
        assert_eq!(session.sink().level_total("apex"), Some(3));
    }
}
