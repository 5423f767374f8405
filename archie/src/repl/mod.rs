//! Terminal front end for Archie
//!
//! Interactive REPL, one-shot mode, and sandbox seeding on first start.

mod render;
mod session;

pub use render::render_event;
pub use session::ReplSession;

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use tracing::{debug, info};

use crate::agent::{Agent, TurnOutcome, event_channel};
use crate::config::{Config, SandboxConfig, expand_home};

const WELCOME_FILE: &str = "welcome.txt";
const WELCOME_TEXT: &str = "Hi! This is your Archie sandbox.\nYou can create, move and organize files here.";

/// Run the interactive REPL
pub async fn run_interactive(config: &Config) -> Result<()> {
    debug!("run_interactive: called");
    let agent = Agent::from_config(config).context("Failed to create agent")?;

    let mut session = ReplSession::new(agent);
    session.run().await
}

/// Run a single prompt and exit
///
/// Events go to stdout as rendered lines, or as JSON lines when `json` is set.
/// A turn that ends without an answer is an error.
pub async fn run_once(config: &Config, prompt: &str, json: bool) -> Result<()> {
    debug!(json, "run_once: called");
    let mut agent = Agent::from_config(config).context("Failed to create agent")?;
    let cancel = agent.cancel_handle();
    let (events, mut rx) = event_channel();

    let print = |event: &crate::agent::AgentEvent| -> Result<()> {
        if json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            println!("{}", render_event(event));
        }
        Ok(())
    };

    let outcome = {
        let turn = agent.process_input(prompt, &events);
        tokio::pin!(turn);

        loop {
            tokio::select! {
                outcome = &mut turn => break outcome?,
                Some(event) = rx.recv() => print(&event)?,
                _ = tokio::signal::ctrl_c() => {
                    cancel.cancel();
                }
            }
        }
    };

    while let Ok(event) = rx.try_recv() {
        print(&event)?;
    }

    info!(?outcome, "run_once: finished");
    match outcome {
        TurnOutcome::Completed { .. } => Ok(()),
        TurnOutcome::Cancelled => Err(eyre::eyre!("Cancelled")),
        TurnOutcome::Failed { message } => Err(eyre::eyre!(message)),
        TurnOutcome::LimitReached { iterations } => {
            Err(eyre::eyre!("No answer after {} model calls", iterations))
        }
    }
}

/// Create the sandbox root, seeding it when empty
///
/// Returns the root as configured (home-expanded).
pub fn ensure_sandbox(config: &SandboxConfig) -> Result<PathBuf> {
    let root = expand_home(&config.root);
    debug!(?root, "ensure_sandbox: called");
    fs::create_dir_all(&root).with_context(|| format!("Failed to create sandbox {}", root.display()))?;

    if is_empty_dir(&root)? {
        info!(?root, "ensure_sandbox: seeding empty sandbox");
        fs::write(root.join(WELCOME_FILE), WELCOME_TEXT).context("Failed to write welcome file")?;
        fs::create_dir_all(root.join("documents")).context("Failed to create documents folder")?;
        fs::create_dir_all(root.join("projects")).context("Failed to create projects folder")?;
    }
    Ok(root)
}

fn is_empty_dir(path: &Path) -> Result<bool> {
    let mut entries = fs::read_dir(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(entries.next().is_none())
}
