//! Interactive REPL
//!
//! Readline loop over one agent conversation with `reset` and `exit`/`quit`
//! commands.

mod session;

pub use session::ReplSession;

use eyre::{Result, WrapErr};
use tracing::info;

use crate::agent::Agent;
use crate::config::Config;
use crate::llm::create_client;

/// Run the interactive REPL
///
/// Probes the backend before entering the loop so an unreachable model server
/// is a startup failure with a non-zero exit, not a surprise mid-session.
pub async fn run_interactive(config: &Config) -> Result<()> {
    let llm = create_client(&config.llm).map_err(|e| eyre::eyre!("Failed to create LLM client: {}", e))?;

    let models = llm
        .models()
        .await
        .wrap_err_with(|| format!("Cannot reach the model backend at {}", config.llm.base_url))?;
    info!(model_count = models.len(), "run_interactive: backend reachable");

    if !models.is_empty() && !models.iter().any(|m| m == &config.llm.model) {
        eprintln!(
            "Warning: model '{}' not reported by the backend ({} available)",
            config.llm.model,
            models.len()
        );
    }

    println!("Connected to {} ({})", config.llm.provider, config.llm.model);

    let agent = Agent::from_config(config, llm);
    let mut session = ReplSession::new(agent, config.history_file());
    session.run().await
}
