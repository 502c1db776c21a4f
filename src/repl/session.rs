//! REPL session management

use std::path::PathBuf;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::agent::Agent;

/// Interactive REPL session wrapping one agent conversation
pub struct ReplSession {
    agent: Agent,
    history_file: PathBuf,
}

impl ReplSession {
    /// Create a new REPL session
    pub fn new(agent: Agent, history_file: PathBuf) -> Self {
        debug!(?history_file, "ReplSession::new: called");
        Self { agent, history_file }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        if rl.load_history(&self.history_file).is_err() {
            debug!("run: no existing history file");
        }

        println!("Type {} or {} to end the session, {} to clear the conversation",
            "exit".yellow(), "quit".yellow(), "reset".yellow());
        println!("---");

        loop {
            let readline = rl.readline(&format!("{} ", ">>>".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    match input.to_lowercase().as_str() {
                        "exit" | "quit" => break,
                        "reset" => {
                            self.agent.reset();
                            println!("{}", "Conversation reset.".dimmed());
                        }
                        _ => self.process_input(input).await,
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C at the prompt - just show a new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D - exit
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        if let Some(parent) = self.history_file.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = rl.save_history(&self.history_file) {
            debug!(error = %e, "run: failed to save history");
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Run one user turn, cancellable with Ctrl+C
    ///
    /// Dropping the in-flight chat future aborts the gateway call; a running
    /// shell child dies with its process group (kill-on-drop).
    async fn process_input(&mut self, input: &str) {
        debug!(input_len = %input.len(), "process_input: called");
        tokio::select! {
            result = self.agent.chat(input) => match result {
                Ok(text) => {
                    println!("\n{}\n", text);
                }
                Err(e) => {
                    // Plain description of the guard or limit hit, never a trace
                    println!("{} {}\n", "Error:".red().bold(), e);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!("\n{}\n", "Cancelled.".dimmed());
            }
        }
    }
}
