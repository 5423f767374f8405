//! REPL session management

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info, warn};

use super::render::render_event;
use crate::agent::{Agent, TurnOutcome, TurnRole, event_channel};

/// Interactive REPL session
pub struct ReplSession {
    agent: Agent,
}

impl ReplSession {
    /// Create a new REPL session
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("\n{} ", ">".bright_blue()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    match self.handle_command(input) {
                        CommandResult::Continue => continue,
                        CommandResult::Quit => break,
                        CommandResult::NotACommand => self.process_user_input(input).await,
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C at the prompt - nothing to cancel
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("{}", "\n  Goodbye!\n".cyan());
        Ok(())
    }

    fn print_welcome(&self) {
        let ctx = self.agent.tool_context();
        let line = "-".repeat(50);
        println!();
        println!("{}", "Archie - File Assistant".bright_cyan().bold());
        println!("{}", line.dimmed());
        println!("  {} Base: {}", "[DIR]".dimmed(), ctx.root().display().to_string().bold());
        println!("  {} Model: {}", "[i]".dimmed(), self.agent.model_name().bold());
        if let Ok(extra) = ctx.extra_dir() {
            println!("  {} Extra: {}", "[DIR]".dimmed(), extra.root().display().to_string().bold());
        }
        println!("{}", line.dimmed());
        println!(
            "  Type {} for help, {} to quit, Ctrl+C cancels a running request",
            "/help".yellow(),
            "exit".yellow()
        );
    }

    /// Handle REPL commands; anything else goes to the agent
    fn handle_command(&mut self, input: &str) -> CommandResult {
        let cmd = input.split_whitespace().next().unwrap_or("");

        match cmd.to_lowercase().as_str() {
            "exit" | "quit" | "/quit" | "/q" | "/exit" => CommandResult::Quit,
            "clear" | "/clear" | "/c" => {
                self.agent.clear_history();
                println!("{}", "  [OK] History cleared".green());
                CommandResult::Continue
            }
            "/help" | "/h" => {
                self.print_help();
                CommandResult::Continue
            }
            "/history" => {
                self.print_history();
                CommandResult::Continue
            }
            _ if cmd.starts_with('/') => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
                CommandResult::Continue
            }
            _ => CommandResult::NotACommand,
        }
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:14} Show this help", "/help".yellow());
        println!("  {:14} Exit the REPL", "exit, /quit".yellow());
        println!("  {:14} Clear conversation history", "clear, /clear".yellow());
        println!("  {:14} Show conversation history", "/history".yellow());
        println!();
        println!("{}", "Available Tools:".bright_cyan());
        for descriptor in self.agent.tool_descriptors() {
            println!("  {:16} {}", descriptor.name.yellow(), descriptor.description);
        }
        println!();
    }

    fn print_history(&self) {
        let turns = self.agent.conversation().turns();
        if turns.is_empty() {
            println!("{}", "No conversation history.".dimmed());
            return;
        }

        println!();
        println!("{}", "Conversation History:".bright_cyan());
        for (i, turn) in turns.iter().enumerate() {
            let role = match turn.role() {
                TurnRole::User => "User".bright_blue(),
                TurnRole::Assistant => "Assistant".bright_green(),
                TurnRole::Tool => format!("Tool({})", turn.tool_name().unwrap_or("?")).magenta(),
            };
            let content = turn.content();
            let preview: String = content.chars().take(50).collect();
            let preview = preview.replace('\n', " ");
            if content.chars().count() > 50 {
                println!("  {}. {}: {}...", i + 1, role, preview);
            } else {
                println!("  {}. {}: {}", i + 1, role, preview);
            }
        }
        println!();
    }

    /// Run one turn, printing events as they arrive
    ///
    /// Ctrl+C while the turn runs requests cancellation.
    async fn process_user_input(&mut self, input: &str) {
        debug!(input_len = input.len(), "ReplSession::process_user_input: called");
        let (events, mut rx) = event_channel();
        let cancel = self.agent.cancel_handle();

        let outcome = {
            let turn = self.agent.process_input(input, &events);
            tokio::pin!(turn);

            loop {
                tokio::select! {
                    outcome = &mut turn => break outcome,
                    Some(event) = rx.recv() => println!("{}", render_event(&event)),
                    _ = tokio::signal::ctrl_c() => {
                        if cancel.cancel() {
                            println!("{}", "\n  [!] Cancelling...".yellow());
                        }
                    }
                }
            }
        };

        while let Ok(event) = rx.try_recv() {
            println!("{}", render_event(&event));
        }

        match outcome {
            Ok(TurnOutcome::Completed { .. }) => debug!("ReplSession::process_user_input: completed"),
            Ok(other) => info!(outcome = ?other, "ReplSession::process_user_input: turn ended without answer"),
            Err(e) => {
                warn!(error = %e, "ReplSession::process_user_input: turn rejected");
                println!("\n{} {}", "[ERR]".red(), e.to_string().red());
            }
        }
    }
}

/// Result of handling a REPL command
enum CommandResult {
    Continue,
    Quit,
    NotACommand,
}
