//! Interactive chat application for a locally hosted model.
//!
//! This binary provides a streaming REPL interface for chatting with an
//! Ollama-compatible endpoint, with conversations persisted as named
//! sessions.
//!
//! # Usage
//!
//! ```bash
//! # Basic usage with default settings
//! confab-chat
//!
//! # Point at a different endpoint and model
//! confab-chat --url http://gpu-box:11434/ --model gemma3
//!
//! # Disable colors (useful for piping output)
//! confab-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/clear` - Reset the conversation to its system message
//! - `/save` - Save the current session (prompts for a name if unsaved)
//! - `/save new` - Save under a fresh name
//! - `/load` - Pick a saved session to load
//! - `/system` - Set a new system prompt
//! - `/exit`, `/bye` - Exit the application
//!
//! Ctrl-C cancels the response currently being streamed without exiting.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use confab::Ollama;
use confab::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, PlainTextRenderer, Renderer, help_text,
    parse_command,
};

/// Main entry point for the confab-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("confab-chat [OPTIONS]");
    let config = ChatConfig::from(args);
    let use_color = config.use_color;

    let client = Ollama::new(Some(config.endpoint.clone()))?;
    let mut session = ChatSession::new(client, config);
    let mut renderer = PlainTextRenderer::with_color(use_color);
    let mut rl = DefaultEditor::new()?;

    // Flag for cancel handling during streaming
    let interrupted = Arc::new(AtomicBool::new(false));

    // Set up Ctrl+C handler
    let interrupted_clone = interrupted.clone();
    ctrlc::set_handler(move || {
        interrupted_clone.store(true, Ordering::Relaxed);
    })?;

    println!("Chat session started (model: {})", session.model());
    for line in help_text().lines() {
        println!("    {}", line);
    }
    println!("Press Ctrl+C to cancel the current response.\n");

    loop {
        // Reset the cancel flag before each input
        interrupted.store(false, Ordering::Relaxed);

        let readline = rl.readline("You: ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::Clear => {
                            session.clear();
                            renderer
                                .print_info("Context cleared. Only the system message remains.");
                        }
                        ChatCommand::Save { new } => {
                            handle_save(&mut session, &mut renderer, &mut rl, new);
                        }
                        ChatCommand::Load => {
                            handle_load(&mut session, &mut renderer, &mut rl);
                        }
                        ChatCommand::System => {
                            handle_system(&mut session, &mut renderer, &mut rl);
                        }
                    }
                    continue;
                }

                // Regular message - send to the model
                println!("\nAssistant:");
                if let Err(e) = session
                    .send_streaming(line, &mut renderer, interrupted.clone())
                    .await
                {
                    renderer.print_error(&e.to_string());
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at the prompt - soft interrupt
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                break;
            }
        }
    }

    Ok(())
}

/// `/save` and `/save new`: prompt for a name when one is needed, then
/// persist. A bound session without `new` is overwritten in place.
fn handle_save(
    session: &mut ChatSession,
    renderer: &mut PlainTextRenderer,
    rl: &mut DefaultEditor,
    new: bool,
) {
    let requested = if new || session.current_session().is_none() {
        match rl.readline("Enter session name (leave blank for a timestamped default): ") {
            Ok(line) => Some(line),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                renderer.print_info("Save canceled.");
                return;
            }
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                return;
            }
        }
    } else {
        None
    };

    match session.save(requested.as_deref().map(str::trim)) {
        Ok(name) => renderer.print_info(&format!("Session saved as {name:?}.")),
        Err(err) => renderer.print_error(&err.to_string()),
    }
}

/// `/load`: show the numbered menu and load the chosen session. An empty
/// selection cancels; a bad selection is reported and nothing changes.
fn handle_load(session: &mut ChatSession, renderer: &mut PlainTextRenderer, rl: &mut DefaultEditor) {
    let names = match session.list_sessions() {
        Ok(names) => names,
        Err(err) => {
            renderer.print_error(&err.to_string());
            return;
        }
    };

    if names.is_empty() {
        renderer.print_info("No saved sessions found.");
        return;
    }

    println!("\nAvailable sessions:");
    for (i, name) in names.iter().enumerate() {
        if session.current_session() == Some(name.as_str()) {
            println!("{}. {} (current)", i + 1, name);
        } else {
            println!("{}. {}", i + 1, name);
        }
    }

    let choice = match rl.readline("\nEnter session number to load (or press Enter to cancel): ") {
        Ok(line) => line,
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
            renderer.print_info("Loading canceled.");
            return;
        }
        Err(err) => {
            renderer.print_error(&format!("Input error: {}", err));
            return;
        }
    };

    let choice = choice.trim();
    if choice.is_empty() {
        renderer.print_info("Loading canceled.");
        return;
    }

    let index = match choice.parse::<usize>() {
        Ok(n) if (1..=names.len()).contains(&n) => n - 1,
        _ => {
            renderer.print_error("Invalid selection.");
            return;
        }
    };

    match session.load_session(&names[index]) {
        Ok(()) => renderer.print_info(&format!("Loaded session: {}", names[index])),
        Err(err) => renderer.print_error(&err.to_string()),
    }
}

/// `/system`: collect a multi-line prompt, terminated by a blank line.
fn handle_system(
    session: &mut ChatSession,
    renderer: &mut PlainTextRenderer,
    rl: &mut DefaultEditor,
) {
    println!("Enter the new system prompt (finish with a blank line):");
    let mut lines = Vec::new();
    loop {
        match rl.readline("") {
            Ok(line) => {
                if line.is_empty() {
                    break;
                }
                lines.push(line);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                renderer.print_error(&format!("Input error: {}", err));
                return;
            }
        }
    }

    if session.set_system_prompt(&lines.join("\n")) {
        renderer.print_info("System prompt updated.");
    } else {
        renderer.print_info("System prompt unchanged.");
    }
}
