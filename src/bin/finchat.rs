//! Interactive terminal client for the financial-assistant backend.
//!
//! This binary provides a streaming REPL: messages are sent to the backend's
//! `/chat` endpoint and the response is rendered token-by-token, with tool
//! invocations and charts surfaced inline.
//!
//! # Usage
//!
//! ```bash
//! # Talk to the default backend (http://localhost:8000)
//! finchat
//!
//! # Point at another backend
//! finchat --backend http://10.0.0.5:8000
//!
//! # Save charts somewhere specific
//! finchat --chart-dir ~/charts
//!
//! # Disable colors (useful for piping output)
//! finchat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/new` - Start a new session
//! - `/sessions` - List sessions
//! - `/switch <id>` - Switch to a session
//! - `/delete [id]` - Delete a session
//! - `/clear` - Clear the active session's history
//! - `/quit` - Exit the application

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use finchat::BackendClient;
use finchat::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatController, PlainTextRenderer, Renderer, help_text,
    parse_command,
};
use finchat::types::{ChatMessage, MessageRole};

/// Main entry point for the finchat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("finchat [OPTIONS]");
    let config = ChatConfig::from(args);

    let client = BackendClient::with_options(config.backend_url.clone(), config.connect_timeout)?;
    let mut controller = ChatController::new();
    let mut renderer =
        PlainTextRenderer::with_color(config.use_color).with_chart_dir(&config.chart_dir);
    let mut rl = DefaultEditor::new()?;

    println!("finchat (backend: {})", client.base_url());
    println!("Type /help for commands, /quit to exit\n");

    loop {
        let prompt = format!("[{}] You: ", controller.active().title);
        let readline = rl.readline(&prompt);

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let _ = rl.add_history_entry(line);

                // Check for slash commands
                if let Some(cmd) = parse_command(line) {
                    match cmd {
                        ChatCommand::Quit => {
                            println!("Goodbye!");
                            break;
                        }
                        ChatCommand::New => {
                            let session = controller.new_session();
                            renderer.print_info(&format!(
                                "Started session {} ({})",
                                session.id, session.title
                            ));
                        }
                        ChatCommand::Sessions => {
                            print_sessions(&controller);
                        }
                        ChatCommand::Switch(id) => {
                            if controller.switch_session(&id) {
                                renderer.print_info(&format!(
                                    "Switched to {}",
                                    controller.active().title
                                ));
                                replay(controller.messages());
                            } else {
                                renderer.print_error(&format!("No session with id {id}"));
                            }
                        }
                        ChatCommand::Delete(id) => {
                            let id = id.unwrap_or_else(|| controller.active().id.clone());
                            if controller
                                .sessions()
                                .iter()
                                .any(|session| session.id == id)
                            {
                                controller.delete_session(&id);
                                renderer.print_info(&format!(
                                    "Deleted {id}; now on {}",
                                    controller.active().title
                                ));
                            } else {
                                renderer.print_error(&format!("No session with id {id}"));
                            }
                        }
                        ChatCommand::Clear => {
                            controller.clear_messages();
                            renderer.print_info("History cleared.");
                        }
                        ChatCommand::Charts(dir) => {
                            renderer.set_chart_dir(&dir);
                            renderer.print_info(&format!("Charts will be saved under {dir}"));
                        }
                        ChatCommand::Help => {
                            for line in help_text().lines() {
                                println!("    {}", line);
                            }
                        }
                        ChatCommand::Invalid(message) => {
                            renderer.print_error(&message);
                        }
                    }
                    continue;
                }

                // Regular message - send to the backend
                println!("Assistant:");
                controller.send(&client, line, &mut renderer).await;
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C at prompt - soft interrupt
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

fn print_sessions(controller: &ChatController) {
    println!("    Sessions:");
    for session in controller.sessions() {
        let marker = if session.id == controller.active().id {
            "*"
        } else {
            " "
        };
        println!("      {} {}  {}", marker, session.id, session.title);
    }
}

/// Reprints a restored session's transcript.
fn replay(messages: &[ChatMessage]) {
    for message in messages {
        match message.role {
            MessageRole::User => println!("You: {}", message.content),
            MessageRole::Assistant => {
                println!("Assistant: {}", message.content);
                for chart in &message.charts {
                    if chart.starts_with("data:") {
                        println!("  [chart: inline image]");
                    } else {
                        println!("  [chart: {chart}]");
                    }
                }
            }
        }
    }
}
