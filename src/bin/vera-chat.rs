//! Interactive chat application for conversing with Vera.
//!
//! This binary provides a REPL interface to the Vera research agent backend:
//! every line typed is sent to `/chat`, and PDFs can be handed to `/upload`.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a backend on the default origin (http://127.0.0.1:8000/)
//! vera-chat
//!
//! # Point at another backend and stream replies
//! vera-chat --base-url http://192.168.20.166:8000 --stream
//!
//! # Disable colors (useful for piping output)
//! vera-chat --no-color
//! ```
//!
//! # Commands
//!
//! While chatting, you can use slash commands:
//! - `/help` - Show available commands
//! - `/upload <file.pdf>` - Upload a document
//! - `/cancel` - Cancel requests in flight (Ctrl+C does the same)
//! - `/quit` - Exit the application

use std::sync::Arc;
use std::sync::mpsc as std_mpsc;
use std::thread;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;

use vera::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatSession, GatewayEvent, PlainTextRenderer, Renderer,
    help_text, parse_command,
};
use vera::{StderrLogger, VeraClient};

/// What the input thread read.
enum InputLine {
    Line(String),
    Interrupted,
    Eof,
    Failed(String),
}

/// One turn of the event loop.
enum Step {
    Input(InputLine),
    Event(GatewayEvent),
    Interrupt,
}

enum Flow {
    Continue,
    Quit,
}

/// Main entry point for the vera-chat application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = ChatArgs::from_command_line_relaxed("vera-chat [OPTIONS]");
    if !free.is_empty() {
        eprintln!("unexpected arguments: {}", free.join(" "));
        std::process::exit(2);
    }
    let config = match ChatConfig::resolve(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let mut client = VeraClient::with_options(Some(&config.base_url), Some(config.timeout))?;
    if config.verbose {
        client = client.with_logger(Arc::new(StderrLogger));
    }
    let mut session = ChatSession::new(client, &config);
    let mut renderer = PlainTextRenderer::with_color(config.use_color);

    // Ctrl+C outside the line editor cancels what is in flight.
    let (interrupt_tx, mut interrupts) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(());
    })?;

    let editor = DefaultEditor::new()?;
    let (ready_tx, ready_rx) = std_mpsc::channel();
    let (line_tx, mut lines) = mpsc::unbounded_channel();
    thread::spawn(move || read_lines(editor, ready_rx, line_tx));

    println!("Vera Chat ({})", config.base_url);
    println!("Session {}", session.session_id());
    println!("Type /help for commands, /quit to exit\n");
    for message in session.log() {
        renderer.print_message(message);
    }
    let _ = ready_tx.send(());

    loop {
        let step = tokio::select! {
            line = lines.recv() => Step::Input(line.unwrap_or(InputLine::Eof)),
            Some(event) = session.next_event(), if session.is_busy() => Step::Event(event),
            Some(()) = interrupts.recv() => Step::Interrupt,
        };

        match step {
            Step::Event(event) => session.apply(event, &mut renderer),
            Step::Interrupt => interrupt(&mut session, &mut renderer),
            Step::Input(InputLine::Line(line)) => {
                if let Flow::Quit = handle_line(&mut session, &mut renderer, line).await {
                    println!("Goodbye!");
                    break;
                }
                let _ = ready_tx.send(());
            }
            Step::Input(InputLine::Interrupted) => {
                interrupt(&mut session, &mut renderer);
                let _ = ready_tx.send(());
            }
            Step::Input(InputLine::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Step::Input(InputLine::Failed(err)) => {
                renderer.print_error(&format!("Input error: {err}"));
                break;
            }
        }
    }

    Ok(())
}

/// Reads one line each time the event loop asks for it.
fn read_lines(
    mut editor: DefaultEditor,
    ready: std_mpsc::Receiver<()>,
    lines: mpsc::UnboundedSender<InputLine>,
) {
    while ready.recv().is_ok() {
        let line = match editor.readline("> ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = editor.add_history_entry(line.as_str());
                }
                InputLine::Line(line)
            }
            Err(ReadlineError::Interrupted) => InputLine::Interrupted,
            Err(ReadlineError::Eof) => InputLine::Eof,
            Err(err) => InputLine::Failed(err.to_string()),
        };
        if lines.send(line).is_err() {
            break;
        }
    }
}

fn interrupt(session: &mut ChatSession<VeraClient>, renderer: &mut dyn Renderer) {
    if session.cancel() {
        renderer.print_interrupted();
    }
}

async fn handle_line(
    session: &mut ChatSession<VeraClient>,
    renderer: &mut dyn Renderer,
    line: String,
) -> Flow {
    let Some(command) = parse_command(&line) else {
        if session.is_sending() && !line.trim().is_empty() {
            renderer.print_info("Vera is still answering; wait for the reply or /cancel.");
        } else {
            session.submit_text(line, renderer);
        }
        return Flow::Continue;
    };

    match command {
        ChatCommand::Quit => return Flow::Quit,
        ChatCommand::Help => {
            for line in help_text().lines() {
                println!("    {line}");
            }
        }
        ChatCommand::Upload(path) => {
            if let Err(err) = session.upload_path(&path, renderer).await {
                renderer.print_error(&format!("Cannot upload {path}: {err}"));
            }
        }
        ChatCommand::Save(path) => match session.save_transcript_to(&path) {
            Ok(()) => renderer.print_info(&format!("Transcript saved to {path}")),
            Err(err) => renderer.print_error(&format!("Failed to save transcript: {err}")),
        },
        ChatCommand::Health => match session.health().await {
            Ok(health) => renderer.print_info(&format!(
                "Backend {}: model {}, mode {}",
                health.status,
                health.model.as_deref().unwrap_or("unknown"),
                health.mode.as_deref().unwrap_or("unknown"),
            )),
            Err(err) => renderer.print_error(&format!("Health check failed: {err}")),
        },
        ChatCommand::Session => {
            renderer.print_info(&format!("Session {}", session.session_id()));
        }
        ChatCommand::Status => print_stats(session),
        ChatCommand::Cancel => {
            if session.cancel() {
                renderer.print_interrupted();
            } else {
                renderer.print_info("Nothing to cancel.");
            }
        }
        ChatCommand::Stream(on) => {
            session.set_streaming(on);
            if on {
                renderer.print_info("Streaming replies enabled.");
            } else {
                renderer.print_info("Streaming replies disabled.");
            }
        }
        ChatCommand::Invalid(message) => renderer.print_error(&message),
    }
    Flow::Continue
}

fn print_stats(session: &ChatSession<VeraClient>) {
    let stats = session.stats();
    println!("    Session Status:");
    println!("      Backend: {}", session.backend().base_url());
    println!("      Session: {}", stats.session_id);
    println!("      Messages: {}", stats.message_count);
    println!(
        "      Composer: {}",
        if session.is_sending() {
            "waiting for Vera"
        } else {
            "ready"
        }
    );
    match stats.upload_status {
        Some(ref status) => println!("      Upload: {status}"),
        None => println!("      Upload: (none)"),
    }
    println!("      Uploads in flight: {}", stats.uploads_in_flight);
    println!(
        "      Streaming: {}",
        if stats.streaming { "on" } else { "off" }
    );
    println!("      Timeout: {}s", stats.deadline.as_secs());
}
