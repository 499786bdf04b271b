//! `meshprobe chat`: interactive messaging.
//!
//! Reads lines from stdin while printing incoming messages as they arrive.
//! Lines starting with `/` are commands; anything else is broadcast.

use std::process::ExitCode;

use meshprobe_core::events::RadioEvent;
use meshprobe_core::types::Destination;
use meshprobe_radio::Session;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::App;
use crate::commands::{print_device_info, print_nodes};
use crate::output;

/// One line of chat input.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatInput<'a> {
    Quit,
    Info,
    Nodes,
    Status,
    Help,
    Unknown(&'a str),
    Message(&'a str),
    Empty,
}

pub fn parse_input(line: &str) -> ChatInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatInput::Empty;
    }
    if !line.starts_with('/') {
        return ChatInput::Message(line);
    }
    match line.to_lowercase().as_str() {
        "/quit" | "/exit" | "/q" => ChatInput::Quit,
        "/info" => ChatInput::Info,
        "/nodes" => ChatInput::Nodes,
        "/status" => ChatInput::Status,
        "/help" => ChatInput::Help,
        _ => ChatInput::Unknown(line),
    }
}

pub async fn run(app: &App) -> anyhow::Result<ExitCode> {
    let mut session = app.connect().await?;
    let snapshot = session.snapshot();

    if let Some(me) = snapshot.my_info() {
        println!("Device: {} ({})", me.display_name(), me.id_string());
    }
    println!("Connected to mesh with {} nodes", snapshot.nodes.len());

    println!();
    println!("Interactive Chat Mode");
    println!("{}", "=".repeat(40));
    print_help();
    println!();
    println!("Start typing messages! They will be sent to all mesh nodes.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if !handle_input(&mut session, &line).await {
                    break;
                }
            }
            event = session.next_event() => match event {
                Some(RadioEvent::Text(msg)) => println!("{}", output::message_line(&msg)),
                Some(_) => {}
                None => break,
            },
        }
    }

    println!("Chat ended! {} message(s) sent.", session.sent_count());
    session.close().await?;
    Ok(ExitCode::SUCCESS)
}

/// Act on one input line. False when the user asked to leave.
async fn handle_input(session: &mut Session, line: &str) -> bool {
    match parse_input(line) {
        ChatInput::Quit => return false,
        ChatInput::Info => {
            let snapshot = session.snapshot();
            println!("Connected via: {}", session.via());
            print_device_info(&snapshot);
        }
        ChatInput::Nodes => print_nodes(&session.snapshot()),
        ChatInput::Status => {
            let snapshot = session.snapshot();
            println!("Device Status:");
            print_device_info(&snapshot);
            println!("Mesh nodes: {}", snapshot.nodes.len());
            println!("Messages sent: {}", session.sent_count());
        }
        ChatInput::Help => print_help(),
        ChatInput::Unknown(command) => println!("Unknown command {command}; type /help"),
        ChatInput::Message(text) => match session.send(text, Destination::Broadcast).await {
            Ok(count) => println!("Message #{count} sent!"),
            Err(e) => println!("Send failed: {e}"),
        },
        ChatInput::Empty => {}
    }
    true
}

fn print_help() {
    println!("Commands:");
    println!("  /info    - Show connected device");
    println!("  /nodes   - Show mesh nodes");
    println!("  /status  - Show device status");
    println!("  /help    - Show this help");
    println!("  /quit    - Exit");
    println!("  Anything else - Send as message to mesh");
}
