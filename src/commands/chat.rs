//! Interactive streaming chat handler
//!
//! Runs a readline-based loop that submits user input to the chat
//! session and prints assistant deltas as they arrive from the stream.
//! Slash commands manage conversations without leaving the loop.

use crate::chat::{ChatSession, TranscriptUpdate};
use crate::commands::open_storage;
use crate::config::Config;
use crate::error::Result;
use crate::api::CompletionClient;
use crate::models::{Attachment, Message, Role};
use anyhow::Context;
use base64::Engine as _;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Start interactive chat mode
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `resume` - Optional conversation id to resume
///
/// # Examples
///
/// ```
/// use regchat::commands::chat;
/// use regchat::config::Config;
///
/// // In application code:
/// // chat::run_chat(Config::default(), None).await?;
/// ```
pub async fn run_chat(config: Config, resume: Option<String>) -> Result<()> {
    let storage = Arc::new(open_storage(&config.storage)?);
    let client = CompletionClient::from_config(&config.api)?;
    let mut session = ChatSession::new(storage, client);

    // Stream output printer. The session emits deltas as they are
    // decoded; printing from a separate task keeps the handler loop
    // free of rendering concerns.
    let mut updates = session.subscribe_updates();
    tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            match update {
                TranscriptUpdate::AssistantDelta(delta) => {
                    print!("{}", delta);
                    let _ = std::io::stdout().flush();
                }
                TranscriptUpdate::StreamFinished => println!(),
            }
        }
    });

    if let Some(id) = &resume {
        session.load_conversation(id)?;
        println!(
            "Resumed conversation {} ({} messages)\n",
            id.cyan(),
            session.transcript().len()
        );
        print_transcript(session.transcript());
    }

    print_welcome_banner();

    let mut rl = DefaultEditor::new()?;
    let mut pending_attachments: Vec<Attachment> = Vec::new();

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() && pending_attachments.is_empty() {
                    continue;
                }

                rl.add_history_entry(trimmed)?;

                if let Some(command) = trimmed.strip_prefix('/') {
                    if handle_slash_command(&mut session, &mut pending_attachments, command)? {
                        break;
                    }
                    continue;
                }

                print!("{} ", "assistant>".green().bold());
                let _ = std::io::stdout().flush();

                let attachments = std::mem::take(&mut pending_attachments);
                if let Err(e) = session.send_message(trimmed, attachments).await {
                    println!();
                    eprintln!("{} {}", "Error:".red().bold(), e);
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(e) => {
                return Err(e).context("Failed to read input");
            }
        }
    }

    Ok(())
}

/// Dispatch a slash command
///
/// Returns `Ok(true)` when the chat loop should exit.
fn handle_slash_command(
    session: &mut ChatSession,
    pending_attachments: &mut Vec<Attachment>,
    command: &str,
) -> Result<bool> {
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "quit" | "exit" => return Ok(true),
        "help" => print_help(),
        "new" => {
            session.start_new_chat();
            pending_attachments.clear();
            println!("Started a new conversation.\n");
        }
        "history" => {
            session.fetch_conversations()?;
            if session.conversations().is_empty() {
                println!("{}\n", "No conversation history found.".yellow());
            } else {
                for conversation in session.conversations() {
                    println!(
                        "  {}  {}",
                        short_id(&conversation.id).cyan(),
                        conversation.title
                    );
                }
                println!();
            }
        }
        "load" => {
            if arg.is_empty() {
                println!("Usage: /load <conversation-id>\n");
            } else {
                match session.load_conversation(arg) {
                    Ok(()) => print_transcript(session.transcript()),
                    Err(e) => eprintln!("{} {}\n", "Error:".red().bold(), e),
                }
            }
        }
        "delete" => {
            if arg.is_empty() {
                println!("Usage: /delete <conversation-id>\n");
            } else {
                session.delete_conversation(arg)?;
                println!("Deleted conversation {}\n", arg.cyan());
            }
        }
        "clear" => {
            session.clear_all_history()?;
            println!("Cleared all conversation history.\n");
        }
        "attach" => {
            if arg.is_empty() {
                println!("Usage: /attach <path>\n");
            } else {
                match attachment_from_path(Path::new(arg)) {
                    Ok(attachment) => {
                        println!("Attached {} to the next message.\n", attachment.name.cyan());
                        pending_attachments.push(attachment);
                    }
                    Err(e) => eprintln!("{} {}\n", "Error:".red().bold(), e),
                }
            }
        }
        other => {
            println!("Unknown command: /{}. Type /help for commands.\n", other);
        }
    }

    Ok(false)
}

/// Build an attachment from a local file as a base64 data URI
fn attachment_from_path(path: &Path) -> Result<Attachment> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read attachment: {}", path.display()))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let media_type = media_type_for(path);
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    let url = format!("data:{};base64,{}", media_type, encoded);

    if media_type.starts_with("image/") {
        Ok(Attachment::image(name, url))
    } else {
        Ok(Attachment::file(name, url))
    }
}

/// Guess a media type from the file extension
fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "csv" => "text/csv",
        "md" | "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Print a stored transcript when resuming or loading a conversation
fn print_transcript(messages: &[Message]) {
    for message in messages {
        let label = match message.role {
            Role::User => "you>".blue().bold(),
            Role::Assistant => "assistant>".green().bold(),
        };
        println!("{} {}", label, message.content);
        for attachment in &message.attachments {
            println!("  [attachment: {}]", attachment.name);
        }
    }
    println!();
}

fn print_welcome_banner() {
    println!();
    println!("{}", "regchat - regulatory intelligence chat".bold());
    println!("Type a message to chat, or {} for commands.", "/help".cyan());
    println!();
}

fn print_help() {
    println!();
    println!("Commands:");
    println!("  {}              Start a new conversation", "/new".cyan());
    println!("  {}          List stored conversations", "/history".cyan());
    println!("  {}        Load a conversation", "/load <id>".cyan());
    println!("  {}      Delete a conversation", "/delete <id>".cyan());
    println!("  {}            Delete all conversations", "/clear".cyan());
    println!("  {}     Attach a file to the next message", "/attach <path>".cyan());
    println!("  {}             Exit the chat", "/quit".cyan());
    println!();
}

/// Shorten a conversation id for display
fn short_id(id: &str) -> &str {
    if id.len() >= 8 {
        &id[..8]
    } else {
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttachmentKind;
    use std::io::Write;

    #[test]
    fn test_media_type_for_known_extensions() {
        assert_eq!(media_type_for(Path::new("scan.png")), "image/png");
        assert_eq!(media_type_for(Path::new("photo.JPG")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("label.pdf")), "application/pdf");
        assert_eq!(media_type_for(Path::new("notes.md")), "text/plain");
    }

    #[test]
    fn test_media_type_for_unknown_extension() {
        assert_eq!(
            media_type_for(Path::new("data.xyz")),
            "application/octet-stream"
        );
        assert_eq!(media_type_for(Path::new("no_extension")), "application/octet-stream");
    }

    #[test]
    fn test_attachment_from_path_builds_data_uri() {
        let mut file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .unwrap();
        file.write_all(b"fake image bytes").unwrap();

        let attachment = attachment_from_path(file.path()).unwrap();
        assert_eq!(attachment.kind, AttachmentKind::Image);
        assert!(attachment.url.starts_with("data:image/png;base64,"));
        assert!(attachment.name.ends_with(".png"));
    }

    #[test]
    fn test_attachment_from_path_missing_file() {
        let result = attachment_from_path(Path::new("/nonexistent/file.txt"));
        assert!(result.is_err());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }
}
