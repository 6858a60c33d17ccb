//! Conversation history command handlers

use crate::cli::HistoryCommand;
use crate::commands::open_storage;
use crate::config::Config;
use crate::error::Result;
use crate::models::Role;
use crate::storage::ConversationStore;
use colored::Colorize;
use prettytable::{format, Table};
use std::io::Write as _;

/// Handle history commands
pub fn handle_history(config: &Config, command: HistoryCommand) -> Result<()> {
    let storage = open_storage(&config.storage)?;

    match command {
        HistoryCommand::List => {
            let conversations = storage.list_conversations()?;

            if conversations.is_empty() {
                println!("{}", "No conversation history found.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "ID".bold(),
                "Title".bold(),
                "Messages".bold(),
                "Last Updated".bold()
            ]);

            for conversation in conversations {
                let id_short = &conversation.id[..8.min(conversation.id.len())];
                let title = if conversation.title.chars().count() > 40 {
                    let head: String = conversation.title.chars().take(37).collect();
                    format!("{}...", head)
                } else {
                    conversation.title.clone()
                };
                let message_count = storage.load_messages(&conversation.id)?.len();
                let updated = conversation.updated_at.format("%Y-%m-%d %H:%M").to_string();

                table.add_row(prettytable::row![
                    id_short.cyan(),
                    title,
                    message_count,
                    updated
                ]);
            }

            println!("\nConversation History:");
            table.printstd();
            println!();
            println!(
                "Use {} to resume a conversation.",
                "regchat chat --resume <ID>".cyan()
            );
            println!();
        }
        HistoryCommand::Show { id } => {
            let messages = storage.load_messages(&id)?;

            if messages.is_empty() {
                println!("{}", format!("No messages found for conversation {}", id).yellow());
                return Ok(());
            }

            println!();
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
        HistoryCommand::Delete { id } => {
            storage.delete_conversation(&id)?;
            println!("{}", format!("Deleted conversation {}", id).green());
        }
        HistoryCommand::Clear { yes } => {
            if !yes && !confirm_clear()? {
                println!("Aborted.");
                return Ok(());
            }
            storage.delete_all()?;
            println!("{}", "Cleared all conversation history.".green());
        }
    }

    Ok(())
}

/// Prompt for confirmation before wiping the history database
fn confirm_clear() -> Result<bool> {
    print!("Delete all conversation history? [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;

    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
