//! Command-line interface definition for regchat
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat and history management.

use clap::{Parser, Subcommand};

/// regchat - Streaming regulatory-intelligence chat CLI
///
/// Chat with a regulatory-intelligence completion endpoint and keep the
/// conversation history in a local database.
#[derive(Parser, Debug, Clone)]
#[command(name = "regchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the history database path
    #[arg(long, env = "REGCHAT_HISTORY_DB")]
    pub storage_path: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for regchat
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Resume an existing conversation by id
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// Manage conversation history
    History {
        /// History subcommand
        #[command(subcommand)]
        command: HistoryCommand,
    },
}

/// History management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    /// List stored conversations, most recently updated first
    List,

    /// Print a conversation's transcript
    Show {
        /// Conversation id
        id: String,
    },

    /// Delete a conversation and its messages
    Delete {
        /// Conversation id
        id: String,
    },

    /// Delete all conversations
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_command_parses() {
        let cli = Cli::try_parse_from(["regchat", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat { resume: None }));
        assert_eq!(cli.config, "config/config.yaml");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_chat_resume_flag() {
        let cli = Cli::try_parse_from(["regchat", "chat", "--resume", "abc123"]).unwrap();
        match cli.command {
            Commands::Chat { resume } => assert_eq!(resume.as_deref(), Some("abc123")),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_history_list_parses() {
        let cli = Cli::try_parse_from(["regchat", "history", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::History {
                command: HistoryCommand::List
            }
        ));
    }

    #[test]
    fn test_history_show_requires_id() {
        assert!(Cli::try_parse_from(["regchat", "history", "show"]).is_err());
        let cli = Cli::try_parse_from(["regchat", "history", "show", "abc"]).unwrap();
        match cli.command {
            Commands::History {
                command: HistoryCommand::Show { id },
            } => assert_eq!(id, "abc"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_history_clear_yes_flag() {
        let cli = Cli::try_parse_from(["regchat", "history", "clear", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::History {
                command: HistoryCommand::Clear { yes: true }
            }
        ));
    }

    #[test]
    fn test_config_and_verbose_flags() {
        let cli =
            Cli::try_parse_from(["regchat", "--config", "custom.yaml", "--verbose", "chat"])
                .unwrap();
        assert_eq!(cli.config, "custom.yaml");
        assert!(cli.verbose);
    }
}
