pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "reqs")]
#[command(about = "Requisition workflow CLI - queues, decisions and attachments through the gateway")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Gateway server selection")]
    Server {
        #[command(subcommand)]
        cmd: commands::server::ServerCommands,
    },

    #[command(about = "Sign in, sign out and profile")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "List the items waiting on a reviewer")]
    Queue(commands::queue::QueueArgs),

    #[command(about = "Show a record with earlier sign-offs")]
    Show(commands::show::ShowArgs),

    #[command(about = "Approve or reject a requisition or approval")]
    Decide(commands::decide::DecideArgs),

    #[command(about = "Raise a new requisition as head of department")]
    Submit(commands::submit::SubmitArgs),

    #[command(about = "Requisition attachments")]
    Attachments {
        #[command(subcommand)]
        cmd: commands::attachments::AttachmentCommands,
    },

    #[command(about = "Stored signature images")]
    Signature {
        #[command(subcommand)]
        cmd: commands::signature::SignatureCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Server { cmd } => commands::server::handle(cmd, output_format).await,
        Commands::Auth { cmd } => commands::auth::handle(cmd, output_format).await,
        Commands::Queue(args) => commands::queue::handle(args, output_format).await,
        Commands::Show(args) => commands::show::handle(args, output_format).await,
        Commands::Decide(args) => commands::decide::handle(args, output_format).await,
        Commands::Submit(args) => commands::submit::handle(args, output_format).await,
        Commands::Attachments { cmd } => commands::attachments::handle(cmd, output_format).await,
        Commands::Signature { cmd } => commands::signature::handle(cmd, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_decide() {
        let cli = Cli::try_parse_from([
            "reqs", "--json", "decide", "technical", "42", "reject", "--comment", "Spec mismatch", "--yes",
        ])
        .unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        match cli.command {
            Commands::Decide(args) => {
                assert_eq!(args.id, "42");
                assert_eq!(args.comment.as_deref(), Some("Spec mismatch"));
                assert!(args.yes);
            }
            _ => panic!("expected decide"),
        }
    }
}
