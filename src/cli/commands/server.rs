use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{load_server_config, ping_server, save_server_config, ServerConfig, ServerStatus};
use crate::cli::utils::{output_success, print_json};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Point the CLI at a gateway")]
    Set {
        #[arg(help = "Gateway URL, e.g. http://localhost:3000")]
        url: String,
    },

    #[command(about = "Show the configured gateway")]
    Show,

    #[command(about = "Health check the configured gateway")]
    Ping,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Set { url } => {
            url::Url::parse(url.trim()).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", url, e))?;
            let config = ServerConfig::new(url);
            save_server_config(&config)?;
            output_success(
                &output_format,
                &format!("Using gateway {}", config.url),
                Some(json!({ "url": config.url })),
            )
        }
        ServerCommands::Show => {
            let config = load_server_config()?;
            match output_format {
                OutputFormat::Json => print_json(&config),
                OutputFormat::Text => {
                    println!("URL: {}", config.url);
                    if let Some(last_ping) = config.last_ping {
                        println!("Last ping: {} ({:?})", last_ping.to_rfc3339(), config.status);
                    }
                    Ok(())
                }
            }
        }
        ServerCommands::Ping => {
            let mut config = load_server_config()?;
            let status = ping_server(&config).await;
            config.update_ping(status.clone());
            save_server_config(&config)?;
            match status {
                ServerStatus::Up => output_success(
                    &output_format,
                    &format!("{} is up", config.url),
                    Some(json!({ "url": config.url, "status": "up" })),
                ),
                _ => Err(anyhow::anyhow!("{} is not responding", config.url)),
            }
        }
    }
}
