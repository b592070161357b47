use std::path::PathBuf;

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{authed_client, output_success, read_upload, write_output};
use crate::cli::OutputFormat;
use crate::client::RequisitionApi;
use crate::session::Session;
use crate::signature::{file_extension, normalize_or_original, signature_file_id};

#[derive(Subcommand)]
pub enum SignatureCommands {
    #[command(about = "Fetch a stored signature, whitened, as PNG")]
    Show {
        #[arg(long, help = "Whose signature (defaults to the signed-in user)")]
        email: Option<String>,
        #[arg(long, short, help = "Output file (defaults to signature-<id>.<ext>)")]
        output: Option<PathBuf>,
        #[arg(long, help = "Save the image exactly as stored")]
        raw: bool,
    },

    #[command(about = "Store a signature image for the first time")]
    Upload {
        file: PathBuf,
        #[arg(long)]
        email: Option<String>,
    },

    #[command(about = "Replace a stored signature image")]
    Update {
        file: PathBuf,
        #[arg(long)]
        email: Option<String>,
    },

    #[command(about = "Delete a stored signature by id")]
    Delete { id: String },
}

fn resolve_email(explicit: Option<String>, session: &Session) -> anyhow::Result<String> {
    explicit
        .or_else(|| session.email.clone())
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Missing user email"))
}

pub async fn handle(cmd: SignatureCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let (session, api) = authed_client()?;

    match cmd {
        SignatureCommands::Show { email, output, raw } => {
            let email = resolve_email(email, &session)?;
            let path = api.signature_path(&email).await?;
            let path = path.trim().trim_matches('"');
            if path.is_empty() {
                return Err(anyhow::anyhow!("Signature path not found"));
            }
            let id = signature_file_id(path).ok_or_else(|| anyhow::anyhow!("Invalid signature path"))?;
            let image = api.signature_file(id).await?;
            let bytes = if raw { image.to_vec() } else { normalize_or_original(&image).into_owned() };
            let written = write_output(output, &format!("signature-{}.{}", id, file_extension(&bytes)), &bytes)?;
            output_success(
                &output_format,
                &format!("Saved signature for {} to {}", email, written.display()),
                Some(json!({ "path": path, "fileId": id, "output": written })),
            )
        }
        SignatureCommands::Upload { file, email } => {
            let email = resolve_email(email, &session)?;
            api.upload_signature(&email, read_upload(&file)?).await?;
            output_success(&output_format, &format!("Signature stored for {}", email), None)
        }
        SignatureCommands::Update { file, email } => {
            let email = resolve_email(email, &session)?;
            api.update_signature(&email, read_upload(&file)?).await?;
            output_success(&output_format, &format!("Signature updated for {}", email), None)
        }
        SignatureCommands::Delete { id } => {
            api.delete_signature(&id).await?;
            output_success(&output_format, &format!("Signature {} deleted", id), None)
        }
    }
}
