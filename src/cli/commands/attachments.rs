use std::path::PathBuf;

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{authed_client, output_empty_collection, output_success, print_json, print_table, read_upload, write_output};
use crate::cli::OutputFormat;
use crate::client::RequisitionApi;
use crate::workflow::attachments::DEFAULT_PAGE_SIZE;
use crate::workflow::AttachmentBrowser;

#[derive(Subcommand)]
pub enum AttachmentCommands {
    #[command(about = "List one page of a requisition's attachments")]
    List {
        requisition_id: String,
        #[arg(long, default_value_t = 1, help = "Page number, starting at 1")]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: u32,
    },

    #[command(about = "Upload one or more files to a requisition")]
    Upload {
        requisition_id: String,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    #[command(about = "Rename an attachment")]
    Rename {
        requisition_id: String,
        attachment_id: String,
        name: String,
        #[arg(long, default_value_t = 1, help = "Page the attachment is listed on")]
        page: u32,
    },

    #[command(about = "Delete an attachment")]
    Delete {
        requisition_id: String,
        attachment_id: String,
        #[arg(long, default_value_t = 1, help = "Page to show afterwards")]
        page: u32,
    },

    #[command(about = "Download an attachment")]
    Download {
        attachment_id: String,
        #[arg(long, short, help = "Output file (defaults to the attachment's name)")]
        output: Option<PathBuf>,
    },
}

fn print_page(output_format: &OutputFormat, browser: &AttachmentBrowser) -> anyhow::Result<()> {
    if browser.rows().is_empty() {
        return output_empty_collection(
            output_format,
            "content",
            &format!("No attachments for requisition {}", browser.requisition_id()),
        );
    }
    match output_format {
        OutputFormat::Json => print_json(&json!({
            "requisitionId": browser.requisition_id(),
            "page": browser.page(),
            "size": browser.size(),
            "totalPages": browser.total_pages(),
            "content": browser.rows(),
        })),
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = browser
                .rows()
                .iter()
                .map(|a| {
                    vec![
                        a.id.to_string(),
                        a.file_name.clone(),
                        a.content_type.clone().unwrap_or_default(),
                        a.size.map(|s| s.to_string()).unwrap_or_default(),
                        a.updated_by.clone().or_else(|| a.created_by.clone()).unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(&["ID", "NAME", "TYPE", "SIZE", "BY"], &rows);
            println!("Page {} of {}", browser.page(), browser.total_pages());
            Ok(())
        }
    }
}

pub async fn handle(cmd: AttachmentCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let (_session, api) = authed_client()?;

    match cmd {
        AttachmentCommands::List {
            requisition_id,
            page,
            size,
        } => {
            let mut browser = AttachmentBrowser::new(requisition_id.as_str()).with_size(size);
            browser.load(&api, page).await?;
            print_page(&output_format, &browser)
        }
        AttachmentCommands::Upload { requisition_id, files } => {
            let uploads = files.iter().map(|p| read_upload(p)).collect::<anyhow::Result<Vec<_>>>()?;
            let count = uploads.len();
            let mut browser = AttachmentBrowser::new(requisition_id.as_str());
            browser.upload(&api, uploads).await?;
            output_success(
                &output_format,
                &format!("Uploaded {} file(s) to requisition {}", count, requisition_id),
                Some(json!({ "uploaded": count })),
            )
        }
        AttachmentCommands::Rename {
            requisition_id,
            attachment_id,
            name,
            page,
        } => {
            let mut browser = AttachmentBrowser::new(requisition_id.as_str());
            browser.load(&api, page).await?;
            if browser.rename(&api, &attachment_id, &name).await? {
                output_success(&output_format, &format!("Renamed attachment {} to {}", attachment_id, name.trim()), None)
            } else {
                output_success(&output_format, "Name unchanged; nothing sent", None)
            }
        }
        AttachmentCommands::Delete {
            requisition_id,
            attachment_id,
            page,
        } => {
            let mut browser = AttachmentBrowser::new(requisition_id.as_str());
            browser.load(&api, page).await?;
            browser.delete(&api, &attachment_id).await?;
            if let OutputFormat::Text = output_format {
                println!("✓ Deleted attachment {}", attachment_id);
            }
            print_page(&output_format, &browser)
        }
        AttachmentCommands::Download { attachment_id, output } => {
            let download = api.download_attachment(&attachment_id).await?;
            let fallback = download
                .file_name
                .clone()
                .unwrap_or_else(|| format!("attachment-{}", attachment_id));
            let path = write_output(output, &fallback, &download.bytes)?;
            output_success(
                &output_format,
                &format!("Saved {} ({} bytes)", path.display(), download.bytes.len()),
                Some(json!({ "path": path, "contentType": download.content_type })),
            )
        }
    }
}
