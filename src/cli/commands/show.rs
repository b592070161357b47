use std::fs;
use std::path::PathBuf;

use clap::Args;
use serde_json::json;

use crate::cli::utils::{authed_client, ensure_access, print_json};
use crate::cli::OutputFormat;
use crate::signature::file_extension;
use crate::workflow::display::UpstreamEntry;
use crate::workflow::flow::{load_form, upstream};
use crate::workflow::{DecisionForm, FormRecord, Reviewer};

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[arg(value_enum, help = "Reviewer whose form to open")]
    pub reviewer: Reviewer,

    #[arg(help = "Requisition id, or approval id for department reviewers")]
    pub id: String,

    #[arg(long, help = "Write earlier departments' signature images into this directory")]
    pub export_signatures: Option<PathBuf>,
}

pub(crate) fn form_path(reviewer: Reviewer, id: &str) -> String {
    format!("{}/{}", reviewer.queue_path(), id)
}

pub(crate) fn record_json(record: Option<&FormRecord>) -> serde_json::Result<serde_json::Value> {
    match record {
        Some(FormRecord::Draft(draft)) => serde_json::to_value(draft),
        Some(FormRecord::Requisition(req)) => serde_json::to_value(req),
        Some(FormRecord::Approval { approval, .. }) => serde_json::to_value(approval),
        None => Ok(serde_json::Value::Null),
    }
}

fn print_entry(entry: &UpstreamEntry) {
    println!("{}", entry.department);
    if let Some(text) = &entry.signature_text {
        println!("  Signature: {}", text);
    } else if entry.has_preview() {
        println!("  Signature: [image]");
    } else if let Some(id) = &entry.signature_file_id {
        println!("  Signature: file {}", id);
    }
    if let Some(date) = &entry.date {
        println!("  Date: {}", date);
    }
    if let Some(comments) = &entry.comments {
        println!("  Comments: {}", comments);
    }
}

pub async fn handle(args: ShowArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let (session, api) = authed_client()?;
    ensure_access(&session, &form_path(args.reviewer, &args.id))?;

    let mut form = DecisionForm::open(args.reviewer, args.id.as_str());
    load_form(&api, &mut form).await?;
    let entries = upstream(&api, &form).await?;

    if let Some(dir) = &args.export_signatures {
        fs::create_dir_all(dir)?;
        for entry in &entries {
            if let (Some(image), Some(id)) = (&entry.preview, &entry.signature_file_id) {
                let department = entry.department.to_lowercase().replace(' ', "-");
                let path = dir.join(format!("{}-{}.{}", department, id, file_extension(image)));
                fs::write(&path, image)?;
                tracing::info!(path = %path.display(), "Wrote signature image");
            }
        }
    }

    let record = record_json(form.record())?;
    match output_format {
        OutputFormat::Json => print_json(&json!({
            "reviewer": args.reviewer.label(),
            "record": record,
            "upstream": entries,
        })),
        OutputFormat::Text => {
            println!("{} form for {}", args.reviewer, args.id);
            println!("{}", serde_json::to_string_pretty(&record)?);
            if !entries.is_empty() {
                println!();
                println!("Earlier sign-offs:");
                for entry in &entries {
                    print_entry(entry);
                }
            }
            Ok(())
        }
    }
}
