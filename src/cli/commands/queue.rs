use clap::Args;
use serde_json::{json, Value};

use crate::cli::utils::{authed_client, ensure_access, output_empty_collection, print_json, print_table};
use crate::cli::OutputFormat;
use crate::workflow::display::format_display_date;
use crate::workflow::flow::{load_queue, QueueRow};
use crate::workflow::queue::{paginate, SortKey, SortOrder};
use crate::workflow::Reviewer;

#[derive(Args, Debug)]
pub struct QueueArgs {
    #[arg(value_enum, help = "Whose queue to list")]
    pub reviewer: Reviewer,

    #[arg(long, default_value_t = 1, help = "Page number, starting at 1")]
    pub page: usize,

    #[arg(long, default_value_t = 10, help = "Rows per page")]
    pub size: usize,

    #[arg(long, value_enum, default_value_t = SortKey::CreatedAt)]
    pub sort: SortKey,

    #[arg(long, value_enum, default_value_t = SortOrder::Desc)]
    pub order: SortOrder,
}

fn created_text(row: &QueueRow) -> String {
    match &row.created_at {
        Some(Value::String(s)) => format_display_date(s),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

pub async fn handle(args: QueueArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let (session, api) = authed_client()?;
    ensure_access(&session, args.reviewer.queue_path())?;

    let rows = load_queue(&api, args.reviewer, args.sort, args.order).await?;
    if rows.is_empty() {
        return output_empty_collection(
            &output_format,
            "items",
            &format!("Nothing waiting for {} ({})", args.reviewer, args.reviewer.waiting_status()),
        );
    }

    let page = paginate(&rows, args.page, args.size);
    match output_format {
        OutputFormat::Json => print_json(&json!({
            "reviewer": args.reviewer.label(),
            "status": args.reviewer.waiting_status(),
            "page": page.page,
            "size": page.size,
            "totalPages": page.total_pages,
            "totalItems": page.total_items,
            "items": page.items,
        })),
        OutputFormat::Text => {
            let table: Vec<Vec<String>> = page
                .items
                .iter()
                .map(|row| {
                    vec![
                        row.id.to_string(),
                        row.requisition_id.as_ref().map(ToString::to_string).unwrap_or_default(),
                        row.status.clone().unwrap_or_default(),
                        created_text(row),
                        row.summary.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(&["ID", "REQUISITION", "STATUS", "CREATED", "SUMMARY"], &table);
            println!(
                "Page {} of {} ({} items)",
                page.page, page.total_pages, page.total_items
            );
            Ok(())
        }
    }
}
