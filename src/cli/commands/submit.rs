use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use chrono::Utc;
use clap::Args;
use serde_json::{json, Value};

use super::decide::{prepare, print_plan};
use crate::cli::utils::{authed_client, ensure_access, output_success};
use crate::cli::OutputFormat;
use crate::workflow::flow::submit;
use crate::workflow::model::NewRequisition;
use crate::workflow::{Decision, DecisionForm, FormRecord, Reviewer};

pub const NEW_REQUISITION_PATH: &str = "/requisition";

#[derive(Args, Debug)]
pub struct SubmitArgs {
    #[arg(value_enum, help = "Head of department verdict; approve raises it as SUBMITTED")]
    pub decision: Decision,

    #[arg(long, help = "JSON file with the requisition fields ('-' for stdin)")]
    pub file: Option<PathBuf>,

    #[arg(long = "field", value_name = "KEY=VALUE", help = "Set one field; repeatable")]
    pub fields: Vec<String>,

    #[arg(long, help = "Attach your stored signature")]
    pub sign: bool,

    #[arg(long, help = "Submit without asking; otherwise only the planned request is shown")]
    pub yes: bool,
}

fn read_fields(file: Option<&PathBuf>) -> anyhow::Result<NewRequisition> {
    let content = match file {
        None => return Ok(NewRequisition::default()),
        Some(path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(path) => fs::read_to_string(path).map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?,
    };
    let value: Value = serde_json::from_str(&content)?;
    NewRequisition::from_value(value).ok_or_else(|| anyhow::anyhow!("Requisition file must hold a JSON object"))
}

fn apply_field(draft: &mut NewRequisition, raw: &str) -> anyhow::Result<()> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow::anyhow!("Empty field name in '{}'", raw));
    }
    draft.set(key, value);
    Ok(())
}

pub async fn handle(args: SubmitArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let (session, api) = authed_client()?;
    ensure_access(&session, NEW_REQUISITION_PATH)?;

    let mut draft = read_fields(args.file.as_ref())?;
    for raw in &args.fields {
        apply_field(&mut draft, raw)?;
    }

    let mut form = DecisionForm::draft(Reviewer::HeadOfDepartment, FormRecord::Draft(draft));
    prepare(&api, &session, &mut form, args.decision, None, None, args.sign).await?;

    if !args.yes {
        let plan = form.preview(Utc::now())?;
        return print_plan(&output_format, &plan, false);
    }

    let plan = submit(&api, &mut form, Utc::now()).await?;
    output_success(
        &output_format,
        &format!("Requisition raised as {}", plan.status),
        Some(json!({ "status": plan.status, "navigateTo": plan.navigate_to })),
    )
}
