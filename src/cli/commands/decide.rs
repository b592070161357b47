use chrono::Utc;
use clap::Args;
use serde_json::json;

use super::show::form_path;
use crate::cli::utils::{authed_client, ensure_access, output_success, print_json};
use crate::cli::OutputFormat;
use crate::client::RequisitionApi;
use crate::session::Session;
use crate::workflow::flow::{load_form, sign, submit};
use crate::workflow::{ApprovalHeader, Decision, DecisionForm, Reviewer, SubmissionPlan};

#[derive(Args, Debug)]
pub struct DecideArgs {
    #[arg(value_enum, help = "Reviewer recording the decision")]
    pub reviewer: Reviewer,

    #[arg(help = "Requisition id, or approval id for department reviewers")]
    pub id: String,

    #[arg(value_enum)]
    pub decision: Decision,

    #[arg(long, help = "Comment stored with the decision")]
    pub comment: Option<String>,

    #[arg(long, help = "Attach your stored signature")]
    pub sign: bool,

    #[arg(long, help = "Approval addressee (legal only)")]
    pub to: Option<String>,

    #[arg(long, help = "Approval reference (legal only)")]
    pub reference: Option<String>,

    #[arg(long, help = "Approval subject (legal only)")]
    pub subject: Option<String>,

    #[arg(long, help = "Submit without asking; otherwise only the planned requests are shown")]
    pub yes: bool,
}

/// Fill a loaded form from the command line and move it to `Confirming`
pub(crate) async fn prepare(
    api: &dyn RequisitionApi,
    session: &Session,
    form: &mut DecisionForm,
    decision: Decision,
    comment: Option<String>,
    header: Option<ApprovalHeader>,
    with_signature: bool,
) -> anyhow::Result<()> {
    form.set_decision(decision)?;
    if let Some(comment) = comment {
        form.set_comments(comment)?;
    }
    if let Some(header) = header {
        form.set_header(header)?;
    }
    if with_signature {
        let signed = sign(api, form, session.email.as_deref()).await?;
        tracing::info!(path = %signed.path, "Signature attached");
    }
    form.confirm()?;
    Ok(())
}

pub(crate) fn print_plan(output_format: &OutputFormat, plan: &SubmissionPlan, submitted: bool) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => print_json(&json!({
            "submitted": submitted,
            "status": plan.status,
            "navigateTo": plan.navigate_to,
            "requests": plan.mutations,
        })),
        OutputFormat::Text => {
            for mutation in &plan.mutations {
                println!("{} {}", mutation.method, mutation.path);
                println!("{}", serde_json::to_string_pretty(&mutation.body)?);
            }
            if !submitted {
                println!("Re-run with --yes to submit as {}", plan.status);
            }
            Ok(())
        }
    }
}

pub async fn handle(args: DecideArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let (session, api) = authed_client()?;
    ensure_access(&session, &form_path(args.reviewer, &args.id))?;

    let mut form = DecisionForm::open(args.reviewer, args.id.as_str());
    load_form(&api, &mut form).await?;

    let header = if args.to.is_some() || args.reference.is_some() || args.subject.is_some() {
        Some(ApprovalHeader {
            to: args.to,
            reference: args.reference,
            subject: args.subject,
        })
    } else {
        None
    };
    prepare(&api, &session, &mut form, args.decision, args.comment, header, args.sign).await?;

    if !args.yes {
        let plan = form.preview(Utc::now())?;
        return print_plan(&output_format, &plan, false);
    }

    let plan = submit(&api, &mut form, Utc::now()).await?;
    match output_format {
        OutputFormat::Json => print_plan(&output_format, &plan, true),
        OutputFormat::Text => output_success(
            &output_format,
            &format!(
                "{} Back to {}",
                form.message().unwrap_or("Decision submitted."),
                plan.navigate_to
            ),
            Some(json!({ "status": plan.status })),
        ),
    }
}
