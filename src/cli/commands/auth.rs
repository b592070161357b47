use std::io::{self, BufRead, Write};

use clap::Subcommand;
use serde_json::{json, Map, Value};

use crate::cli::config::{clear_session, load_session, save_session};
use crate::cli::utils::{authed_client, client, output_success, print_json};
use crate::cli::OutputFormat;
use crate::client::RequisitionApi;
use crate::session::Session;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Sign in and store the session")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (falls back to REQS_PASSWORD, then stdin)")]
        password: Option<String>,
    },

    #[command(about = "Forget the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show the signed-in user's profile")]
    Whoami,

    #[command(about = "Update the signed-in user's profile")]
    Update {
        #[arg(long)]
        firstname: Option<String>,
        #[arg(long)]
        lastname: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn require_user_id(session: &Session) -> anyhow::Result<&str> {
    session
        .user_id
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("Session has no user id; log in again"))
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Login { email, password } => {
            let password = match password.or_else(|| std::env::var("REQS_PASSWORD").ok()) {
                Some(p) => p,
                None => read_password()?,
            };
            let api = client(None)?;
            let response = api.authenticate(&email, &password).await?;
            let mut session = Session::from_auth_response(&response)?;
            if session.email.is_none() {
                session.email = Some(email);
            }
            save_session(&session)?;
            tracing::debug!(roles = session.roles.len(), "Session stored");

            let roles: Vec<&str> = session.roles.iter().map(|r| r.as_str()).collect();
            output_success(
                &output_format,
                &format!(
                    "Logged in as {}",
                    session.email.as_deref().unwrap_or("unknown user")
                ),
                Some(json!({ "email": session.email, "roles": roles })),
            )
        }
        AuthCommands::Logout => {
            let removed = clear_session()?;
            let message = if removed { "Logged out" } else { "No session to clear" };
            output_success(&output_format, message, None)
        }
        AuthCommands::Status => {
            let session = load_session()?.filter(Session::is_authenticated);
            match (output_format, session) {
                (OutputFormat::Json, session) => print_json(&json!({
                    "authenticated": session.is_some(),
                    "email": session.as_ref().and_then(|s| s.email.clone()),
                    "roles": session.as_ref().map(|s| s.roles.clone()).unwrap_or_default(),
                })),
                (OutputFormat::Text, Some(session)) => {
                    println!("Logged in as {}", session.email.as_deref().unwrap_or("unknown user"));
                    let roles: Vec<&str> = session.roles.iter().map(|r| r.as_str()).collect();
                    if roles.is_empty() {
                        println!("Roles: (none reported)");
                    } else {
                        println!("Roles: {}", roles.join(", "));
                    }
                    Ok(())
                }
                (OutputFormat::Text, None) => {
                    println!("Not logged in");
                    Ok(())
                }
            }
        }
        AuthCommands::Whoami => {
            let (mut session, api) = authed_client()?;
            let user = api.user(require_user_id(&session)?).await?;
            session.apply_profile(&user);
            save_session(&session)?;
            match output_format {
                OutputFormat::Json => print_json(&user),
                OutputFormat::Text => {
                    if let Some(name) = session.profile.display_name() {
                        println!("Name: {}", name);
                    }
                    if let Some(email) = &session.email {
                        println!("Email: {}", email);
                    }
                    if let Some(phone) = &session.profile.phone {
                        println!("Phone: {}", phone);
                    }
                    if let Some(role) = &session.profile.role {
                        println!("Role: {}", role);
                    }
                    Ok(())
                }
            }
        }
        AuthCommands::Update {
            firstname,
            lastname,
            phone,
        } => {
            let mut body = Map::new();
            for (key, value) in [("firstname", firstname), ("lastname", lastname), ("phone", phone)] {
                if let Some(value) = value {
                    body.insert(key.to_string(), Value::String(value));
                }
            }
            if body.is_empty() {
                return Err(anyhow::anyhow!("Nothing to update; pass --firstname, --lastname or --phone"));
            }
            let (mut session, api) = authed_client()?;
            let body = Value::Object(body);
            api.update_user(require_user_id(&session)?, &body).await?;
            session.apply_profile(&body);
            save_session(&session)?;
            output_success(&output_format, "Profile updated", Some(json!({ "profile": session.profile })))
        }
    }
}
