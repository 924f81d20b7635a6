//! Command handlers. Results go to stdout as JSON; logs go to stderr.

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};

use artdesk_application::{Engine, RegistrationOutcome, ResourceStore};
use artdesk_domain::{Attachment, LoginCredentials, RegistrationCredentials, ResourceRecord};
use artdesk_infrastructure::{TokioFileSystem, load_attachment};

use crate::{Commands, RecordAction};

pub async fn run(engine: &Engine, command: Commands) -> Result<()> {
    let sessions = engine.sessions();
    match command {
        Commands::Login { email, password } => {
            let user = sessions
                .login(&LoginCredentials::new(email, password))
                .await?;
            print_json(&json!({ "signedIn": user }))
        }
        Commands::Register {
            email,
            password,
            confirm,
            name,
        } => {
            let mut credentials = RegistrationCredentials::new(email, password);
            if let Some(confirm) = confirm {
                credentials = credentials.with_confirmation(confirm);
            }
            if let Some(name) = name {
                credentials = credentials.with_display_name(name);
            }
            let outcome = sessions.register(&credentials).await?;
            print_json(&registration_report(&outcome))
        }
        Commands::Logout => {
            engine.logout().await?;
            print_json(&json!({ "signedOut": true }))
        }
        Commands::Whoami => {
            let session = engine.session();
            print_json(&json!({
                "phase": session.phase(),
                "user": session.user(),
                "credential": session.credential().map(|token| token.preview()),
            }))
        }
        Commands::ResetPassword { email } => {
            sessions.reset_password(&email).await?;
            print_json(&json!({ "resetRequested": email }))
        }
        Commands::ConfirmReset {
            email,
            code,
            new_password,
        } => {
            sessions
                .confirm_password_reset(&email, &code, &new_password)
                .await?;
            print_json(&json!({ "passwordReset": email }))
        }
        Commands::VerifyEmail { email, code } => {
            sessions.verify_email(&email, &code).await?;
            print_json(&json!({ "verified": email }))
        }
        Commands::VerifyOtp { email, code } => {
            sessions.verify_otp(&email, &code).await?;
            print_json(&json!({ "verified": email }))
        }
        Commands::Artworks { action } => run_records(engine.artworks(), action).await,
        Commands::Contacts { action } => run_records(engine.contacts(), action).await,
        Commands::Dashboard => {
            let snapshot = engine.analytics().fetch_dashboard().await?;
            print_json(&snapshot)
        }
    }
}

async fn run_records(store: &ResourceStore, action: RecordAction) -> Result<()> {
    match action {
        RecordAction::List => {
            store.fetch_all().await?;
            let records: Vec<Value> = store.records().iter().map(ResourceRecord::to_value).collect();
            print_json(&records)
        }
        RecordAction::Show { id } => {
            let record = store.fetch_one(&id).await?;
            print_json(&record.to_value())
        }
        RecordAction::Create { data, attachment } => {
            let attachment = read_attachment(attachment.as_deref()).await?;
            let record = store.create(parse_object(&data)?, attachment).await?;
            print_json(&record.to_value())
        }
        RecordAction::SetStatus { id, status } => {
            store.update_status(&id, &status).await?;
            print_json(&json!({ "id": id, "status": status }))
        }
        RecordAction::Update {
            id,
            data,
            attachment,
        } => {
            let attachment = read_attachment(attachment.as_deref()).await?;
            store.update(&id, parse_object(&data)?, attachment).await?;
            match store.find(&id) {
                Some(record) => print_json(&record.to_value()),
                None => print_json(&json!({ "updated": id })),
            }
        }
        RecordAction::Delete { id } => {
            store.remove(&id).await?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

fn registration_report(outcome: &RegistrationOutcome) -> Value {
    match outcome {
        RegistrationOutcome::SignedIn(user) => json!({ "registered": true, "signedIn": user }),
        RegistrationOutcome::Created { user } => {
            json!({ "registered": true, "account": user, "signedIn": null })
        }
    }
}

fn parse_object(data: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(data).context("--data must be JSON")?;
    if !value.is_object() {
        bail!("--data must be a JSON object");
    }
    Ok(value)
}

async fn read_attachment(path: Option<&Path>) -> Result<Option<Attachment>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let cwd = std::env::current_dir().context("no working directory")?;
    Ok(Some(
        load_attachment(&TokioFileSystem::new(), path, Some(&cwd)).await?,
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
