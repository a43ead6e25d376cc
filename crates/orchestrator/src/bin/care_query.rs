//! Run one healthcare query through the pipeline and print the envelope as JSON.
//!
//! Usage:
//!   care-query "when should I take my metformin" --medication metformin
//!   echo "đau ngực dữ dội" | care-query
//!
//! Configuration via .env file or environment variables:
//!   OPENAI_API_KEY             - API key for the backend (required)
//!   CARE_SESSION_ID            - Session id (default: cli)
//!   CARE_CLASSIFY_WITH_BACKEND - Backend-assisted classification (default: true)
//!   LOG_FORMAT                 - json or pretty (default: pretty)

use std::env;

use clap::Parser;
use orchestrator::{Orchestrator, OrchestratorError, Query, QueryContext};
use tokio::io::AsyncReadExt;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "care-query")]
#[command(about = "Route a healthcare query through redaction, triage and a specialist handler")]
struct Args {
    /// Query text. Read from stdin when omitted.
    text: Vec<String>,

    /// Session id
    #[arg(long, env = "CARE_SESSION_ID", default_value = "cli")]
    session: String,

    /// Patient age in years
    #[arg(long)]
    age: Option<u32>,

    /// Current medication (repeatable)
    #[arg(long = "medication")]
    medications: Vec<String>,

    /// Known condition (repeatable)
    #[arg(long = "condition")]
    conditions: Vec<String>,

    /// Language preference (en, vi, mixed)
    #[arg(long)]
    language: Option<String>,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    init_tracing();
    let args = Args::parse();

    let text = if args.text.is_empty() {
        let mut buf = String::new();
        tokio::io::stdin().read_to_string(&mut buf).await?;
        buf.trim().to_string()
    } else {
        args.text.join(" ")
    };
    if text.is_empty() {
        return Err("no query text given".into());
    }

    let mut context = QueryContext::default();
    if let Some(age) = args.age {
        context = context.with_age(age);
    }
    for medication in &args.medications {
        context = context.with_medication(medication);
    }
    for condition in &args.conditions {
        context = context.with_condition(condition);
    }
    if let Some(language) = &args.language {
        context = context.with_language_preference(language);
    }

    let orchestrator = Orchestrator::from_env()?;
    let query = Query::new(args.session, text).with_context(context);

    let (envelope, failure) = match orchestrator.process(query).await {
        Ok(envelope) => (envelope, None),
        Err(OrchestratorError::AuditWriteFailure { source, envelope }) => {
            error!(error = %source, "AUDIT_WRITE_FAILED");
            (*envelope, Some(source))
        }
        Err(e) => return Err(e.into()),
    };

    let json = if args.compact {
        serde_json::to_string(&envelope)?
    } else {
        serde_json::to_string_pretty(&envelope)?
    };
    println!("{json}");

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}
