//! TeachShare CLI: operator commands against the configured database and
//! document store.
//!
//! Reads configuration from the environment (and `.env`); see `Config::from_env`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use teachshare_cli::{init_tracing, log_error, read_upload, DocumentView, ErrorResponse};
use teachshare_core::models::{ModerationState, VisibilityScope};
use teachshare_core::validation::parse_document_id;
use teachshare_core::{AppError, Config};
use teachshare_db::setup_database;
use teachshare_services::build_from_config;

#[derive(Parser)]
#[command(name = "teachshare", about = "TeachShare document sharing CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Upload a document; text files are converted to PDF
    Ingest {
        /// Path to the file to upload
        file: std::path::PathBuf,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        grade: String,
        /// Content type to assume if it cannot be detected
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Approve or deny a document
    Review {
        /// Document UUID
        id: String,
        #[arg(long)]
        reviewer: String,
        /// approved or denied
        #[arg(long)]
        decision: String,
        #[arg(long, default_value = "")]
        comments: String,
    },
    /// Add a rating to a document
    Rate {
        /// Document UUID
        id: String,
        #[arg(allow_negative_numbers = true)]
        score: i32,
    },
    /// Search documents (approved and unreported only, unless --reviewer)
    Search {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        grade: Option<String>,
        /// Include pending, denied and reported documents
        #[arg(long)]
        reviewer: bool,
    },
    /// Report a document
    Report {
        /// Document UUID
        id: String,
        #[arg(long)]
        reporter: String,
        #[arg(long)]
        reason: String,
    },
    /// Show a document with its rating
    Show {
        /// Document UUID
        id: String,
    },
    /// Show the moderation history of a document
    History {
        /// Document UUID
        id: String,
    },
    /// Print a time-limited download URL for a document
    Url {
        /// Document UUID
        id: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    if let Err(err) = run(cli, &config).await {
        match err.downcast_ref::<AppError>() {
            Some(app_error) => {
                log_error(app_error);
                let body = ErrorResponse::from_app_error(app_error, config.is_production());
                eprintln!("{}", serde_json::to_string_pretty(&body)?);
            }
            None => eprintln!("Error: {:#}", err),
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli, config: &Config) -> anyhow::Result<()> {
    if let Commands::Migrate = cli.command {
        setup_database(config).await?;
        print_json(&serde_json::json!({ "success": true, "message": "Migrations applied" }))?;
        return Ok(());
    }

    let app = build_from_config(config).await?;

    match cli.command {
        Commands::Migrate => {}
        Commands::Ingest {
            file,
            owner,
            title,
            subject,
            grade,
            content_type,
        } => {
            let (payload, filename) = read_upload(&file)?;
            let document = app
                .ingest_request(teachshare_services::IngestRequest {
                    payload,
                    filename,
                    declared_type: content_type,
                    owner_id: owner,
                    title,
                    subject,
                    grade,
                })
                .await?;
            print_json(&document)?;
        }
        Commands::Review {
            id,
            reviewer,
            decision,
            comments,
        } => {
            let id = parse_document_id(&id)?;
            let decision: ModerationState = decision.parse()?;
            let record = app.review(id, &reviewer, decision, &comments).await?;
            print_json(&record)?;
        }
        Commands::Rate { id, score } => {
            let id = parse_document_id(&id)?;
            let rating = app.rate(id, score).await?;
            print_json(&rating)?;
        }
        Commands::Search {
            title,
            subject,
            grade,
            reviewer,
        } => {
            let scope = if reviewer {
                VisibilityScope::Reviewer
            } else {
                VisibilityScope::Public
            };
            let documents = app
                .search(
                    title.as_deref(),
                    subject.as_deref(),
                    grade.as_deref(),
                    scope,
                )
                .await?;
            print_json(&documents)?;
        }
        Commands::Report {
            id,
            reporter,
            reason,
        } => {
            let id = parse_document_id(&id)?;
            let record = app.report(id, &reporter, &reason).await?;
            print_json(&record)?;
        }
        Commands::Show { id } => {
            let id = parse_document_id(&id)?;
            let document = app.document(id, VisibilityScope::Reviewer).await?;
            let rating = app.rating(id).await?;
            print_json(&DocumentView { document, rating })?;
        }
        Commands::History { id } => {
            let id = parse_document_id(&id)?;
            let history = app.moderation_history(id).await?;
            print_json(&history)?;
        }
        Commands::Url { id } => {
            let id = parse_document_id(&id)?;
            let url = app.download_url(id, VisibilityScope::Reviewer).await?;
            print_json(&serde_json::json!({ "document_id": id, "url": url }))?;
        }
    }

    Ok(())
}
