use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use issue_rollup::config::{Config, StoreConfig};
use issue_rollup::engine::Orchestrator;
use issue_rollup::models::{ReportKind, RunReport};
use issue_rollup::tracker::TrackerClient;
use issue_rollup::{api, db};

#[derive(Parser)]
#[command(name = "rollup")]
#[command(about = "Incremental weekly rollups of issue-tracker activity")]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = "rollup.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one aggregation pass
    Run {
        /// velocity, defectRatio, meetings, estimateAccuracy, progress or redFlags
        #[arg(short, long, value_parser = parse_report)]
        report: ReportKind,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve persisted rollups over HTTP
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Show the configured teams and projects
    Roster,
}

fn parse_report(s: &str) -> Result<ReportKind, String> {
    ReportKind::from_str(s).ok_or_else(|| {
        let names: Vec<&str> = ReportKind::ALL.iter().map(|k| k.as_str()).collect();
        format!("unknown report '{}', expected one of: {}", s, names.join(", "))
    })
}

/// Logs go to stderr so stdout carries only the report.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "issue_rollup=info,tower_http=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: &Path) -> anyhow::Result<Config> {
    Config::load(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn open_database(store: &StoreConfig) -> anyhow::Result<db::Database> {
    let db = match &store.path {
        Some(path) => db::Database::open(path.clone()),
        None => db::Database::open_default(),
    }
    .context("Failed to open rollup database")?;
    db.migrate()?;
    Ok(db)
}

fn print_report(report: &RunReport) {
    for o in &report.observations {
        println!("{}\t{}\t{}\t{:.2}", o.subject, o.metric.as_str(), o.bucket, o.value);
    }
    for u in &report.undefined_ratios {
        println!("UNDEFINED\t{}\t{}\t{}", u.subject, u.metric.as_str(), u.bucket);
    }
    for f in &report.findings {
        println!("FLAG\t{}\t{}\t{:?}\t{}", f.subject, f.issue_key, f.flag, f.detail);
    }
    for f in &report.failures {
        println!("FAILED\t{}\t{}", f.subject, f.error);
    }
    println!(
        "{}: {} succeeded, {} failed",
        report.report.as_str(),
        report.succeeded,
        report.failed
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Run { report, json } => {
            let config = load_config(&cli.config)?;
            let db = open_database(&config.store)?;
            let source = TrackerClient::from_config(&config.tracker);

            let mut orchestrator = Orchestrator::from_config(&config, Arc::new(source), Arc::new(db));
            let result = orchestrator.run(report).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_report(&result);
            }
        }
        Commands::Serve { port } => {
            // The API only needs the store, so a missing config file is fine.
            let store = if cli.config.exists() {
                load_config(&cli.config)?.store
            } else {
                StoreConfig {
                    path: std::env::var("ROLLUP_DB").ok().map(PathBuf::from),
                }
            };
            let db = open_database(&store)?;
            let app = api::create_router(db);

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
            tracing::info!("Rollup API listening on http://127.0.0.1:{}", port);

            axum::serve(listener, app).await?;
        }
        Commands::Roster => {
            let config = load_config(&cli.config)?;
            let roster = config.roster();
            for team in &roster.teams {
                let lead = team.lead.as_deref().unwrap_or("-");
                println!("team {} (lead {}): {}", team.name, lead, team.members.join(", "));
            }
            for project in &roster.projects {
                println!("project {}", project);
            }
        }
    }

    Ok(())
}
