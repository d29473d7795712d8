use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crew::{PhaseEngine, SseSeverityFeed};
use events::EventBus;
use heist_core::Role;
use offers::{Catalog, OfferService};
use orchestrator::{
    CrewClient, FileReportWriter, LesterClient, Mission, MissionConfig, MissionReport, ReportSink,
};
use server::config::{default_port, HeistConfig, CONFIG_FILE, DEFAULT_LESTER_PORT};
use server::state::{CrewState, LesterState};
use server::{crew_router, lester_router};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "heist")]
#[command(about = "Bank heist crew: Lester, Trevor, Franklin and Michael", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional settings file
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the offer service and the star feed
    Lester {
        #[arg(short, long, env = "LESTER_PORT", default_value_t = DEFAULT_LESTER_PORT)]
        port: u16,

        /// Offer catalog, overrides the config file
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
    /// Run an executor
    Crew {
        #[arg(short, long)]
        role: Role,

        /// Defaults to 50053 for Trevor and 50054 for Franklin
        #[arg(short, long)]
        port: Option<u16>,

        #[arg(long, env = "LESTER_HOST", default_value = "localhost:50051")]
        lester_host: String,
    },
    /// Run one mission and write the report
    Michael {
        #[arg(long, env = "LESTER_HOST", default_value = "localhost:50051")]
        lester_host: String,

        #[arg(long, env = "TREVOR_HOST", default_value = "localhost:50053")]
        trevor_host: String,

        #[arg(long, env = "FRANKLIN_HOST", default_value = "localhost:50054")]
        franklin_host: String,

        /// Report directory, overrides the config file
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = HeistConfig::read(&cli.config).await;

    match cli.command {
        Commands::Lester { port, catalog } => run_lester(&config, port, catalog).await,
        Commands::Crew {
            role,
            port,
            lester_host,
        } => run_crew(&config, role, port.unwrap_or_else(|| default_port(role)), &lester_host).await,
        Commands::Michael {
            lester_host,
            trevor_host,
            franklin_host,
            report_dir,
        } => {
            let report_dir = report_dir.unwrap_or_else(|| config.michael.report_dir.clone());
            run_michael(&config, &lester_host, &trevor_host, &franklin_host, &report_dir).await
        }
    }
}

async fn run_lester(config: &HeistConfig, port: u16, catalog: Option<PathBuf>) -> Result<()> {
    let catalog = match catalog.or_else(|| config.lester.catalog.clone()) {
        Some(path) => Catalog::load(&path)
            .await
            .with_context(|| format!("Failed to load offer catalog {}", path.display()))?,
        None => Catalog::default(),
    };

    let service = OfferService::new(catalog, config.lester.service_config())
        .context("Failed to create offer service")?;
    let state = LesterState::new(service, EventBus::new());
    let app = lester_router(state.clone());

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    tracing::info!(port, "Lester is listening");
    println!("  Offer service:  http://localhost:{}", port);
    println!("  Swagger UI:     http://localhost:{}/swagger-ui", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.producer.stop();
    Ok(())
}

async fn run_crew(config: &HeistConfig, role: Role, port: u16, lester_host: &str) -> Result<()> {
    let feed = SseSeverityFeed::new(base_url(lester_host));
    tracing::info!(%role, feed = feed.url(), "Star feed source");

    let engine = PhaseEngine::spawn(config.crew.crew_config(role), Arc::new(feed))
        .context("Failed to start phase engine")?;
    let app = crew_router(CrewState::new(engine.clone()));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    tracing::info!(%role, port, "Executor is listening");
    println!("  {}:  http://localhost:{}", role, port);
    println!("  Swagger UI:  http://localhost:{}/swagger-ui", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    engine.shutdown();
    Ok(())
}

async fn run_michael(
    config: &HeistConfig,
    lester_host: &str,
    trevor_host: &str,
    franklin_host: &str,
    report_dir: &Path,
) -> Result<()> {
    let cancel = CancellationToken::new();
    let mission = Mission::new(
        Arc::new(LesterClient::new(base_url(lester_host))),
        Arc::new(CrewClient::new(Role::Trevor, base_url(trevor_host))),
        Arc::new(CrewClient::new(Role::Franklin, base_url(franklin_host))),
    )
    .with_config(MissionConfig {
        poll_interval: Duration::from_millis(config.michael.poll_interval_ms),
        phase_timeout: Duration::from_secs(config.michael.phase_timeout_secs),
    })
    .with_cancellation(cancel.clone());

    let signal_token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::warn!("Interrupted, calling off the mission");
        signal_token.cancel();
    });

    let outcome = mission.run().await.context("Mission aborted")?;

    let writer = FileReportWriter::in_dir(report_dir);
    let report = MissionReport::from(&outcome);
    writer
        .write(&report)
        .await
        .with_context(|| format!("Failed to write report to {}", writer.path().display()))?;

    print!("{}", report.render());
    Ok(())
}

/// Accepts either `host:port` or a full URL.
fn base_url(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "heist=info,server=info,crew=info,offers=info,orchestrator=info,tower_http=info".into()
        }))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(base_url("lester:50051"), "http://lester:50051");
        assert_eq!(base_url("https://lester.local"), "https://lester.local");
    }

    #[test]
    fn test_crew_args() {
        let cli = Cli::try_parse_from(["heist", "crew", "--role", "franklin"]).unwrap();
        match cli.command {
            Commands::Crew { role, port, .. } => {
                assert_eq!(role, Role::Franklin);
                assert_eq!(port, None);
            }
            _ => panic!("expected crew command"),
        }
        assert_eq!(cli.config, PathBuf::from(CONFIG_FILE));
    }
}
