//! Skill-check CLI and REST API entry point.
//!
//! Binary name: `skc`
//!
//! Parses CLI arguments, sets up tracing, picks a local or remote backend,
//! then dispatches to the command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use skillcheck_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
use skillcheck_types::session::SessionStatus;

use cli::backend::Backend;
use cli::{Cli, Commands, SessionCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,skc=debug,skillcheck_core=debug,skillcheck_infra=debug",
        _ => "trace",
    };
    init_tracing(&TracingOptions::new(filter).json(cli.json).otel(cli.otel))
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need a backend
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "skc", &mut std::io::stdout());
        return Ok(());
    }

    if let Commands::Serve { port, host } = cli.command {
        return serve(port, host).await;
    }

    let backend = Backend::connect(cli.remote.as_deref()).await?;

    match cli.command {
        Commands::Session { action } => match action {
            SessionCommand::Create { name, team, date } => {
                cli::session::create_session(&backend, name, team, date, cli.json).await?;
            }
            SessionCommand::List { status, team } => {
                cli::session::list_sessions(&backend, status, team, cli.json).await?;
            }
            SessionCommand::Show { id } => {
                cli::session::show_session(&backend, &id, cli.json).await?;
            }
            SessionCommand::Complete(args) => {
                cli::session::change_status(
                    &backend,
                    &args.id,
                    SessionStatus::Complete,
                    args.force,
                    cli.json,
                )
                .await?;
            }
            SessionCommand::Discard(args) => {
                cli::session::change_status(
                    &backend,
                    &args.id,
                    SessionStatus::Discard,
                    args.force,
                    cli.json,
                )
                .await?;
            }
            SessionCommand::Delete { id, force } => {
                cli::session::delete_session(&backend, &id, force, cli.json).await?;
            }
        },

        Commands::Draft(args) => {
            cli::draft::run_draft(&backend, args, cli.json).await?;
        }

        Commands::Assign { action } => {
            cli::assign::run_assign(&backend, action, cli.json).await?;
        }

        Commands::Serve { .. } | Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Run the REST API against the local database.
async fn serve(port: Option<u16>, host: Option<String>) -> anyhow::Result<()> {
    let state = AppState::init().await?;
    let host = host.unwrap_or_else(|| state.config.server.host.clone());
    let port = port.unwrap_or(state.config.server.port);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Skill-check API listening on {}",
        console::style("⚡").bold(),
        console::style(format!("http://{addr}")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());
    tracing::info!(%addr, "api server started");

    let router = http::router::build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
