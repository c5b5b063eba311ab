//! `ratekeeperctl`: the control panel on the command line.

mod cli;
mod commands;
mod session;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::commands::Action;
use crate::session::Session;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ratekeeper_core=info,ratekeeperctl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let session = Session::open(&cli).await?;

    let outcome = match cli.command {
        Command::Status { json } => commands::status(&session, json).await,
        Command::Set { rate } => commands::apply(&session, Action::Set(rate)).await,
        Command::Up => commands::apply(&session, Action::Up).await,
        Command::Down => commands::apply(&session, Action::Down).await,
        Command::Reset => commands::apply(&session, Action::Reset).await,
        Command::Simulate {
            native_rate,
            navigations,
        } => {
            commands::simulate(
                &session,
                cli.url.as_deref(),
                cli.live_rate,
                native_rate,
                navigations,
            )
            .await
        }
    };

    session.close().await?;
    outcome
}
