use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "ratekeeperctl",
    version,
    about = "Persist and apply a video playback rate across page loads"
)]
pub struct Cli {
    /// JSON file holding the persisted rate
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
    /// Settings file (TOML or JSON); RATEKEEPER_* variables override it
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// URL of the simulated active tab; omit for no active tab
    #[arg(long, global = true)]
    pub url: Option<String>,
    /// Current rate of the video on the simulated tab
    #[arg(long, global = true, default_value_t = 1.0)]
    pub live_rate: f64,
    /// Run a page agent inside the simulated tab
    #[arg(long, global = true)]
    pub agent: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the panel and show the reconciled rate
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Apply a rate, e.g. `1.5` or `2`
    Set {
        #[arg(allow_negative_numbers = true)]
        rate: String,
    },
    /// Raise the rate by one step
    Up,
    /// Lower the rate by one step
    Down,
    /// Return to normal speed
    Reset,
    /// Run the page agent through a scripted browsing session
    Simulate {
        /// Change the rate through the native player after the first video binds
        #[arg(long)]
        native_rate: Option<f64>,
        /// Number of in-page navigations that replace the video element
        #[arg(long, default_value_t = 1)]
        navigations: u32,
    },
}
