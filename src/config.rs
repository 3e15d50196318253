//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{
    controller::ControllerOptions,
    services::Settings,
    state::{Timeout, TimeoutCatalog, DEFAULT_TIMEOUTS},
};

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "caffeine")]
#[command(about = "Keeps the display awake for a selected timeout")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20553")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Selectable timeouts, in cycle order (e.g. 30s,5m,1h,indefinite)
    #[arg(short, long, value_delimiter = ',')]
    pub timeouts: Option<Vec<Timeout>>,

    /// JSON file remembering the selection and running flag across restarts
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Allow the display to dim while keeping the system awake
    #[arg(long)]
    pub allow_dim: bool,

    /// Delay in milliseconds before a restart or rapid advance takes effect
    #[arg(long, default_value = "1000")]
    pub debounce_ms: u64,

    /// Log keep-alive requests instead of holding a real inhibitor
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            dim: self.allow_dim,
            debounce_window: Duration::from_millis(self.debounce_ms),
        }
    }

    /// Command line list first, then the saved list, then the defaults.
    pub fn catalog(&self, saved: Option<&Settings>) -> TimeoutCatalog {
        match (&self.timeouts, saved) {
            (Some(timeouts), _) => TimeoutCatalog::new(timeouts.iter().copied()),
            (None, Some(settings)) => TimeoutCatalog::new(settings.timeouts.iter().copied()),
            (None, None) => TimeoutCatalog::new(DEFAULT_TIMEOUTS),
        }
    }
}
