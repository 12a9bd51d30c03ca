//! Runtime settings resolved from command-line flags and the environment.

use crate::cli::Args;
use crate::errors::SentryResult;
use crate::store;
use std::path::PathBuf;

pub const HOME_ENV: &str = "CHAINSENTRY_HOME";
pub const USER_ENV: &str = "CHAINSENTRY_USER";
pub const NO_DELAY_ENV: &str = "CHAINSENTRY_NO_DELAY";

pub const DEFAULT_DATA_DIR: &str = ".chainsentry";
pub const DEFAULT_USER: &str = "demo";

/// Artificial latency per operation, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delays {
    pub threat_scan: u64,
    pub phishing: u64,
    pub pipeline: u64,
    pub wallet: u64,
    pub audit_steps: [(&'static str, u64); 4],
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            threat_scan: 1500,
            phishing: 1500,
            pipeline: 2000,
            wallet: 2000,
            audit_steps: [
                ("Parsing contract...", 500),
                ("Analyzing vulnerabilities...", 1000),
                ("Checking best practices...", 800),
                ("Generating report...", 700),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub user_id: String,
    pub pacing: bool,
    pub delays: Delays,
    pub json: bool,
    pub quiet: bool,
}

impl Settings {
    pub fn from_args(args: &Args) -> SentryResult<Self> {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    /// Resolve with an injectable environment lookup
    pub fn resolve<F>(args: &Args, env: F) -> SentryResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = args
            .data_dir
            .clone()
            .or_else(|| env(HOME_ENV).filter(|v| !v.is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let user_id = args
            .user
            .clone()
            .or_else(|| env(USER_ENV).filter(|v| !v.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        store::validate_user_id(&user_id)?;

        let pacing = !(args.no_delay || env(NO_DELAY_ENV).is_some_and(|v| is_truthy(&v)));

        let settings = Self {
            data_dir,
            user_id,
            pacing,
            delays: Delays::default(),
            json: args.json,
            quiet: args.quiet,
        };
        log::debug!("Resolved settings: {:?}", settings);
        Ok(settings)
    }

    /// Show spinners and progress bars
    pub fn interactive(&self) -> bool {
        !self.quiet && !self.json
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "" | "0" | "false" | "no" | "off")
}
