use crate::models::{Blockchain, IncidentStatus, IncidentType, Severity, ThreatStatus};
use crate::store::{IncidentFilter, ThreatFilter};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "chainsentry",
    about = "ChainSentry - blockchain security toolkit for URL, contract and wallet risk scoring",
    version
)]
pub struct Args {
    /// Directory holding per-user demo data (default: $CHAINSENTRY_HOME or ./.chainsentry)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// User id whose demo store is used (default: $CHAINSENTRY_USER or "demo")
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Skip the artificial scan delays
    #[arg(long, global = true)]
    pub no_delay: bool,

    /// Enable verbose logging of all operations
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Hide progress output and only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON instead of formatted text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Quick threat scan of a URL, recorded in the store
    Scan {
        url: String,
    },

    /// Detailed phishing analysis of a URL
    Phishing {
        url: String,

        /// Run the simulated ML detection pipeline instead of the rule set
        #[arg(long)]
        pipeline: bool,

        /// RNG seed for the pipeline's simulated values
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List recorded threats
    Threats {
        #[arg(short, long, value_enum, default_value = "all")]
        filter: ThreatFilter,
    },

    /// Change the status of a recorded threat
    ThreatStatus {
        id: String,
        #[arg(value_enum)]
        status: ThreatStatus,
    },

    /// Audit a Solidity source file
    Audit {
        /// Contract address (0x followed by 40 hex digits)
        address: String,

        /// Path to the contract source
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, value_enum, default_value = "ethereum")]
        chain: Blockchain,
    },

    /// Audit every .sol file under a directory in parallel
    AuditDir {
        dir: PathBuf,

        #[arg(short, long, value_enum, default_value = "ethereum")]
        chain: Blockchain,

        /// Number of parallel audit threads (0 = auto-detect)
        #[arg(short, long, default_value = "0")]
        threads: usize,
    },

    /// List recorded contract audits
    Audits,

    /// Screen a wallet address
    Wallet {
        address: String,

        #[arg(short, long, value_enum, default_value = "ethereum")]
        chain: Blockchain,

        /// RNG seed for reproducible screenings
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List recorded wallet screenings
    Wallets,

    /// Manage security incidents
    Incident {
        #[command(subcommand)]
        action: IncidentAction,
    },

    /// Dashboard counters
    Stats,

    /// Unified alert feed
    Alerts {
        /// all, unread, low, medium, high or critical
        #[arg(short, long, default_value = "all")]
        filter: crate::alerts::AlertFilter,
    },

    /// Aggregate analytics over the store
    Analytics,

    /// Follow the simulated live threat feed
    Monitor {
        /// Stop after this many seconds (runs until Ctrl-C if omitted)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Seconds between feed ticks
        #[arg(short, long, default_value = "5")]
        interval: u64,

        /// Chance that a tick produces an event
        #[arg(long, default_value = "0.3")]
        probability: f64,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum IncidentAction {
    /// Open a new incident
    Create(IncidentFields),

    /// List incidents
    List {
        #[arg(short, long, value_enum, default_value = "all")]
        filter: IncidentFilter,

        /// Case-insensitive search over title and description
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Edit an incident
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, value_enum)]
        severity: Option<Severity>,

        #[arg(long, value_enum)]
        status: Option<IncidentStatus>,

        #[arg(long = "type", value_enum)]
        incident_type: Option<IncidentType>,

        /// Comma separated affected assets (replaces the current list)
        #[arg(long, value_delimiter = ',')]
        assets: Option<Vec<String>>,
    },

    /// Delete an incident
    Delete {
        id: String,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct IncidentFields {
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, value_enum, default_value = "medium")]
    pub severity: Severity,

    #[arg(long = "type", value_enum, default_value = "other")]
    pub incident_type: IncidentType,

    /// Comma separated affected assets
    #[arg(long, default_value = "")]
    pub assets: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertFilter;

    #[test]
    fn test_parses_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "chainsentry",
            "scan",
            "https://example.com",
            "--no-delay",
            "--json",
            "--user",
            "alice",
        ])
        .unwrap();
        assert!(args.no_delay);
        assert!(args.json);
        assert_eq!(args.user.as_deref(), Some("alice"));
        assert!(matches!(args.command, Command::Scan { ref url } if url == "https://example.com"));
    }

    #[test]
    fn test_threat_status_values() {
        let args = Args::try_parse_from(["chainsentry", "threat-status", "42", "false_positive"]).unwrap();
        match args.command {
            Command::ThreatStatus { id, status } => {
                assert_eq!(id, "42");
                assert_eq!(status, ThreatStatus::FalsePositive);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_incident_create_defaults() {
        let args = Args::try_parse_from(["chainsentry", "incident", "create", "--title", "Drain"]).unwrap();
        match args.command {
            Command::Incident {
                action: IncidentAction::Create(fields),
            } => {
                assert_eq!(fields.title, "Drain");
                assert_eq!(fields.severity, Severity::Medium);
                assert_eq!(fields.incident_type, IncidentType::Other);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_alert_filter_parsing() {
        let args = Args::try_parse_from(["chainsentry", "alerts", "--filter", "critical"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Alerts {
                filter: AlertFilter::Severity(Severity::Critical)
            }
        ));
        assert!(Args::try_parse_from(["chainsentry", "alerts", "--filter", "urgent"]).is_err());
    }

    #[test]
    fn test_audit_requires_file() {
        assert!(Args::try_parse_from(["chainsentry", "audit", "0xabc"]).is_err());
    }
}
