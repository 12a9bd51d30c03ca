//! Scoring Module - heuristic risk engines
//!
//! Every engine follows the same shape: extract a handful of features from
//! the input, sum fixed penalties, clamp to 0-100 and bucket the result.
//! - `threat`: dashboard quick scan of a URL
//! - `phishing`: detailed rule-based URL analysis
//! - `pipeline`: simulated ML feature pipeline for URLs
//! - `contract`: Solidity vulnerability patterns
//! - `wallet`: randomised wallet screening

pub mod contract;
pub mod phishing;
pub mod pipeline;
pub mod threat;
pub mod wallet;

use crate::models::Severity;
use serde::{Deserialize, Serialize};

pub use contract::{ContractAnalyzer, ContractAuditor, VulnerabilityReport};
pub use phishing::{analyze_url, PhishingAnalysis};
pub use pipeline::{analyze_url_with_pipeline, PipelineResult};
pub use threat::scan_threat;
pub use wallet::WalletScreener;

/// Single reason a score went up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub category: String,
    pub severity: Severity,
    pub description: String,
    /// Share of the total score this indicator contributed, when tracked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl Indicator {
    pub fn new(category: &str, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            category: category.to_string(),
            severity,
            description: description.into(),
            weight: None,
        }
    }

    pub fn weighted(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// Clamp an accumulated penalty sum into the 0-100 score range
pub fn clamp_score(raw: i32) -> u8 {
    raw.clamp(0, 100) as u8
}

impl Severity {
    /// Wallet screening buckets
    pub fn from_wallet_score(score: u8) -> Self {
        match score {
            s if s > 75 => Severity::Critical,
            s if s > 50 => Severity::High,
            s if s > 25 => Severity::Medium,
            _ => Severity::Low,
        }
    }

    /// Contract buckets; a higher security score means lower risk
    pub fn from_security_score(score: u8) -> Self {
        match score {
            s if s >= 80 => Severity::Low,
            s if s >= 60 => Severity::Medium,
            s if s >= 40 => Severity::High,
            _ => Severity::Critical,
        }
    }

    /// Alert severity for a scanned threat
    pub fn from_alert_score(score: u8) -> Self {
        match score {
            s if s >= 90 => Severity::Critical,
            s if s >= 70 => Severity::High,
            _ => Severity::Medium,
        }
    }
}

/// Count scores into (low, medium, high, critical) quartiles
pub fn risk_breakdown<I>(scores: I) -> (usize, usize, usize, usize)
where
    I: IntoIterator<Item = u8>,
{
    let mut low = 0;
    let mut medium = 0;
    let mut high = 0;
    let mut critical = 0;

    for score in scores {
        match score {
            0..=25 => low += 1,
            26..=50 => medium += 1,
            51..=75 => high += 1,
            _ => critical += 1,
        }
    }

    (low, medium, high, critical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-40), 0);
        assert_eq!(clamp_score(65), 65);
        assert_eq!(clamp_score(140), 100);
    }

    #[test]
    fn test_wallet_buckets() {
        assert_eq!(Severity::from_wallet_score(25), Severity::Low);
        assert_eq!(Severity::from_wallet_score(26), Severity::Medium);
        assert_eq!(Severity::from_wallet_score(51), Severity::High);
        assert_eq!(Severity::from_wallet_score(76), Severity::Critical);
    }

    #[test]
    fn test_security_buckets() {
        assert_eq!(Severity::from_security_score(100), Severity::Low);
        assert_eq!(Severity::from_security_score(80), Severity::Low);
        assert_eq!(Severity::from_security_score(65), Severity::Medium);
        assert_eq!(Severity::from_security_score(40), Severity::High);
        assert_eq!(Severity::from_security_score(39), Severity::Critical);
    }

    #[test]
    fn test_alert_buckets() {
        assert_eq!(Severity::from_alert_score(95), Severity::Critical);
        assert_eq!(Severity::from_alert_score(70), Severity::High);
        assert_eq!(Severity::from_alert_score(10), Severity::Medium);
    }

    #[test]
    fn test_risk_breakdown() {
        let (low, medium, high, critical) = risk_breakdown([0, 25, 26, 60, 75, 76, 100]);
        assert_eq!((low, medium, high, critical), (2, 1, 2, 2));
    }
}
