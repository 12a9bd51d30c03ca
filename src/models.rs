use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shared severity scale, also used as the risk level of screenings and audits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThreatType {
    Phishing,
    Scam,
    Suspicious,
    LowRisk,
}

impl fmt::Display for ThreatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreatType::Phishing => write!(f, "phishing"),
            ThreatType::Scam => write!(f, "scam"),
            ThreatType::Suspicious => write!(f, "suspicious"),
            ThreatType::LowRisk => write!(f, "low-risk"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ThreatStatus {
    Active,
    Investigating,
    Resolved,
    #[value(name = "false_positive")]
    FalsePositive,
}

impl fmt::Display for ThreatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreatStatus::Active => write!(f, "active"),
            ThreatStatus::Investigating => write!(f, "investigating"),
            ThreatStatus::Resolved => write!(f, "resolved"),
            ThreatStatus::FalsePositive => write!(f, "false_positive"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditStatus {
    Completed,
    InProgress,
    Failed,
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditStatus::Completed => write!(f, "completed"),
            AuditStatus::InProgress => write!(f, "in-progress"),
            AuditStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Open,
    Investigating,
    Resolved,
    Closed,
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncidentStatus::Open => write!(f, "open"),
            IncidentStatus::Investigating => write!(f, "investigating"),
            IncidentStatus::Resolved => write!(f, "resolved"),
            IncidentStatus::Closed => write!(f, "closed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    Phishing,
    #[value(name = "contract_exploit")]
    ContractExploit,
    #[value(name = "unauthorized_access")]
    UnauthorizedAccess,
    #[value(name = "data_breach")]
    DataBreach,
    Malware,
    Other,
}

impl fmt::Display for IncidentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncidentType::Phishing => write!(f, "phishing"),
            IncidentType::ContractExploit => write!(f, "contract_exploit"),
            IncidentType::UnauthorizedAccess => write!(f, "unauthorized_access"),
            IncidentType::DataBreach => write!(f, "data_breach"),
            IncidentType::Malware => write!(f, "malware"),
            IncidentType::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Blockchain {
    Ethereum,
    Bitcoin,
    Polygon,
    Bsc,
    Arbitrum,
    Optimism,
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Blockchain::Ethereum => write!(f, "ethereum"),
            Blockchain::Bitcoin => write!(f, "bitcoin"),
            Blockchain::Polygon => write!(f, "polygon"),
            Blockchain::Bsc => write!(f, "bsc"),
            Blockchain::Arbitrum => write!(f, "arbitrum"),
            Blockchain::Optimism => write!(f, "optimism"),
        }
    }
}

// Persisted entities

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    pub id: String,
    pub url: String,
    pub threat_type: ThreatType,
    pub risk_score: u8,
    pub status: ThreatStatus,
    pub detected_at: String,
    pub metadata: ThreatMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreatMetadata {
    pub https: bool,
    pub domain_length: usize,
    pub suspicious_keywords: bool,
    pub suspicious_tld: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletScreening {
    pub id: String,
    pub wallet_address: String,
    pub blockchain: Blockchain,
    pub risk_score: u8,
    pub risk_level: Severity,
    pub flags: Vec<String>,
    pub sanctions_match: bool,
    pub exposure_data: ExposureData,
    pub created_at: String,
}

/// Counterparty interaction counts attached to a wallet screening
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureData {
    pub exchanges: u32,
    pub mixers: u32,
    pub gambling: u32,
    pub defi: u32,
    pub nft: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractAudit {
    pub id: String,
    pub contract_address: String,
    pub blockchain: Blockchain,
    pub risk_level: Severity,
    pub issues_found: usize,
    pub status: AuditStatus,
    pub vulnerabilities: Vec<Vulnerability>,
    #[serde(default)]
    pub security_score: u8,
    #[serde(default)]
    pub code_sha256: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub line_number: Option<usize>,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub incident_type: IncidentType,
    pub affected_assets: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// The whole per-user store document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoData {
    #[serde(default)]
    pub threats: Vec<Threat>,
    #[serde(default)]
    pub wallet_screenings: Vec<WalletScreening>,
    #[serde(default)]
    pub contract_audits: Vec<ContractAudit>,
    #[serde(default)]
    pub incidents: Vec<Incident>,
}

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub active_threats: usize,
    pub contracts_audited: usize,
    pub open_incidents: usize,
    pub alerts_24h: usize,
    pub high_risk_threats: usize,
    pub critical_incidents: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentCounts {
    pub total: usize,
    pub open: usize,
    pub investigating: usize,
    pub resolved: usize,
    pub critical: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&ThreatType::LowRisk).unwrap(), "\"low-risk\"");
        assert_eq!(serde_json::to_string(&AuditStatus::InProgress).unwrap(), "\"in-progress\"");
        assert_eq!(
            serde_json::to_string(&ThreatStatus::FalsePositive).unwrap(),
            "\"false_positive\""
        );
        assert_eq!(
            serde_json::to_string(&IncidentType::ContractExploit).unwrap(),
            "\"contract_exploit\""
        );
    }

    #[test]
    fn test_demo_data_uses_camel_case_keys() {
        let json = serde_json::to_value(DemoData::default()).unwrap();
        assert!(json.get("walletScreenings").is_some());
        assert!(json.get("contractAudits").is_some());
    }

    #[test]
    fn test_demo_data_missing_arrays_default() {
        let data: DemoData = serde_json::from_str(r#"{"threats": []}"#).unwrap();
        assert!(data.incidents.is_empty());
        assert!(data.wallet_screenings.is_empty());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::Medium > Severity::Low);
    }
}
