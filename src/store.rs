//! Demo store: one JSON document per user id.
//!
//! The whole document is rewritten on every save, so concurrent writers
//! simply overwrite each other.

use crate::errors::{SentryError, SentryResult};
use crate::models::{
    AuditStatus, ContractAudit, DashboardStats, DemoData, Incident, IncidentCounts, IncidentStatus,
    IncidentType, Severity, Threat, ThreatStatus, WalletScreening, Vulnerability,
};
use crate::utils;
use chrono::{DateTime, Duration, Utc};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

pub const STORE_FILE_PREFIX: &str = "chainsentry-demo-data-";

/// Threats at or above this score count as high risk
pub const HIGH_RISK_SCORE: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ThreatFilter {
    #[default]
    All,
    HighRisk,
    Active,
    Resolved,
}

impl ThreatFilter {
    pub fn matches(&self, threat: &Threat) -> bool {
        match self {
            ThreatFilter::All => true,
            ThreatFilter::HighRisk => threat.risk_score >= HIGH_RISK_SCORE,
            ThreatFilter::Active => threat.status == ThreatStatus::Active,
            ThreatFilter::Resolved => threat.status == ThreatStatus::Resolved,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum IncidentFilter {
    #[default]
    All,
    Open,
    Investigating,
    Resolved,
    Critical,
    High,
}

impl IncidentFilter {
    pub fn matches(&self, incident: &Incident) -> bool {
        match self {
            IncidentFilter::All => true,
            IncidentFilter::Open => incident.status == IncidentStatus::Open,
            IncidentFilter::Investigating => incident.status == IncidentStatus::Investigating,
            IncidentFilter::Resolved => incident.status == IncidentStatus::Resolved,
            IncidentFilter::Critical => incident.severity == Severity::Critical,
            IncidentFilter::High => incident.severity == Severity::High,
        }
    }
}

/// Form input for a new incident
#[derive(Debug, Clone)]
pub struct NewIncident {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub incident_type: IncidentType,
    /// Comma separated list as typed by the user
    pub affected_assets: String,
}

impl NewIncident {
    pub fn into_incident(self) -> SentryResult<Incident> {
        if self.title.trim().is_empty() {
            return Err(SentryError::InvalidInput("Incident title is required".to_string()));
        }
        let affected_assets = self
            .affected_assets
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
        let now = utils::now_timestamp();
        Ok(Incident {
            id: utils::next_id(),
            title: self.title,
            description: self.description,
            severity: self.severity,
            status: IncidentStatus::Open,
            incident_type: self.incident_type,
            affected_assets,
            created_at: now.clone(),
            updated_at: now,
        })
    }
}

/// Partial incident edit; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct IncidentUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<IncidentStatus>,
    pub incident_type: Option<IncidentType>,
    pub affected_assets: Option<Vec<String>>,
}

/// Partial audit edit
#[derive(Debug, Clone, Default)]
pub struct AuditUpdate {
    pub status: Option<AuditStatus>,
    pub risk_level: Option<Severity>,
    pub security_score: Option<u8>,
    pub vulnerabilities: Option<Vec<Vulnerability>>,
    pub code_sha256: Option<String>,
}

impl AuditUpdate {
    /// Copy the results of a finished audit onto a pending record
    pub fn from_completed(audit: &ContractAudit) -> Self {
        Self {
            status: Some(audit.status),
            risk_level: Some(audit.risk_level),
            security_score: Some(audit.security_score),
            vulnerabilities: Some(audit.vulnerabilities.clone()),
            code_sha256: audit.code_sha256.clone(),
        }
    }
}

pub struct DemoStore {
    path: PathBuf,
    user_id: String,
    data: DemoData,
}

impl DemoStore {
    /// Load the document for `user_id` from `data_dir`.
    ///
    /// A missing file starts an empty store. A corrupt file is logged and
    /// replaced by an empty store on the next save.
    pub fn open(data_dir: &Path, user_id: &str) -> SentryResult<Self> {
        validate_user_id(user_id)?;
        let path = store_path(data_dir, user_id);

        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<DemoData>(&raw) {
                Ok(data) => data,
                Err(e) => {
                    log::error!("Failed to parse stored data at {:?}: {}", path, e);
                    DemoData::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No stored data for user {}, starting empty", user_id);
                DemoData::default()
            }
            Err(e) => return Err(SentryError::io(e, Some(path))),
        };

        Ok(Self {
            path,
            user_id: user_id.to_string(),
            data,
        })
    }

    pub fn save(&self) -> SentryResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SentryError::io(e, Some(parent.to_path_buf())))?;
        }
        let raw = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, raw).map_err(|e| SentryError::io(e, Some(self.path.clone())))?;
        log::debug!("Saved demo data for {} to {:?}", self.user_id, self.path);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn data(&self) -> &DemoData {
        &self.data
    }

    pub fn add_threat(&mut self, threat: Threat) {
        self.data.threats.insert(0, threat);
    }

    pub fn update_threat_status(&mut self, id: &str, status: ThreatStatus) -> SentryResult<&Threat> {
        let threat = self
            .data
            .threats
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| SentryError::not_found("Threat", id))?;
        threat.status = status;
        Ok(threat)
    }

    pub fn add_wallet_screening(&mut self, screening: WalletScreening) {
        self.data.wallet_screenings.insert(0, screening);
    }

    pub fn add_contract_audit(&mut self, audit: ContractAudit) {
        self.data.contract_audits.insert(0, audit);
    }

    pub fn update_contract_audit(&mut self, id: &str, update: AuditUpdate) -> SentryResult<&ContractAudit> {
        let audit = self
            .data
            .contract_audits
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| SentryError::not_found("Contract audit", id))?;
        if let Some(status) = update.status {
            audit.status = status;
        }
        if let Some(level) = update.risk_level {
            audit.risk_level = level;
        }
        if let Some(score) = update.security_score {
            audit.security_score = score;
        }
        if let Some(vulnerabilities) = update.vulnerabilities {
            audit.issues_found = vulnerabilities.len();
            audit.vulnerabilities = vulnerabilities;
        }
        if update.code_sha256.is_some() {
            audit.code_sha256 = update.code_sha256;
        }
        Ok(audit)
    }

    pub fn add_incident(&mut self, incident: Incident) {
        self.data.incidents.insert(0, incident);
    }

    /// Apply `update` and stamp `updated_at`
    pub fn update_incident(&mut self, id: &str, update: IncidentUpdate) -> SentryResult<&Incident> {
        let incident = self
            .data
            .incidents
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| SentryError::not_found("Incident", id))?;
        if let Some(title) = update.title {
            incident.title = title;
        }
        if let Some(description) = update.description {
            incident.description = description;
        }
        if let Some(severity) = update.severity {
            incident.severity = severity;
        }
        if let Some(status) = update.status {
            incident.status = status;
        }
        if let Some(incident_type) = update.incident_type {
            incident.incident_type = incident_type;
        }
        if let Some(assets) = update.affected_assets {
            incident.affected_assets = assets;
        }
        incident.updated_at = utils::now_timestamp();
        Ok(incident)
    }

    pub fn delete_incident(&mut self, id: &str) -> SentryResult<Incident> {
        let idx = self
            .data
            .incidents
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| SentryError::not_found("Incident", id))?;
        Ok(self.data.incidents.remove(idx))
    }

    pub fn threats(&self, filter: ThreatFilter) -> Vec<&Threat> {
        self.data.threats.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Filtered incidents; `query` matches title or description, ignoring case
    pub fn incidents(&self, filter: IncidentFilter, query: Option<&str>) -> Vec<&Incident> {
        let query = query.map(str::to_lowercase).filter(|q| !q.is_empty());
        self.data
            .incidents
            .iter()
            .filter(|i| filter.matches(i))
            .filter(|i| match &query {
                Some(q) => i.title.to_lowercase().contains(q) || i.description.to_lowercase().contains(q),
                None => true,
            })
            .collect()
    }

    pub fn stats(&self, now: DateTime<Utc>) -> DashboardStats {
        let cutoff = now - Duration::hours(24);
        let threats = &self.data.threats;
        let incidents = &self.data.incidents;

        DashboardStats {
            active_threats: threats.iter().filter(|t| t.status == ThreatStatus::Active).count(),
            contracts_audited: self
                .data
                .contract_audits
                .iter()
                .filter(|a| a.status == AuditStatus::Completed)
                .count(),
            open_incidents: incidents
                .iter()
                .filter(|i| matches!(i.status, IncidentStatus::Open | IncidentStatus::Investigating))
                .count(),
            alerts_24h: threats
                .iter()
                .filter(|t| utils::parse_timestamp(&t.detected_at).is_some_and(|at| at > cutoff))
                .count(),
            high_risk_threats: threats
                .iter()
                .filter(|t| t.risk_score >= HIGH_RISK_SCORE && t.status == ThreatStatus::Active)
                .count(),
            critical_incidents: incidents
                .iter()
                .filter(|i| i.severity == Severity::Critical && i.status != IncidentStatus::Closed)
                .count(),
        }
    }

    pub fn incident_counts(&self) -> IncidentCounts {
        let incidents = &self.data.incidents;
        let with_status = |s: IncidentStatus| incidents.iter().filter(|i| i.status == s).count();
        IncidentCounts {
            total: incidents.len(),
            open: with_status(IncidentStatus::Open),
            investigating: with_status(IncidentStatus::Investigating),
            resolved: with_status(IncidentStatus::Resolved),
            critical: incidents.iter().filter(|i| i.severity == Severity::Critical).count(),
        }
    }
}

pub fn store_path(data_dir: &Path, user_id: &str) -> PathBuf {
    data_dir.join(format!("{}{}.json", STORE_FILE_PREFIX, user_id))
}

/// User ids become part of a file name
pub fn validate_user_id(user_id: &str) -> SentryResult<()> {
    let valid = !user_id.is_empty()
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
        && !user_id.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(SentryError::InvalidInput(format!("Invalid user id '{}'", user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Blockchain, ThreatMetadata, ThreatType};
    use tempfile::TempDir;

    fn threat(id: &str, score: u8, status: ThreatStatus, detected_at: DateTime<Utc>) -> Threat {
        Threat {
            id: id.to_string(),
            url: format!("https://{}.example.com", id),
            threat_type: ThreatType::Suspicious,
            risk_score: score,
            status,
            detected_at: utils::timestamp(detected_at),
            metadata: ThreatMetadata::default(),
        }
    }

    fn incident(title: &str, severity: Severity) -> Incident {
        NewIncident {
            title: title.to_string(),
            description: format!("{} description", title),
            severity,
            incident_type: IncidentType::Phishing,
            affected_assets: "treasury, , hot-wallet ".to_string(),
        }
        .into_incident()
        .unwrap()
    }

    fn audit(id: &str, status: AuditStatus) -> ContractAudit {
        ContractAudit {
            id: id.to_string(),
            contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            blockchain: Blockchain::Ethereum,
            risk_level: Severity::Low,
            issues_found: 0,
            status,
            vulnerabilities: Vec::new(),
            security_score: 100,
            code_sha256: None,
            created_at: utils::now_timestamp(),
        }
    }

    #[test]
    fn test_missing_file_starts_empty() -> SentryResult<()> {
        let dir = TempDir::new()?;
        let store = DemoStore::open(dir.path(), "alice")?;
        assert_eq!(store.data(), &DemoData::default());
        assert!(store.path().ends_with("chainsentry-demo-data-alice.json"));
        Ok(())
    }

    #[test]
    fn test_save_and_reload() -> SentryResult<()> {
        let dir = TempDir::new()?;
        let mut store = DemoStore::open(dir.path(), "alice")?;
        store.add_threat(threat("1", 80, ThreatStatus::Active, Utc::now()));
        store.add_incident(incident("Drained hot wallet", Severity::Critical));
        store.save()?;

        let reloaded = DemoStore::open(dir.path(), "alice")?;
        assert_eq!(reloaded.data(), store.data());

        let other = DemoStore::open(dir.path(), "bob")?;
        assert!(other.data().threats.is_empty());
        Ok(())
    }

    #[test]
    fn test_corrupt_file_resets() -> SentryResult<()> {
        let dir = TempDir::new()?;
        std::fs::write(store_path(dir.path(), "alice"), "{not json")?;
        let mut store = DemoStore::open(dir.path(), "alice")?;
        assert!(store.data().incidents.is_empty());

        store.add_threat(threat("1", 40, ThreatStatus::Active, Utc::now()));
        store.save()?;
        let raw = std::fs::read_to_string(store_path(dir.path(), "alice"))?;
        let parsed: DemoData = serde_json::from_str(&raw)?;
        assert_eq!(parsed.threats.len(), 1);
        assert_eq!(DemoStore::open(dir.path(), "alice")?.data().threats[0].id, "1");
        Ok(())
    }

    #[test]
    fn test_rejects_path_like_user_ids() {
        let dir = TempDir::new().unwrap();
        assert!(DemoStore::open(dir.path(), "../etc").is_err());
        assert!(DemoStore::open(dir.path(), "").is_err());
        assert!(DemoStore::open(dir.path(), "ops@chainsentry.io").is_ok());
    }

    #[test]
    fn test_new_records_are_prepended() -> SentryResult<()> {
        let dir = TempDir::new()?;
        let mut store = DemoStore::open(dir.path(), "alice")?;
        store.add_threat(threat("1", 10, ThreatStatus::Active, Utc::now()));
        store.add_threat(threat("2", 10, ThreatStatus::Active, Utc::now()));
        assert_eq!(store.data().threats[0].id, "2");
        Ok(())
    }

    #[test]
    fn test_threat_status_update() -> SentryResult<()> {
        let dir = TempDir::new()?;
        let mut store = DemoStore::open(dir.path(), "alice")?;
        store.add_threat(threat("1", 90, ThreatStatus::Active, Utc::now()));
        store.update_threat_status("1", ThreatStatus::Resolved)?;
        assert_eq!(store.threats(ThreatFilter::Resolved).len(), 1);
        assert!(store.threats(ThreatFilter::Active).is_empty());
        assert_eq!(store.threats(ThreatFilter::HighRisk).len(), 1);
        assert!(matches!(
            store.update_threat_status("nope", ThreatStatus::Active),
            Err(SentryError::NotFound { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_incident_lifecycle() -> SentryResult<()> {
        let dir = TempDir::new()?;
        let mut store = DemoStore::open(dir.path(), "alice")?;
        let created = incident("Fake airdrop", Severity::High);
        let id = created.id.clone();
        assert_eq!(created.affected_assets, vec!["treasury", "hot-wallet"]);
        assert_eq!(created.status, IncidentStatus::Open);
        store.add_incident(created);

        let before = store.data().incidents[0].updated_at.clone();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let updated = store.update_incident(
            &id,
            IncidentUpdate {
                status: Some(IncidentStatus::Investigating),
                ..Default::default()
            },
        )?;
        assert_eq!(updated.status, IncidentStatus::Investigating);
        assert_ne!(updated.updated_at, before);

        let removed = store.delete_incident(&id)?;
        assert_eq!(removed.title, "Fake airdrop");
        assert!(store.data().incidents.is_empty());
        assert!(store.delete_incident(&id).is_err());
        Ok(())
    }

    #[test]
    fn test_incident_requires_title() {
        let result = NewIncident {
            title: "  ".to_string(),
            description: String::new(),
            severity: Severity::Low,
            incident_type: IncidentType::Other,
            affected_assets: String::new(),
        }
        .into_incident();
        assert!(result.is_err());
    }

    #[test]
    fn test_incident_filter_and_search() -> SentryResult<()> {
        let dir = TempDir::new()?;
        let mut store = DemoStore::open(dir.path(), "alice")?;
        store.add_incident(incident("Bridge exploit", Severity::Critical));
        store.add_incident(incident("Phishing domain", Severity::High));
        store.add_incident(incident("Spam tokens", Severity::Low));

        assert_eq!(store.incidents(IncidentFilter::All, None).len(), 3);
        assert_eq!(store.incidents(IncidentFilter::Critical, None).len(), 1);
        assert_eq!(store.incidents(IncidentFilter::All, Some("PHISHING")).len(), 1);
        assert_eq!(store.incidents(IncidentFilter::High, Some("bridge")).len(), 0);
        assert_eq!(store.incidents(IncidentFilter::All, Some("description")).len(), 3);
        Ok(())
    }

    #[test]
    fn test_audit_update_fills_pending_record() -> SentryResult<()> {
        let dir = TempDir::new()?;
        let mut store = DemoStore::open(dir.path(), "alice")?;
        store.add_contract_audit(audit("a1", AuditStatus::InProgress));
        let mut finished = audit("a1", AuditStatus::Completed);
        finished.vulnerabilities.push(Vulnerability {
            id: "AUTH-003".to_string(),
            severity: Severity::High,
            title: "tx.origin Used for Authorization".to_string(),
            description: String::new(),
            line_number: Some(3),
            recommendation: String::new(),
        });
        finished.risk_level = Severity::Medium;

        let updated = store.update_contract_audit("a1", AuditUpdate::from_completed(&finished))?;
        assert_eq!(updated.status, AuditStatus::Completed);
        assert_eq!(updated.issues_found, 1);
        assert_eq!(updated.risk_level, Severity::Medium);

        let missing = store.update_contract_audit("missing", AuditUpdate::default());
        assert!(matches!(missing, Err(SentryError::NotFound { kind: "Contract audit", .. })));
        Ok(())
    }

    #[test]
    fn test_stats() -> SentryResult<()> {
        let dir = TempDir::new()?;
        let mut store = DemoStore::open(dir.path(), "alice")?;
        let now = Utc::now();
        store.add_threat(threat("1", 85, ThreatStatus::Active, now - Duration::hours(1)));
        store.add_threat(threat("2", 40, ThreatStatus::Active, now - Duration::hours(30)));
        store.add_threat(threat("3", 95, ThreatStatus::Resolved, now - Duration::minutes(5)));
        store.add_contract_audit(audit("a1", AuditStatus::Completed));
        store.add_contract_audit(audit("a2", AuditStatus::InProgress));

        let critical = incident("Bridge exploit", Severity::Critical);
        let critical_id = critical.id.clone();
        store.add_incident(critical);
        store.add_incident(incident("Phishing domain", Severity::High));
        let mut closed = incident("Old exploit", Severity::Critical);
        closed.status = IncidentStatus::Closed;
        store.add_incident(closed);
        store.update_incident(
            &critical_id,
            IncidentUpdate {
                status: Some(IncidentStatus::Investigating),
                ..Default::default()
            },
        )?;

        let stats = store.stats(now);
        assert_eq!(stats.active_threats, 2);
        assert_eq!(stats.contracts_audited, 1);
        assert_eq!(stats.open_incidents, 2);
        assert_eq!(stats.alerts_24h, 2);
        assert_eq!(stats.high_risk_threats, 1);
        assert_eq!(stats.critical_incidents, 1);

        let counts = store.incident_counts();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.open, 1);
        assert_eq!(counts.investigating, 1);
        assert_eq!(counts.critical, 2);
        Ok(())
    }
}
