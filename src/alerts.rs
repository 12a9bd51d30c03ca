//! Alert feed and analytics derived from the demo store

use crate::models::{DemoData, IncidentStatus, Severity};
use crate::scoring::{self, risk_breakdown};
use crate::store::HIGH_RISK_SCORE;
use crate::utils;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Threat,
    Wallet,
    Contract,
    Incident,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub alert_type: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub source: String,
    pub is_read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertFilter {
    #[default]
    All,
    Unread,
    Severity(Severity),
}

impl AlertFilter {
    pub fn matches(&self, alert: &Alert) -> bool {
        match self {
            AlertFilter::All => true,
            AlertFilter::Unread => !alert.is_read,
            AlertFilter::Severity(s) => alert.severity == *s,
        }
    }
}

impl FromStr for AlertFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(AlertFilter::All),
            "unread" => Ok(AlertFilter::Unread),
            "low" => Ok(AlertFilter::Severity(Severity::Low)),
            "medium" => Ok(AlertFilter::Severity(Severity::Medium)),
            "high" => Ok(AlertFilter::Severity(Severity::High)),
            "critical" => Ok(AlertFilter::Severity(Severity::Critical)),
            other => Err(format!(
                "unknown alert filter '{}' (expected all, unread, low, medium, high or critical)",
                other
            )),
        }
    }
}

/// Every stored record as an alert, newest first
pub fn build_alerts(data: &DemoData) -> Vec<Alert> {
    let threats = data.threats.iter().map(|t| Alert {
        id: t.id.clone(),
        alert_type: AlertKind::Threat,
        severity: Severity::from_alert_score(t.risk_score),
        message: format!("Threat detected: {}", t.threat_type),
        source: t.url.clone(),
        is_read: false,
        created_at: t.detected_at.clone(),
    });
    let wallets = data.wallet_screenings.iter().map(|w| Alert {
        id: w.id.clone(),
        alert_type: AlertKind::Wallet,
        severity: w.risk_level,
        message: format!("Wallet screening: {} risk", w.risk_level),
        source: w.wallet_address.clone(),
        is_read: false,
        created_at: w.created_at.clone(),
    });
    let audits = data.contract_audits.iter().map(|a| Alert {
        id: a.id.clone(),
        alert_type: AlertKind::Contract,
        severity: a.risk_level,
        message: format!("Contract audit: {} issues found", a.issues_found),
        source: a.contract_address.clone(),
        is_read: false,
        created_at: a.created_at.clone(),
    });
    let incidents = data.incidents.iter().map(|i| Alert {
        id: i.id.clone(),
        alert_type: AlertKind::Incident,
        severity: i.severity,
        message: format!("Incident: {}", i.title),
        source: i.incident_type.to_string(),
        is_read: false,
        created_at: i.created_at.clone(),
    });

    let mut alerts: Vec<Alert> = threats.chain(wallets).chain(audits).chain(incidents).collect();
    // unparsable timestamps sort last
    alerts.sort_by_key(|a| std::cmp::Reverse(utils::parse_timestamp(&a.created_at)));
    alerts
}

pub fn filter_alerts(alerts: Vec<Alert>, filter: AlertFilter) -> Vec<Alert> {
    alerts.into_iter().filter(|a| filter.matches(a)).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

/// Audit security scores grouped into the report bands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditScoreBands {
    #[serde(rename = "90-100")]
    pub excellent: usize,
    #[serde(rename = "80-89")]
    pub good: usize,
    #[serde(rename = "70-79")]
    pub fair: usize,
    #[serde(rename = "Below 70")]
    pub poor: usize,
}

impl AuditScoreBands {
    fn record(&mut self, score: u8) {
        match score {
            90.. => self.excellent += 1,
            80..=89 => self.good += 1,
            70..=79 => self.fair += 1,
            _ => self.poor += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: String,
    pub threats: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_threats: usize,
    pub high_risk_threats: usize,
    pub total_audits: usize,
    pub failed_audits: usize,
    /// Rounded mean security score, 0 without audits
    pub average_audit_score: u8,
    /// Audits not failed as a rounded percentage
    pub audit_pass_rate: u8,
    pub audit_score_bands: AuditScoreBands,
    pub total_incidents: usize,
    pub open_incidents: usize,
    pub total_screenings: usize,
    pub high_risk_wallets: usize,
    pub threats_by_type: BTreeMap<String, usize>,
    pub incidents_by_severity: BTreeMap<Severity, usize>,
    pub threat_risk_breakdown: RiskBreakdown,
    pub threats_last_7_days: Vec<DailyCount>,
    /// Resolved incidents as a rounded percentage of all incidents
    pub incident_resolution_rate: u8,
}

pub fn summarize(data: &DemoData, now: DateTime<Utc>) -> AnalyticsSummary {
    let mut threats_by_type = BTreeMap::new();
    for threat in &data.threats {
        *threats_by_type.entry(threat.threat_type.to_string()).or_insert(0) += 1;
    }

    let (low, medium, high, critical) = risk_breakdown(data.threats.iter().map(|t| t.risk_score));

    let audits = &data.contract_audits;
    let failed_audits = audits
        .iter()
        .filter(|a| matches!(a.risk_level, Severity::High | Severity::Critical))
        .count();
    let mut audit_score_bands = AuditScoreBands::default();
    for audit in audits {
        audit_score_bands.record(audit.security_score);
    }
    let total_score: u32 = audits.iter().map(|a| u32::from(a.security_score)).sum();
    let average_audit_score = rounded_ratio(total_score as usize, audits.len(), 1.0);
    let audit_pass_rate = rounded_ratio(audits.len() - failed_audits, audits.len(), 100.0);

    let mut incidents_by_severity = BTreeMap::new();
    for incident in &data.incidents {
        *incidents_by_severity.entry(incident.severity).or_insert(0) += 1;
    }

    let resolved = data
        .incidents
        .iter()
        .filter(|i| i.status == IncidentStatus::Resolved)
        .count();
    let incident_resolution_rate = rounded_ratio(resolved, data.incidents.len(), 100.0);

    AnalyticsSummary {
        total_threats: data.threats.len(),
        high_risk_threats: data.threats.iter().filter(|t| t.risk_score >= HIGH_RISK_SCORE).count(),
        total_audits: audits.len(),
        failed_audits,
        average_audit_score,
        audit_pass_rate,
        audit_score_bands,
        total_incidents: data.incidents.len(),
        open_incidents: data
            .incidents
            .iter()
            .filter(|i| i.status == IncidentStatus::Open)
            .count(),
        total_screenings: data.wallet_screenings.len(),
        high_risk_wallets: data
            .wallet_screenings
            .iter()
            .filter(|w| w.risk_score >= HIGH_RISK_SCORE)
            .count(),
        threats_by_type,
        incidents_by_severity,
        threat_risk_breakdown: RiskBreakdown { low, medium, high, critical },
        threats_last_7_days: threats_per_day(data, now, 7),
        incident_resolution_rate,
    }
}

/// `part / whole * scale`, rounded and clamped to 0-100; 0 when `whole` is 0
fn rounded_ratio(part: usize, whole: usize, scale: f64) -> u8 {
    if whole == 0 {
        return 0;
    }
    scoring::clamp_score((part as f64 / whole as f64 * scale).round() as i32)
}

/// Threat counts per UTC day, oldest first, ending with `now`'s day
pub fn threats_per_day(data: &DemoData, now: DateTime<Utc>, days: i64) -> Vec<DailyCount> {
    (0..days)
        .rev()
        .map(|offset| {
            let day = (now - Duration::days(offset)).date_naive();
            let threats = data
                .threats
                .iter()
                .filter_map(|t| utils::parse_timestamp(&t.detected_at))
                .filter(|at| at.date_naive() == day)
                .count();
            DailyCount {
                date: day.format("%Y-%m-%d").to_string(),
                threats,
            }
        })
        .collect()
}
