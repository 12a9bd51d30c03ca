use crate::alerts::{Alert, AnalyticsSummary};
use crate::models::{
    ContractAudit, DashboardStats, Incident, IncidentCounts, Severity, Threat, WalletScreening,
};
use crate::monitor::ThreatEvent;
use crate::scoring::contract::{FileAudit, QualityStatus};
use crate::scoring::{PhishingAnalysis, PipelineResult, VulnerabilityReport};
use crate::utils;
use console::{style, StyledObject, Term};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub type UiResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Terminal renderer for command results
pub struct TerminalUI {
    term: Term,
    interactive: bool,
}

impl TerminalUI {
    pub fn new(interactive: bool) -> Self {
        Self {
            term: Term::stdout(),
            interactive,
        }
    }

    pub fn banner(&self, user_id: &str) {
        if !self.interactive {
            return;
        }
        println!();
        println!("    {}", style("⛓  CHAINSENTRY").cyan().bold());
        println!("    {}", style("Blockchain threat intelligence toolkit").dim().italic());
        println!(
            "    {} {}  {} {}  {} {}",
            style("user").dim(),
            style(user_id).white().bold(),
            style("host").dim(),
            style(whoami::devicename()).white(),
            style("os").dim(),
            style(format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH)).white()
        );
        println!();
    }

    /// Spinner shown while a paced operation runs
    pub fn spinner(&self, message: &str) -> UiResult<ProgressBar> {
        let bar = if self.interactive {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("{prefix} {spinner:.green} {msg}")?
                .tick_strings(&["▰▱▱▱", "▰▰▱▱", "▰▰▰▱", "▰▰▰▰", "▱▰▰▰", "▱▱▰▰", "▱▱▱▰", "✓"]),
        );
        bar.set_prefix(style("🔍").to_string());
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Ok(bar)
    }

    /// Bar for the staged contract audit
    pub fn step_progress(&self, steps: u64) -> UiResult<ProgressBar> {
        let bar = if self.interactive {
            ProgressBar::new(steps)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::with_template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        bar.set_prefix(style("📜 AUDIT").green().bold().to_string());
        Ok(bar)
    }

    pub fn finish(&self) {
        let _ = self.term.show_cursor();
    }

    pub fn success(&self, message: &str) {
        println!("    {} {}", style("✓").green().bold(), style(message).white().bold());
    }

    pub fn print_threat(&self, threat: &Threat) {
        header("THREAT SCAN");
        field("URL", &threat.url);
        field("Type", &threat.threat_type.to_string());
        field("Risk score", &score_bar(threat.risk_score));
        field("Status", &threat.status.to_string());
        field("HTTPS", yes_no(threat.metadata.https));
        field("Suspicious keywords", yes_no(threat.metadata.suspicious_keywords));
        field("Suspicious TLD", yes_no(threat.metadata.suspicious_tld));
        field("Record id", &threat.id);
        println!();
    }

    pub fn print_threat_list(&self, threats: &[&Threat]) {
        header("THREATS");
        if threats.is_empty() {
            empty("No threats recorded");
            return;
        }
        for threat in threats {
            println!(
                "   {:<15} {:>3}  {:<10} {:<14} {}",
                style(&threat.id).dim(),
                colored_score(threat.risk_score),
                threat.threat_type.to_string(),
                threat.status.to_string(),
                utils::truncate(&threat.url, 60)
            );
        }
        println!();
    }

    pub fn print_phishing(&self, analysis: &PhishingAnalysis) {
        header("PHISHING ANALYSIS");
        field("URL", &analysis.url);
        let verdict = if analysis.is_phishing {
            style("PHISHING").red().bold().to_string()
        } else {
            style("likely safe").green().to_string()
        };
        field("Verdict", &verdict);
        field("Risk score", &score_bar(analysis.risk_score));
        let features = &analysis.url_features;
        field("SSL", yes_no(features.has_ssl));
        field("IP host", yes_no(features.ip_address));
        field("URL length", &features.url_length.to_string());
        field("Subdomains", &features.subdomain_count.to_string());
        field("Domain age", &features.domain_age);
        if !features.suspicious_keywords.is_empty() {
            field("Keywords", &features.suspicious_keywords.join(", "));
        }
        indicators(analysis.indicators.iter().map(|i| (i.severity, i.description.as_str())));
    }

    pub fn print_pipeline(&self, result: &PipelineResult) {
        header("DETECTION PIPELINE");
        field("URL", &result.url);
        let pre = &result.preprocessing_phase;
        field(
            "DOM tree",
            &format!(
                "{} nodes, depth {}, {} forms",
                pre.dom_tree.node_count, pre.dom_tree.depth, pre.dom_tree.form_elements
            ),
        );
        let links = &pre.extracted_features.hyperlink_features;
        field(
            "Links",
            &format!(
                "{} external, {} internal, {} broken",
                links.external_links, links.internal_links, links.broken_links
            ),
        );
        let prediction = &result.detection_phase.model_prediction;
        field(
            "Prediction",
            &format!(
                "{} ({:.1}% confidence)",
                prediction.class_label,
                prediction.confidence * 100.0
            ),
        );
        field(
            "Model accuracy",
            &format!(
                "train {:.0}%, test {:.0}%",
                result.detection_phase.training_accuracy * 100.0,
                result.detection_phase.testing_accuracy * 100.0
            ),
        );
        field("Risk score", &score_bar(result.risk_score));
        indicators(result.indicators.iter().map(|i| (i.severity, i.description.as_str())));
    }

    pub fn print_audit(&self, audit: &ContractAudit, report: &VulnerabilityReport) {
        header("CONTRACT AUDIT");
        field("Contract", &audit.contract_address);
        field("Chain", &audit.blockchain.to_string());
        field("Security score", &score_bar(report.security_score));
        field("Risk level", &severity_label(report.risk_level).to_string());
        field("Issues", &audit.issues_found.to_string());

        for vuln in &report.vulnerabilities {
            let line = vuln
                .line_number
                .map(|n| format!(" (line {})", n))
                .unwrap_or_default();
            println!(
                "   {} {} {}{}",
                severity_label(vuln.severity),
                style(&vuln.id).dim(),
                style(&vuln.title).white().bold(),
                style(line).dim()
            );
            println!("      {}", vuln.description);
            println!("      {} {}", style("fix:").cyan(), vuln.recommendation);
        }

        if !report.gas_optimization.is_empty() {
            println!();
            println!("   {}", style("Gas optimisation").yellow().bold());
            for gas in &report.gas_optimization {
                println!("      {} ({})", gas.issue, style(&gas.savings).dim());
            }
        }
        if !report.code_quality.is_empty() {
            println!();
            println!("   {}", style("Code quality").yellow().bold());
            for metric in &report.code_quality {
                let status = match metric.status {
                    QualityStatus::Good => style("good").green(),
                    QualityStatus::Warning => style("warning").yellow(),
                    QualityStatus::Poor => style("poor").red(),
                };
                println!("      {:<24} {:<10} {}", metric.metric, metric.value, status);
            }
        }
        if !report.recommendations.is_empty() {
            println!();
            println!("   {}", style("Recommendations").yellow().bold());
            for rec in &report.recommendations {
                println!("      • {}", rec);
            }
        }
        println!();
    }

    pub fn print_directory_audit(&self, audits: &[FileAudit]) {
        header("DIRECTORY AUDIT");
        if audits.is_empty() {
            empty("No Solidity files found");
            return;
        }
        for entry in audits {
            println!(
                "   {:>3}  {:<9} {:>2} issues  {}",
                colored_score(entry.report.security_score),
                severity_label(entry.audit.risk_level),
                entry.audit.issues_found,
                entry.path.display()
            );
        }
        let risky = audits
            .iter()
            .filter(|a| a.audit.risk_level >= Severity::High)
            .count();
        println!();
        field("Files audited", &audits.len().to_string());
        field("High or critical", &risky.to_string());
        println!();
    }

    pub fn print_audit_list(&self, audits: &[ContractAudit]) {
        header("CONTRACT AUDITS");
        if audits.is_empty() {
            empty("No audits recorded");
            return;
        }
        for audit in audits {
            println!(
                "   {:<15} {:<44} {:<9} {:<9} {:>2} issues  {}",
                style(&audit.id).dim(),
                audit.contract_address,
                audit.blockchain.to_string(),
                severity_label(audit.risk_level),
                audit.issues_found,
                audit.status
            );
        }
        println!();
    }

    pub fn print_wallet(&self, screening: &WalletScreening) {
        header("WALLET SCREENING");
        field("Address", &screening.wallet_address);
        field("Chain", &screening.blockchain.to_string());
        field("Risk score", &score_bar(screening.risk_score));
        field("Risk level", &severity_label(screening.risk_level).to_string());
        let sanctions = if screening.sanctions_match {
            style("MATCH").red().bold().to_string()
        } else {
            style("clear").green().to_string()
        };
        field("Sanctions", &sanctions);
        let exposure = &screening.exposure_data;
        field(
            "Exposure",
            &format!(
                "exchanges {}, mixers {}, gambling {}, defi {}, nft {}",
                exposure.exchanges, exposure.mixers, exposure.gambling, exposure.defi, exposure.nft
            ),
        );
        for flag in &screening.flags {
            println!("   {} {}", style("⚑").yellow(), flag);
        }
        println!();
    }

    pub fn print_wallet_list(&self, screenings: &[WalletScreening]) {
        header("WALLET SCREENINGS");
        if screenings.is_empty() {
            empty("No screenings recorded");
            return;
        }
        for s in screenings {
            println!(
                "   {:<15} {:<44} {:<9} {:>3}  {}{}",
                style(&s.id).dim(),
                s.wallet_address,
                s.blockchain.to_string(),
                colored_score(s.risk_score),
                severity_label(s.risk_level),
                if s.sanctions_match { "  (sanctioned)" } else { "" }
            );
        }
        println!();
    }

    pub fn print_incident(&self, incident: &Incident) {
        header("INCIDENT");
        field("Id", &incident.id);
        field("Title", &incident.title);
        field("Severity", &severity_label(incident.severity).to_string());
        field("Status", &incident.status.to_string());
        field("Type", &incident.incident_type.to_string());
        if !incident.description.is_empty() {
            field("Description", &incident.description);
        }
        if !incident.affected_assets.is_empty() {
            field("Assets", &incident.affected_assets.join(", "));
        }
        field("Updated", &incident.updated_at);
        println!();
    }

    pub fn print_incident_list(&self, incidents: &[&Incident], counts: &IncidentCounts) {
        header("INCIDENTS");
        println!(
            "   total {}  open {}  investigating {}  resolved {}  critical {}",
            style(counts.total).white().bold(),
            style(counts.open).yellow(),
            style(counts.investigating).cyan(),
            style(counts.resolved).green(),
            style(counts.critical).red().bold()
        );
        println!();
        if incidents.is_empty() {
            empty("No matching incidents");
            return;
        }
        for incident in incidents {
            println!(
                "   {:<15} {:<9} {:<14} {:<20} {}",
                style(&incident.id).dim(),
                severity_label(incident.severity),
                incident.status.to_string(),
                incident.incident_type.to_string(),
                utils::truncate(&incident.title, 50)
            );
        }
        println!();
    }

    pub fn print_stats(&self, stats: &DashboardStats) {
        header("DASHBOARD");
        println!("   {} Active threats:     {}", style("🚨").red(), style(stats.active_threats).white().bold());
        println!("   {} High-risk threats:  {}", style("🔥").red(), style(stats.high_risk_threats).red().bold());
        println!("   {} Contracts audited:  {}", style("📜").blue(), style(stats.contracts_audited).white().bold());
        println!("   {} Open incidents:     {}", style("📂").blue(), style(stats.open_incidents).white().bold());
        println!("   {} Critical incidents: {}", style("⚠").yellow(), style(stats.critical_incidents).red().bold());
        println!("   {} Alerts (24h):       {}", style("🔔").blue(), style(stats.alerts_24h).white().bold());
        println!();
    }

    pub fn print_alerts(&self, alerts: &[Alert]) {
        header("ALERTS");
        if alerts.is_empty() {
            empty("No alerts");
            return;
        }
        for alert in alerts {
            println!(
                "   {:<9} {:<24} {}  {}",
                severity_label(alert.severity),
                style(&alert.created_at).dim(),
                alert.message,
                style(utils::truncate(&alert.source, 48)).dim()
            );
        }
        println!();
    }

    pub fn print_analytics(&self, summary: &AnalyticsSummary) {
        header("ANALYTICS");
        field(
            "Threats",
            &format!("{} ({} high risk)", summary.total_threats, summary.high_risk_threats),
        );
        field(
            "Audits",
            &format!("{} ({} failed)", summary.total_audits, summary.failed_audits),
        );
        field(
            "Incidents",
            &format!("{} ({} open)", summary.total_incidents, summary.open_incidents),
        );
        field(
            "Screenings",
            &format!("{} ({} high risk)", summary.total_screenings, summary.high_risk_wallets),
        );
        field("Resolution rate", &format!("{}%", summary.incident_resolution_rate));
        field("Average audit score", &format!("{}/100", summary.average_audit_score));
        field("Audit pass rate", &format!("{}%", summary.audit_pass_rate));

        let bands = &summary.audit_score_bands;
        field(
            "Audit scores",
            &format!(
                "90-100: {}, 80-89: {}, 70-79: {}, below 70: {}",
                bands.excellent, bands.good, bands.fair, bands.poor
            ),
        );
        if !summary.incidents_by_severity.is_empty() {
            let by_severity: Vec<String> = summary
                .incidents_by_severity
                .iter()
                .map(|(severity, count)| format!("{} {}", severity, count))
                .collect();
            field("Incident severity", &by_severity.join(", "));
        }

        let breakdown = &summary.threat_risk_breakdown;
        field(
            "Risk breakdown",
            &format!(
                "low {}, medium {}, high {}, critical {}",
                breakdown.low, breakdown.medium, breakdown.high, breakdown.critical
            ),
        );
        for (threat_type, count) in &summary.threats_by_type {
            println!("      {:<12} {}", threat_type, count);
        }

        println!();
        println!("   {}", style("Threats, last 7 days").yellow().bold());
        for day in &summary.threats_last_7_days {
            println!("      {}  {}", day.date, style("▇".repeat(day.threats.min(40))).cyan());
        }
        println!();
    }

    pub fn print_event(&self, event: &ThreatEvent) {
        let target = event
            .target
            .as_deref()
            .map(|t| format!(" → {}", t))
            .unwrap_or_default();
        println!(
            "   {} {:<9} {:<22} {}",
            style(&event.timestamp).dim(),
            severity_label(event.severity),
            style(event.event_type.to_string()).yellow(),
            event.description
        );
        println!(
            "      {}{} on {}, {} ({} users)",
            style(&event.source).dim(),
            style(target).dim(),
            event.details.blockchain,
            event.details.amount,
            event.details.affected_users
        );
    }
}

impl Drop for TerminalUI {
    fn drop(&mut self) {
        let _ = self.term.show_cursor();
    }
}

fn header(title: &str) {
    println!();
    println!("{}", style(format!("══ {} ", title)).cyan().bold());
    println!();
}

fn field(label: &str, value: &str) {
    println!("   {:<20} {}", style(format!("{}:", label)).dim(), value);
}

fn empty(message: &str) {
    println!("   {}", style(message).dim());
    println!();
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn indicators<'a>(items: impl Iterator<Item = (Severity, &'a str)>) {
    let items: Vec<_> = items.collect();
    if items.is_empty() {
        println!();
        return;
    }
    println!();
    println!("   {}", style("Indicators").yellow().bold());
    for (severity, description) in items {
        println!("      {} {}", severity_label(severity), description);
    }
    println!();
}

pub fn severity_label(severity: Severity) -> StyledObject<String> {
    let label = format!("{:<8}", severity.as_str().to_uppercase());
    match severity {
        Severity::Low => style(label).green(),
        Severity::Medium => style(label).yellow(),
        Severity::High => style(label).red(),
        Severity::Critical => style(label).red().bold(),
    }
}

fn colored_score(score: u8) -> StyledObject<u8> {
    match score {
        0..=39 => style(score).green(),
        40..=69 => style(score).yellow(),
        _ => style(score).red().bold(),
    }
}

/// Ten-cell gauge followed by the numeric score
pub fn score_bar(score: u8) -> String {
    let filled = (usize::from(score.min(100)) + 5) / 10;
    format!(
        "{}{} {}",
        "█".repeat(filled),
        "░".repeat(10 - filled),
        colored_score(score)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bar_cells() {
        console::set_colors_enabled(false);
        assert_eq!(score_bar(0), format!("{} 0", "░".repeat(10)));
        assert_eq!(score_bar(100), format!("{} 100", "█".repeat(10)));
        assert!(score_bar(54).starts_with("█████░"));
    }

    #[test]
    fn test_severity_label_is_padded() {
        console::set_colors_enabled(false);
        assert_eq!(severity_label(Severity::Low).to_string(), "LOW     ");
        assert_eq!(severity_label(Severity::Critical).to_string(), "CRITICAL");
    }
}
