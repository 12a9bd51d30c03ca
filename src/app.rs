//! Command dispatch: ties settings, store, scoring engines and the terminal
//! renderer together for one CLI invocation.

use crate::alerts;
use crate::cli::{Args, Command, IncidentAction, IncidentFields};
use crate::config::Settings;
use crate::errors::{SentryError, SentryResult};
use crate::models::{AuditStatus, Blockchain, ContractAudit, Severity};
use crate::monitor::ThreatMonitor;
use crate::scoring::{self, ContractAuditor, WalletScreener};
use crate::store::{AuditUpdate, DemoStore, IncidentUpdate, NewIncident};
use crate::ui::TerminalUI;
use crate::utils::{self, pace};
use crate::validation;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

pub struct ChainSentry {
    settings: Settings,
    store: DemoStore,
    ui: TerminalUI,
}

impl ChainSentry {
    pub fn new(args: &Args) -> SentryResult<Self> {
        let settings = Settings::from_args(args)?;
        let store = DemoStore::open(&settings.data_dir, &settings.user_id)?;
        log::debug!("Using store {:?}", store.path());
        let ui = TerminalUI::new(settings.interactive());
        Ok(Self { settings, store, ui })
    }

    pub async fn run(mut self, command: Command) -> SentryResult<()> {
        self.ui.banner(self.store.user_id());
        let result = self.dispatch(command).await;
        self.ui.finish();
        result
    }

    async fn dispatch(&mut self, command: Command) -> SentryResult<()> {
        match command {
            Command::Scan { url } => self.scan(&url).await,
            Command::Phishing { url, pipeline, seed } => self.phishing(&url, pipeline, seed).await,
            Command::Threats { filter } => {
                let threats = self.store.threats(filter);
                if self.settings.json {
                    return emit_json(&threats);
                }
                self.ui.print_threat_list(&threats);
                Ok(())
            }
            Command::ThreatStatus { id, status } => {
                let threat = self.store.update_threat_status(&id, status)?.clone();
                self.store.save()?;
                if self.settings.json {
                    return emit_json(&threat);
                }
                self.ui.success(&format!("Threat {} marked {}", threat.id, threat.status));
                Ok(())
            }
            Command::Audit { address, file, chain } => self.audit(&address, &file, chain).await,
            Command::AuditDir { dir, chain, threads } => self.audit_dir(&dir, chain, threads).await,
            Command::Audits => {
                let audits = &self.store.data().contract_audits;
                if self.settings.json {
                    return emit_json(audits);
                }
                self.ui.print_audit_list(audits);
                Ok(())
            }
            Command::Wallet { address, chain, seed } => self.wallet(&address, chain, seed).await,
            Command::Wallets => {
                let screenings = &self.store.data().wallet_screenings;
                if self.settings.json {
                    return emit_json(screenings);
                }
                self.ui.print_wallet_list(screenings);
                Ok(())
            }
            Command::Incident { action } => self.incident(action),
            Command::Stats => {
                let stats = self.store.stats(Utc::now());
                if self.settings.json {
                    return emit_json(&stats);
                }
                self.ui.print_stats(&stats);
                Ok(())
            }
            Command::Alerts { filter } => {
                let feed = alerts::filter_alerts(alerts::build_alerts(self.store.data()), filter);
                if self.settings.json {
                    return emit_json(&feed);
                }
                self.ui.print_alerts(&feed);
                Ok(())
            }
            Command::Analytics => {
                let summary = alerts::summarize(self.store.data(), Utc::now());
                if self.settings.json {
                    return emit_json(&summary);
                }
                self.ui.print_analytics(&summary);
                Ok(())
            }
            Command::Monitor {
                duration,
                interval,
                probability,
            } => self.monitor(duration, interval, probability).await,
        }
    }

    async fn scan(&mut self, url: &str) -> SentryResult<()> {
        validation::validate_url(url)?;
        let spinner = self.ui.spinner(&format!("Scanning {}", url)).map_err(ui_error)?;
        pace(self.settings.pacing, self.settings.delays.threat_scan).await;
        let threat = scoring::scan_threat(url)?;
        spinner.finish_and_clear();

        self.store.add_threat(threat.clone());
        self.store.save()?;

        if self.settings.json {
            return emit_json(&threat);
        }
        self.ui.print_threat(&threat);
        Ok(())
    }

    async fn phishing(&mut self, url: &str, pipeline: bool, seed: Option<u64>) -> SentryResult<()> {
        validation::validate_url(url)?;
        let spinner = self.ui.spinner(&format!("Analyzing {}", url)).map_err(ui_error)?;

        if pipeline {
            pace(self.settings.pacing, self.settings.delays.pipeline).await;
            let mut rng = seeded_rng(seed);
            let result = scoring::analyze_url_with_pipeline(url, &mut rng)?;
            spinner.finish_and_clear();
            if self.settings.json {
                return emit_json(&result);
            }
            self.ui.print_pipeline(&result);
        } else {
            pace(self.settings.pacing, self.settings.delays.phishing).await;
            let analysis = scoring::analyze_url(url)?;
            spinner.finish_and_clear();
            if self.settings.json {
                return emit_json(&analysis);
            }
            self.ui.print_phishing(&analysis);
        }
        Ok(())
    }

    /// Record an in-progress audit, walk the paced stages, then complete it
    async fn audit(&mut self, address: &str, file: &Path, chain: Blockchain) -> SentryResult<()> {
        let code = std::fs::read_to_string(file).map_err(|e| SentryError::io(e, Some(file.to_path_buf())))?;
        validation::validate_contract_address(address)?;
        validation::validate_contract_code(&code)?;

        let pending = ContractAudit {
            id: utils::next_id(),
            contract_address: address.to_string(),
            blockchain: chain,
            risk_level: Severity::Low,
            issues_found: 0,
            status: AuditStatus::InProgress,
            vulnerabilities: Vec::new(),
            security_score: 0,
            code_sha256: None,
            created_at: utils::now_timestamp(),
        };
        let pending_id = pending.id.clone();
        self.store.add_contract_audit(pending);
        self.store.save()?;

        let steps = self.settings.delays.audit_steps;
        let progress = self.ui.step_progress(steps.len() as u64).map_err(ui_error)?;
        for (label, millis) in steps {
            progress.set_message(label);
            pace(self.settings.pacing, millis).await;
            progress.inc(1);
        }
        progress.finish_and_clear();

        let outcome = ContractAuditor::new().and_then(|auditor| auditor.audit(address, &code, chain));
        let (audit, report) = match outcome {
            Ok(done) => done,
            Err(e) => {
                let failed = AuditUpdate {
                    status: Some(AuditStatus::Failed),
                    ..AuditUpdate::default()
                };
                self.store.update_contract_audit(&pending_id, failed)?;
                self.store.save()?;
                return Err(e);
            }
        };

        let stored = self
            .store
            .update_contract_audit(&pending_id, AuditUpdate::from_completed(&audit))?
            .clone();
        self.store.save()?;

        if self.settings.json {
            return emit_json(&report);
        }
        self.ui.print_audit(&stored, &report);
        Ok(())
    }

    async fn audit_dir(&mut self, dir: &Path, chain: Blockchain, threads: usize) -> SentryResult<()> {
        let spinner = self
            .ui
            .spinner(&format!("Auditing contracts under {}", dir.display()))
            .map_err(ui_error)?;
        let auditor = ContractAuditor::new()?;
        let audits = auditor.audit_directory(dir, chain, threads)?;
        spinner.finish_and_clear();

        for entry in &audits {
            self.store.add_contract_audit(entry.audit.clone());
        }
        self.store.save()?;

        if self.settings.json {
            let reports: Vec<_> = audits.iter().map(|a| &a.report).collect();
            return emit_json(&reports);
        }
        self.ui.print_directory_audit(&audits);
        Ok(())
    }

    async fn wallet(&mut self, address: &str, chain: Blockchain, seed: Option<u64>) -> SentryResult<()> {
        validation::validate_wallet_address(address)?;
        let spinner = self.ui.spinner(&format!("Screening {}", address)).map_err(ui_error)?;
        pace(self.settings.pacing, self.settings.delays.wallet).await;
        let mut screener = match seed {
            Some(seed) => WalletScreener::with_seed(seed),
            None => WalletScreener::new(),
        };
        let screening = screener.screen(address, chain)?;
        spinner.finish_and_clear();

        self.store.add_wallet_screening(screening.clone());
        self.store.save()?;

        if self.settings.json {
            return emit_json(&screening);
        }
        self.ui.print_wallet(&screening);
        Ok(())
    }

    fn incident(&mut self, action: IncidentAction) -> SentryResult<()> {
        match action {
            IncidentAction::Create(IncidentFields {
                title,
                description,
                severity,
                incident_type,
                assets,
            }) => {
                let incident = NewIncident {
                    title,
                    description,
                    severity,
                    incident_type,
                    affected_assets: assets,
                }
                .into_incident()?;
                self.store.add_incident(incident.clone());
                self.store.save()?;
                if self.settings.json {
                    return emit_json(&incident);
                }
                self.ui.print_incident(&incident);
            }
            IncidentAction::List { filter, search } => {
                let incidents = self.store.incidents(filter, search.as_deref());
                if self.settings.json {
                    return emit_json(&incidents);
                }
                self.ui.print_incident_list(&incidents, &self.store.incident_counts());
            }
            IncidentAction::Update {
                id,
                title,
                description,
                severity,
                status,
                incident_type,
                assets,
            } => {
                let update = IncidentUpdate {
                    title,
                    description,
                    severity,
                    status,
                    incident_type,
                    affected_assets: assets.map(|list| {
                        list.into_iter()
                            .map(|a| a.trim().to_string())
                            .filter(|a| !a.is_empty())
                            .collect()
                    }),
                };
                let incident = self.store.update_incident(&id, update)?.clone();
                self.store.save()?;
                if self.settings.json {
                    return emit_json(&incident);
                }
                self.ui.print_incident(&incident);
            }
            IncidentAction::Delete { id } => {
                let removed = self.store.delete_incident(&id)?;
                self.store.save()?;
                if self.settings.json {
                    return emit_json(&removed);
                }
                self.ui.success(&format!("Deleted incident {} ({})", removed.id, removed.title));
            }
        }
        Ok(())
    }

    async fn monitor(&mut self, duration: Option<u64>, interval: u64, probability: f64) -> SentryResult<()> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(SentryError::InvalidInput(format!(
                "Emit probability must be between 0 and 1, got {}",
                probability
            )));
        }

        let monitor = ThreatMonitor::new(Duration::from_secs(interval.max(1)), probability);
        let mut subscription = monitor.subscribe();
        monitor.start();
        if !self.settings.json {
            self.ui.success("Live threat feed started (Ctrl-C to stop)");
        }

        let deadline = async move {
            match duration {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut received = 0usize;
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                _ = tokio::signal::ctrl_c() => {
                    log::info!("Interrupted, stopping threat feed");
                    break;
                }
                event = subscription.events.recv() => {
                    let Some(event) = event else { break };
                    received += 1;
                    if self.settings.json {
                        println!("{}", serde_json::to_string(&event)?);
                    } else {
                        self.ui.print_event(&event);
                    }
                }
            }
        }

        monitor.unsubscribe(subscription.id);
        monitor.stop();
        log::info!("Threat feed closed after {} events", received);
        Ok(())
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn emit_json<T: Serialize + ?Sized>(value: &T) -> SentryResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn ui_error(e: Box<dyn std::error::Error + Send + Sync>) -> SentryError {
    SentryError::external("terminal", e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IncidentStatus, ThreatStatus};
    use clap::Parser;
    use tempfile::tempdir;

    const VULNERABLE: &str = r#"
pragma solidity ^0.7.0;
contract Vault {
    mapping(address => uint) balances;
    function withdraw() public {
        msg.sender.call{value: balances[msg.sender]}("");
        balances[msg.sender] = 0;
    }
}
"#;

    fn app(dir: &Path, extra: &[&str]) -> (ChainSentry, Command) {
        let data_dir = dir.to_string_lossy().to_string();
        let mut argv = vec!["chainsentry", "--data-dir", data_dir.as_str(), "--no-delay", "--quiet"];
        argv.extend_from_slice(extra);
        let args = Args::try_parse_from(argv).unwrap();
        let command = args.command.clone();
        (ChainSentry::new(&args).unwrap(), command)
    }

    fn reopen(dir: &Path) -> DemoStore {
        DemoStore::open(dir, "demo").unwrap()
    }

    #[tokio::test]
    async fn test_scan_is_persisted() {
        let dir = tempdir().unwrap();
        let (app, cmd) = app(dir.path(), &["scan", "http://metamask-login.xyz"]);
        app.run(cmd).await.unwrap();

        let store = reopen(dir.path());
        assert_eq!(store.data().threats.len(), 1);
        assert_eq!(store.data().threats[0].status, ThreatStatus::Active);
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_without_writing() {
        let dir = tempdir().unwrap();
        let (app, cmd) = app(dir.path(), &["scan", "not a url"]);
        assert!(matches!(app.run(cmd).await, Err(SentryError::Validation(_))));
        assert!(reopen(dir.path()).data().threats.is_empty());
    }

    #[tokio::test]
    async fn test_audit_completes_pending_record() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("Vault.sol");
        std::fs::write(&source, VULNERABLE).unwrap();
        let source = source.to_string_lossy().to_string();

        let address = "0x5FbDB2315678afecb367f032d93F642f64180aa3";
        let (app, cmd) = app(dir.path(), &["audit", address, "--file", source.as_str()]);
        app.run(cmd).await.unwrap();

        let store = reopen(dir.path());
        let audits = &store.data().contract_audits;
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0].status, AuditStatus::Completed);
        assert!(audits[0].issues_found > 0);
        assert!(audits[0].code_sha256.is_some());
    }

    #[tokio::test]
    async fn test_incident_lifecycle() {
        let dir = tempdir().unwrap();
        let (app_a, cmd) = app(
            dir.path(),
            &["incident", "create", "--title", "Bridge drain", "--severity", "critical", "--assets", "ETH, USDC"],
        );
        app_a.run(cmd).await.unwrap();

        let id = reopen(dir.path()).data().incidents[0].id.clone();
        let (app_b, cmd) = app(dir.path(), &["incident", "update", id.as_str(), "--status", "resolved"]);
        app_b.run(cmd).await.unwrap();

        let store = reopen(dir.path());
        assert_eq!(store.data().incidents[0].status, IncidentStatus::Resolved);
        assert_eq!(store.data().incidents[0].affected_assets, vec!["ETH", "USDC"]);

        let (app_c, cmd) = app(dir.path(), &["incident", "delete", id.as_str()]);
        app_c.run(cmd).await.unwrap();
        assert!(reopen(dir.path()).data().incidents.is_empty());

        let (app_d, cmd) = app(dir.path(), &["incident", "delete", id.as_str()]);
        assert!(matches!(app_d.run(cmd).await, Err(SentryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_monitor_rejects_bad_probability() {
        let dir = tempdir().unwrap();
        let (app, cmd) = app(dir.path(), &["monitor", "--probability", "1.5", "--duration", "1"]);
        assert!(matches!(app.run(cmd).await, Err(SentryError::InvalidInput(_))));
    }
}
