//! Smart contract vulnerability analysis
//!
//! Pattern rules over Solidity source. Each rule deducts a fixed penalty
//! from a starting security score of 100.

use crate::errors::{SentryError, SentryResult};
use crate::models::{AuditStatus, Blockchain, ContractAudit, Severity, Vulnerability};
use crate::utils;
use crate::validation;
use rand::Rng;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const EXTERNAL_CALL_PATTERN: &str = r"\.call\(|\.delegatecall\(";

/// What a rule looks for in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Check {
    Reentrancy,
    UncheckedCall,
    TxOrigin,
    AccessControl,
    IntegerOverflow,
    Delegatecall,
}

struct ContractRule {
    id: &'static str,
    check: Check,
    severity: Severity,
    title: &'static str,
    recommendation: &'static str,
    penalty: i32,
}

fn rule_definitions() -> Vec<ContractRule> {
    vec![
        ContractRule {
            id: "REEN-001",
            check: Check::Reentrancy,
            severity: Severity::Critical,
            title: "Reentrancy Vulnerability",
            recommendation: "Use OpenZeppelin ReentrancyGuard or checks-effects-interactions pattern",
            penalty: 30,
        },
        ContractRule {
            id: "EXT-002",
            check: Check::UncheckedCall,
            severity: Severity::High,
            title: "Unchecked External Call",
            recommendation: "Always check return values of external calls",
            penalty: 20,
        },
        ContractRule {
            id: "AUTH-003",
            check: Check::TxOrigin,
            severity: Severity::High,
            title: "tx.origin Used for Authorization",
            recommendation: "Use msg.sender instead of tx.origin",
            penalty: 20,
        },
        ContractRule {
            id: "ACC-004",
            check: Check::AccessControl,
            severity: Severity::Medium,
            title: "Missing Access Control",
            recommendation: "Implement proper access control using OpenZeppelin Ownable or AccessControl",
            penalty: 15,
        },
        ContractRule {
            id: "INT-005",
            check: Check::IntegerOverflow,
            severity: Severity::High,
            title: "Potential Integer Overflow",
            recommendation: "Upgrade to Solidity 0.8+ or use SafeMath library",
            penalty: 20,
        },
        ContractRule {
            id: "DELEG-006",
            check: Check::Delegatecall,
            severity: Severity::Medium,
            title: "Delegatecall Usage",
            recommendation: "Ensure delegatecall is only used with trusted contracts",
            penalty: 10,
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasOptimization {
    pub issue: String,
    pub savings: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityStatus {
    Good,
    Warning,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeQuality {
    pub metric: String,
    pub value: String,
    pub status: QualityStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityReport {
    pub contract_address: String,
    pub vulnerabilities: Vec<Vulnerability>,
    pub security_score: u8,
    pub risk_level: Severity,
    pub gas_optimization: Vec<GasOptimization>,
    pub code_quality: Vec<CodeQuality>,
    pub recommendations: Vec<String>,
}

/// Compiled rule set for Solidity source
pub struct ContractAnalyzer {
    rules: Vec<ContractRule>,
    external_call: Regex,
}

impl ContractAnalyzer {
    pub fn new() -> SentryResult<Self> {
        let external_call = Regex::new(EXTERNAL_CALL_PATTERN)
            .map_err(|e| SentryError::regex(e, EXTERNAL_CALL_PATTERN))?;
        Ok(Self {
            rules: rule_definitions(),
            external_call,
        })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Run every rule over `code`. A missing address is replaced by a random one.
    pub fn analyze<R: Rng + ?Sized>(&self, code: &str, address: Option<&str>, rng: &mut R) -> VulnerabilityReport {
        let mut vulnerabilities = Vec::new();
        let mut score = 100i32;

        for rule in &self.rules {
            if let Some(description) = self.evaluate(rule.check, code) {
                score -= rule.penalty;
                vulnerabilities.push(Vulnerability {
                    id: rule.id.to_string(),
                    severity: rule.severity,
                    title: rule.title.to_string(),
                    description,
                    line_number: self.locate(rule.check, code),
                    recommendation: rule.recommendation.to_string(),
                });
            }
        }

        let security_score = super::clamp_score(score);
        log::debug!(
            "Contract analysis found {} issues, security score {}",
            vulnerabilities.len(),
            security_score
        );

        VulnerabilityReport {
            contract_address: address
                .map(str::to_string)
                .unwrap_or_else(|| utils::random_address(rng)),
            vulnerabilities,
            security_score,
            risk_level: Severity::from_security_score(security_score),
            gas_optimization: default_gas_notes(),
            code_quality: default_quality_notes(),
            recommendations: default_recommendations(),
        }
    }

    /// Description of the finding, or `None` when the rule does not fire
    fn evaluate(&self, check: Check, code: &str) -> Option<String> {
        match check {
            Check::Reentrancy => {
                let external_value_call = code.contains(".call{value:") || code.contains(".call.value(");
                (external_value_call && !code.contains("nonReentrant"))
                    .then(|| "External call detected without reentrancy guard".to_string())
            }
            Check::UncheckedCall => {
                let calls = self.external_call.find_iter(code).count();
                (calls > 0 && !code.contains("require(success")).then(|| {
                    format!("Found {} external call(s) that may not check return values", calls)
                })
            }
            Check::TxOrigin => code.contains("tx.origin").then(|| {
                "Using tx.origin for authorization is vulnerable to phishing attacks".to_string()
            }),
            Check::AccessControl => (!code.contains("onlyOwner") && !code.contains("AccessControl"))
                .then(|| "No access control modifiers detected".to_string()),
            Check::IntegerOverflow => (!code.contains("pragma solidity ^0.8") && !code.contains("SafeMath"))
                .then(|| "Using Solidity version < 0.8.0 without SafeMath".to_string()),
            Check::Delegatecall => code
                .contains("delegatecall")
                .then(|| "Delegatecall can be dangerous if not used carefully".to_string()),
        }
    }

    /// 1-based line of the first offending line; whole-file rules have none
    fn locate(&self, check: Check, code: &str) -> Option<usize> {
        match check {
            Check::Reentrancy => first_line(code, |l| l.contains(".call")),
            Check::UncheckedCall => first_line(code, |l| self.external_call.is_match(l)),
            Check::TxOrigin => first_line(code, |l| l.contains("tx.origin")),
            Check::Delegatecall => first_line(code, |l| l.contains("delegatecall")),
            Check::AccessControl | Check::IntegerOverflow => None,
        }
    }
}

fn first_line(code: &str, pred: impl Fn(&str) -> bool) -> Option<usize> {
    code.lines().position(pred).map(|idx| idx + 1)
}

fn default_gas_notes() -> Vec<GasOptimization> {
    vec![
        GasOptimization {
            issue: "State variable packing".to_string(),
            savings: "~20,000 gas per transaction".to_string(),
        },
        GasOptimization {
            issue: "Use calldata instead of memory".to_string(),
            savings: "~5,000 gas per function call".to_string(),
        },
    ]
}

fn default_quality_notes() -> Vec<CodeQuality> {
    [
        ("Test Coverage", "85%", QualityStatus::Good),
        ("Code Complexity", "Medium", QualityStatus::Warning),
        ("Documentation", "70%", QualityStatus::Warning),
    ]
    .into_iter()
    .map(|(metric, value, status)| CodeQuality {
        metric: metric.to_string(),
        value: value.to_string(),
        status,
    })
    .collect()
}

fn default_recommendations() -> Vec<String> {
    [
        "Implement comprehensive test coverage for all functions",
        "Add NatSpec documentation for public functions",
        "Consider using OpenZeppelin's audited contracts",
        "Implement event logging for critical state changes",
        "Use SafeMath or Solidity 0.8+ for arithmetic operations",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// SHA-256 hex digest of a contract source
pub fn code_fingerprint(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// Result of auditing one source file from a directory
#[derive(Debug, Clone)]
pub struct FileAudit {
    pub path: PathBuf,
    pub audit: ContractAudit,
    pub report: VulnerabilityReport,
}

/// Turns analyzer reports into stored audit records
pub struct ContractAuditor {
    analyzer: ContractAnalyzer,
}

impl ContractAuditor {
    pub fn new() -> SentryResult<Self> {
        Ok(Self {
            analyzer: ContractAnalyzer::new()?,
        })
    }

    /// Validate inputs and produce a completed audit
    pub fn audit(
        &self,
        address: &str,
        code: &str,
        blockchain: Blockchain,
    ) -> SentryResult<(ContractAudit, VulnerabilityReport)> {
        validation::validate_contract_address(address)?;
        validation::validate_contract_code(code)?;

        let report = self.analyzer.analyze(code, Some(address), &mut rand::thread_rng());
        let audit = ContractAudit {
            id: utils::next_id(),
            contract_address: address.to_string(),
            blockchain,
            risk_level: report.risk_level,
            issues_found: report.vulnerabilities.len(),
            status: AuditStatus::Completed,
            vulnerabilities: report.vulnerabilities.clone(),
            security_score: report.security_score,
            code_sha256: Some(code_fingerprint(code)),
            created_at: utils::now_timestamp(),
        };
        log::info!(
            "Audited {} on {}: {} issues, risk {}",
            address,
            blockchain,
            audit.issues_found,
            audit.risk_level
        );
        Ok((audit, report))
    }

    /// Audit every `.sol` file under `dir` in parallel.
    ///
    /// Files carry no deployment address, so each one is keyed by the first
    /// 20 bytes of its source hash. Unreadable or empty files are skipped
    /// with a warning.
    pub fn audit_directory(
        &self,
        dir: &Path,
        blockchain: Blockchain,
        threads: usize,
    ) -> SentryResult<Vec<FileAudit>> {
        if !dir.is_dir() {
            return Err(SentryError::InvalidInput(format!("Not a directory: {:?}", dir)));
        }

        let sources = collect_sources(dir);
        log::info!("Discovered {} Solidity files under {:?}", sources.len(), dir);

        let thread_count = if threads == 0 { num_cpus::get() } else { threads };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .build()
            .map_err(|e| SentryError::external("thread pool", e.to_string()))?;

        let mut audits: Vec<FileAudit> = pool.install(|| {
            sources
                .into_par_iter()
                .filter_map(|path| match std::fs::read_to_string(&path) {
                    Ok(code) => {
                        let address = format!("0x{}", &code_fingerprint(&code)[..40]);
                        match self.audit(&address, &code, blockchain) {
                            Ok((audit, report)) => Some(FileAudit { path, audit, report }),
                            Err(e) => {
                                log::warn!("Skipping {:?}: {}", path, e);
                                None
                            }
                        }
                    }
                    Err(e) => {
                        log::warn!("Failed to read {:?}: {}", path, e);
                        None
                    }
                })
                .collect()
        });

        audits.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(audits)
    }
}

fn collect_sources(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(e) => {
                log::warn!("Error accessing entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("sol"))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect()
}
