//! Dashboard quick scan: classify a URL into a stored threat record

use crate::errors::{SentryError, SentryResult};
use crate::heuristics::{QUICK_SCAN_KEYWORDS, SHORT_DOMAIN_LEN, SUSPICIOUS_TLDS};
use crate::models::{Threat, ThreatMetadata, ThreatStatus, ThreatType};
use crate::utils;
use crate::validation;
use url::Url;

const KEYWORD_PENALTY: i32 = 40;
const NO_HTTPS_PENALTY: i32 = 20;
const SHORT_DOMAIN_PENALTY: i32 = 15;
const SUSPICIOUS_TLD_PENALTY: i32 = 25;

/// Score and classify `input`, producing a new active threat
pub fn scan_threat(input: &str) -> SentryResult<Threat> {
    validation::validate_url(input)?;
    let url = Url::parse(input)
        .map_err(|e| SentryError::InvalidInput(format!("{}: {}", input, e)))?;
    let hostname = url.host_str().unwrap_or_default();

    let lowered = input.to_lowercase();
    let has_keyword = QUICK_SCAN_KEYWORDS.iter().any(|kw| lowered.contains(kw));
    let is_https = url.scheme() == "https";
    let short_domain = hostname.len() < SHORT_DOMAIN_LEN;
    let suspicious_tld = SUSPICIOUS_TLDS.iter().any(|tld| hostname.ends_with(tld));

    let mut score = 0;
    if has_keyword {
        score += KEYWORD_PENALTY;
    }
    if !is_https {
        score += NO_HTTPS_PENALTY;
    }
    if short_domain {
        score += SHORT_DOMAIN_PENALTY;
    }
    if suspicious_tld {
        score += SUSPICIOUS_TLD_PENALTY;
    }

    let risk_score = super::clamp_score(score);
    let threat_type = classify(risk_score);
    log::debug!("Quick scan of {} scored {} ({})", input, risk_score, threat_type);

    Ok(Threat {
        id: utils::next_id(),
        url: input.to_string(),
        threat_type,
        risk_score,
        status: ThreatStatus::Active,
        detected_at: utils::now_timestamp(),
        metadata: ThreatMetadata {
            https: is_https,
            domain_length: hostname.len(),
            suspicious_keywords: has_keyword,
            suspicious_tld,
        },
    })
}

pub fn classify(score: u8) -> ThreatType {
    match score {
        s if s > 70 => ThreatType::Phishing,
        s if s > 50 => ThreatType::Scam,
        s if s > 30 => ThreatType::Suspicious,
        _ => ThreatType::LowRisk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phishing_url() {
        let threat = scan_threat("http://free-airdrop.xyz/claim").unwrap();
        assert_eq!(threat.risk_score, 85);
        assert_eq!(threat.threat_type, ThreatType::Phishing);
        assert_eq!(threat.status, ThreatStatus::Active);
        assert!(threat.metadata.suspicious_tld);
        assert!(!threat.metadata.https);
    }

    #[test]
    fn test_short_domain_on_free_tld_is_scam() {
        let threat = scan_threat("http://a.tk").unwrap();
        assert_eq!(threat.risk_score, 60);
        assert_eq!(threat.threat_type, ThreatType::Scam);
        assert_eq!(threat.metadata.domain_length, 4);
    }

    #[test]
    fn test_keyword_alone_is_suspicious() {
        let threat = scan_threat("https://metamask.io").unwrap();
        assert_eq!(threat.risk_score, 40);
        assert_eq!(threat.threat_type, ThreatType::Suspicious);
    }

    #[test]
    fn test_clean_url_is_low_risk() {
        let threat = scan_threat("https://ethereum.org/en/").unwrap();
        assert_eq!(threat.risk_score, 0);
        assert_eq!(threat.threat_type, ThreatType::LowRisk);
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let threat = scan_threat("https://example.com/VERIFY").unwrap();
        assert!(threat.metadata.suspicious_keywords);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = scan_threat("ftp://example.com").unwrap_err();
        assert!(matches!(err, SentryError::Validation(_)));
    }
}
