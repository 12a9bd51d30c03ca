//! Rule-based phishing URL analysis

use super::{clamp_score, Indicator};
use crate::errors::{SentryError, SentryResult};
use crate::heuristics::{load_phishing_heuristics, PhishingHeuristics};
use crate::models::Severity;
use crate::validation;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

pub(crate) static IPV4_HOST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").expect("static ipv4 pattern"));

/// Score above which a URL is reported as phishing
pub const PHISHING_THRESHOLD: u8 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhishingAnalysis {
    pub url: String,
    pub is_phishing: bool,
    pub risk_score: u8,
    pub indicators: Vec<Indicator>,
    pub url_features: UrlFeatures,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlFeatures {
    pub domain_age: String,
    pub has_ssl: bool,
    pub suspicious_keywords: Vec<String>,
    pub ip_address: bool,
    pub url_length: usize,
    /// Labels beyond the registrable `name.tld` pair; negative for bare hosts
    pub subdomain_count: i32,
}

/// Parsed pieces shared by the URL scorers
pub(crate) struct ParsedUrl {
    pub url: Url,
    pub hostname: String,
    pub path: String,
}

pub(crate) fn parse_url(input: &str) -> SentryResult<ParsedUrl> {
    validation::validate_url(input)?;
    let url = Url::parse(input)
        .map_err(|e| SentryError::InvalidInput(format!("{}: {}", input, e)))?;
    let hostname = url.host_str().unwrap_or_default().to_string();
    let path = url.path().to_string();
    Ok(ParsedUrl { url, hostname, path })
}

pub(crate) fn subdomain_count(hostname: &str) -> i32 {
    hostname.split('.').count() as i32 - 2
}

/// Analyze `input` with the default heuristics
pub fn analyze_url(input: &str) -> SentryResult<PhishingAnalysis> {
    analyze_url_with(input, &load_phishing_heuristics())
}

pub fn analyze_url_with(input: &str, heuristics: &PhishingHeuristics) -> SentryResult<PhishingAnalysis> {
    let parsed = parse_url(input)?;
    let hostname = parsed.hostname.as_str();

    let found_keywords = heuristics.matched_keywords(hostname, &parsed.path);
    let has_ssl = parsed.url.scheme() == "https";
    let ip_address = IPV4_HOST.is_match(hostname);
    let subdomains = subdomain_count(hostname);
    let url_length = input.chars().count();

    let mut score = 0i32;
    let mut indicators = Vec::new();

    if !has_ssl {
        score += 25;
        indicators.push(Indicator::new(
            "SSL Certificate",
            Severity::High,
            "No SSL certificate detected - insecure connection",
        ));
    }

    if ip_address {
        score += 30;
        indicators.push(Indicator::new(
            "Domain Type",
            Severity::Critical,
            "URL uses IP address instead of domain name",
        ));
    }

    if !found_keywords.is_empty() {
        score += found_keywords.len() as i32 * 10;
        let severity = if found_keywords.len() > 2 {
            Severity::High
        } else {
            Severity::Medium
        };
        indicators.push(Indicator::new(
            "Suspicious Keywords",
            severity,
            format!("Found suspicious keywords: {}", found_keywords.join(", ")),
        ));
    }

    if subdomains > 2 {
        score += 15;
        indicators.push(Indicator::new(
            "Subdomain Count",
            Severity::Medium,
            format!("Excessive subdomains detected ({})", subdomains),
        ));
    }

    if url_length > 75 {
        score += 10;
        indicators.push(Indicator::new(
            "URL Length",
            Severity::Low,
            "Unusually long URL detected",
        ));
    }

    let legitimate = heuristics.is_legitimate(hostname);
    if legitimate {
        score = (score - heuristics.legitimate_discount).max(0);
    }

    let risk_score = clamp_score(score);
    log::debug!("Phishing analysis of {}: score {}, {} indicators", input, risk_score, indicators.len());

    Ok(PhishingAnalysis {
        url: input.to_string(),
        is_phishing: risk_score > PHISHING_THRESHOLD,
        risk_score,
        indicators,
        url_features: UrlFeatures {
            domain_age: if legitimate { "5+ years" } else { "Unknown" }.to_string(),
            has_ssl,
            suspicious_keywords: found_keywords,
            ip_address,
            url_length,
            subdomain_count: subdomains,
        },
    })
}
