//! Keyword, TLD and allow-list tables used by the URL scorers

/// Keywords checked by the dashboard quick scan against the full URL
pub const QUICK_SCAN_KEYWORDS: &[&str] = &[
    "metamask", "wallet", "airdrop", "claim", "free", "urgent", "verify",
];

/// Free or abuse-prone TLDs penalised by the quick scan
pub const SUSPICIOUS_TLDS: &[&str] = &[".xyz", ".tk", ".ml", ".ga"];

/// Quick scan flags hostnames shorter than this
pub const SHORT_DOMAIN_LEN: usize = 8;

/// Keyword and allow-list set for one phishing analysis profile
#[derive(Debug, Clone)]
pub struct PhishingHeuristics {
    pub suspicious_keywords: Vec<&'static str>,
    pub legitimate_domains: Vec<&'static str>,
    /// Points removed from the score of an allow-listed host
    pub legitimate_discount: i32,
}

impl PhishingHeuristics {
    /// Host or path keyword hits, in table order
    pub fn matched_keywords(&self, hostname: &str, path: &str) -> Vec<String> {
        let host = hostname.to_lowercase();
        let path = path.to_lowercase();
        self.suspicious_keywords
            .iter()
            .filter(|kw| host.contains(*kw) || path.contains(*kw))
            .map(|kw| kw.to_string())
            .collect()
    }

    pub fn is_legitimate(&self, hostname: &str) -> bool {
        self.legitimate_domains.iter().any(|d| hostname.ends_with(d))
    }
}

/// Profile for the rule-based phishing analyzer
pub fn load_phishing_heuristics() -> PhishingHeuristics {
    PhishingHeuristics {
        suspicious_keywords: vec![
            "login", "verify", "account", "secure", "update", "confirm", "wallet", "metamask",
            "uniswap",
        ],
        legitimate_domains: vec![
            "google.com",
            "github.com",
            "vercel.app",
            "ethereum.org",
            "uniswap.org",
        ],
        legitimate_discount: 50,
    }
}

/// Profile for the simulated ML pipeline
pub fn load_pipeline_heuristics() -> PhishingHeuristics {
    let mut base = load_phishing_heuristics();
    base.suspicious_keywords.extend(["password", "signin", "banking"]);
    base.legitimate_domains.extend(["opensea.io", "coinbase.com"]);
    base.legitimate_discount = 60;
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_matches_host_and_path() {
        let h = load_phishing_heuristics();
        let found = h.matched_keywords("secure-metamask.io", "/Login");
        assert_eq!(found, vec!["login", "secure", "metamask"]);
    }

    #[test]
    fn test_legitimate_suffix() {
        let h = load_phishing_heuristics();
        assert!(h.is_legitimate("app.uniswap.org"));
        assert!(!h.is_legitimate("uniswap.org.evil.xyz"));
    }

    #[test]
    fn test_pipeline_profile_extends_base() {
        let h = load_pipeline_heuristics();
        assert_eq!(h.suspicious_keywords.len(), 12);
        assert!(h.is_legitimate("opensea.io"));
        assert_eq!(h.legitimate_discount, 60);
    }
}
