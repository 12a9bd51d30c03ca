//! Simulated ML phishing pipeline.
//!
//! Mirrors the two phases of a classic phishing classifier: a preprocessing
//! phase that extracts URL, hyperlink and textual features, and a detection
//! phase that vectorises them and produces a prediction. Only the URL
//! features are real; page-content features are drawn from the supplied
//! RNG, so a seeded RNG gives reproducible results.

use super::phishing::{parse_url, subdomain_count, IPV4_HOST, PHISHING_THRESHOLD};
use super::{clamp_score, Indicator};
use crate::errors::SentryResult;
use crate::heuristics::{load_pipeline_heuristics, PhishingHeuristics};
use crate::models::Severity;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SPECIAL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[@#$%^&*()]").expect("static special char pattern"));

pub const TRAINING_ACCURACY: f64 = 0.94;
pub const TESTING_ACCURACY: f64 = 0.91;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperlinkFeatures {
    pub external_links: u32,
    pub internal_links: u32,
    pub broken_links: u32,
    pub suspicious_anchors: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineUrlFeatures {
    pub url_length: usize,
    pub domain_length: usize,
    pub subdomain_count: i32,
    pub path_depth: usize,
    pub has_ip_address: bool,
    pub has_port: bool,
    pub special_char_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextualFeatures {
    pub title_length: u32,
    pub body_length: u32,
    pub form_count: u32,
    pub input_field_count: u32,
    pub hidden_field_count: u32,
    pub suspicious_keyword_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFeatures {
    pub hyperlink_features: HyperlinkFeatures,
    pub url_features: PipelineUrlFeatures,
    pub textual_features: TextualFeatures,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomTree {
    pub node_count: u32,
    pub depth: u32,
    pub form_elements: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingPhase {
    pub dom_tree: DomTree,
    pub extracted_features: ExtractedFeatures,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassLabel {
    Legitimate,
    Phishing,
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassLabel::Legitimate => write!(f, "legitimate"),
            ClassLabel::Phishing => write!(f, "phishing"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub is_phishing: bool,
    pub confidence: f64,
    pub class_label: ClassLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionPhase {
    pub feature_vector: Vec<f64>,
    pub model_prediction: ModelPrediction,
    pub training_accuracy: f64,
    pub testing_accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub url: String,
    pub preprocessing_phase: PreprocessingPhase,
    pub detection_phase: DetectionPhase,
    pub risk_score: u8,
    pub indicators: Vec<Indicator>,
}

pub fn analyze_url_with_pipeline<R: Rng + ?Sized>(input: &str, rng: &mut R) -> SentryResult<PipelineResult> {
    run_pipeline(input, &load_pipeline_heuristics(), rng)
}

pub fn run_pipeline<R: Rng + ?Sized>(
    input: &str,
    heuristics: &PhishingHeuristics,
    rng: &mut R,
) -> SentryResult<PipelineResult> {
    let parsed = parse_url(input)?;
    let hostname = parsed.hostname.as_str();
    let found_keywords = heuristics.matched_keywords(hostname, &parsed.path);
    let keyword_count = found_keywords.len() as u32;

    // Preprocessing phase
    let url_features = PipelineUrlFeatures {
        url_length: input.chars().count(),
        domain_length: hostname.len(),
        subdomain_count: subdomain_count(hostname),
        path_depth: parsed.path.split('/').filter(|p| !p.is_empty()).count(),
        has_ip_address: IPV4_HOST.is_match(hostname),
        has_port: parsed.url.port().is_some(),
        special_char_count: SPECIAL_CHARS.find_iter(input).count(),
    };

    let hyperlink_features = HyperlinkFeatures {
        external_links: rng.gen_range(0..20),
        internal_links: rng.gen_range(0..50),
        broken_links: rng.gen_range(0..5),
        suspicious_anchors: keyword_count,
    };

    let textual_features = TextualFeatures {
        title_length: rng.gen_range(0..100),
        body_length: rng.gen_range(0..5000),
        form_count: if url_features.has_ip_address { 2 } else { rng.gen_range(0..3) },
        input_field_count: if keyword_count > 2 { 5 } else { rng.gen_range(0..10) },
        hidden_field_count: if url_features.has_ip_address { 3 } else { rng.gen_range(0..2) },
        suspicious_keyword_count: keyword_count,
    };

    // Detection phase
    let feature_vector = vec![
        url_features.url_length as f64 / 100.0,
        url_features.domain_length as f64 / 50.0,
        url_features.subdomain_count as f64 / 5.0,
        url_features.path_depth as f64 / 10.0,
        if url_features.has_ip_address { 1.0 } else { 0.0 },
        if url_features.has_port { 1.0 } else { 0.0 },
        url_features.special_char_count as f64 / 10.0,
        hyperlink_features.external_links as f64 / 20.0,
        hyperlink_features.broken_links as f64 / 5.0,
        hyperlink_features.suspicious_anchors as f64 / 5.0,
        textual_features.form_count as f64 / 3.0,
        textual_features.hidden_field_count as f64 / 3.0,
        textual_features.suspicious_keyword_count as f64 / 5.0,
    ];

    let mut score = 0i32;
    let mut indicators = Vec::new();

    if url_features.has_ip_address {
        score += 30;
        indicators.push(
            Indicator::new("URL Structure", Severity::Critical, "URL uses IP address instead of domain name")
                .weighted(0.3),
        );
    }

    if url_features.url_length > 75 {
        score += 15;
        indicators.push(
            Indicator::new(
                "URL Length",
                Severity::Medium,
                format!("Unusually long URL ({} characters)", url_features.url_length),
            )
            .weighted(0.15),
        );
    }

    if url_features.subdomain_count > 2 {
        score += 20;
        indicators.push(
            Indicator::new(
                "Domain Structure",
                Severity::High,
                format!("Excessive subdomains detected ({})", url_features.subdomain_count),
            )
            .weighted(0.2),
        );
    }

    if parsed.url.scheme() != "https" {
        score += 25;
        indicators.push(
            Indicator::new("SSL Certificate", Severity::High, "No SSL certificate - insecure connection")
                .weighted(0.25),
        );
    }

    if keyword_count > 0 {
        let keyword_risk = (keyword_count as i32 * 8).min(25);
        score += keyword_risk;
        let severity = if keyword_count > 2 { Severity::High } else { Severity::Medium };
        indicators.push(
            Indicator::new(
                "Content Analysis",
                severity,
                format!("Suspicious keywords detected: {}", found_keywords.join(", ")),
            )
            .weighted(keyword_risk as f64 / 100.0),
        );
    }

    if textual_features.hidden_field_count > 2 {
        score += 15;
        indicators.push(
            Indicator::new(
                "Form Analysis",
                Severity::Medium,
                format!("Multiple hidden form fields detected ({})", textual_features.hidden_field_count),
            )
            .weighted(0.15),
        );
    }

    if hyperlink_features.broken_links > 3 {
        score += 10;
        indicators.push(
            Indicator::new(
                "Link Quality",
                Severity::Low,
                format!("High number of broken links ({})", hyperlink_features.broken_links),
            )
            .weighted(0.1),
        );
    }

    if heuristics.is_legitimate(hostname) {
        score = (score - heuristics.legitimate_discount).max(0);
    }

    let risk_score = clamp_score(score);
    let is_phishing = risk_score > PHISHING_THRESHOLD;
    let confidence = 0.85 + rng.gen::<f64>() * 0.14;

    log::debug!(
        "Pipeline classified {} as {} (score {}, confidence {:.2})",
        input,
        if is_phishing { "phishing" } else { "legitimate" },
        risk_score,
        confidence
    );

    Ok(PipelineResult {
        url: input.to_string(),
        preprocessing_phase: PreprocessingPhase {
            dom_tree: DomTree {
                node_count: rng.gen_range(100..600),
                depth: rng.gen_range(5..15),
                form_elements: textual_features.form_count,
            },
            extracted_features: ExtractedFeatures {
                hyperlink_features,
                url_features,
                textual_features,
            },
        },
        detection_phase: DetectionPhase {
            feature_vector,
            model_prediction: ModelPrediction {
                is_phishing,
                confidence,
                class_label: if is_phishing { ClassLabel::Phishing } else { ClassLabel::Legitimate },
            },
            training_accuracy: TRAINING_ACCURACY,
            testing_accuracy: TESTING_ACCURACY,
        },
        risk_score,
        indicators,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ip_host_forces_hidden_fields() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = analyze_url_with_pipeline("http://45.33.12.9:8080/signin", &mut rng).unwrap();
        let features = &result.preprocessing_phase.extracted_features;
        assert!(features.url_features.has_ip_address);
        assert!(features.url_features.has_port);
        assert_eq!(features.textual_features.form_count, 2);
        assert_eq!(features.textual_features.hidden_field_count, 3);
        // ip 30 + no ssl 25 + one keyword 8 + hidden fields 15, plus possible broken links
        assert!(result.risk_score >= 78);
        assert!(result.detection_phase.model_prediction.is_phishing);
        assert_eq!(result.detection_phase.model_prediction.class_label, ClassLabel::Phishing);
    }

    #[test]
    fn test_legitimate_host_is_discounted() {
        let mut rng = StdRng::seed_from_u64(2);
        let result = analyze_url_with_pipeline("https://www.coinbase.com/signin", &mut rng).unwrap();
        // keyword 8 and at most 10 for broken links, both wiped by the 60 point discount
        assert_eq!(result.risk_score, 0);
        assert!(!result.detection_phase.model_prediction.is_phishing);
    }

    #[test]
    fn test_keyword_risk_is_capped() {
        let mut rng = StdRng::seed_from_u64(3);
        let result =
            analyze_url_with_pipeline("https://secure-login.example.com/verify/account/password", &mut rng).unwrap();
        let content = result
            .indicators
            .iter()
            .find(|i| i.category == "Content Analysis")
            .unwrap();
        assert_eq!(content.weight, Some(0.25));
        assert_eq!(content.severity, Severity::High);
        assert_eq!(result.preprocessing_phase.extracted_features.textual_features.input_field_count, 5);
    }

    #[test]
    fn test_confidence_and_vector_shape() {
        let mut rng = StdRng::seed_from_u64(4);
        let result = analyze_url_with_pipeline("https://example.com/a/b/c", &mut rng).unwrap();
        let prediction = &result.detection_phase.model_prediction;
        assert!(prediction.confidence >= 0.85 && prediction.confidence < 0.99);
        assert_eq!(result.detection_phase.feature_vector.len(), 13);
        assert_eq!(result.preprocessing_phase.extracted_features.url_features.path_depth, 3);
        assert_eq!(result.detection_phase.training_accuracy, 0.94);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let a = analyze_url_with_pipeline("https://example.com", &mut StdRng::seed_from_u64(9)).unwrap();
        let b = analyze_url_with_pipeline("https://example.com", &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }
}
