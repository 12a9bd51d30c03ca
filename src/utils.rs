use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Millisecond-timestamp record id, strictly increasing within the process
pub fn next_id() -> String {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let prev = LAST_ID
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    now.max(prev + 1).to_string()
}

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_timestamp() -> String {
    timestamp(Utc::now())
}

/// Parse a stored RFC 3339 timestamp; malformed values yield `None`
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `len` random lowercase hex characters
pub fn random_hex<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    let mut bytes = vec![0u8; len.div_ceil(2)];
    rng.fill(bytes.as_mut_slice());
    let mut out = hex::encode(bytes);
    out.truncate(len);
    out
}

/// Random `0x` address with 40 hex digits
pub fn random_address<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("0x{}", random_hex(rng, 40))
}

/// Abbreviated address in the `0x12345678...abcd` form used by the feed
pub fn random_short_address<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("0x{}...{}", random_hex(rng, 8), random_hex(rng, 4))
}

/// Artificial pacing so scans feel like real network work
pub async fn pace(enabled: bool, millis: u64) {
    if enabled && millis > 0 {
        log::debug!("Pacing for {}ms", millis);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

/// Truncate long strings for table output
pub fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let cut: String = value.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ids_strictly_increase() {
        let a: u64 = next_id().parse().unwrap();
        let b: u64 = next_id().parse().unwrap();
        let c: u64 = next_id().parse().unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_random_address_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let addr = random_address(&mut rng);
        assert!(crate::validation::is_valid_ethereum_address(&addr));
        assert_eq!(random_hex(&mut rng, 5).len(), 5);
    }

    #[test]
    fn test_timestamp_round_trips() {
        let now = Utc::now();
        let parsed = parse_timestamp(&timestamp(now)).unwrap();
        assert_eq!(parsed.timestamp_millis(), now.timestamp_millis());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("https://very-long-domain.example", 10), "https:/...");
    }
}
