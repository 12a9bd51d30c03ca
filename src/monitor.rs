//! Simulated live threat feed.
//!
//! A background task ticks on a fixed interval and, with a configurable
//! probability, publishes a synthetic [`ThreatEvent`] to every subscriber.

use crate::models::{Blockchain, Severity};
use crate::utils;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_EMIT_PROBABILITY: f64 = 0.3;
const MIN_INTERVAL: Duration = Duration::from_millis(1);
const SUBSCRIBER_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatEventType {
    Phishing,
    Malware,
    SuspiciousTransaction,
    ContractExploit,
    Ddos,
}

impl ThreatEventType {
    const ALL: [ThreatEventType; 5] = [
        ThreatEventType::Phishing,
        ThreatEventType::Malware,
        ThreatEventType::SuspiciousTransaction,
        ThreatEventType::ContractExploit,
        ThreatEventType::Ddos,
    ];

    fn descriptions(&self) -> &'static [&'static str] {
        match self {
            ThreatEventType::Phishing => &[
                "Phishing site detected mimicking MetaMask",
                "Fake Uniswap interface attempting credential theft",
                "Malicious wallet connection request detected",
            ],
            ThreatEventType::Malware => &[
                "Clipboard hijacker detected modifying wallet addresses",
                "Keylogger attempting to capture seed phrases",
                "Malicious browser extension detected",
            ],
            ThreatEventType::SuspiciousTransaction => &[
                "Large transfer to newly created wallet",
                "Unusual transaction pattern detected",
                "High-value transfer to mixer service",
            ],
            ThreatEventType::ContractExploit => &[
                "Reentrancy attack detected on DeFi protocol",
                "Flash loan attack in progress",
                "Unauthorized token minting detected",
            ],
            ThreatEventType::Ddos => &[
                "Network congestion attack detected",
                "RPC endpoint under heavy load",
                "Mempool spam attack in progress",
            ],
        }
    }
}

impl std::fmt::Display for ThreatEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreatEventType::Phishing => write!(f, "phishing"),
            ThreatEventType::Malware => write!(f, "malware"),
            ThreatEventType::SuspiciousTransaction => write!(f, "suspicious_transaction"),
            ThreatEventType::ContractExploit => write!(f, "contract_exploit"),
            ThreatEventType::Ddos => write!(f, "ddos"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDetails {
    pub blockchain: Blockchain,
    pub transaction_hash: String,
    pub amount: String,
    pub affected_users: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatEvent {
    pub id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub event_type: ThreatEventType,
    pub severity: Severity,
    pub source: String,
    pub target: Option<String>,
    pub description: String,
    pub status: crate::models::ThreatStatus,
    pub details: EventDetails,
}

const FEED_CHAINS: [Blockchain; 5] = [
    Blockchain::Ethereum,
    Blockchain::Bsc,
    Blockchain::Polygon,
    Blockchain::Arbitrum,
    Blockchain::Optimism,
];

const SEVERITIES: [Severity; 4] = [Severity::Low, Severity::Medium, Severity::High, Severity::Critical];

/// Draw one synthetic event
pub fn generate_event<R: Rng + ?Sized>(rng: &mut R) -> ThreatEvent {
    let event_type = *ThreatEventType::ALL.choose(rng).unwrap_or(&ThreatEventType::Phishing);
    let severity = *SEVERITIES.choose(rng).unwrap_or(&Severity::Medium);
    let description = event_type
        .descriptions()
        .choose(rng)
        .copied()
        .unwrap_or_default()
        .to_string();
    let target = rng.gen_bool(0.5).then(|| utils::random_short_address(rng));

    ThreatEvent {
        id: format!("THR-{}-{}", chrono::Utc::now().timestamp_millis(), utils::random_hex(rng, 5)),
        timestamp: utils::now_timestamp(),
        event_type,
        severity,
        source: utils::random_short_address(rng),
        target,
        description,
        status: crate::models::ThreatStatus::Active,
        details: EventDetails {
            blockchain: *FEED_CHAINS.choose(rng).unwrap_or(&Blockchain::Ethereum),
            transaction_hash: format!("0x{}", utils::random_hex(rng, 64)),
            amount: format!("{:.2} ETH", rng.gen::<f64>() * 1000.0),
            affected_users: rng.gen_range(0..1000),
        },
    }
}

/// Handle returned by [`ThreatMonitor::subscribe`]
pub struct Subscription {
    pub id: u64,
    pub events: mpsc::Receiver<ThreatEvent>,
}

type Subscribers = Arc<Mutex<HashMap<u64, mpsc::Sender<ThreatEvent>>>>;

pub struct ThreatMonitor {
    interval: Duration,
    emit_probability: f64,
    seed: Option<u64>,
    subscribers: Subscribers,
    next_subscriber: AtomicU64,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl ThreatMonitor {
    /// Intervals below 1ms are raised to 1ms; a NaN probability falls back to the default.
    pub fn new(interval: Duration, emit_probability: f64) -> Self {
        let emit_probability = if emit_probability.is_nan() {
            DEFAULT_EMIT_PROBABILITY
        } else {
            emit_probability.clamp(0.0, 1.0)
        };
        Self {
            interval: interval.max(MIN_INTERVAL),
            emit_probability,
            seed: None,
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            next_subscriber: AtomicU64::new(1),
            ticker: Mutex::new(None),
        }
    }

    /// Use a fixed RNG seed for the generated events
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn subscribe(&self) -> Subscription {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.insert(id, tx);
        }
        log::debug!("Threat feed subscriber {} registered", id);
        Subscription { id, events: rx }
    }

    pub fn unsubscribe(&self, id: u64) -> bool {
        self.subscribers
            .lock()
            .map(|mut subs| subs.remove(&id).is_some())
            .unwrap_or(false)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|subs| subs.len()).unwrap_or(0)
    }

    pub fn is_running(&self) -> bool {
        self.ticker
            .lock()
            .map(|t| t.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Start ticking. Calling this while already running does nothing.
    pub fn start(&self) {
        let Ok(mut ticker) = self.ticker.lock() else {
            log::error!("Threat monitor state poisoned, cannot start");
            return;
        };
        if ticker.is_some() {
            return;
        }

        let subscribers = Arc::clone(&self.subscribers);
        let period = self.interval;
        let probability = self.emit_probability;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        log::info!("Threat monitor started ({:?} interval)", period);
        *ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // the first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if !rng.gen_bool(probability) {
                    continue;
                }
                let event = generate_event(&mut rng);
                log::debug!("Broadcasting {} event {}", event.event_type, event.id);
                broadcast(&subscribers, event);
            }
        }));
    }

    pub fn stop(&self) {
        if let Ok(mut ticker) = self.ticker.lock() {
            if let Some(handle) = ticker.take() {
                handle.abort();
                log::info!("Threat monitor stopped");
            }
        }
    }
}

impl Default for ThreatMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL, DEFAULT_EMIT_PROBABILITY)
    }
}

impl Drop for ThreatMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Deliver to every live subscriber, pruning closed channels
fn broadcast(subscribers: &Subscribers, event: ThreatEvent) {
    let Ok(mut subs) = subscribers.lock() else {
        return;
    };
    subs.retain(|id, tx| match tx.try_send(event.clone()) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            log::warn!("Subscriber {} is lagging, dropping event", id);
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_event_shape() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let event = generate_event(&mut rng);
            assert!(event.id.starts_with("THR-"));
            assert!(event.details.amount.ends_with(" ETH"));
            assert_eq!(event.details.transaction_hash.len(), 66);
            assert!(event.details.affected_users < 1000);
            assert!(event.event_type.descriptions().contains(&event.description.as_str()));
            assert_ne!(event.details.blockchain, Blockchain::Bitcoin);
        }
    }

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let monitor = ThreatMonitor::new(Duration::from_millis(10), 1.0).with_seed(3);
        let mut sub = monitor.subscribe();
        monitor.start();
        assert!(monitor.is_running());

        let event = tokio::time::timeout(Duration::from_secs(2), sub.events.recv())
            .await
            .expect("event within timeout")
            .expect("channel open");
        assert_eq!(event.status, crate::models::ThreatStatus::Active);

        monitor.stop();
        assert!(!monitor.is_running());
    }

    #[tokio::test]
    async fn test_start_is_idempotent_and_unsubscribe() {
        let monitor = ThreatMonitor::new(Duration::from_millis(10), 1.0);
        monitor.start();
        monitor.start();
        let sub = monitor.subscribe();
        assert_eq!(monitor.subscriber_count(), 1);
        assert!(monitor.unsubscribe(sub.id));
        assert!(!monitor.unsubscribe(sub.id));
        assert_eq!(monitor.subscriber_count(), 0);
        monitor.stop();
    }

    #[tokio::test]
    async fn test_degenerate_settings_are_sanitised() {
        let monitor = ThreatMonitor::new(Duration::ZERO, f64::NAN);
        assert_eq!(monitor.interval, MIN_INTERVAL);
        assert_eq!(monitor.emit_probability, DEFAULT_EMIT_PROBABILITY);

        let monitor = ThreatMonitor::new(Duration::ZERO, 1.0).with_seed(5);
        let mut sub = monitor.subscribe();
        monitor.start();
        let event = tokio::time::timeout(Duration::from_secs(2), sub.events.recv()).await;
        assert!(matches!(event, Ok(Some(_))));
        assert!(monitor.is_running());
        monitor.stop();
    }

    #[tokio::test]
    async fn test_zero_probability_is_silent() {
        let monitor = ThreatMonitor::new(Duration::from_millis(5), 0.0);
        let mut sub = monitor.subscribe();
        monitor.start();
        let result = tokio::time::timeout(Duration::from_millis(100), sub.events.recv()).await;
        assert!(result.is_err());
        monitor.stop();
    }
}
