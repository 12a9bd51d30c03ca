//! Wallet screening.
//!
//! There is no chain data behind this: the risk score is drawn at random and
//! flags and exposure counts are derived from it. The RNG is owned by the
//! screener so tests and `--seed` runs are reproducible.

use crate::errors::SentryResult;
use crate::models::{Blockchain, ExposureData, Severity, WalletScreening};
use crate::utils;
use crate::validation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chance that a high-risk wallet is reported as a sanctions hit
const SANCTIONS_PROBABILITY: f64 = 0.3;

pub struct WalletScreener {
    rng: StdRng,
}

impl WalletScreener {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn screen(&mut self, address: &str, blockchain: Blockchain) -> SentryResult<WalletScreening> {
        validation::validate_wallet_address(address)?;

        let risk_score: u8 = self.rng.gen_range(0..100);
        let mut flags = Vec::new();
        let mut sanctions_match = false;

        if risk_score > 70 {
            flags.push("High-risk jurisdiction exposure".to_string());
            flags.push("Multiple mixer interactions".to_string());
            if self.rng.gen_bool(SANCTIONS_PROBABILITY) {
                sanctions_match = true;
                flags.push("OFAC sanctions list match".to_string());
            }
        } else if risk_score > 40 {
            flags.push("Moderate exchange exposure".to_string());
            flags.push("DeFi protocol interactions".to_string());
        }

        let exposure_data = ExposureData {
            exchanges: self.rng.gen_range(0..10),
            mixers: if risk_score > 50 { self.rng.gen_range(0..5) } else { 0 },
            gambling: self.rng.gen_range(0..3),
            defi: self.rng.gen_range(0..15),
            nft: self.rng.gen_range(0..8),
        };

        let risk_level = Severity::from_wallet_score(risk_score);
        log::info!(
            "Screened {} on {}: score {}, level {}, {} flags",
            address,
            blockchain,
            risk_score,
            risk_level,
            flags.len()
        );

        Ok(WalletScreening {
            id: utils::next_id(),
            wallet_address: address.to_string(),
            blockchain,
            risk_score,
            risk_level,
            flags,
            sanctions_match,
            exposure_data,
            created_at: utils::now_timestamp(),
        })
    }
}

impl Default for WalletScreener {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

    #[test]
    fn test_rejects_bad_address() {
        let mut screener = WalletScreener::with_seed(1);
        assert!(screener.screen("vitalik.eth", Blockchain::Ethereum).is_err());
    }

    #[test]
    fn test_flags_follow_score() {
        let mut screener = WalletScreener::with_seed(42);
        for _ in 0..200 {
            let s = screener.screen(ADDR, Blockchain::Ethereum).unwrap();
            assert!(s.risk_score < 100);
            assert_eq!(s.risk_level, Severity::from_wallet_score(s.risk_score));
            match s.risk_score {
                71..=99 => {
                    assert!(s.flags.len() == 2 || s.flags.len() == 3);
                    assert_eq!(s.sanctions_match, s.flags.len() == 3);
                }
                41..=70 => {
                    assert_eq!(s.flags, vec!["Moderate exchange exposure", "DeFi protocol interactions"]);
                    assert!(!s.sanctions_match);
                }
                _ => assert!(s.flags.is_empty()),
            }
            if s.risk_score <= 50 {
                assert_eq!(s.exposure_data.mixers, 0);
            }
            assert!(s.exposure_data.exchanges < 10);
            assert!(s.exposure_data.defi < 15);
            assert!(s.exposure_data.nft < 8);
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let a = WalletScreener::with_seed(7).screen(ADDR, Blockchain::Bsc).unwrap();
        let b = WalletScreener::with_seed(7).screen(ADDR, Blockchain::Bsc).unwrap();
        assert_eq!(a.risk_score, b.risk_score);
        assert_eq!(a.flags, b.flags);
        assert_eq!(a.exposure_data, b.exposure_data);
        assert_eq!(a.blockchain, Blockchain::Bsc);
    }
}
