//! Input validation for wallet addresses, contract addresses and URLs.
//!
//! Messages are shown verbatim by the CLI.

use crate::errors::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static ETH_ADDRESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0x[a-fA-F0-9]{40}$").expect("static address pattern"));

/// `0x` followed by exactly 40 hex characters
pub fn is_valid_ethereum_address(address: &str) -> bool {
    ETH_ADDRESS.is_match(address)
}

pub fn is_valid_contract_address(address: &str) -> bool {
    is_valid_ethereum_address(address)
}

/// Accepts only absolute http(s) URLs
pub fn is_valid_url(input: &str) -> bool {
    match Url::parse(input) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

pub fn validate_wallet_address(address: &str) -> Result<(), ValidationError> {
    if address.trim().is_empty() {
        return Err(ValidationError::new("wallet_address", "Wallet address is required"));
    }
    if !is_valid_ethereum_address(address) {
        return Err(ValidationError::new(
            "wallet_address",
            "Invalid wallet address format. Must be 0x followed by 40 hexadecimal characters",
        ));
    }
    Ok(())
}

pub fn validate_contract_address(address: &str) -> Result<(), ValidationError> {
    if address.trim().is_empty() {
        return Err(ValidationError::new("contract_address", "Contract address is required"));
    }
    if !is_valid_contract_address(address) {
        return Err(ValidationError::new(
            "contract_address",
            "Invalid contract address format. Must be 0x followed by 40 hexadecimal characters",
        ));
    }
    Ok(())
}

pub fn validate_url(input: &str) -> Result<(), ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::new("url", "URL is required"));
    }
    if !is_valid_url(input) {
        return Err(ValidationError::new(
            "url",
            "Invalid URL format. Must start with http:// or https://",
        ));
    }
    Ok(())
}

pub fn validate_contract_code(code: &str) -> Result<(), ValidationError> {
    if code.trim().is_empty() {
        return Err(ValidationError::new("code", "Please enter contract code to analyze"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";

    #[test]
    fn test_ethereum_address() {
        assert!(is_valid_ethereum_address(ADDR));
        assert!(!is_valid_ethereum_address("742d35Cc6634C0532925a3b844Bc454e4438f44e"));
        assert!(!is_valid_ethereum_address("0x742d35Cc6634C0532925a3b844Bc454e4438f4"));
        assert!(!is_valid_ethereum_address("0x742d35Cc6634C0532925a3b844Bc454e4438f44z"));
    }

    #[test]
    fn test_url_schemes() {
        assert!(is_valid_url("https://uniswap.org"));
        assert!(is_valid_url("http://192.168.0.1/login"));
        assert!(!is_valid_url("ftp://files.example.com"));
        assert!(!is_valid_url("uniswap.org"));
    }

    #[test]
    fn test_required_messages() {
        assert_eq!(validate_wallet_address("  ").unwrap_err().message, "Wallet address is required");
        assert_eq!(validate_contract_address("").unwrap_err().message, "Contract address is required");
        assert_eq!(validate_url("").unwrap_err().message, "URL is required");
    }

    #[test]
    fn test_format_messages() {
        let err = validate_url("not a url").unwrap_err();
        assert_eq!(err.message, "Invalid URL format. Must start with http:// or https://");
        let err = validate_wallet_address("0x123").unwrap_err();
        assert!(err.message.starts_with("Invalid wallet address format"));
        assert!(validate_contract_address(ADDR).is_ok());
    }

    #[test]
    fn test_contract_code_required() {
        assert!(validate_contract_code("\n\t ").is_err());
        assert!(validate_contract_code("contract A {}").is_ok());
    }
}
