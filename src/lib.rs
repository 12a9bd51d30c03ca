//! ChainSentry
//!
//! Heuristic risk scoring for URLs, smart contracts and wallets, backed by
//! a per-user JSON demo store and a simulated live threat feed.

pub mod alerts;
pub mod app;
pub mod cli;
pub mod config;
pub mod errors;
pub mod heuristics;
pub mod models;
pub mod monitor;
pub mod scoring;
pub mod store;
pub mod ui;
pub mod utils;
pub mod validation;

pub use app::ChainSentry;
pub use errors::{SentryError, SentryResult};
