//! ticker-dash: real-time crypto ticker aggregator
//!
//! This library provides the streaming core behind a price dashboard:
//! - One multiplexed Binance 24h ticker stream with fixed-delay reconnection
//! - Ticker decoding and validation against a tracked symbol catalog
//! - Bounded per-symbol price history
//! - Fiat conversion with a refreshable rate table
//! - An owned facade publishing immutable snapshots to presentation code
//! - Durable display-order preference
//! - Structured logging and Prometheus counters

pub mod aggregator;
pub mod cli;
pub mod config;
pub mod currency;
pub mod dashboard;
pub mod feed;
pub mod history;
pub mod preferences;
pub mod registry;
pub mod telemetry;
pub mod ws;
