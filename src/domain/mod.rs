//! Core domain types and logic. Nothing in here performs I/O.

pub mod asset;
pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod forecast;
pub mod indicator;
pub mod metrics;
pub mod ohlcv;
pub mod portfolio;
pub mod position;
pub mod signal;
pub mod strategy;
