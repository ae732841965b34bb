//! Typed errors surfaced by the core. Everything else degrades to a default.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("trade id not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectError {
    #[error("unknown option side {0:?} (expected CE/CALL or PE/PUT)")]
    InvalidSide(String),
    #[error("invalid selector input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NumericError {
    #[error("missing value")]
    Missing,
    #[error("not a number: {0}")]
    NotNumeric(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("selection.delta_min ({min}) is greater than selection.delta_max ({max})")]
    DeltaRange { min: f64, max: f64 },
    #[error("exit.eod_time {0:?} is not HH:MM")]
    EodTime(String),
    #[error("fees.per_trade_fee must be non-negative, got {0}")]
    NegativeFee(f64),
}
