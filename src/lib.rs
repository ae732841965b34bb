//! Option trade bookkeeping and ITM strike selection.
//!
//! [`ledger::TradeLedger`] tracks trades from open to close and keeps their
//! PnL fields consistent via [`pnl::normalize`]. [`selector`] picks a single
//! strike from an option chain. [`engines`] holds the entry, exit and risk
//! policies; [`sim`] wires everything to a mock feed for offline runs.

pub mod config;
pub mod engines;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod pnl;
pub mod report;
pub mod selector;
pub mod sim;
pub mod sink;
pub mod types;
pub mod utils;

pub use error::{ConfigError, LedgerError, NumericError, SelectError};
pub use ledger::{LedgerSummary, MarkUpdate, TradeLedger};
pub use selector::{NearestItmSelector, SelectionFilters, StrikeSelector};
pub use types::{ChainSnapshot, OpenTrade, OptionRecord, OptionSide, Signal, Trade};
