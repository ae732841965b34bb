//! In-memory trade ledger. Owns every trade for the lifetime of a run and
//! keeps the PnL fields consistent through open / mark / close.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;
use crate::pnl::{self, round6};
use crate::sink::{self, SharedSink};
use crate::types::{OpenTrade, Trade};

/// Aggregate view consumed by run reports. Field names are part of the
/// summary file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub count_open: usize,
    pub count_closed: usize,
    pub total_realized: f64,
    pub total_fees: f64,
    pub net: f64,
}

/// Outcome of [`TradeLedger::update_mark`].
#[derive(Debug, Clone, PartialEq)]
pub struct MarkUpdate {
    pub trade: Trade,
    /// `false` when the trade was already closed and the mark was dropped.
    pub applied: bool,
}

pub struct TradeLedger {
    trades: Vec<Trade>,
    index: HashMap<String, usize>,
    sink: SharedSink,
}

impl Default for TradeLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::with_sink(sink::noop())
    }

    pub fn with_sink(sink: SharedSink) -> Self {
        Self {
            trades: Vec::new(),
            index: HashMap::new(),
            sink,
        }
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Trade> {
        self.index.get(id).map(|&i| &self.trades[i])
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Trade, LedgerError> {
        match self.index.get(id) {
            Some(&i) => Ok(&mut self.trades[i]),
            None => Err(LedgerError::NotFound(id.to_string())),
        }
    }

    pub fn open(&mut self, req: OpenTrade) -> Trade {
        self.open_at(req, Utc::now())
    }

    pub fn open_at(&mut self, req: OpenTrade, opened_at: DateTime<Utc>) -> Trade {
        let id = Uuid::new_v4().to_string();
        let mut trade = Trade {
            id: id.clone(),
            symbol: req.symbol,
            strike: req.strike,
            side: req.side,
            quantity: req.quantity,
            entry_price: req.entry_price,
            exit_price: None,
            mark_price: req.entry_price,
            fees: req.fees,
            realized_pnl: 0.0,
            unrealized_pnl: 0.0,
            net_pnl: 0.0,
            opened_at,
            closed_at: None,
            metadata: req.metadata,
        };
        pnl::normalize(&mut trade, self.sink.as_ref());
        self.sink.info(&format!(
            "Opened trade {} {} qty={} entry={:.2}",
            id,
            trade.describe(),
            trade.quantity,
            trade.entry_price
        ));
        self.index.insert(id, self.trades.len());
        self.trades.push(trade.clone());
        trade
    }

    /// Re-mark an open trade. Closed trades are returned untouched with
    /// `applied == false`.
    pub fn update_mark(&mut self, id: &str, mark_price: f64) -> Result<MarkUpdate, LedgerError> {
        let sink = self.sink.clone();
        let trade = self.get_mut(id)?;
        if trade.is_closed() {
            sink.debug(&format!("Ignoring mark {mark_price} for closed trade {id}"));
            return Ok(MarkUpdate {
                trade: trade.clone(),
                applied: false,
            });
        }
        trade.mark_price = mark_price;
        pnl::normalize(trade, sink.as_ref());
        Ok(MarkUpdate {
            trade: trade.clone(),
            applied: true,
        })
    }

    /// Close a trade at `exit_price`. Closing an already-closed trade
    /// overwrites its exit price and close time.
    pub fn close(
        &mut self,
        id: &str,
        exit_price: f64,
        close_time: Option<DateTime<Utc>>,
    ) -> Result<Trade, LedgerError> {
        let sink = self.sink.clone();
        let trade = self.get_mut(id)?;
        if trade.is_closed() {
            sink.warn(&format!("Re-closing trade {id}; previous exit overwritten"));
        }
        trade.exit_price = Some(exit_price);
        trade.closed_at = Some(close_time.unwrap_or_else(Utc::now));
        trade.mark_price = exit_price;
        pnl::normalize(trade, sink.as_ref());
        sink.info(&format!(
            "Closed trade {} exit={:.2} realized={:.2} net={:.2}",
            id, exit_price, trade.realized_pnl, trade.net_pnl
        ));
        Ok(trade.clone())
    }

    pub fn list_open(&self) -> Vec<Trade> {
        self.trades.iter().filter(|t| t.is_open()).cloned().collect()
    }

    pub fn list_closed(&self) -> Vec<Trade> {
        self.trades.iter().filter(|t| t.is_closed()).cloned().collect()
    }

    /// All trades in the order they were opened.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Fees count for every trade (charged at entry); realized and net only
    /// for closed trades.
    pub fn summary(&self) -> LedgerSummary {
        let (open, closed): (Vec<&Trade>, Vec<&Trade>) =
            self.trades.iter().partition(|t| t.is_open());
        LedgerSummary {
            count_open: open.len(),
            count_closed: closed.len(),
            total_realized: round6(closed.iter().map(|t| t.realized_pnl).sum()),
            total_fees: round6(self.trades.iter().map(|t| t.fees).sum()),
            net: round6(closed.iter().map(|t| t.net_pnl).sum()),
        }
    }

    /// Number of trades opened on `day` (UTC).
    pub fn opened_on(&self, day: NaiveDate) -> usize {
        self.trades
            .iter()
            .filter(|t| t.opened_at.date_naive() == day)
            .count()
    }

    /// Net PnL booked by trades closed on `day` (UTC).
    pub fn realized_net_on(&self, day: NaiveDate) -> f64 {
        round6(
            self.trades
                .iter()
                .filter(|t| t.closed_at.map(|c| c.date_naive()) == Some(day))
                .map(|t| t.net_pnl)
                .sum(),
        )
    }
}
