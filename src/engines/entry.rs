//! Entry policy: signal -> side -> strike -> open-trade request.

use serde_json::json;

use crate::config::AppConfig;
use crate::error::SelectError;
use crate::selector::{SelectionFilters, StrikeSelector};
use crate::sink::{self, SharedSink};
use crate::types::{ChainSnapshot, OpenTrade, Signal};

pub struct EntryEngine {
    selector: Box<dyn StrikeSelector>,
    filters: SelectionFilters,
    lots: u32,
    per_trade_fee: f64,
    sink: SharedSink,
}

impl EntryEngine {
    pub fn new(selector: Box<dyn StrikeSelector>, cfg: &AppConfig) -> Self {
        Self {
            selector,
            filters: cfg.selection.filters(),
            lots: cfg.lot_size.fixed_lots,
            per_trade_fee: cfg.fees.per_trade_fee,
            sink: sink::noop(),
        }
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    /// Build the open request for `signal`, or `None` when no strike qualifies.
    /// The entry price is the selected strike's premium.
    pub fn try_enter(
        &self,
        symbol: &str,
        signal: Signal,
        snapshot: &ChainSnapshot,
    ) -> Result<Option<OpenTrade>, SelectError> {
        let side = signal.side();
        let Some(strike) =
            self.selector
                .select(&snapshot.strikes, snapshot.spot, side.label(), &self.filters)?
        else {
            self.sink.info(&format!(
                "No {side} strike for {symbol} at spot={:.2}; no entry",
                snapshot.spot
            ));
            return Ok(None);
        };

        let req = OpenTrade::new(symbol, strike.strike, side, f64::from(self.lots), strike.premium)
            .with_fees(self.per_trade_fee)
            .with_metadata("signal", json!(signal))
            .with_metadata("spot", snapshot.spot)
            .with_metadata("delta", strike.delta)
            .with_metadata("open_interest", strike.open_interest);
        Ok(Some(req))
    }
}
