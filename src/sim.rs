//! Offline simulator: mock chain -> entry -> ledger -> mark -> exit.

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::config::{AppConfig, Direction};
use crate::engines::{DayStats, EntryEngine, ExitDecision, ExitPolicy, RiskEngine};
use crate::feed::MockFeed;
use crate::ledger::{LedgerSummary, TradeLedger};
use crate::selector::{NearestItmSelector, StrikeSelector};
use crate::sink::SharedSink;
use crate::types::{Signal, Trade};
use crate::utils::sanitize_symbol;

pub struct Simulator {
    cfg: AppConfig,
    feed: MockFeed,
    ledger: TradeLedger,
    entry: EntryEngine,
    exit: ExitPolicy,
    risk: RiskEngine,
    sink: SharedSink,
}

impl Simulator {
    pub fn new(cfg: AppConfig, sink: SharedSink) -> anyhow::Result<Self> {
        let selector = Box::new(NearestItmSelector::new(sink.clone()));
        Self::with_selector(cfg, selector, sink)
    }

    pub fn with_selector(
        cfg: AppConfig,
        selector: Box<dyn StrikeSelector>,
        sink: SharedSink,
    ) -> anyhow::Result<Self> {
        cfg.validate().context("invalid simulator config")?;
        let exit = ExitPolicy::from_cfg(&cfg.exit)?;
        Ok(Self {
            feed: MockFeed::new(cfg.seed),
            ledger: TradeLedger::with_sink(sink.clone()),
            entry: EntryEngine::new(selector, &cfg).with_sink(sink.clone()),
            risk: RiskEngine::from_cfg(&cfg.risk),
            exit,
            sink,
            cfg,
        })
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    fn signal(&mut self) -> Signal {
        match self.cfg.direction {
            Direction::BuyCall => Signal::Bullish,
            Direction::BuyPut => Signal::Bearish,
            Direction::Random => self.feed.random_signal(),
        }
    }

    /// One entry attempt for `symbol`. Returns the trade as it stands after
    /// the simulated tick, or `None` when risk or selection declined.
    pub fn run_for_symbol(&mut self, symbol: &str, now: DateTime<Utc>) -> anyhow::Result<Option<Trade>> {
        let symbol = sanitize_symbol(symbol);

        let stats = DayStats::from_ledger(&self.ledger, now.date_naive(), self.cfg.capital);
        if let Err(rejection) = self.risk.pre_check(&stats) {
            self.sink.warn(&format!("Risk rejected {symbol}: {rejection}"));
            return Ok(None);
        }

        let snap = self.feed.snapshot(&symbol);
        self.sink.info(&format!(
            "Snapshot for {symbol}: spot={:.2} strikes={}",
            snap.spot,
            snap.strikes.len()
        ));

        let signal = self.signal();
        let Some(req) = self
            .entry
            .try_enter(&symbol, signal, &snap)
            .with_context(|| format!("select strike for {symbol}"))?
        else {
            self.sink.warn(&format!("No candidate found for {symbol}; skipping"));
            return Ok(None);
        };

        let trade = self.ledger.open_at(req.with_metadata("selector", "sim"), now);

        let new_premium = self.feed.next_premium(trade.entry_price, self.cfg.move_range_pct);
        let marked = self.ledger.update_mark(&trade.id, new_premium)?;
        self.sink.info(&format!(
            "Updated mark for trade {}: {:.2} (unrealized {:+.2})",
            trade.id, new_premium, marked.trade.unrealized_pnl
        ));

        // same UTC clock as the risk day above
        match self.exit.evaluate(trade.entry_price, new_premium, now.time()) {
            ExitDecision::Exit(reason) => {
                self.sink.info(&format!("Exit {} on {:?}", trade.id, reason));
                let closed = self.ledger.close(&trade.id, new_premium, Some(now))?;
                Ok(Some(closed))
            }
            ExitDecision::Hold => Ok(Some(marked.trade)),
        }
    }

    /// Every configured symbol once; a failing symbol is logged and skipped.
    pub fn run(&mut self) -> LedgerSummary {
        self.run_at(Utc::now())
    }

    pub fn run_at(&mut self, now: DateTime<Utc>) -> LedgerSummary {
        let symbols = self.cfg.symbols.clone();
        for s in &symbols {
            if let Err(e) = self.run_for_symbol(s, now) {
                self.sink.warn(&format!("Error running symbol {s}: {e:#}"));
            }
        }
        let summary = self.ledger.summary();
        self.sink.info(&format!(
            "Simulation summary: open={} closed={} realized={} fees={} net={}",
            summary.count_open,
            summary.count_closed,
            summary.total_realized,
            summary.total_fees,
            summary.net
        ));
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SelectError;
    use crate::selector::SelectionFilters;
    use crate::sink::{self, EventLevel, RecordingSink};
    use crate::types::{OptionRecord, OptionSide};
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 4, 0, 0).unwrap()
    }

    fn cfg() -> AppConfig {
        AppConfig {
            symbols: vec!["nifty_synth".into(), "RELIANCE_SYNTH".into(), "BANK_SYNTH".into()],
            seed: Some(11),
            direction: Direction::BuyCall,
            ..AppConfig::default()
        }
    }

    #[test]
    fn run_books_one_trade_per_symbol_consistently() {
        let mut sim = Simulator::new(cfg(), sink::noop()).unwrap();
        let summary = sim.run_at(at());

        assert_eq!(summary.count_open + summary.count_closed, 3);
        let trades = sim.ledger().trades();
        assert_eq!(trades[0].symbol, "NIFTY_SYNTH");
        for t in trades {
            assert_eq!(t.side, OptionSide::Call);
            assert_eq!(t.metadata["selector"], "sim");
            assert_eq!(t.net_pnl, crate::pnl::round6(t.realized_pnl + t.unrealized_pnl - t.fees));
        }
    }

    #[test]
    fn same_seed_same_run() {
        let a = Simulator::new(cfg(), sink::noop()).unwrap().run_at(at());
        let b = Simulator::new(cfg(), sink::noop()).unwrap().run_at(at());
        assert_eq!(a, b);
    }

    #[test]
    fn tight_exit_thresholds_close_everything() {
        let mut c = cfg();
        c.exit.target_pct = 0.0;
        c.exit.stoploss_pct = 0.0;
        let summary = Simulator::new(c, sink::noop()).unwrap().run_at(at());
        assert_eq!(summary.count_closed, 3);
        assert_eq!(summary.count_open, 0);
    }

    #[test]
    fn risk_caps_trades_per_day() {
        let sink = RecordingSink::new();
        let mut c = cfg();
        c.risk.max_trades_per_day = 2;
        let summary = Simulator::new(c, sink.clone()).unwrap().run_at(at());
        assert_eq!(summary.count_open + summary.count_closed, 2);
        assert!(sink.contains(EventLevel::Warn, "Risk rejected BANK_SYNTH"));
    }

    struct Broken;

    impl StrikeSelector for Broken {
        fn select(
            &self,
            _candidates: &[OptionRecord],
            _spot: f64,
            side: &str,
            _filters: &SelectionFilters,
        ) -> Result<Option<OptionRecord>, SelectError> {
            Err(SelectError::InvalidSide(side.to_string()))
        }
    }

    struct Nothing;

    impl StrikeSelector for Nothing {
        fn select(
            &self,
            _candidates: &[OptionRecord],
            _spot: f64,
            _side: &str,
            _filters: &SelectionFilters,
        ) -> Result<Option<OptionRecord>, SelectError> {
            Ok(None)
        }
    }

    #[test]
    fn selector_errors_are_logged_per_symbol() {
        let sink = RecordingSink::new();
        let mut sim = Simulator::with_selector(cfg(), Box::new(Broken), sink.clone()).unwrap();
        let summary = sim.run_at(at());
        assert_eq!(summary, LedgerSummary::default());
        assert_eq!(
            sink.events()
                .iter()
                .filter(|(l, m)| *l == EventLevel::Warn && m.starts_with("Error running symbol"))
                .count(),
            3
        );
    }

    #[test]
    fn no_candidate_skips_symbol() {
        let sink = RecordingSink::new();
        let mut sim = Simulator::with_selector(cfg(), Box::new(Nothing), sink.clone()).unwrap();
        assert!(sim.run_for_symbol("X", at()).unwrap().is_none());
        assert!(sink.contains(EventLevel::Warn, "No candidate found for X"));
        assert!(sim.ledger().is_empty());
    }

    #[test]
    fn eod_cutoff_and_risk_day_share_the_utc_clock() {
        let eod_only = || {
            let mut c = cfg();
            c.exit.eod_exit_enabled = true;
            c.exit.target_pct = 1_000.0;
            c.exit.stoploss_pct = 1_000.0;
            c.exit.eod_time = "23:30".into();
            c
        };
        let late = Utc.with_ymd_and_hms(2024, 3, 1, 23, 45, 0).unwrap();
        let mut sim = Simulator::new(eod_only(), sink::noop()).unwrap();
        let summary = sim.run_at(late);
        assert_eq!(summary.count_closed, 3);
        for t in sim.ledger().trades() {
            assert_eq!(t.closed_at.map(|c| c.date_naive()), Some(late.date_naive()));
        }

        let early = Utc.with_ymd_and_hms(2024, 3, 1, 23, 15, 0).unwrap();
        let summary = Simulator::new(eod_only(), sink::noop()).unwrap().run_at(early);
        assert_eq!(summary.count_open, 3);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut c = cfg();
        c.selection.delta_min = 0.9;
        c.selection.delta_max = 0.1;
        assert!(Simulator::new(c, sink::noop()).is_err());
    }
}
