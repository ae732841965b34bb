//! Risk checks before a new trade is opened.

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::RiskCfg;
use crate::ledger::TradeLedger;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DayStats {
    pub trades_today: u32,
    /// Negative means loss.
    pub todays_loss_pct: f64,
}

impl DayStats {
    /// Trades opened on `day` and the net PnL booked that day as a
    /// percentage of `capital`.
    pub fn from_ledger(ledger: &TradeLedger, day: NaiveDate, capital: f64) -> Self {
        let booked = ledger.realized_net_on(day);
        let todays_loss_pct = if capital > 0.0 {
            booked * 100.0 / capital
        } else {
            0.0
        };
        Self {
            trades_today: u32::try_from(ledger.opened_on(day)).unwrap_or(u32::MAX),
            todays_loss_pct,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RiskRejection {
    #[error("{taken} trades already taken today (max {max})")]
    MaxTrades { taken: u32, max: u32 },
    #[error("today's PnL {loss_pct:.2}% breaches max daily loss {max_pct:.2}%")]
    MaxDailyLoss { loss_pct: f64, max_pct: f64 },
}

pub struct RiskEngine {
    max_trades_per_day: u32,
    max_loss_per_day_pct: f64,
}

impl RiskEngine {
    pub fn new(max_trades_per_day: u32, max_loss_per_day_pct: f64) -> Self {
        Self {
            max_trades_per_day,
            max_loss_per_day_pct,
        }
    }

    pub fn from_cfg(cfg: &RiskCfg) -> Self {
        Self::new(cfg.max_trades_per_day, cfg.max_loss_per_day_pct)
    }

    pub fn pre_check(&self, stats: &DayStats) -> Result<(), RiskRejection> {
        if stats.trades_today >= self.max_trades_per_day {
            return Err(RiskRejection::MaxTrades {
                taken: stats.trades_today,
                max: self.max_trades_per_day,
            });
        }
        if stats.todays_loss_pct <= -self.max_loss_per_day_pct {
            return Err(RiskRejection::MaxDailyLoss {
                loss_pct: stats.todays_loss_pct,
                max_pct: self.max_loss_per_day_pct,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OpenTrade, OptionSide};
    use chrono::{TimeZone, Utc};

    fn stats(trades_today: u32, todays_loss_pct: f64) -> DayStats {
        DayStats {
            trades_today,
            todays_loss_pct,
        }
    }

    #[test]
    fn trade_count_limit() {
        let risk = RiskEngine::from_cfg(&RiskCfg::default());
        assert!(risk.pre_check(&stats(3, 0.0)).is_ok());
        assert_eq!(
            risk.pre_check(&stats(4, 0.0)),
            Err(RiskRejection::MaxTrades { taken: 4, max: 4 })
        );
    }

    #[test]
    fn daily_loss_limit_is_inclusive() {
        let risk = RiskEngine::new(10, 2.0);
        assert!(risk.pre_check(&stats(0, -1.99)).is_ok());
        assert!(risk.pre_check(&stats(0, 5.0)).is_ok());
        assert!(matches!(
            risk.pre_check(&stats(0, -2.0)),
            Err(RiskRejection::MaxDailyLoss { .. })
        ));
    }

    #[test]
    fn stats_from_ledger() {
        let mut ledger = TradeLedger::new();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let t = ledger.open_at(OpenTrade::new("NIFTY", 15000.0, OptionSide::Call, 10.0, 100.0), at);
        ledger.open_at(OpenTrade::new("NIFTY", 15000.0, OptionSide::Put, 10.0, 100.0), at);
        ledger.close(&t.id, 70.0, Some(at)).unwrap();

        let s = DayStats::from_ledger(&ledger, at.date_naive(), 10_000.0);
        assert_eq!(s.trades_today, 2);
        assert_eq!(s.todays_loss_pct, -3.0);
        assert!(RiskEngine::new(4, 2.0).pre_check(&s).is_err());

        assert_eq!(DayStats::from_ledger(&ledger, at.date_naive(), 0.0).todays_loss_pct, 0.0);
    }
}
