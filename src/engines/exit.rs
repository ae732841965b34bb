//! Exit policy: end-of-day cutoff, percentage target, percentage stop.

use chrono::NaiveTime;
use serde::Serialize;

use crate::config::ExitCfg;
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitReason {
    /// Entry price of zero leaves the move undefined.
    ZeroEntry,
    EndOfDay,
    Target,
    StopLoss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitDecision {
    Hold,
    Exit(ExitReason),
}

impl ExitDecision {
    pub fn should_exit(self) -> bool {
        matches!(self, ExitDecision::Exit(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitPolicy {
    eod_cutoff: Option<NaiveTime>,
    target_pct: f64,
    stoploss_pct: f64,
}

impl ExitPolicy {
    pub fn from_cfg(cfg: &ExitCfg) -> Result<Self, ConfigError> {
        let eod_cutoff = if cfg.eod_exit_enabled {
            Some(cfg.eod_cutoff()?)
        } else {
            None
        };
        Ok(Self {
            eod_cutoff,
            target_pct: cfg.target_pct,
            stoploss_pct: cfg.stoploss_pct,
        })
    }

    pub fn evaluate(&self, entry_price: f64, mark_price: f64, now: NaiveTime) -> ExitDecision {
        if entry_price == 0.0 {
            return ExitDecision::Exit(ExitReason::ZeroEntry);
        }
        if self.eod_cutoff.is_some_and(|cutoff| now >= cutoff) {
            return ExitDecision::Exit(ExitReason::EndOfDay);
        }
        let pct_move = (mark_price - entry_price) / entry_price * 100.0;
        if pct_move >= self.target_pct {
            return ExitDecision::Exit(ExitReason::Target);
        }
        if pct_move <= -self.stoploss_pct {
            return ExitDecision::Exit(ExitReason::StopLoss);
        }
        ExitDecision::Hold
    }
}

/// One-shot form of [`ExitPolicy::evaluate`].
pub fn should_exit(
    entry_price: f64,
    mark_price: f64,
    now: NaiveTime,
    cfg: &ExitCfg,
) -> Result<ExitDecision, ConfigError> {
    Ok(ExitPolicy::from_cfg(cfg)?.evaluate(entry_price, mark_price, now))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn policy(eod: bool) -> ExitPolicy {
        ExitPolicy::from_cfg(&ExitCfg {
            eod_exit_enabled: eod,
            ..ExitCfg::default()
        })
        .unwrap()
    }

    #[test]
    fn target_and_stop_thresholds_are_inclusive() {
        let p = policy(false);
        assert_eq!(p.evaluate(100.0, 105.0, t(10, 0)), ExitDecision::Exit(ExitReason::Target));
        assert_eq!(p.evaluate(100.0, 104.9, t(10, 0)), ExitDecision::Hold);
        assert_eq!(p.evaluate(100.0, 80.0, t(10, 0)), ExitDecision::Exit(ExitReason::StopLoss));
        assert_eq!(p.evaluate(100.0, 80.5, t(10, 0)), ExitDecision::Hold);
    }

    #[test]
    fn zero_entry_always_exits() {
        assert_eq!(
            policy(false).evaluate(0.0, 0.0, t(9, 15)),
            ExitDecision::Exit(ExitReason::ZeroEntry)
        );
    }

    #[test]
    fn eod_only_when_enabled() {
        assert_eq!(
            policy(true).evaluate(100.0, 100.0, t(15, 25)),
            ExitDecision::Exit(ExitReason::EndOfDay)
        );
        assert_eq!(policy(true).evaluate(100.0, 100.0, t(15, 24)), ExitDecision::Hold);
        assert_eq!(policy(false).evaluate(100.0, 100.0, t(15, 30)), ExitDecision::Hold);
    }

    #[test]
    fn bad_eod_time_only_matters_when_enabled() {
        let mut cfg = ExitCfg {
            eod_time: "3pm".into(),
            ..ExitCfg::default()
        };
        assert!(should_exit(100.0, 100.0, t(10, 0), &cfg).is_ok());
        cfg.eod_exit_enabled = true;
        assert_eq!(
            should_exit(100.0, 100.0, t(10, 0), &cfg),
            Err(ConfigError::EodTime("3pm".into()))
        );
    }

    #[test]
    fn decision_flag() {
        assert!(ExitDecision::Exit(ExitReason::Target).should_exit());
        assert!(!ExitDecision::Hold.should_exit());
    }
}
