//! Load and validate runtime configuration.

use std::{fs, path::Path};

use anyhow::Context;
use chrono::NaiveTime;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::selector::SelectionFilters;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SelectionCfg {
    pub min_open_interest: Option<u64>,
    pub min_volume: Option<u64>,
    pub delta_min: f64,
    pub delta_max: f64,
}

impl Default for SelectionCfg {
    fn default() -> Self {
        Self {
            min_open_interest: None,
            min_volume: None,
            delta_min: 0.30,
            delta_max: 0.70,
        }
    }
}

impl SelectionCfg {
    pub fn filters(&self) -> SelectionFilters {
        SelectionFilters {
            delta_range: Some((self.delta_min, self.delta_max)),
            min_open_interest: self.min_open_interest,
            min_volume: self.min_volume,
            ..SelectionFilters::default()
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LotSizeCfg {
    pub fixed_lots: u32,
}

impl Default for LotSizeCfg {
    fn default() -> Self {
        Self { fixed_lots: 1 }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct FeesCfg {
    pub per_trade_fee: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ExitCfg {
    pub eod_exit_enabled: bool,
    pub eod_time: String, // "HH:MM", UTC
    pub target_pct: f64,
    pub stoploss_pct: f64,
}

impl Default for ExitCfg {
    fn default() -> Self {
        Self {
            eod_exit_enabled: false,
            eod_time: "15:25".to_string(),
            target_pct: 5.0,
            stoploss_pct: 20.0,
        }
    }
}

impl ExitCfg {
    pub fn eod_cutoff(&self) -> Result<NaiveTime, ConfigError> {
        NaiveTime::parse_from_str(self.eod_time.trim(), "%H:%M")
            .map_err(|_| ConfigError::EodTime(self.eod_time.clone()))
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RiskCfg {
    pub max_trades_per_day: u32,
    pub max_loss_per_day_pct: f64,
}

impl Default for RiskCfg {
    fn default() -> Self {
        Self {
            max_trades_per_day: 4,
            max_loss_per_day_pct: 2.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Random,
    BuyCall,
    BuyPut,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub symbols: Vec<String>,
    pub seed: Option<u64>,
    pub direction: Direction,
    /// Capital base for the daily loss percentage.
    pub capital: f64,
    /// Simulated premium moves are drawn from +/- this percentage.
    pub move_range_pct: f64,
    pub selection: SelectionCfg,
    pub lot_size: LotSizeCfg,
    pub fees: FeesCfg,
    pub exit: ExitCfg,
    pub risk: RiskCfg,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols: vec!["NIFTY_SYNTH".to_string(), "RELIANCE_SYNTH".to_string()],
            seed: Some(42),
            direction: Direction::Random,
            capital: 100_000.0,
            move_range_pct: 25.0,
            selection: SelectionCfg::default(),
            lot_size: LotSizeCfg::default(),
            fees: FeesCfg::default(),
            exit: ExitCfg::default(),
            risk: RiskCfg::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let cfg = Self::from_yaml_str(&s).with_context(|| format!("parse config {}", path.display()))?;
        Ok(cfg)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::warn!("Config {} not found; using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_yaml_str(s: &str) -> anyhow::Result<Self> {
        // an empty document deserializes to unit, not a map
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Self = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.selection.delta_min > self.selection.delta_max {
            return Err(ConfigError::DeltaRange {
                min: self.selection.delta_min,
                max: self.selection.delta_max,
            });
        }
        self.exit.eod_cutoff()?;
        if self.fees.per_trade_fee < 0.0 {
            return Err(ConfigError::NegativeFee(self.fees.per_trade_fee));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        let cfg = AppConfig::from_yaml_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.exit.eod_cutoff().unwrap(), NaiveTime::from_hms_opt(15, 25, 0).unwrap());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg = AppConfig::from_yaml_str(
            r#"
symbols: [BANKNIFTY_SYNTH]
direction: buy_put
selection:
  min_open_interest: 10
  delta_max: 0.8
lot_size:
  fixed_lots: 3
fees:
  per_trade_fee: 0.1
exit:
  eod_exit_enabled: true
  eod_time: "15:10"
risk:
  max_trades_per_day: 2
"#,
        )
        .unwrap();
        assert_eq!(cfg.symbols, vec!["BANKNIFTY_SYNTH"]);
        assert_eq!(cfg.direction, Direction::BuyPut);
        assert_eq!(cfg.selection.min_open_interest, Some(10));
        assert_eq!(cfg.selection.min_volume, None);
        assert_eq!(cfg.selection.delta_min, 0.30);
        assert_eq!(cfg.selection.delta_max, 0.8);
        assert_eq!(cfg.lot_size.fixed_lots, 3);
        assert_eq!(cfg.fees.per_trade_fee, 0.1);
        assert!(cfg.exit.eod_exit_enabled);
        assert_eq!(cfg.exit.target_pct, 5.0);
        assert_eq!(cfg.risk.max_trades_per_day, 2);
        assert_eq!(cfg.risk.max_loss_per_day_pct, 2.0);
        assert_eq!(cfg.seed, Some(42));
    }

    #[test]
    fn selection_maps_to_filters() {
        let f = SelectionCfg {
            min_open_interest: Some(5),
            min_volume: Some(7),
            delta_min: 0.25,
            delta_max: 0.6,
        }
        .filters();
        assert!(f.prefer_nearest);
        assert_eq!(f.delta_range, Some((0.25, 0.6)));
        assert_eq!(f.min_open_interest, Some(5));
        assert_eq!(f.min_volume, Some(7));
        assert_eq!(f.max_premium, None);
    }

    #[test]
    fn rejects_inverted_delta_bad_eod_and_negative_fee() {
        let err = AppConfig::from_yaml_str("selection: {delta_min: 0.9, delta_max: 0.1}").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::DeltaRange { .. })
        ));

        let err = AppConfig::from_yaml_str("exit: {eod_time: \"late\"}").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::EodTime("late".into()))
        );

        let err = AppConfig::from_yaml_str("fees: {per_trade_fee: -1.0}").unwrap_err();
        assert_eq!(err.downcast_ref::<ConfigError>(), Some(&ConfigError::NegativeFee(-1.0)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = AppConfig::load_or_default("definitely/not/here.yaml").unwrap();
        assert_eq!(cfg, AppConfig::default());
    }
}
