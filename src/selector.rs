//! ITM strike selection.
//!
//! Candidates are narrowed to the requested side and to strikes that are
//! in the money at `spot`. Liquidity and delta filters are applied next; if
//! they reject everything the full ITM set is used instead. The survivor
//! closest to spot wins, with open interest and then volume as tie-breaks.

use std::cmp::Ordering;

use crate::error::SelectError;
use crate::sink::{self, EventSink, SharedSink};
use crate::types::{OptionRecord, OptionSide};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionFilters {
    /// Rank by distance from spot first; otherwise by liquidity first.
    pub prefer_nearest: bool,
    /// Inclusive bounds on |delta|. `None` disables the check.
    pub delta_range: Option<(f64, f64)>,
    pub min_open_interest: Option<u64>,
    pub min_volume: Option<u64>,
    pub max_premium: Option<f64>,
}

impl Default for SelectionFilters {
    fn default() -> Self {
        Self {
            prefer_nearest: true,
            delta_range: Some((0.30, 0.70)),
            min_open_interest: None,
            min_volume: None,
            max_premium: None,
        }
    }
}

impl SelectionFilters {
    pub fn passes(&self, r: &OptionRecord) -> bool {
        if self.min_open_interest.is_some_and(|min| r.open_interest < min) {
            return false;
        }
        if self.min_volume.is_some_and(|min| r.volume < min) {
            return false;
        }
        if self.max_premium.is_some_and(|max| r.premium > max) {
            return false;
        }
        if let Some((lo, hi)) = self.delta_range {
            let d = r.delta.abs();
            if d < lo || d > hi {
                return false;
            }
        }
        true
    }
}

/// Pluggable strike selection. `side` is the raw label supplied by the
/// caller and is validated by the implementation.
pub trait StrikeSelector {
    fn select(
        &self,
        candidates: &[OptionRecord],
        spot: f64,
        side: &str,
        filters: &SelectionFilters,
    ) -> Result<Option<OptionRecord>, SelectError>;
}

/// Nearest in-the-money strike with filter fallback.
pub struct NearestItmSelector {
    sink: SharedSink,
}

impl Default for NearestItmSelector {
    fn default() -> Self {
        Self::new(sink::noop())
    }
}

impl NearestItmSelector {
    pub fn new(sink: SharedSink) -> Self {
        Self { sink }
    }
}

impl StrikeSelector for NearestItmSelector {
    fn select(
        &self,
        candidates: &[OptionRecord],
        spot: f64,
        side: &str,
        filters: &SelectionFilters,
    ) -> Result<Option<OptionRecord>, SelectError> {
        select_itm_strike(candidates, spot, side, filters, self.sink.as_ref())
    }
}

fn rank(a: &OptionRecord, b: &OptionRecord, spot: f64, prefer_nearest: bool) -> Ordering {
    let dist = (a.strike - spot).abs().total_cmp(&(b.strike - spot).abs());
    // higher OI / volume sorts first
    let oi = b.open_interest.cmp(&a.open_interest);
    let vol = b.volume.cmp(&a.volume);
    if prefer_nearest {
        dist.then(oi).then(vol)
    } else {
        oi.then(vol).then(dist)
    }
}

pub fn select_itm_strike(
    candidates: &[OptionRecord],
    spot: f64,
    side: &str,
    filters: &SelectionFilters,
    sink: &dyn EventSink,
) -> Result<Option<OptionRecord>, SelectError> {
    if !spot.is_finite() {
        return Err(SelectError::InvalidInput(format!("spot must be numeric, got {spot}")));
    }
    let side: OptionSide = side.parse()?;

    let itm: Vec<&OptionRecord> = candidates
        .iter()
        .filter(|r| r.side == side && side.is_itm(r.strike, spot))
        .collect();
    if itm.is_empty() {
        sink.info(&format!("No ITM strikes found for {side} at spot={spot:.2}"));
        return Ok(None);
    }

    let mut pool: Vec<&OptionRecord> = itm.iter().copied().filter(|r| filters.passes(r)).collect();
    if pool.is_empty() {
        sink.info("No strikes passed filters; falling back to nearest ITM only");
        pool = itm;
    }

    // min_by keeps the first of equal elements, so ties resolve by input order
    let best = pool
        .into_iter()
        .min_by(|a, b| rank(a, b, spot, filters.prefer_nearest));
    if let Some(b) = best {
        sink.debug(&format!(
            "Selected strike={} diff={:.2} oi={} vol={}",
            b.strike,
            (b.strike - spot).abs(),
            b.open_interest,
            b.volume
        ));
    }
    Ok(best.cloned())
}
