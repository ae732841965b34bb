//! PnL normalization.
//!
//! Realized and unrealized PnL are mutually exclusive: an open trade only
//! carries unrealized PnL at its mark, a closed trade only carries realized
//! PnL at its exit. Net is `realized + unrealized - fees`, rounded to six
//! decimals. Dirty numeric input never raises: it degrades to `0.0` and the
//! degradation is reported back in a [`PnlReport`] and on the sink.

use serde_json::{json, Map, Value};

use crate::error::NumericError;
use crate::sink::EventSink;
use crate::types::Trade;

pub const PNL_DECIMALS: i32 = 6;

/// Round to `dp` decimals. `None` when the input is not finite.
pub fn round_dp(x: f64, dp: i32) -> Option<f64> {
    if !x.is_finite() {
        return None;
    }
    let factor = 10f64.powi(dp);
    let scaled = x * factor;
    if !scaled.is_finite() {
        // Magnitude is far beyond six decimals of precision already.
        return Some(x);
    }
    Some(scaled.round() / factor)
}

pub fn round6(x: f64) -> f64 {
    round_dp(x, PNL_DECIMALS).unwrap_or(0.0)
}

/// Strict numeric parse of a loose JSON value. Only finite numbers pass;
/// strings such as `"NaN"` or `"inf"` are rejected.
pub fn parse_numeric(value: &Value) -> Result<f64, NumericError> {
    let parsed = match value {
        Value::Null => return Err(NumericError::Missing),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(x) if x.is_finite() => Ok(x),
        _ => Err(NumericError::NotNumeric(value.to_string())),
    }
}

/// Result of coercing a field: the value to use and whether it was defaulted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coerced {
    pub value: f64,
    pub degraded: bool,
}

/// Absent keys take `default` silently; present but unparseable values take
/// `default` and are flagged.
pub fn coerce(value: Option<&Value>, default: f64) -> Coerced {
    match value {
        None => Coerced {
            value: default,
            degraded: false,
        },
        Some(v) => match parse_numeric(v) {
            Ok(value) => Coerced {
                value,
                degraded: false,
            },
            Err(_) => Coerced {
                value: default,
                degraded: true,
            },
        },
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PnlFields {
    pub realized: f64,
    pub unrealized: f64,
    pub net: f64,
}

/// What a normalize pass had to paper over.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PnlReport {
    /// Fields whose value was replaced by a default.
    pub coerced: Vec<&'static str>,
    /// Non-finite result zeroed all PnL fields.
    pub non_finite_reset: bool,
}

impl PnlReport {
    pub fn is_clean(&self) -> bool {
        self.coerced.is_empty() && !self.non_finite_reset
    }

    fn note_coerced(&mut self, field: &'static str, raw: &str, sink: &dyn EventSink) {
        sink.warn(&format!("pnl: {field} value {raw} is not numeric; using 0.0"));
        self.coerced.push(field);
    }
}

struct PnlInputs {
    entry: Option<f64>,
    exit: Option<f64>,
    mark: Option<f64>,
    closed: bool,
    quantity: f64,
    fees: f64,
    net_override: Option<f64>,
}

fn pnl_for(open: Option<f64>, close: Option<f64>, quantity: f64) -> f64 {
    match (open, close) {
        (Some(o), Some(c)) => (c - o) * quantity,
        _ => 0.0,
    }
}

fn compute(inputs: &PnlInputs, report: &mut PnlReport, sink: &dyn EventSink) -> PnlFields {
    let realized = if inputs.closed {
        pnl_for(inputs.entry, inputs.exit, inputs.quantity)
    } else {
        0.0
    };
    let unrealized = if inputs.closed {
        0.0
    } else {
        pnl_for(inputs.entry, inputs.mark, inputs.quantity)
    };
    let net = inputs
        .net_override
        .unwrap_or(realized + unrealized - inputs.fees);

    let rounded = (
        round_dp(realized, PNL_DECIMALS),
        round_dp(unrealized, PNL_DECIMALS),
        round_dp(net, PNL_DECIMALS),
    );
    match rounded {
        (Some(realized), Some(unrealized), Some(net)) if net.is_finite() => PnlFields {
            realized,
            unrealized,
            net,
        },
        _ => {
            sink.warn(&format!(
                "pnl: non-finite result (realized={realized}, unrealized={unrealized}, net={net}); zeroing"
            ));
            report.non_finite_reset = true;
            PnlFields::default()
        }
    }
}

/// Recompute the derived PnL fields of `trade` in place.
pub fn normalize(trade: &mut Trade, sink: &dyn EventSink) -> PnlReport {
    let mut report = PnlReport::default();

    if !trade.fees.is_finite() {
        report.note_coerced("fees", &trade.fees.to_string(), sink);
        trade.fees = 0.0;
    }
    let quantity = if trade.quantity.is_nan() {
        report.note_coerced("quantity", "NaN", sink);
        0.0
    } else {
        trade.quantity
    };

    let inputs = PnlInputs {
        entry: Some(trade.entry_price),
        exit: trade.exit_price,
        mark: Some(trade.exit_price.unwrap_or(trade.mark_price)),
        closed: trade.exit_price.is_some(),
        quantity,
        fees: trade.fees,
        net_override: None,
    };
    let fields = compute(&inputs, &mut report, sink);
    trade.realized_pnl = fields.realized;
    trade.unrealized_pnl = fields.unrealized;
    trade.net_pnl = fields.net;
    report
}

fn price_field(
    record: &Map<String, Value>,
    key: &'static str,
    report: &mut PnlReport,
    sink: &dyn EventSink,
) -> Option<f64> {
    match record.get(key) {
        None | Some(Value::Null) => None,
        Some(v) => match parse_numeric(v) {
            Ok(p) => Some(p),
            Err(_) => {
                report.note_coerced(key, &v.to_string(), sink);
                None
            }
        },
    }
}

fn numeric_field(
    record: &Map<String, Value>,
    key: &'static str,
    report: &mut PnlReport,
    sink: &dyn EventSink,
) -> f64 {
    let c = coerce(record.get(key), 0.0);
    if c.degraded {
        let raw = record.get(key).map(Value::to_string).unwrap_or_default();
        report.note_coerced(key, &raw, sink);
    }
    c.value
}

/// Normalize a loosely-typed trade record, e.g. one read from a trade log.
///
/// A supplied `pnl_rupees` (or, failing that, `pnl`) is taken as the
/// authoritative net figure. Writes `realized_pnl`, `unrealized_pnl`,
/// `net_pnl`, `fees` and the `pnl_rupees` / `pnl` aliases.
pub fn normalize_record(record: &mut Map<String, Value>, sink: &dyn EventSink) -> PnlReport {
    let mut report = PnlReport::default();

    let fees = numeric_field(record, "fees", &mut report, sink);
    let quantity = numeric_field(record, "quantity", &mut report, sink);
    let entry = price_field(record, "entry_price", &mut report, sink);
    let closed = !matches!(record.get("exit_price"), None | Some(Value::Null));
    let exit = price_field(record, "exit_price", &mut report, sink);
    let mark = if record.contains_key("mark_price") {
        price_field(record, "mark_price", &mut report, sink)
    } else if closed {
        exit
    } else {
        entry
    };
    let net_override = if record.contains_key("pnl_rupees") {
        Some(numeric_field(record, "pnl_rupees", &mut report, sink))
    } else if record.contains_key("pnl") {
        Some(numeric_field(record, "pnl", &mut report, sink))
    } else {
        None
    };

    let inputs = PnlInputs {
        entry,
        exit,
        mark,
        closed,
        quantity,
        fees,
        net_override,
    };
    let fields = compute(&inputs, &mut report, sink);

    record.insert("realized_pnl".into(), json!(fields.realized));
    record.insert("unrealized_pnl".into(), json!(fields.unrealized));
    record.insert("net_pnl".into(), json!(fields.net));
    record.insert("fees".into(), json!(fees));
    record.insert("pnl_rupees".into(), json!(fields.net));
    record.insert("pnl".into(), json!(fields.net));
    report
}
