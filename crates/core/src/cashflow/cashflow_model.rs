use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What a cash flow represents from the investor's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowKind {
    Inflow,
    Outflow,
    /// Synthetic closing flow: market value of open positions at the
    /// valuation date.
    TerminalValue,
}

/// A dated, signed amount in the valuation currency. Ephemeral - rebuilt
/// for every calculation, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowEvent {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub kind: FlowKind,
}

impl CashFlowEvent {
    pub fn new(date: NaiveDate, amount: Decimal, kind: FlowKind) -> Self {
        Self { date, amount, kind }
    }
}

/// Which ledger entries participate in the flow set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowScope {
    /// Security-level view: pure currency-ledger movements are excluded.
    Security,
    /// Ledger-level view: currency movements count as flows too.
    Ledger,
}

/// A price or rate the engine could not resolve. Collected instead of
/// thrown; the caller reports `is_complete = false` alongside these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingDataPoint {
    pub symbol: String,
    pub date: NaiveDate,
    pub reason: String,
}

impl MissingDataPoint {
    pub fn new(symbol: impl Into<String>, date: NaiveDate, reason: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            reason: reason.into(),
        }
    }
}
