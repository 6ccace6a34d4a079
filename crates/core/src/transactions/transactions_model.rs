use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, ValidationError};

/// Kinds of ledger entries the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Buy,
    Sell,
    Dividend,
    Interest,
    /// Cash moved between currency ledgers, not a security trade.
    CurrencyMove,
}

impl TransactionType {
    pub fn is_trade(&self) -> bool {
        matches!(self, TransactionType::Buy | TransactionType::Sell)
    }
}

/// An immutable ledger entry.
///
/// Transactions are inputs to calculations, never mutated by them; editing
/// one produces a fresh calculation rather than patching derived results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub portfolio_id: String,
    /// Provider-resolvable symbol, e.g. "AAPL" or "SAP.DE".
    pub ticker: String,
    /// Market tag used for split matching, e.g. "XNAS". May be empty.
    pub market: String,
    pub transaction_type: TransactionType,
    pub date: NaiveDate,
    pub shares: Decimal,
    pub price: Decimal,
    /// Total amount for non-trade entries (dividend, interest, currency
    /// moves). Trades derive their amount from shares x price.
    pub amount: Option<Decimal>,
    pub fees: Decimal,
    pub currency: String,
    /// Exchange rate captured at trade time, if the broker reported one.
    pub fx_rate: Option<Decimal>,
}

impl Transaction {
    /// Validating constructor. Trades must carry positive shares and price.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        portfolio_id: impl Into<String>,
        ticker: impl Into<String>,
        market: impl Into<String>,
        transaction_type: TransactionType,
        date: NaiveDate,
        shares: Decimal,
        price: Decimal,
        amount: Option<Decimal>,
        fees: Decimal,
        currency: impl Into<String>,
        fx_rate: Option<Decimal>,
    ) -> Result<Self> {
        if transaction_type.is_trade() {
            if shares <= Decimal::ZERO {
                return Err(ValidationError::InvalidInput(format!(
                    "Trade requires positive share count, got {}",
                    shares
                ))
                .into());
            }
            if price <= Decimal::ZERO {
                return Err(ValidationError::InvalidInput(format!(
                    "Trade requires positive price, got {}",
                    price
                ))
                .into());
            }
        }
        if fees < Decimal::ZERO {
            return Err(
                ValidationError::InvalidInput(format!("Negative fees: {}", fees)).into(),
            );
        }

        Ok(Self {
            id: id.into(),
            portfolio_id: portfolio_id.into(),
            ticker: ticker.into(),
            market: market.into(),
            transaction_type,
            date,
            shares,
            price,
            amount,
            fees,
            currency: currency.into(),
            fx_rate,
        })
    }

    /// Gross amount in the transaction's own currency, before fees.
    pub fn gross_amount(&self) -> Decimal {
        match self.transaction_type {
            TransactionType::Buy | TransactionType::Sell => self.shares * self.price,
            _ => self.amount.unwrap_or(self.shares * self.price),
        }
    }
}
