//! Builds the signed cash-flow series a money-weighted return is solved on.
//!
//! Sign convention is the investor's: money leaving the pocket is negative
//! (buys, fees), money coming back is positive (sells, dividends, the
//! terminal value of whatever is still held). Transactions whose price or
//! FX rate cannot be resolved are skipped and reported, never guessed.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{Error, Result};
use crate::pricing::{PricingError, PricingService};
use crate::splits::{adjust_for_splits, StockSplit};
use crate::transactions::{Transaction, TransactionType};

use super::cashflow_model::{CashFlowEvent, FlowKind, FlowScope, MissingDataPoint};

pub struct CashFlowBuilder {
    pricing: Arc<PricingService>,
}

/// Net open position accumulated from the trade history.
struct OpenPosition {
    adjusted_shares: Decimal,
    currency: String,
}

impl CashFlowBuilder {
    pub fn new(pricing: Arc<PricingService>) -> Self {
        Self { pricing }
    }

    /// Maps transactions plus a terminal valuation into dated flows in
    /// `valuation_currency`.
    ///
    /// Items are processed sequentially on purpose: many lookups may share
    /// one underlying store handle, and the layered cache makes repeated
    /// (pair, date) resolutions cheap anyway.
    pub async fn build(
        &self,
        transactions: &[Transaction],
        all_splits: &[StockSplit],
        as_of: NaiveDate,
        valuation_currency: &str,
        scope: FlowScope,
    ) -> Result<(Vec<CashFlowEvent>, Vec<MissingDataPoint>)> {
        let mut flows = Vec::with_capacity(transactions.len() + 1);
        let mut missing = Vec::new();

        let mut ordered: Vec<&Transaction> = transactions.iter().filter(|t| t.date <= as_of).collect();
        ordered.sort_by_key(|t| t.date);

        for tx in &ordered {
            if tx.transaction_type == TransactionType::CurrencyMove
                && scope == FlowScope::Security
            {
                continue;
            }

            let fx = match self.rate_for(tx, valuation_currency).await? {
                Some(rate) => rate,
                None => {
                    missing.push(MissingDataPoint::new(
                        format!("{}{}", tx.currency, valuation_currency),
                        tx.date,
                        format!("exchange rate unavailable for transaction {}", tx.id),
                    ));
                    continue;
                }
            };

            let gross = tx.gross_amount() * fx;
            let fees = tx.fees * fx;

            let event = match tx.transaction_type {
                TransactionType::Buy => {
                    CashFlowEvent::new(tx.date, -(gross + fees), FlowKind::Outflow)
                }
                TransactionType::Sell => CashFlowEvent::new(tx.date, gross - fees, FlowKind::Inflow),
                TransactionType::Dividend | TransactionType::Interest => {
                    CashFlowEvent::new(tx.date, gross - fees, FlowKind::Inflow)
                }
                TransactionType::CurrencyMove => {
                    let kind = if gross >= Decimal::ZERO {
                        FlowKind::Inflow
                    } else {
                        FlowKind::Outflow
                    };
                    CashFlowEvent::new(tx.date, gross, kind)
                }
            };
            flows.push(event);
        }

        let (terminal_value, any_open) = self
            .value_open_positions(&ordered, all_splits, as_of, valuation_currency, &mut missing)
            .await?;

        if any_open {
            flows.push(CashFlowEvent::new(
                as_of,
                terminal_value,
                FlowKind::TerminalValue,
            ));
        }

        Ok((flows, missing))
    }

    /// Market value of net open positions on `as_of`, in the valuation
    /// currency. Positions that cannot be priced contribute nothing and are
    /// reported in `missing`.
    async fn value_open_positions(
        &self,
        ordered: &[&Transaction],
        all_splits: &[StockSplit],
        as_of: NaiveDate,
        valuation_currency: &str,
        missing: &mut Vec<MissingDataPoint>,
    ) -> Result<(Decimal, bool)> {
        let mut positions: HashMap<(String, String), OpenPosition> = HashMap::new();

        for tx in ordered {
            if !tx.transaction_type.is_trade() {
                continue;
            }
            let adjustment = adjust_for_splits(
                &tx.ticker,
                &tx.market,
                tx.date,
                tx.shares,
                tx.price,
                all_splits,
                Some(as_of),
            );
            let entry = positions
                .entry((tx.ticker.clone(), tx.market.clone()))
                .or_insert_with(|| OpenPosition {
                    adjusted_shares: Decimal::ZERO,
                    currency: tx.currency.clone(),
                });
            match tx.transaction_type {
                TransactionType::Buy => entry.adjusted_shares += adjustment.adjusted_shares,
                TransactionType::Sell => entry.adjusted_shares -= adjustment.adjusted_shares,
                _ => {}
            }
            entry.currency = tx.currency.clone();
        }

        let mut total = Decimal::ZERO;
        let mut any_open = false;

        let mut open: Vec<((String, String), OpenPosition)> = positions
            .into_iter()
            .filter(|(_, p)| p.adjusted_shares > Decimal::ZERO)
            .collect();
        // Deterministic iteration for reproducible missing lists.
        open.sort_by(|a, b| a.0.cmp(&b.0));

        for ((ticker, _market), position) in open {
            any_open = true;

            let price = match self.pricing.get_or_fetch_price(&ticker, as_of).await {
                Ok(resolved) => resolved,
                Err(Error::Pricing(PricingError::NotAvailable { .. })) => {
                    missing.push(MissingDataPoint::new(
                        ticker.clone(),
                        as_of,
                        "terminal price unavailable",
                    ));
                    continue;
                }
                Err(e) => return Err(e),
            };

            let price_currency = price.currency.as_deref().unwrap_or(&position.currency);
            let fx = if price_currency == valuation_currency {
                Decimal::ONE
            } else {
                match self
                    .pricing
                    .get_or_fetch_rate(price_currency, valuation_currency, as_of)
                    .await
                {
                    Ok(resolved) => resolved.value,
                    Err(Error::Pricing(PricingError::NotAvailable { .. })) => {
                        missing.push(MissingDataPoint::new(
                            format!("{}{}", price_currency, valuation_currency),
                            as_of,
                            format!("terminal exchange rate unavailable for {}", ticker),
                        ));
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            };

            total += position.adjusted_shares * price.value * fx;
        }

        Ok((total, any_open))
    }

    async fn rate_for(
        &self,
        tx: &Transaction,
        valuation_currency: &str,
    ) -> Result<Option<Decimal>> {
        if tx.currency == valuation_currency {
            return Ok(Some(Decimal::ONE));
        }
        if let Some(rate) = tx.fx_rate {
            return Ok(Some(rate));
        }
        match self
            .pricing
            .get_or_fetch_rate(&tx.currency, valuation_currency, tx.date)
            .await
        {
            Ok(resolved) => Ok(Some(resolved.value)),
            Err(Error::Pricing(PricingError::NotAvailable { .. })) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
