//! Year-by-year performance: assembles boundary valuations, period flows
//! and the three return measures for one calendar year.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::cashflow::{CashFlowEvent, FlowKind, MissingDataPoint};
use crate::constants::DECIMAL_PRECISION;
use crate::errors::{CalculatorError, Error, Result};
use crate::performance::performance_model::{XirrResult, YearPerformance};
use crate::performance::period_returns::{modified_dietz, time_weighted, PeriodFlow, ValuationPoint};
use crate::performance::xirr;
use crate::pricing::{PricingError, PricingService};
use crate::splits::{adjust_for_splits, StockSplit};
use crate::transactions::{Transaction, TransactionType};

pub struct PerformanceService {
    pricing: Arc<PricingService>,
}

/// Everything the year's figures need, computed once per reporting
/// currency.
#[derive(Clone)]
struct CurrencyFigures {
    start_value: Decimal,
    end_value: Decimal,
    net_contributions: Decimal,
    dietz: Option<Decimal>,
    twr: Option<Decimal>,
    flows: Vec<PeriodFlow>,
    complete: bool,
}

impl PerformanceService {
    pub fn new(pricing: Arc<PricingService>) -> Self {
        Self { pricing }
    }

    /// Computes the full set of return figures for `year`.
    ///
    /// The measurement period runs from Dec 31 of the prior year to Dec 31
    /// of `year`, clamped to `as_of` for the current year. Missing prices
    /// or rates never abort the calculation; the affected figures come back
    /// `None` with the gaps listed in `missing_prices`.
    pub async fn calculate_year(
        &self,
        transactions: &[Transaction],
        all_splits: &[StockSplit],
        year: i32,
        home_currency: &str,
        source_currency: &str,
        as_of: NaiveDate,
    ) -> Result<YearPerformance> {
        let period_start = year_end(year - 1)?;
        let period_end = year_end(year)?.min(as_of);
        if period_end <= period_start {
            return Err(Error::Calculation(CalculatorError::InvalidPeriod {
                start: period_start,
                end: period_end,
            }));
        }

        let mut missing = Vec::new();

        let home = self
            .figures_for(
                transactions,
                all_splits,
                period_start,
                period_end,
                home_currency,
                &mut missing,
            )
            .await?;
        let source = if source_currency == home_currency {
            home.clone()
        } else {
            self.figures_for(
                transactions,
                all_splits,
                period_start,
                period_end,
                source_currency,
                &mut missing,
            )
            .await?
        };

        let xirr = if home.complete {
            solve_money_weighted(&home, period_start, period_end)
        } else {
            XirrResult::undefined(0, None)
        };

        Ok(YearPerformance {
            year,
            xirr: percent(xirr.rate),
            xirr_confidence: xirr.confidence,
            modified_dietz_home: percent(home.dietz),
            modified_dietz_source: percent(source.dietz),
            twr_home: percent(home.twr),
            twr_source: percent(source.twr),
            start_value_home: home.start_value,
            start_value_source: source.start_value,
            end_value_home: home.end_value,
            end_value_source: source.end_value,
            net_contributions_home: home.net_contributions,
            net_contributions_source: source.net_contributions,
            is_complete: missing.is_empty(),
            missing_prices: missing,
        })
    }

    async fn figures_for(
        &self,
        transactions: &[Transaction],
        all_splits: &[StockSplit],
        period_start: NaiveDate,
        period_end: NaiveDate,
        currency: &str,
        missing: &mut Vec<MissingDataPoint>,
    ) -> Result<CurrencyFigures> {
        let (start_value, start_ok) = self
            .market_value_at(transactions, all_splits, period_start, currency, missing)
            .await?;
        let (end_value, end_ok) = self
            .market_value_at(transactions, all_splits, period_end, currency, missing)
            .await?;

        let (flows, flows_ok) = self
            .contribution_flows(transactions, period_start, period_end, currency, missing)
            .await?;
        let net_contributions: Decimal = flows.iter().map(|f| f.amount).sum();

        let boundaries_ok = start_ok && end_ok && flows_ok;

        let dietz = if boundaries_ok {
            modified_dietz(start_value, end_value, &flows, period_start, period_end)
        } else {
            None
        };

        let twr = if boundaries_ok {
            self.chained_return(
                transactions,
                all_splits,
                period_start,
                period_end,
                start_value,
                end_value,
                &flows,
                currency,
                missing,
            )
            .await?
        } else {
            None
        };

        Ok(CurrencyFigures {
            start_value: start_value.round_dp(DECIMAL_PRECISION),
            end_value: end_value.round_dp(DECIMAL_PRECISION),
            net_contributions: net_contributions.round_dp(DECIMAL_PRECISION),
            dietz,
            twr,
            flows,
            complete: boundaries_ok,
        })
    }

    /// Time-weighted return with a valuation point at every flow date.
    #[allow(clippy::too_many_arguments)]
    async fn chained_return(
        &self,
        transactions: &[Transaction],
        all_splits: &[StockSplit],
        period_start: NaiveDate,
        period_end: NaiveDate,
        start_value: Decimal,
        end_value: Decimal,
        flows: &[PeriodFlow],
        currency: &str,
        missing: &mut Vec<MissingDataPoint>,
    ) -> Result<Option<Decimal>> {
        let mut by_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for flow in flows {
            *by_date.entry(flow.date).or_default() += flow.amount;
        }
        let end_flow = by_date.remove(&period_end).unwrap_or_default();

        let mut points = vec![ValuationPoint {
            date: period_start,
            value: start_value,
            flow: Decimal::ZERO,
        }];
        for (date, flow) in by_date {
            let (value, ok) = self
                .market_value_at(transactions, all_splits, date, currency, missing)
                .await?;
            if !ok {
                return Ok(None);
            }
            points.push(ValuationPoint { date, value, flow });
        }
        points.push(ValuationPoint {
            date: period_end,
            value: end_value,
            flow: end_flow,
        });

        Ok(time_weighted(&points))
    }

    /// Market value of the net open positions on `date`, in `currency`.
    /// The flag is false when any open position could not be valued.
    async fn market_value_at(
        &self,
        transactions: &[Transaction],
        all_splits: &[StockSplit],
        date: NaiveDate,
        currency: &str,
        missing: &mut Vec<MissingDataPoint>,
    ) -> Result<(Decimal, bool)> {
        struct Position {
            adjusted_shares: Decimal,
            currency: String,
        }

        let mut positions: HashMap<(String, String), Position> = HashMap::new();
        for tx in transactions {
            if tx.date > date || !tx.transaction_type.is_trade() {
                continue;
            }
            let adjustment = adjust_for_splits(
                &tx.ticker,
                &tx.market,
                tx.date,
                tx.shares,
                tx.price,
                all_splits,
                Some(date),
            );
            let entry = positions
                .entry((tx.ticker.clone(), tx.market.clone()))
                .or_insert_with(|| Position {
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

        let mut open: Vec<((String, String), Position)> = positions
            .into_iter()
            .filter(|(_, p)| p.adjusted_shares > Decimal::ZERO)
            .collect();
        open.sort_by(|a, b| a.0.cmp(&b.0));

        let mut total = Decimal::ZERO;
        let mut complete = true;

        for ((ticker, _market), position) in open {
            let price = match self.pricing.get_or_fetch_price(&ticker, date).await {
                Ok(resolved) => resolved,
                Err(Error::Pricing(PricingError::NotAvailable { .. })) => {
                    missing.push(MissingDataPoint::new(
                        ticker.clone(),
                        date,
                        "price unavailable for valuation",
                    ));
                    complete = false;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let price_currency = price.currency.as_deref().unwrap_or(&position.currency);
            let fx = if price_currency == currency {
                Decimal::ONE
            } else {
                match self
                    .pricing
                    .get_or_fetch_rate(price_currency, currency, date)
                    .await
                {
                    Ok(resolved) => resolved.value,
                    Err(Error::Pricing(PricingError::NotAvailable { .. })) => {
                        missing.push(MissingDataPoint::new(
                            format!("{}{}", price_currency, currency),
                            date,
                            format!("exchange rate unavailable for {}", ticker),
                        ));
                        complete = false;
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            };

            total += position.adjusted_shares * price.value * fx;
        }

        Ok((total, complete))
    }

    /// External flows inside (`period_start`, `period_end`], signed from
    /// the portfolio's perspective: buys are contributions, sale and income
    /// proceeds are withdrawals. Currency-ledger movements do not touch the
    /// holdings being measured and are excluded.
    async fn contribution_flows(
        &self,
        transactions: &[Transaction],
        period_start: NaiveDate,
        period_end: NaiveDate,
        currency: &str,
        missing: &mut Vec<MissingDataPoint>,
    ) -> Result<(Vec<PeriodFlow>, bool)> {
        let mut in_period: Vec<&Transaction> = transactions
            .iter()
            .filter(|t| {
                t.date > period_start
                    && t.date <= period_end
                    && t.transaction_type != TransactionType::CurrencyMove
            })
            .collect();
        in_period.sort_by_key(|t| t.date);

        let mut flows = Vec::with_capacity(in_period.len());
        let mut complete = true;

        for tx in in_period {
            let fx = if tx.currency == currency {
                Decimal::ONE
            } else if let Some(rate) = tx.fx_rate {
                rate
            } else {
                match self
                    .pricing
                    .get_or_fetch_rate(&tx.currency, currency, tx.date)
                    .await
                {
                    Ok(resolved) => resolved.value,
                    Err(Error::Pricing(PricingError::NotAvailable { .. })) => {
                        missing.push(MissingDataPoint::new(
                            format!("{}{}", tx.currency, currency),
                            tx.date,
                            format!("exchange rate unavailable for transaction {}", tx.id),
                        ));
                        complete = false;
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            };

            let gross = tx.gross_amount() * fx;
            let fees = tx.fees * fx;
            let amount = match tx.transaction_type {
                TransactionType::Buy => gross + fees,
                TransactionType::Sell => -(gross - fees),
                TransactionType::Dividend | TransactionType::Interest => -(gross - fees),
                TransactionType::CurrencyMove => continue,
            };
            flows.push(PeriodFlow {
                date: tx.date,
                amount,
            });
        }

        Ok((flows, complete))
    }
}

/// Money-weighted solve over the year: the opening value enters as an
/// outflow, contributions keep their investor sign, the closing value
/// comes back as the terminal inflow.
fn solve_money_weighted(
    figures: &CurrencyFigures,
    period_start: NaiveDate,
    period_end: NaiveDate,
) -> XirrResult {
    let mut events = Vec::with_capacity(figures.flows.len() + 2);
    if !figures.start_value.is_zero() {
        events.push(CashFlowEvent::new(
            period_start,
            -figures.start_value,
            FlowKind::Outflow,
        ));
    }
    for flow in &figures.flows {
        let amount = -flow.amount;
        let kind = if amount.is_sign_negative() {
            FlowKind::Outflow
        } else {
            FlowKind::Inflow
        };
        events.push(CashFlowEvent::new(flow.date, amount, kind));
    }
    if !figures.end_value.is_zero() {
        events.push(CashFlowEvent::new(
            period_end,
            figures.end_value,
            FlowKind::TerminalValue,
        ));
    }
    xirr::solve(&events)
}

fn year_end(year: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31).ok_or_else(|| {
        Error::Calculation(CalculatorError::Calculation(format!(
            "year {} out of range",
            year
        )))
    })
}

fn percent(fraction: Option<Decimal>) -> Option<Decimal> {
    fraction.map(|f| (f * Decimal::ONE_HUNDRED).round_dp(DECIMAL_PRECISION))
}
