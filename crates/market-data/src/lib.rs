//! Market data access for the portfolio performance engine.
//!
//! This crate owns everything that talks to external data sources:
//!
//! - [`provider::QuoteProvider`] - the contract a concrete source implements
//!   (stock price, exchange rate, month-end price; always the nearest
//!   trading-day observation on or before the requested date)
//! - [`chain::ProviderChain`] - prioritized fallback across sources
//! - [`providers`] - the concrete HTTP-backed sources
//!
//! Caching and persistence live in the core crate; this crate is stateless
//! apart from HTTP clients.

pub mod chain;
pub mod errors;
pub mod models;
pub mod provider;
pub mod providers;

pub use chain::ProviderChain;
pub use errors::{MarketDataError, Result};
pub use models::{ProviderId, ProviderObservation, ProviderSettings};
pub use provider::QuoteProvider;
