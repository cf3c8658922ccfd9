//! Live Metrics Collector
//!
//! Extracts windowed performance metrics for a strategy instance from the
//! append-only event log: cashflow-adjusted return, annualized volatility
//! of daily returns, windowed max drawdown, win rate and trade cadence.

mod collector;

pub use collector::{LiveMetricsCollector, DEFAULT_WINDOW_DAYS};
