//! Baseline Extractor
//!
//! Normalizes a raw backtest summary into [`BaselineMetrics`] so that live
//! trading over any window can be compared against it directly. The net
//! return is re-expressed as a 30-day-equivalent rate regardless of how
//! long the backtest ran.

use health_core::{BacktestSummary, BaselineMetrics};

/// Fallback when the backtest record carries no initial deposit
const DEFAULT_INITIAL_DEPOSIT: f64 = 10_000.0;

/// Minimum assumed backtest duration when estimating from trade count
const MIN_ESTIMATED_DURATION_DAYS: f64 = 30.0;

/// Normalize a backtest summary over a known duration.
///
/// `duration_days` must be > 0; callers that only know the trade count
/// should pass [`estimate_duration_days`].
pub fn extract(summary: &BacktestSummary, duration_days: f64) -> BaselineMetrics {
    let initial = if summary.initial_deposit > 0.0 {
        summary.initial_deposit
    } else {
        DEFAULT_INITIAL_DEPOSIT
    };

    let net_return_pct = summary.net_profit / initial * 100.0;
    let daily_return_pct = net_return_pct / duration_days;

    BaselineMetrics {
        return_pct: daily_return_pct * 30.0,
        max_drawdown_pct: summary.max_drawdown_percent,
        win_rate: summary.win_rate,
        trades_per_day: summary.total_trades as f64 / duration_days,
        sharpe_ratio: summary.sharpe_ratio,
        // Estimated from Sharpe by the scorer when needed
        volatility: None,
    }
}

/// Estimate backtest duration from trade count when it is not recorded.
///
/// Assumes roughly 2 trades per day, with a 30-day floor so short backtests
/// do not produce degenerate per-day rates.
pub fn estimate_duration_days(total_trades: u32) -> f64 {
    ((total_trades as f64 / 2.0).round()).max(MIN_ESTIMATED_DURATION_DAYS)
}
