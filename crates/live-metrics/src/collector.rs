use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use statrs::statistics::Statistics;
use tracing::debug;

use health_core::{EventStore, HealthError, LiveMetrics, TradeCloseEvent};

/// Rolling evaluation window when the caller does not specify one
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Computes [`LiveMetrics`] for an instance over a rolling window.
///
/// Reads only; the three event-store queries run concurrently and slight
/// skew between them is tolerated as noise.
pub struct LiveMetricsCollector {
    store: Arc<dyn EventStore>,
}

impl LiveMetricsCollector {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Collect metrics for the window ending at `as_of`.
    ///
    /// Returns a zeroed record with `total_trades = 0` when the instance
    /// has no running state yet; the scorer classifies that as
    /// insufficient data.
    pub async fn collect(
        &self,
        instance_id: &str,
        window_days: i64,
        as_of: DateTime<Utc>,
    ) -> Result<LiveMetrics, HealthError> {
        let from = as_of - Duration::days(window_days);

        let (state, trades, cashflows) = tokio::try_join!(
            self.store.instance_state(instance_id),
            self.store.trade_closes(instance_id, from, as_of),
            self.store.cashflows(instance_id, from, as_of),
        )?;

        let Some(state) = state else {
            debug!(instance_id, "no running state, returning zeroed metrics");
            return Ok(LiveMetrics::default());
        };

        let total_pnl: f64 = trades.iter().map(TradeCloseEvent::pnl).sum();
        let net_cashflow: f64 = cashflows.iter().map(|c| c.signed_amount()).sum();

        // Back-solve the balance at window start so external deposits and
        // withdrawals do not distort the return denominator. Floored at 1
        // to keep the division sane.
        let start_balance = (state.balance - total_pnl - net_cashflow).max(1.0);

        let return_pct = total_pnl / start_balance * 100.0;
        let trade_returns = per_trade_returns(&trades, start_balance);
        let volatility = annualized_volatility(&trades, start_balance);
        let max_drawdown_pct = windowed_drawdown(&trades, start_balance);

        let total_trades = trades.len() as u32;
        let winning = trades.iter().filter(|t| t.is_win()).count();
        let win_rate = if total_trades > 0 {
            winning as f64 / total_trades as f64 * 100.0
        } else {
            0.0
        };

        // Actual elapsed days with data, not the nominal window
        let window_days_actual = match (trades.first(), trades.last()) {
            (Some(first), Some(last)) => {
                let span = (last.closed_at - first.closed_at).num_seconds() as f64 / 86_400.0;
                span.min(window_days as f64)
            }
            _ => window_days as f64,
        };

        let trades_per_day = total_trades as f64 / window_days_actual.max(1.0);

        debug!(
            instance_id,
            total_trades,
            return_pct,
            max_drawdown_pct,
            "collected live metrics"
        );

        Ok(LiveMetrics {
            return_pct,
            volatility,
            max_drawdown_pct,
            win_rate,
            trades_per_day,
            total_trades,
            window_days: window_days_actual,
            trade_returns,
        })
    }
}

/// Per-trade PnL as % of the running balance, in close order
fn per_trade_returns(trades: &[TradeCloseEvent], start_balance: f64) -> Vec<f64> {
    let mut balance = start_balance;
    let mut returns = Vec::with_capacity(trades.len());
    for trade in trades {
        let pnl = trade.pnl();
        returns.push(pnl / balance.max(1.0) * 100.0);
        balance += pnl;
    }
    returns
}

/// Annualized stdev of daily returns; 0 with fewer than two daily buckets
fn annualized_volatility(trades: &[TradeCloseEvent], start_balance: f64) -> f64 {
    let mut pnl_by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for trade in trades {
        *pnl_by_day.entry(trade.closed_at.date_naive()).or_insert(0.0) += trade.pnl();
    }

    if pnl_by_day.len() < 2 {
        return 0.0;
    }

    let mut balance = start_balance;
    let mut daily_returns = Vec::with_capacity(pnl_by_day.len());
    for (_, day_pnl) in pnl_by_day {
        daily_returns.push(day_pnl / balance.max(1.0));
        balance += day_pnl;
    }

    daily_returns.iter().std_dev() * TRADING_DAYS_PER_YEAR.sqrt()
}

/// Max peak-to-trough equity decline from in-window trades only.
///
/// Deliberately not derived from the all-time high-water mark: an old
/// drawdown event should not suppress the score forever.
fn windowed_drawdown(trades: &[TradeCloseEvent], start_balance: f64) -> f64 {
    let mut equity = start_balance;
    let mut peak = start_balance;
    let mut max_dd = 0.0_f64;

    for trade in trades {
        equity += trade.pnl();
        if equity > peak {
            peak = equity;
        }
        if peak > 0.0 {
            let dd = (peak - equity) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
