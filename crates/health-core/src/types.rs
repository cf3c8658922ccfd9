use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Health status classification for a live strategy instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    /// Live performance is in line with the baseline
    Healthy,
    /// Some degradation detected but still viable
    Warning,
    /// Significant degradation, needs attention
    Degraded,
    /// Too few trades or too short a window to judge
    InsufficientData,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "HEALTHY",
            HealthStatus::Warning => "WARNING",
            HealthStatus::Degraded => "DEGRADED",
            HealthStatus::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

/// The five metrics a health assessment is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    Return,
    Volatility,
    Drawdown,
    WinRate,
    TradeFrequency,
}

impl MetricKind {
    /// Human-readable label used for the primary-driver diagnostic
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Return => "return",
            MetricKind::Volatility => "volatility",
            MetricKind::Drawdown => "drawdown",
            MetricKind::WinRate => "win rate",
            MetricKind::TradeFrequency => "trade frequency",
        }
    }
}

/// Score for a single metric against its baseline
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricScore {
    /// 0.0 (at or beyond alarm) to 1.0 (at or better than baseline)
    pub score: f64,
    pub weight: f64,
    pub live_value: f64,
    pub baseline_value: Option<f64>,
}

/// The five named metric scores; weights sum to 1.0
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricScores {
    #[serde(rename = "return")]
    pub returns: MetricScore,
    pub volatility: MetricScore,
    pub drawdown: MetricScore,
    pub win_rate: MetricScore,
    pub trade_frequency: MetricScore,
}

impl MetricScores {
    pub fn entries(&self) -> [(MetricKind, &MetricScore); 5] {
        [
            (MetricKind::Return, &self.returns),
            (MetricKind::Volatility, &self.volatility),
            (MetricKind::Drawdown, &self.drawdown),
            (MetricKind::WinRate, &self.win_rate),
            (MetricKind::TradeFrequency, &self.trade_frequency),
        ]
    }

    /// Weight-sum of the five scores
    pub fn weighted_total(&self) -> f64 {
        self.entries().iter().map(|(_, m)| m.score * m.weight).sum()
    }
}

/// Result of the one-sided lower CUSUM over per-trade returns
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftSummary {
    /// Final CUSUM statistic, always >= 0
    pub cusum_value: f64,
    pub drift_detected: bool,
    /// Linear ramp toward the decision threshold, 0.0 to 1.0
    pub drift_severity: f64,
}

/// Confidence interval around the overall score, clipped to [0, 1]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// Metrics extracted from the live event log over the evaluation window.
/// Recomputed fresh each evaluation, never persisted directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveMetrics {
    /// Cashflow-adjusted % return over the window
    pub return_pct: f64,
    /// Annualized stdev of daily returns
    pub volatility: f64,
    /// Max peak-to-trough decline within the window only
    pub max_drawdown_pct: f64,
    pub win_rate: f64,
    pub trades_per_day: f64,
    pub total_trades: u32,
    /// Actual elapsed days with data, capped to the requested window
    pub window_days: f64,
    /// Ordered per-trade PnL as % of running balance; input to drift detection
    pub trade_returns: Vec<f64>,
}

/// Normalized backtest expectation for a strategy version.
/// All rates are comparable with [`LiveMetrics`]: percentages, per-day
/// rates, and a return expressed as a 30-day-equivalent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineMetrics {
    /// Backtest net return normalized to a 30-day-equivalent rate
    pub return_pct: f64,
    pub max_drawdown_pct: f64,
    pub win_rate: f64,
    pub trades_per_day: f64,
    pub sharpe_ratio: f64,
    /// Estimated from Sharpe by the scorer when absent
    pub volatility: Option<f64>,
}

/// Full output of one health evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResult {
    pub status: HealthStatus,
    pub overall_score: f64,
    pub confidence_interval: ConfidenceInterval,
    pub drift: DriftSummary,
    pub metrics: MetricScores,
    /// Metric contributing the most weighted drag, if any
    pub primary_driver: Option<String>,
    pub live: LiveMetrics,
    pub baseline: Option<BaselineMetrics>,
}

/// A trade-close event from the append-only event log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TradeCloseEvent {
    pub closed_at: DateTime<Utc>,
    pub profit: f64,
    pub swap: f64,
    pub commission: f64,
}

impl TradeCloseEvent {
    pub fn pnl(&self) -> f64 {
        self.profit + self.swap + self.commission
    }

    pub fn is_win(&self) -> bool {
        self.pnl() > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashflowKind {
    Deposit,
    Withdrawal,
}

/// A deposit or withdrawal on the live account
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CashflowEvent {
    pub occurred_at: DateTime<Utc>,
    /// Always positive; direction comes from `kind`
    pub amount: f64,
    pub kind: CashflowKind,
}

impl CashflowEvent {
    /// Signed contribution to net cashflow
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            CashflowKind::Deposit => self.amount,
            CashflowKind::Withdrawal => -self.amount,
        }
    }
}

/// Current running state of a strategy instance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InstanceState {
    pub balance: f64,
    pub equity: f64,
    pub high_water_mark: f64,
    pub total_trades: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    Running,
    Paused,
    Offline,
}

/// A registered live strategy instance
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StrategyInstance {
    pub id: String,
    pub strategy_version_id: String,
    pub status: InstanceStatus,
}

/// Raw backtest result record as persisted by the baseline store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestSummary {
    pub total_trades: u32,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub max_drawdown: f64,
    pub max_drawdown_percent: f64,
    pub net_profit: f64,
    pub sharpe_ratio: f64,
    pub initial_deposit: f64,
    pub final_balance: f64,
}

/// A backtest summary plus its duration when independently known
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBacktest {
    pub summary: BacktestSummary,
    /// Days the backtest covered; estimated from trade count when absent
    pub duration_days: Option<f64>,
}

/// Persisted record of one health evaluation
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub id: Option<i64>,
    pub instance_id: String,
    pub strategy_version_id: String,
    pub status: HealthStatus,
    pub overall_score: f64,
    pub confidence_lower: f64,
    pub confidence_upper: f64,
    pub cusum_value: f64,
    pub drift_detected: bool,
    pub drift_severity: f64,
    pub return_score: f64,
    pub volatility_score: f64,
    pub drawdown_score: f64,
    pub win_rate_score: f64,
    pub trade_frequency_score: f64,
    pub live_return_pct: f64,
    pub live_volatility: f64,
    pub live_max_drawdown_pct: f64,
    pub live_win_rate: f64,
    pub live_trades_per_day: f64,
    pub primary_driver: Option<String>,
    /// Baseline echoed as JSON for audit; NULL when no baseline existed
    pub baseline_json: Option<String>,
    pub trades_sampled: i64,
    pub window_days: f64,
    pub created_at: DateTime<Utc>,
}

impl HealthSnapshot {
    /// Flatten a [`HealthResult`] into a persistable row
    pub fn from_result(
        instance_id: &str,
        strategy_version_id: &str,
        result: &HealthResult,
        created_at: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        let baseline_json = result
            .baseline
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        Ok(Self {
            id: None,
            instance_id: instance_id.to_string(),
            strategy_version_id: strategy_version_id.to_string(),
            status: result.status,
            overall_score: result.overall_score,
            confidence_lower: result.confidence_interval.lower,
            confidence_upper: result.confidence_interval.upper,
            cusum_value: result.drift.cusum_value,
            drift_detected: result.drift.drift_detected,
            drift_severity: result.drift.drift_severity,
            return_score: result.metrics.returns.score,
            volatility_score: result.metrics.volatility.score,
            drawdown_score: result.metrics.drawdown.score,
            win_rate_score: result.metrics.win_rate.score,
            trade_frequency_score: result.metrics.trade_frequency.score,
            live_return_pct: result.live.return_pct,
            live_volatility: result.live.volatility,
            live_max_drawdown_pct: result.live.max_drawdown_pct,
            live_win_rate: result.live.win_rate,
            live_trades_per_day: result.live.trades_per_day,
            primary_driver: result.primary_driver.clone(),
            baseline_json,
            trades_sampled: result.live.total_trades as i64,
            window_days: result.live.window_days,
            created_at,
        })
    }
}
