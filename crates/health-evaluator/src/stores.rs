use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use health_core::{
    BacktestSummary, BaselineStore, CashflowEvent, EventStore, HealthError, HealthSnapshot,
    InstanceState, SnapshotStore, StoredBacktest, StrategyInstance, TradeCloseEvent,
};

/// Create the engine's tables if they don't exist.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(
        r#"
        CREATE TABLE IF NOT EXISTS strategy_instances (
            id TEXT PRIMARY KEY,
            strategy_version_id TEXT NOT NULL,
            status TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS instance_states (
            instance_id TEXT PRIMARY KEY,
            balance REAL NOT NULL,
            equity REAL NOT NULL,
            high_water_mark REAL NOT NULL,
            total_trades INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS trade_close_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            instance_id TEXT NOT NULL,
            closed_at TEXT NOT NULL,
            profit REAL NOT NULL,
            swap REAL NOT NULL,
            commission REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_trade_close_instance_time
            ON trade_close_events (instance_id, closed_at);

        CREATE TABLE IF NOT EXISTS cashflow_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            instance_id TEXT NOT NULL,
            occurred_at TEXT NOT NULL,
            amount REAL NOT NULL,
            kind TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_cashflow_instance_time
            ON cashflow_events (instance_id, occurred_at);

        CREATE TABLE IF NOT EXISTS backtest_baselines (
            strategy_version_id TEXT PRIMARY KEY,
            total_trades INTEGER NOT NULL,
            win_rate REAL NOT NULL,
            profit_factor REAL NOT NULL,
            max_drawdown REAL NOT NULL,
            max_drawdown_percent REAL NOT NULL,
            net_profit REAL NOT NULL,
            sharpe_ratio REAL NOT NULL,
            initial_deposit REAL NOT NULL,
            final_balance REAL NOT NULL,
            duration_days REAL
        );

        CREATE TABLE IF NOT EXISTS health_snapshots (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            instance_id TEXT NOT NULL,
            strategy_version_id TEXT NOT NULL,
            status TEXT NOT NULL,
            overall_score REAL NOT NULL,
            confidence_lower REAL NOT NULL,
            confidence_upper REAL NOT NULL,
            cusum_value REAL NOT NULL,
            drift_detected INTEGER NOT NULL,
            drift_severity REAL NOT NULL,
            return_score REAL NOT NULL,
            volatility_score REAL NOT NULL,
            drawdown_score REAL NOT NULL,
            win_rate_score REAL NOT NULL,
            trade_frequency_score REAL NOT NULL,
            live_return_pct REAL NOT NULL,
            live_volatility REAL NOT NULL,
            live_max_drawdown_pct REAL NOT NULL,
            live_win_rate REAL NOT NULL,
            live_trades_per_day REAL NOT NULL,
            primary_driver TEXT,
            baseline_json TEXT,
            trades_sampled INTEGER NOT NULL,
            window_days REAL NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_health_snapshots_instance_time
            ON health_snapshots (instance_id, created_at);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// SQLite-backed view of the event log
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn instance(
        &self,
        instance_id: &str,
    ) -> Result<Option<StrategyInstance>, HealthError> {
        let instance: Option<StrategyInstance> = sqlx::query_as(
            "SELECT id, strategy_version_id, status FROM strategy_instances WHERE id = ?",
        )
        .bind(instance_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(instance)
    }

    async fn instance_state(
        &self,
        instance_id: &str,
    ) -> Result<Option<InstanceState>, HealthError> {
        let state: Option<InstanceState> = sqlx::query_as(
            r#"
            SELECT balance, equity, high_water_mark, total_trades
            FROM instance_states
            WHERE instance_id = ?
            "#,
        )
        .bind(instance_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(state)
    }

    async fn trade_closes(
        &self,
        instance_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TradeCloseEvent>, HealthError> {
        let trades: Vec<TradeCloseEvent> = sqlx::query_as(
            r#"
            SELECT closed_at, profit, swap, commission
            FROM trade_close_events
            WHERE instance_id = ? AND closed_at >= ? AND closed_at <= ?
            ORDER BY closed_at ASC
            "#,
        )
        .bind(instance_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(trades)
    }

    async fn cashflows(
        &self,
        instance_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CashflowEvent>, HealthError> {
        let cashflows: Vec<CashflowEvent> = sqlx::query_as(
            r#"
            SELECT occurred_at, amount, kind
            FROM cashflow_events
            WHERE instance_id = ? AND occurred_at >= ? AND occurred_at <= ?
            ORDER BY occurred_at ASC
            "#,
        )
        .bind(instance_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(cashflows)
    }
}

/// Row shape for the baseline table
#[derive(sqlx::FromRow)]
struct BacktestRow {
    total_trades: u32,
    win_rate: f64,
    profit_factor: f64,
    max_drawdown: f64,
    max_drawdown_percent: f64,
    net_profit: f64,
    sharpe_ratio: f64,
    initial_deposit: f64,
    final_balance: f64,
    duration_days: Option<f64>,
}

/// SQLite-backed lookup of persisted backtest results
pub struct SqliteBaselineStore {
    pool: SqlitePool,
}

impl SqliteBaselineStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaselineStore for SqliteBaselineStore {
    async fn backtest(
        &self,
        strategy_version_id: &str,
    ) -> Result<Option<StoredBacktest>, HealthError> {
        let row: Option<BacktestRow> = sqlx::query_as(
            r#"
            SELECT
                total_trades, win_rate, profit_factor, max_drawdown,
                max_drawdown_percent, net_profit, sharpe_ratio,
                initial_deposit, final_balance, duration_days
            FROM backtest_baselines
            WHERE strategy_version_id = ?
            "#,
        )
        .bind(strategy_version_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| StoredBacktest {
            summary: BacktestSummary {
                total_trades: r.total_trades,
                win_rate: r.win_rate,
                profit_factor: r.profit_factor,
                max_drawdown: r.max_drawdown,
                max_drawdown_percent: r.max_drawdown_percent,
                net_profit: r.net_profit,
                sharpe_ratio: r.sharpe_ratio,
                initial_deposit: r.initial_deposit,
                final_balance: r.final_balance,
            },
            duration_days: r.duration_days,
        }))
    }
}

/// SQLite-backed snapshot history
pub struct SqliteSnapshotStore {
    pool: SqlitePool,
}

impl SqliteSnapshotStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn latest(
        &self,
        instance_id: &str,
    ) -> Result<Option<HealthSnapshot>, HealthError> {
        let snapshot: Option<HealthSnapshot> = sqlx::query_as(
            r#"
            SELECT
                id, instance_id, strategy_version_id, status, overall_score,
                confidence_lower, confidence_upper, cusum_value,
                drift_detected, drift_severity, return_score,
                volatility_score, drawdown_score, win_rate_score,
                trade_frequency_score, live_return_pct, live_volatility,
                live_max_drawdown_pct, live_win_rate, live_trades_per_day,
                primary_driver, baseline_json, trades_sampled, window_days,
                created_at
            FROM health_snapshots
            WHERE instance_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(instance_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(snapshot)
    }

    async fn insert(&self, snapshot: &HealthSnapshot) -> Result<i64, HealthError> {
        let result = sqlx::query(
            r#"
            INSERT INTO health_snapshots (
                instance_id, strategy_version_id, status, overall_score,
                confidence_lower, confidence_upper, cusum_value,
                drift_detected, drift_severity, return_score,
                volatility_score, drawdown_score, win_rate_score,
                trade_frequency_score, live_return_pct, live_volatility,
                live_max_drawdown_pct, live_win_rate, live_trades_per_day,
                primary_driver, baseline_json, trades_sampled, window_days,
                created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&snapshot.instance_id)
        .bind(&snapshot.strategy_version_id)
        .bind(snapshot.status)
        .bind(snapshot.overall_score)
        .bind(snapshot.confidence_lower)
        .bind(snapshot.confidence_upper)
        .bind(snapshot.cusum_value)
        .bind(snapshot.drift_detected)
        .bind(snapshot.drift_severity)
        .bind(snapshot.return_score)
        .bind(snapshot.volatility_score)
        .bind(snapshot.drawdown_score)
        .bind(snapshot.win_rate_score)
        .bind(snapshot.trade_frequency_score)
        .bind(snapshot.live_return_pct)
        .bind(snapshot.live_volatility)
        .bind(snapshot.live_max_drawdown_pct)
        .bind(snapshot.live_win_rate)
        .bind(snapshot.live_trades_per_day)
        .bind(&snapshot.primary_driver)
        .bind(&snapshot.baseline_json)
        .bind(snapshot.trades_sampled)
        .bind(snapshot.window_days)
        .bind(snapshot.created_at)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }
}
