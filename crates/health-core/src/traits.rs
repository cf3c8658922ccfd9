use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::HealthError;
use crate::types::{
    CashflowEvent, HealthSnapshot, InstanceState, StoredBacktest, StrategyInstance,
    TradeCloseEvent,
};

/// Read-only view of the append-only event log
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn instance(&self, instance_id: &str)
        -> Result<Option<StrategyInstance>, HealthError>;

    async fn instance_state(
        &self,
        instance_id: &str,
    ) -> Result<Option<InstanceState>, HealthError>;

    /// Trade-close events within [from, to], ordered by close time
    async fn trade_closes(
        &self,
        instance_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TradeCloseEvent>, HealthError>;

    /// Deposits and withdrawals within [from, to]
    async fn cashflows(
        &self,
        instance_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CashflowEvent>, HealthError>;
}

/// Read-only lookup of persisted backtest results per strategy version
#[async_trait]
pub trait BaselineStore: Send + Sync {
    async fn backtest(
        &self,
        strategy_version_id: &str,
    ) -> Result<Option<StoredBacktest>, HealthError>;
}

/// Durable history of computed health results
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Most recent snapshot for an instance, if any
    async fn latest(&self, instance_id: &str)
        -> Result<Option<HealthSnapshot>, HealthError>;

    async fn insert(&self, snapshot: &HealthSnapshot) -> Result<i64, HealthError>;
}
