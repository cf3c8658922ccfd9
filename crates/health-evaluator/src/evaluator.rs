use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use health_core::{
    BaselineMetrics, BaselineStore, EventStore, HealthError, HealthResult, HealthSnapshot,
    HealthThresholds, SnapshotStore, StoredBacktest,
};
use health_scorer::HealthScorer;
use live_metrics::{LiveMetricsCollector, DEFAULT_WINDOW_DAYS};

/// A health snapshot plus whether it was computed within the staleness
/// threshold.
#[derive(Debug, Clone)]
pub struct FreshHealth {
    pub snapshot: HealthSnapshot,
    pub fresh: bool,
}

/// Orchestrates health evaluations for strategy instances.
///
/// Cheap to clone; clones share the underlying stores, which is what the
/// fire-and-forget background refresh relies on.
#[derive(Clone)]
pub struct HealthEvaluator {
    events: Arc<dyn EventStore>,
    baselines: Arc<dyn BaselineStore>,
    snapshots: Arc<dyn SnapshotStore>,
    collector: Arc<LiveMetricsCollector>,
    scorer: Arc<HealthScorer>,
}

impl HealthEvaluator {
    pub fn new(
        events: Arc<dyn EventStore>,
        baselines: Arc<dyn BaselineStore>,
        snapshots: Arc<dyn SnapshotStore>,
        thresholds: HealthThresholds,
    ) -> Self {
        Self {
            collector: Arc::new(LiveMetricsCollector::new(events.clone())),
            scorer: Arc::new(HealthScorer::new(thresholds)),
            events,
            baselines,
            snapshots,
        }
    }

    fn thresholds(&self) -> &HealthThresholds {
        self.scorer.thresholds()
    }

    /// Evaluate unless a snapshot younger than the cooldown already
    /// exists. Intended to be invoked fire-and-forget after each
    /// trade-close event.
    ///
    /// The cooldown is a best-effort rate limit, not a lock: two
    /// concurrent triggers inside the window may both evaluate, which is
    /// harmless since evaluation is idempotent.
    pub async fn evaluate_health_if_due(
        &self,
        instance_id: &str,
    ) -> Result<Option<HealthResult>, HealthError> {
        if let Some(latest) = self.snapshots.latest(instance_id).await? {
            let age = Utc::now() - latest.created_at;
            if age < Duration::milliseconds(self.thresholds().eval_cooldown_ms) {
                debug!(instance_id, "health evaluation skipped, inside cooldown");
                return Ok(None);
            }
        }

        self.evaluate_health(instance_id).await.map(Some)
    }

    /// Run a full evaluation and persist the snapshot.
    ///
    /// Fails with [`HealthError::InstanceNotFound`] for unknown instances
    /// and [`HealthError::InstanceOffline`] for offline ones; the latter
    /// is an expected skip, not a fault.
    pub async fn evaluate_health(
        &self,
        instance_id: &str,
    ) -> Result<HealthResult, HealthError> {
        let instance = self
            .events
            .instance(instance_id)
            .await?
            .ok_or_else(|| HealthError::InstanceNotFound(instance_id.to_string()))?;

        if instance.status == health_core::InstanceStatus::Offline {
            return Err(HealthError::InstanceOffline(instance_id.to_string()));
        }

        let now = Utc::now();
        let live = self
            .collector
            .collect(instance_id, DEFAULT_WINDOW_DAYS, now)
            .await?;

        let baseline = self
            .baselines
            .backtest(&instance.strategy_version_id)
            .await?
            .map(normalize_baseline);

        let previous = self
            .snapshots
            .latest(instance_id)
            .await?
            .map(|s| s.status);

        let result = self.scorer.score(&live, baseline.as_ref(), previous);

        let snapshot = HealthSnapshot::from_result(
            instance_id,
            &instance.strategy_version_id,
            &result,
            now,
        )?;
        self.snapshots.insert(&snapshot).await?;

        info!(
            instance_id,
            status = result.status.as_str(),
            overall_score = result.overall_score,
            trades_sampled = live.total_trades,
            "health evaluated"
        );

        Ok(result)
    }

    /// Read path for consumers.
    ///
    /// Evaluates synchronously once when no snapshot exists. When the
    /// latest snapshot has gone stale, returns it immediately with
    /// `fresh = false` and refreshes in the background; a refresh failure
    /// is logged and swallowed, never surfaced to this caller.
    pub async fn health_with_freshness(
        &self,
        instance_id: &str,
    ) -> Result<FreshHealth, HealthError> {
        let Some(latest) = self.snapshots.latest(instance_id).await? else {
            self.evaluate_health(instance_id).await?;
            let snapshot = self.snapshots.latest(instance_id).await?.ok_or_else(|| {
                HealthError::Storage("snapshot missing after evaluation".to_string())
            })?;
            return Ok(FreshHealth {
                snapshot,
                fresh: true,
            });
        };

        let age = Utc::now() - latest.created_at;
        if age > Duration::milliseconds(self.thresholds().stale_threshold_ms) {
            let this = self.clone();
            let id = instance_id.to_string();
            tokio::spawn(async move {
                if let Err(err) = this.evaluate_health(&id).await {
                    warn!(instance_id = %id, %err, "background health refresh failed");
                }
            });

            return Ok(FreshHealth {
                snapshot: latest,
                fresh: false,
            });
        }

        Ok(FreshHealth {
            snapshot: latest,
            fresh: true,
        })
    }
}

/// Normalize a stored backtest to the 30-day convention, estimating the
/// duration from trade count when the store does not carry it.
fn normalize_baseline(stored: StoredBacktest) -> BaselineMetrics {
    let duration_days = stored
        .duration_days
        .filter(|d| *d > 0.0)
        .unwrap_or_else(|| baseline_extractor::estimate_duration_days(stored.summary.total_trades));

    baseline_extractor::extract(&stored.summary, duration_days)
}
