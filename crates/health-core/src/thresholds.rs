use serde::{Deserialize, Serialize};

use crate::types::MetricKind;

/// Scoring band for one metric.
///
/// `tolerance`, `warning` and `alarm` are relative deviations from the
/// baseline (0.30 = 30% worse than baseline). Deviation within tolerance
/// scores 1.0, warning maps to 0.5, alarm and beyond to 0.0, with linear
/// interpolation between. All three are widened by the confidence
/// multiplier when the live sample is thin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricBand {
    pub weight: f64,
    pub tolerance: f64,
    pub warning: f64,
    pub alarm: f64,
    pub higher_is_better: bool,
}

/// The full tunable surface of the health engine.
///
/// Defaults carry the shipped calibration; deployments override via config
/// rather than editing scoring code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthThresholds {
    #[serde(rename = "return")]
    pub returns: MetricBand,
    pub volatility: MetricBand,
    pub drawdown: MetricBand,
    pub win_rate: MetricBand,
    pub trade_frequency: MetricBand,

    /// Sample size at which tolerance bands stop widening
    pub reference_trades: f64,
    pub min_trades_for_assessment: u32,
    pub min_days_for_assessment: f64,

    /// Score boundary for HEALTHY
    pub healthy_threshold: f64,
    /// Score boundary for WARNING
    pub warning_threshold: f64,
    /// Dead-zone around each boundary before a status change is accepted
    pub hysteresis_margin: f64,
    /// Confidence-interval half-width at the reference sample size
    pub confidence_base_margin: f64,

    pub eval_cooldown_ms: i64,
    pub stale_threshold_ms: i64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            returns: MetricBand {
                weight: 0.25,
                tolerance: 0.30,
                warning: 0.50,
                alarm: 0.75,
                higher_is_better: true,
            },
            volatility: MetricBand {
                weight: 0.15,
                tolerance: 0.50,
                warning: 1.00,
                alarm: 2.00,
                higher_is_better: false,
            },
            drawdown: MetricBand {
                weight: 0.25,
                tolerance: 0.50,
                warning: 1.00,
                alarm: 2.00,
                higher_is_better: false,
            },
            win_rate: MetricBand {
                weight: 0.20,
                tolerance: 0.15,
                warning: 0.30,
                alarm: 0.50,
                higher_is_better: true,
            },
            trade_frequency: MetricBand {
                weight: 0.15,
                tolerance: 0.40,
                warning: 0.70,
                alarm: 0.90,
                higher_is_better: true,
            },
            reference_trades: 100.0,
            min_trades_for_assessment: 10,
            min_days_for_assessment: 7.0,
            healthy_threshold: 0.7,
            warning_threshold: 0.4,
            hysteresis_margin: 0.05,
            confidence_base_margin: 0.10,
            eval_cooldown_ms: 3_600_000,
            stale_threshold_ms: 900_000,
        }
    }
}

impl HealthThresholds {
    pub fn band(&self, kind: MetricKind) -> &MetricBand {
        match kind {
            MetricKind::Return => &self.returns,
            MetricKind::Volatility => &self.volatility,
            MetricKind::Drawdown => &self.drawdown,
            MetricKind::WinRate => &self.win_rate,
            MetricKind::TradeFrequency => &self.trade_frequency,
        }
    }

    pub fn weight_sum(&self) -> f64 {
        self.returns.weight
            + self.volatility.weight
            + self.drawdown.weight
            + self.win_rate.weight
            + self.trade_frequency.weight
    }
}
