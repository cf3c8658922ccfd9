//! Drift Detector
//!
//! One-sided lower CUSUM over per-trade returns. Detects a persistent
//! decline in average per-trade return that a single-snapshot tolerance
//! check would miss: noise washes out of any one evaluation, but a
//! sustained shift accumulates in the statistic.
//!
//! Intentionally stateless: every call re-walks the full series from zero
//! rather than updating a stored running statistic, which keeps behavior
//! correct under out-of-order event arrival.

use health_core::DriftSummary;

/// One-sided lower CUSUM detector
pub struct DriftDetector {
    /// Allowance (k) in units of sigma
    slack_sigma: f64,
    /// Decision threshold (h) in units of sigma
    threshold_sigma: f64,
    /// Minimum series length before any signal is attempted
    min_observations: usize,
}

impl Default for DriftDetector {
    /// k = 0.5 sigma, h = 4 sigma: average run length before a false alarm
    /// of roughly 100+ observations, the standard quality-control
    /// calibration.
    fn default() -> Self {
        Self::new(0.5, 4.0, 5)
    }
}

impl DriftDetector {
    pub fn new(slack_sigma: f64, threshold_sigma: f64, min_observations: usize) -> Self {
        Self {
            slack_sigma,
            threshold_sigma,
            min_observations,
        }
    }

    /// Run the CUSUM over a series of per-trade returns.
    ///
    /// `expected_mean` is the baseline expectation per trade. Pass
    /// `std_dev = 0.0` to have the detector estimate sigma from the series
    /// itself (sample variance, floored at 1 if still zero).
    pub fn detect(
        &self,
        trade_returns: &[f64],
        expected_mean: f64,
        std_dev: f64,
    ) -> DriftSummary {
        if trade_returns.len() < self.min_observations {
            return DriftSummary::default();
        }

        let sigma = if std_dev > 0.0 {
            std_dev
        } else {
            let estimated = sample_std_dev(trade_returns);
            if estimated > 0.0 {
                estimated
            } else {
                1.0
            }
        };

        let k = self.slack_sigma * sigma;
        let h = self.threshold_sigma * sigma;

        let mut s = 0.0_f64;
        for &x in trade_returns {
            s = (s + (expected_mean - x) - k).max(0.0);
        }

        DriftSummary {
            cusum_value: s,
            drift_detected: s > h,
            drift_severity: (s / h.max(0.001)).min(1.0),
        }
    }
}

fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_few_returns_yields_zero_result() {
        let detector = DriftDetector::default();
        let result = detector.detect(&[0.1, -0.2, 0.3, 0.1], 0.2, 0.5);

        assert_eq!(result.cusum_value, 0.0);
        assert!(!result.drift_detected);
        assert_eq!(result.drift_severity, 0.0);
    }

    #[test]
    fn on_target_series_never_triggers() {
        let detector = DriftDetector::default();
        // Alternating around the expected mean, zero net shift
        let returns: Vec<f64> = (0..200)
            .map(|i| if i % 2 == 0 { 0.3 } else { 0.1 })
            .collect();
        let result = detector.detect(&returns, 0.2, 0.1);

        assert!(!result.drift_detected);
    }

    #[test]
    fn sustained_one_sigma_shift_triggers() {
        let detector = DriftDetector::default();
        // Expected 0.2% per trade, actual running a full sigma lower
        let returns: Vec<f64> = vec![0.1; 120];
        let result = detector.detect(&returns, 0.2, 0.1);

        assert!(result.drift_detected);
        assert_eq!(result.drift_severity, 1.0);
    }

    #[test]
    fn severity_ramps_before_threshold() {
        let detector = DriftDetector::default();
        // Mild shift: accumulates but stays under h
        let returns: Vec<f64> = vec![0.14; 10];
        let result = detector.detect(&returns, 0.2, 0.1);

        assert!(!result.drift_detected);
        assert!(result.drift_severity > 0.0);
        assert!(result.drift_severity < 1.0);
    }

    #[test]
    fn cusum_value_is_never_negative() {
        let detector = DriftDetector::default();
        // Live outperforming the baseline keeps the statistic pinned at 0
        let returns: Vec<f64> = vec![1.0; 50];
        let result = detector.detect(&returns, 0.2, 0.1);

        assert_eq!(result.cusum_value, 0.0);
        assert!(!result.drift_detected);
    }

    #[test]
    fn zero_std_dev_self_estimates_from_series() {
        let detector = DriftDetector::default();
        let returns: Vec<f64> = (0..50).map(|i| (i % 5) as f64 * 0.1 - 0.2).collect();
        let result = detector.detect(&returns, 0.5, 0.0);

        // Should produce a finite result rather than dividing by zero
        assert!(result.cusum_value.is_finite());
        assert!(result.drift_severity.is_finite());
    }

    #[test]
    fn constant_series_with_zero_std_floors_sigma_at_one() {
        let detector = DriftDetector::default();
        let returns: Vec<f64> = vec![0.2; 20];
        let result = detector.detect(&returns, 0.2, 0.0);

        // expected - x = 0 each step, k = 0.5 drains the statistic
        assert_eq!(result.cusum_value, 0.0);
        assert!(!result.drift_detected);
    }
}
