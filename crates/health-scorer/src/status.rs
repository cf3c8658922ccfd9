use health_core::{HealthStatus, HealthThresholds};

/// Status transition table with hysteresis.
///
/// Each boundary carries an asymmetric dead-zone: a held status is only
/// abandoned once the score crosses `boundary - margin` in the degrading
/// direction, and a lower status is only left once it crosses
/// `boundary + margin` in the improving direction. A score oscillating
/// near 0.40 or 0.70 therefore cannot flip status every cycle.
///
/// `INSUFFICIENT_DATA` is never produced here; it is only reachable via
/// the sample-size gate in the scorer.
pub fn next_status(
    score: f64,
    previous: Option<HealthStatus>,
    thresholds: &HealthThresholds,
) -> HealthStatus {
    let healthy = thresholds.healthy_threshold;
    let warning = thresholds.warning_threshold;
    let margin = thresholds.hysteresis_margin;

    match previous {
        None | Some(HealthStatus::InsufficientData) => {
            if score >= healthy {
                HealthStatus::Healthy
            } else if score >= warning {
                HealthStatus::Warning
            } else {
                HealthStatus::Degraded
            }
        }
        Some(HealthStatus::Healthy) => {
            if score >= healthy - margin {
                HealthStatus::Healthy
            } else if score >= warning - margin {
                HealthStatus::Warning
            } else {
                HealthStatus::Degraded
            }
        }
        Some(HealthStatus::Warning) => {
            if score >= healthy + margin {
                HealthStatus::Healthy
            } else if score < warning - margin {
                HealthStatus::Degraded
            } else {
                HealthStatus::Warning
            }
        }
        Some(HealthStatus::Degraded) => {
            if score >= healthy + margin {
                HealthStatus::Healthy
            } else if score >= warning + margin {
                HealthStatus::Warning
            } else {
                HealthStatus::Degraded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> HealthThresholds {
        HealthThresholds::default()
    }

    #[test]
    fn fresh_classification_uses_plain_thresholds() {
        assert_eq!(next_status(0.85, None, &t()), HealthStatus::Healthy);
        assert_eq!(next_status(0.70, None, &t()), HealthStatus::Healthy);
        assert_eq!(next_status(0.68, None, &t()), HealthStatus::Warning);
        assert_eq!(next_status(0.40, None, &t()), HealthStatus::Warning);
        assert_eq!(next_status(0.39, None, &t()), HealthStatus::Degraded);
    }

    #[test]
    fn previous_insufficient_data_classifies_fresh() {
        let prev = Some(HealthStatus::InsufficientData);
        assert_eq!(next_status(0.75, prev, &t()), HealthStatus::Healthy);
        assert_eq!(next_status(0.30, prev, &t()), HealthStatus::Degraded);
    }

    #[test]
    fn healthy_holds_inside_dead_zone() {
        let prev = Some(HealthStatus::Healthy);
        // Just under 0.70 but above 0.70 - 0.05
        assert_eq!(next_status(0.68, prev, &t()), HealthStatus::Healthy);
        assert_eq!(next_status(0.65, prev, &t()), HealthStatus::Healthy);
    }

    #[test]
    fn healthy_demotes_past_the_margin() {
        let prev = Some(HealthStatus::Healthy);
        assert_eq!(next_status(0.64, prev, &t()), HealthStatus::Warning);
        // Collapse straight through both boundaries
        assert_eq!(next_status(0.30, prev, &t()), HealthStatus::Degraded);
    }

    #[test]
    fn warning_promotes_only_above_margin() {
        let prev = Some(HealthStatus::Warning);
        assert_eq!(next_status(0.72, prev, &t()), HealthStatus::Warning);
        assert_eq!(next_status(0.75, prev, &t()), HealthStatus::Healthy);
    }

    #[test]
    fn warning_demotes_only_below_margin() {
        let prev = Some(HealthStatus::Warning);
        assert_eq!(next_status(0.36, prev, &t()), HealthStatus::Warning);
        assert_eq!(next_status(0.34, prev, &t()), HealthStatus::Degraded);
    }

    #[test]
    fn degraded_recovers_only_above_margin() {
        let prev = Some(HealthStatus::Degraded);
        assert_eq!(next_status(0.42, prev, &t()), HealthStatus::Degraded);
        assert_eq!(next_status(0.45, prev, &t()), HealthStatus::Warning);
        assert_eq!(next_status(0.75, prev, &t()), HealthStatus::Healthy);
    }

    #[test]
    fn oscillation_around_boundary_does_not_flap() {
        let mut status = next_status(0.71, None, &t());
        assert_eq!(status, HealthStatus::Healthy);

        // Noisy scores straddling 0.70 stay inside the dead-zone
        for score in [0.69, 0.71, 0.68, 0.72, 0.66] {
            status = next_status(score, Some(status), &t());
            assert_eq!(status, HealthStatus::Healthy);
        }
    }
}
