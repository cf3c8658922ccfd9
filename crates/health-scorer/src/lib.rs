//! Scorer
//!
//! Pure, deterministic health scoring: confidence-scaled tolerance bands
//! per metric, absolute fallbacks when no baseline exists, drift detection
//! over per-trade returns, and a hysteretic status state machine. No I/O,
//! no clock access; identical inputs always produce identical output.

mod scorer;
mod status;

pub use scorer::HealthScorer;
pub use status::next_status;
