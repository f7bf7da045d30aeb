// Performance scoring pipeline for voxscore: expected-target sequencing,
// per-tick scoring, display smoothing, and the session engine.

pub mod history;
pub mod melody;
pub mod scorer;
pub mod session;
pub mod smoothing;

pub use melody::MelodySequencer;
pub use scorer::PerformanceScorer;
pub use session::ScoringEngine;
pub use smoothing::MetricsSmoother;
