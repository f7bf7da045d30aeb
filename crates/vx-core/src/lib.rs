/// Configuration, types, and shared structures for voxscore.
///
/// This crate contains all shared types, the song clock, and configuration
/// logic used across the voxscore workspace.

pub mod clock;
pub mod config;
pub mod error;
pub mod note;
pub mod types;

pub use clock::SongClock;
pub use config::EngineConfig;
pub use error::CoreError;
pub use types::{AnalysisSample, DebugSnapshot, ExpectedNote, PerformanceMetrics};
