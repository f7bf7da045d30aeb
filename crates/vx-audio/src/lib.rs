// Microphone capture and per-frame signal analysis for voxscore.

pub mod analyzer;
pub mod capture;
pub mod error;

pub use analyzer::SignalAnalyzer;
pub use capture::MicCapture;
pub use error::AudioError;
