use vx_core::config::EngineConfig;
use vx_core::types::AnalysisSample;

/// Analyse d'une frame audio : volume RMS, pitch par autocorrélation,
/// drapeau de voicing.
///
/// La détection de pitch est gated sur le loudness : en dessous de
/// `pitch_gate`, on ne cherche même pas de périodicité (évite les estimations
/// parasites sur le silence et le bruit). Le voicing utilise un seuil
/// distinct, si bien qu'un chanteur peut être actif sans pitch résolu
/// (voix soufflée, attaque bruitée).
///
/// # Example
/// ```
/// use vx_audio::analyzer::SignalAnalyzer;
/// use vx_core::config::EngineConfig;
///
/// let analyzer = SignalAnalyzer::new(&EngineConfig::default());
/// let silence = vec![0.0f32; 2048];
/// let sample = analyzer.analyze(&silence, 44100);
/// assert!(sample.pitch_hz.is_none());
/// assert!(sample.volume.abs() < f32::EPSILON);
/// assert!(!sample.is_active);
/// ```
pub struct SignalAnalyzer {
    min_pitch_hz: f32,
    max_pitch_hz: f32,
    correlation_threshold: f32,
    volume_scale: f32,
    pitch_gate: f32,
    activity_threshold: f32,
}

impl SignalAnalyzer {
    /// Construit un analyseur depuis une configuration déjà validée.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            min_pitch_hz: config.min_pitch_hz,
            max_pitch_hz: config.max_pitch_hz,
            correlation_threshold: config.correlation_threshold,
            volume_scale: config.volume_scale,
            pitch_gate: config.pitch_gate,
            activity_threshold: config.activity_threshold,
        }
    }

    /// Turn one audio frame into one `AnalysisSample`.
    ///
    /// Never panics for any input: non-finite samples are treated as zero,
    /// empty frames yield the silent sample.
    #[must_use]
    pub fn analyze(&self, samples: &[f32], sample_rate: u32) -> AnalysisSample {
        if samples.is_empty() || sample_rate == 0 {
            return AnalysisSample::default();
        }

        let volume = self.volume(samples);
        let pitch_hz = if volume > self.pitch_gate {
            self.detect_pitch(samples, sample_rate)
        } else {
            None
        };

        AnalysisSample {
            pitch_hz,
            volume,
            is_active: volume > self.activity_threshold,
        }
    }

    /// RMS de la frame, mise à l'échelle et clampée dans [0, 100].
    fn volume(&self, samples: &[f32]) -> f32 {
        let sum_sq: f32 = samples.iter().map(|&s| sanitize(s) * sanitize(s)).sum();
        let rms = (sum_sq / samples.len() as f32).sqrt();
        (rms * self.volume_scale).clamp(0.0, 100.0)
    }

    /// Autocorrélation non normalisée sur la bande vocale.
    ///
    /// Pour chaque période candidate p, somme Σ x[i]·x[i+p] sur le
    /// recouvrement valide ; la période de corrélation maximale gagne si
    /// elle dépasse le seuil de confiance. O(frame × plage de périodes),
    /// le coût dominant du tick.
    fn detect_pitch(&self, samples: &[f32], sample_rate: u32) -> Option<f32> {
        let min_period = ((sample_rate as f32 / self.max_pitch_hz) as usize).max(1);
        let max_period = ((sample_rate as f32 / self.min_pitch_hz) as usize).min(samples.len());
        if min_period >= max_period {
            return None;
        }

        let mut best_correlation = 0.0f32;
        let mut best_period = 0usize;

        for period in min_period..max_period {
            let mut correlation = 0.0f32;
            for i in 0..samples.len() - period {
                correlation += sanitize(samples[i]) * sanitize(samples[i + period]);
            }
            if correlation > best_correlation {
                best_correlation = correlation;
                best_period = period;
            }
        }

        if best_correlation > self.correlation_threshold && best_period > 0 {
            Some(sample_rate as f32 / best_period as f32)
        } else {
            None
        }
    }
}

/// NaN/infinis traités comme du silence, jamais propagés.
#[inline]
fn sanitize(sample: f32) -> f32 {
    if sample.is_finite() { sample } else { 0.0 }
}
