use serde::{Deserialize, Serialize};

/// Résultat d'un tick d'analyse du signal micro.
///
/// Éphémère : écrasé à chaque tick, jamais persisté.
///
/// # Example
/// ```
/// use vx_core::types::AnalysisSample;
/// let sample = AnalysisSample::default();
/// assert!(sample.pitch_hz.is_none());
/// assert!(!sample.is_active);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnalysisSample {
    /// Fréquence fondamentale estimée (Hz). `None` si aucune périodicité
    /// confiante n'a été trouvée.
    pub pitch_hz: Option<f32>,
    /// Volume RMS mis à l'échelle, dans [0, 100].
    pub volume: f32,
    /// Voicing : le chanteur produit un son audible, pitch résolu ou non.
    pub is_active: bool,
}

/// Note attendue "maintenant", dérivée du temps écoulé dans la chanson.
///
/// Calculée à la demande, jamais stockée.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExpectedNote {
    /// Début de la note (secondes depuis le début de la chanson).
    pub start_time_secs: f32,
    /// Durée de la note (secondes).
    pub duration_secs: f32,
    /// Fréquence attendue (Hz).
    pub pitch_hz: f32,
    /// Bande de tolérance (±Hz).
    pub tolerance_hz: f32,
}

/// Métriques de performance, chacune dans [0, 100].
///
/// Deux copies vivent en parallèle : la valeur "courante" non lissée tenue
/// par le scorer, et la copie lissée (EMA) publiée vers l'extérieur.
///
/// # Example
/// ```
/// use vx_core::types::PerformanceMetrics;
/// let m = PerformanceMetrics::default();
/// assert!(m.overall_score.abs() < f32::EPSILON);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct PerformanceMetrics {
    /// Taux de réussite du pitch : hits / tentatives × 100.
    pub pitch_accuracy: f32,
    /// Sous-score de timing du dernier tick.
    pub timing_accuracy: f32,
    /// Sous-score de régularité du volume du dernier tick.
    pub volume_consistency: f32,
    /// Moyenne fenêtrée des scores par tick.
    pub overall_score: f32,
}

impl PerformanceMetrics {
    /// Clamp every metric to [0, 100] for display.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            pitch_accuracy: self.pitch_accuracy.clamp(0.0, 100.0),
            timing_accuracy: self.timing_accuracy.clamp(0.0, 100.0),
            volume_consistency: self.volume_consistency.clamp(0.0, 100.0),
            overall_score: self.overall_score.clamp(0.0, 100.0),
        }
    }
}

/// Instantané de diagnostic basse fréquence. Aucun poids dans le scoring.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DebugSnapshot {
    /// Pitch brut du dernier tick (Hz).
    pub pitch_hz: Option<f32>,
    /// Volume brut du dernier tick.
    pub volume: f32,
    /// Voicing du dernier tick.
    pub is_active: bool,
    /// Nom de la note la plus proche du pitch détecté ("N/A" si absent).
    pub note_name: String,
    /// Note attendue au moment du tick.
    pub expected: Option<ExpectedNote>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_clamped_to_display_range() {
        let m = PerformanceMetrics {
            pitch_accuracy: 120.0,
            timing_accuracy: -5.0,
            volume_consistency: 50.0,
            overall_score: 100.5,
        }
        .clamped();
        assert!((m.pitch_accuracy - 100.0).abs() < f32::EPSILON);
        assert!(m.timing_accuracy.abs() < f32::EPSILON);
        assert!((m.volume_consistency - 50.0).abs() < f32::EPSILON);
        assert!((m.overall_score - 100.0).abs() < f32::EPSILON);
    }
}
