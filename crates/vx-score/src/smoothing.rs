use vx_core::types::PerformanceMetrics;

/// Lissage EMA des métriques affichées.
///
/// `displayed = displayed·(1−α) + current·α`, indépendamment par métrique.
/// Découple le signal interne cadencé à 200 ms d'un affichage stable, sans
/// flicker. Le Score lui-même est déjà fenêtré au scorer et n'est pas
/// re-lissé ici.
///
/// # Example
/// ```
/// use vx_score::smoothing::MetricsSmoother;
/// let smoother = MetricsSmoother::new(0.3);
/// ```
pub struct MetricsSmoother {
    alpha: f32,
    displayed: PerformanceMetrics,
}

impl MetricsSmoother {
    /// Create a new smoother. `alpha` is clamped to (0, 1].
    #[must_use]
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(0.01, 1.0),
            displayed: PerformanceMetrics::default(),
        }
    }

    /// Applique un pas d'EMA vers `current` et retourne la copie affichée,
    /// clampée à [0, 100].
    pub fn smooth(&mut self, current: &PerformanceMetrics) -> PerformanceMetrics {
        self.displayed = PerformanceMetrics {
            pitch_accuracy: self.ema(self.displayed.pitch_accuracy, current.pitch_accuracy),
            timing_accuracy: self.ema(self.displayed.timing_accuracy, current.timing_accuracy),
            volume_consistency: self.ema(
                self.displayed.volume_consistency,
                current.volume_consistency,
            ),
            overall_score: self.ema(self.displayed.overall_score, current.overall_score),
        };
        self.displayed.clamped()
    }

    /// Dernière copie affichée.
    #[must_use]
    pub fn displayed(&self) -> PerformanceMetrics {
        self.displayed.clamped()
    }

    /// Oublie tout (retour à zéro, état Idle).
    pub fn reset(&mut self) {
        self.displayed = PerformanceMetrics::default();
    }

    #[inline]
    fn ema(&self, previous: f32, current: f32) -> f32 {
        previous * (1.0 - self.alpha) + current * self.alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_gap_shrinks_monotonically_towards_constant() {
        let mut smoother = MetricsSmoother::new(0.3);
        let target = PerformanceMetrics {
            pitch_accuracy: 90.0,
            timing_accuracy: 85.0,
            volume_consistency: 70.0,
            overall_score: 88.0,
        };

        let mut prev_gap = f32::INFINITY;
        for _ in 0..50 {
            let displayed = smoother.smooth(&target);
            let gap = (displayed.overall_score - target.overall_score).abs();
            assert!(gap <= prev_gap);
            prev_gap = gap;
        }
        // Converged for all four metrics
        let d = smoother.displayed();
        assert!((d.pitch_accuracy - 90.0).abs() < 0.1);
        assert!((d.timing_accuracy - 85.0).abs() < 0.1);
        assert!((d.volume_consistency - 70.0).abs() < 0.1);
        assert!((d.overall_score - 88.0).abs() < 0.1);
    }

    #[test]
    fn first_step_moves_alpha_fraction_from_zero() {
        let mut smoother = MetricsSmoother::new(0.3);
        let target = PerformanceMetrics {
            pitch_accuracy: 100.0,
            timing_accuracy: 0.0,
            volume_consistency: 0.0,
            overall_score: 50.0,
        };
        let displayed = smoother.smooth(&target);
        assert!((displayed.pitch_accuracy - 30.0).abs() < 1e-4);
        assert!((displayed.overall_score - 15.0).abs() < 1e-4);
    }

    #[test]
    fn reset_forgets_displayed_state() {
        let mut smoother = MetricsSmoother::new(0.3);
        let target = PerformanceMetrics {
            overall_score: 80.0,
            ..PerformanceMetrics::default()
        };
        smoother.smooth(&target);
        smoother.reset();
        assert!(smoother.displayed().overall_score.abs() < f32::EPSILON);
    }

    #[test]
    fn output_is_clamped_to_display_range() {
        let mut smoother = MetricsSmoother::new(1.0);
        let wild = PerformanceMetrics {
            pitch_accuracy: 150.0,
            timing_accuracy: -20.0,
            volume_consistency: 50.0,
            overall_score: 101.0,
        };
        let displayed = smoother.smooth(&wild);
        assert!(displayed.pitch_accuracy <= 100.0);
        assert!(displayed.timing_accuracy >= 0.0);
        assert!(displayed.overall_score <= 100.0);
    }
}
