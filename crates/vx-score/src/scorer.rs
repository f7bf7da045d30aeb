use vx_core::config::EngineConfig;
use vx_core::types::{AnalysisSample, ExpectedNote, PerformanceMetrics};

use crate::history::PerformanceHistory;

/// Sortie d'un tick de scoring : tout provient du même tick, jamais de
/// mélange de champs entre deux ticks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Score publié : moyenne fenêtrée arrondie au dixième, dans [0, 100].
    pub score: f32,
    /// Métriques courantes non lissées, à relever par la tâche d'affichage.
    pub metrics: PerformanceMetrics,
    /// Échantillon d'analyse brut du tick (diagnostics).
    pub sample: AnalysisSample,
    /// Note attendue au moment du tick (diagnostics).
    pub expected: Option<ExpectedNote>,
}

/// Scorer de performance : combine l'analyse du signal et la note attendue
/// en un score par tick, et entretient l'historique de session.
///
/// Pondération : 50 % pitch, 30 % timing, 20 % volume. Le timing est un
/// proxy simplifié (voicing pendant une note / hors note / silence) dont le
/// branchement exact est préservé via la configuration.
pub struct PerformanceScorer {
    pitch_weight: f32,
    timing_weight: f32,
    volume_weight: f32,
    effort_score: f32,
    rest_score: f32,
    timing_on_note: f32,
    timing_off_note: f32,
    timing_rest: f32,
    comfort_min: f32,
    comfort_max: f32,
    loudness_penalty: f32,
    seed_score: f32,
    history: PerformanceHistory,
}

impl PerformanceScorer {
    /// Construit un scorer depuis une configuration déjà validée.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            pitch_weight: config.pitch_weight,
            timing_weight: config.timing_weight,
            volume_weight: config.volume_weight,
            effort_score: config.effort_score,
            rest_score: config.rest_score,
            timing_on_note: config.timing_on_note,
            timing_off_note: config.timing_off_note,
            timing_rest: config.timing_rest,
            comfort_min: config.comfort_min,
            comfort_max: config.comfort_max,
            loudness_penalty: config.loudness_penalty,
            seed_score: config.seed_score,
            history: PerformanceHistory::new(config.volume_window, config.score_window),
        }
    }

    /// Transition Idle → Scoring : baseline neutre, fenêtres vides, seed.
    pub fn start_session(&mut self) {
        self.history.reset_for_start(self.seed_score);
    }

    /// Transition Scoring → Idle : tout est effacé, aucun reliquat.
    pub fn end_session(&mut self) {
        self.history.clear();
    }

    /// Un tick de scoring, cadence fixe.
    pub fn tick(
        &mut self,
        sample: &AnalysisSample,
        expected: Option<&ExpectedNote>,
    ) -> TickReport {
        let pitch_score = self.score_pitch(sample, expected);
        let volume_score = self.score_volume(sample.volume);
        let timing_score = self.score_timing(sample.is_active, expected.is_some());

        let raw = (pitch_score * self.pitch_weight
            + timing_score * self.timing_weight
            + volume_score * self.volume_weight)
            .round();
        self.history.push_score(raw);

        let windowed = self.history.windowed_score();
        let metrics = PerformanceMetrics {
            pitch_accuracy: self.history.pitch_accuracy(),
            timing_accuracy: timing_score,
            volume_consistency: volume_score,
            overall_score: windowed,
        };
        self.history.current_metrics = metrics;

        TickReport {
            score: published_score(windowed),
            metrics,
            sample: *sample,
            expected: expected.copied(),
        }
    }

    /// Accès lecture à l'historique (tests, diagnostics).
    #[must_use]
    pub fn history(&self) -> &PerformanceHistory {
        &self.history
    }

    /// Sous-score de pitch, et tenue des compteurs hit/tentative.
    ///
    /// Dans la tolérance : (70, 100], décroissance linéaire, compte un hit.
    /// Entre 1× et 2× la tolérance : [0, 20), décroissance linéaire.
    /// Voicing sans pitch confiant pendant une note : crédit d'effort.
    /// Silence sans note attendue : crédit de repos. Sinon : 0.
    fn score_pitch(&mut self, sample: &AnalysisSample, expected: Option<&ExpectedNote>) -> f32 {
        match (sample.is_active, sample.pitch_hz, expected) {
            (true, Some(pitch), Some(note)) => {
                self.history.pitch_attempts += 1;
                let diff = (pitch - note.pitch_hz).abs();
                if diff <= note.tolerance_hz {
                    self.history.pitch_hits += 1;
                    100.0 - diff / note.tolerance_hz * 30.0
                } else if diff <= note.tolerance_hz * 2.0 {
                    40.0 - diff / note.tolerance_hz * 20.0
                } else {
                    0.0
                }
            }
            (true, None, Some(_)) => {
                self.history.pitch_attempts += 1;
                self.effort_score
            }
            (false, _, None) => self.rest_score,
            _ => 0.0,
        }
    }

    /// Sous-score de volume : régularité de la fenêtre glissante, pénalité
    /// multiplicative hors de la bande confortable. Silence total → 0, et
    /// la fenêtre n'est pas alimentée.
    fn score_volume(&mut self, volume: f32) -> f32 {
        if volume <= 0.0 {
            return 0.0;
        }
        self.history.push_volume(volume);
        let (mean, variance) = self.history.volume_stats();
        let mut score = (100.0 - variance * 2.0).max(0.0);
        if !(mean > self.comfort_min && mean < self.comfort_max) {
            score *= self.loudness_penalty;
        }
        score
    }

    /// Proxy de timing : branchement exact préservé.
    fn score_timing(&self, is_active: bool, note_expected: bool) -> f32 {
        if is_active && note_expected {
            self.timing_on_note
        } else if is_active {
            self.timing_off_note
        } else {
            self.timing_rest
        }
    }
}

/// Score publié : moyenne fenêtrée arrondie au dixième, clampée à [0, 100].
#[must_use]
fn published_score(windowed_mean: f32) -> f32 {
    ((windowed_mean * 10.0).round() / 10.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> PerformanceScorer {
        let mut s = PerformanceScorer::new(&EngineConfig::default());
        s.start_session();
        s
    }

    fn voiced(pitch_hz: f32, volume: f32) -> AnalysisSample {
        AnalysisSample {
            pitch_hz: Some(pitch_hz),
            volume,
            is_active: true,
        }
    }

    fn note(pitch_hz: f32) -> ExpectedNote {
        ExpectedNote {
            start_time_secs: 0.0,
            duration_secs: 1.0,
            pitch_hz,
            tolerance_hz: 50.0,
        }
    }

    #[test]
    fn in_tolerance_pitch_scores_ninety_four_and_hits() {
        let mut s = scorer();
        let target = note(200.0);
        let sub = s.score_pitch(&voiced(210.0, 50.0), Some(&target));
        // 100 − 30·(10/50) = 94
        assert!((sub - 94.0).abs() < 1e-4);
        assert_eq!(s.history().pitch_hits, 1);
        assert_eq!(s.history().pitch_attempts, 1);
    }

    #[test]
    fn near_miss_scores_on_the_low_ramp_without_hit() {
        let mut s = scorer();
        let target = note(200.0);
        // Δ = 75 Hz, 1.5× tolerance → 40 − 20·1.5 = 10
        let sub = s.score_pitch(&voiced(275.0, 50.0), Some(&target));
        assert!((sub - 10.0).abs() < 1e-4);
        assert_eq!(s.history().pitch_hits, 0);
        assert_eq!(s.history().pitch_attempts, 1);
    }

    #[test]
    fn far_miss_scores_zero_but_counts_attempt() {
        let mut s = scorer();
        let target = note(200.0);
        let sub = s.score_pitch(&voiced(400.0, 50.0), Some(&target));
        assert!(sub.abs() < f32::EPSILON);
        assert_eq!(s.history().pitch_attempts, 1);
    }

    #[test]
    fn voicing_without_pitch_earns_effort_credit() {
        let mut s = scorer();
        let target = note(200.0);
        let sample = AnalysisSample {
            pitch_hz: None,
            volume: 20.0,
            is_active: true,
        };
        let sub = s.score_pitch(&sample, Some(&target));
        assert!((sub - 10.0).abs() < f32::EPSILON);
        assert_eq!(s.history().pitch_attempts, 1);
        assert_eq!(s.history().pitch_hits, 0);
    }

    #[test]
    fn correct_silence_earns_rest_credit() {
        let mut s = scorer();
        let sub = s.score_pitch(&AnalysisSample::default(), None);
        assert!((sub - 80.0).abs() < f32::EPSILON);
        assert_eq!(s.history().pitch_attempts, 0);
    }

    #[test]
    fn voicing_with_no_note_scores_zero_pitch() {
        let mut s = scorer();
        let sub = s.score_pitch(&voiced(200.0, 50.0), None);
        assert!(sub.abs() < f32::EPSILON);
    }

    #[test]
    fn timing_branching_is_preserved() {
        let s = scorer();
        assert!((s.score_timing(true, true) - 85.0).abs() < f32::EPSILON);
        assert!((s.score_timing(true, false) - 60.0).abs() < f32::EPSILON);
        assert!((s.score_timing(false, true) - 90.0).abs() < f32::EPSILON);
        assert!((s.score_timing(false, false) - 90.0).abs() < f32::EPSILON);
    }

    #[test]
    fn steady_comfortable_volume_scores_high() {
        let mut s = scorer();
        let mut last = 0.0;
        for _ in 0..10 {
            last = s.score_volume(40.0);
        }
        // Zero variance, mean in the comfortable band
        assert!((last - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn quiet_mean_takes_loudness_penalty() {
        let mut s = scorer();
        let mut last = 0.0;
        for _ in 0..10 {
            last = s.score_volume(5.0);
        }
        assert!((last - 70.0).abs() < 1e-4);
    }

    #[test]
    fn silence_does_not_feed_the_volume_window() {
        let mut s = scorer();
        assert!(s.score_volume(0.0).abs() < f32::EPSILON);
        assert_eq!(s.history().volume_window_len(), 0);
    }

    #[test]
    fn published_score_has_tenths_precision() {
        assert!((published_score(60.0) - 60.0).abs() < f32::EPSILON);
        assert!((published_score(58.54) - 58.5).abs() < 1e-4);
        assert!((published_score(120.0) - 100.0).abs() < f32::EPSILON);
        assert!((published_score(-3.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn tick_weights_sub_scores() {
        let mut s = PerformanceScorer::new(&EngineConfig::default());
        // No seed: the window holds exactly this tick's raw score.
        // Silent, no note: pitch 80, timing 90, volume 0
        // → raw = round(0.5·80 + 0.3·90 + 0.2·0) = 67
        let report = s.tick(&AnalysisSample::default(), None);
        assert!((report.score - 67.0).abs() < f32::EPSILON);
        assert!((report.metrics.timing_accuracy - 90.0).abs() < f32::EPSILON);
        assert!(report.metrics.volume_consistency.abs() < f32::EPSILON);
        assert!(report.metrics.pitch_accuracy.abs() < f32::EPSILON);
    }

    #[test]
    fn session_restart_resets_history_completely() {
        let mut s = scorer();
        let target = note(200.0);
        for _ in 0..30 {
            s.tick(&voiced(205.0, 40.0), Some(&target));
        }
        assert!(s.history().pitch_attempts > 0);

        s.end_session();
        s.start_session();
        assert_eq!(s.history().pitch_hits, 0);
        assert_eq!(s.history().pitch_attempts, 0);
        assert_eq!(s.history().volume_window_len(), 0);
        assert_eq!(s.history().score_window_len(), 1);
        assert!((s.history().windowed_score() - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn score_window_stays_bounded_across_many_ticks() {
        let mut s = scorer();
        let target = note(200.0);
        for _ in 0..200 {
            s.tick(&voiced(210.0, 40.0), Some(&target));
        }
        assert_eq!(s.history().score_window_len(), 20);
        assert_eq!(s.history().volume_window_len(), 10);
    }

    #[test]
    fn sustained_accuracy_converges_to_a_high_score() {
        let mut s = scorer();
        let target = note(200.0);
        let mut report = TickReport::default();
        for _ in 0..40 {
            report = s.tick(&voiced(200.0, 40.0), Some(&target));
        }
        // Perfect pitch (100), on-note timing (85), steady comfortable
        // volume (100) → raw = round(50 + 25.5 + 20) = 96 every tick.
        assert!((report.score - 96.0).abs() < 0.11);
        assert!((report.metrics.pitch_accuracy - 100.0).abs() < f32::EPSILON);
    }
}
