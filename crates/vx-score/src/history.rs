use std::collections::VecDeque;

use vx_core::types::PerformanceMetrics;

/// État courant d'une session de scoring.
///
/// Fenêtres glissantes à capacité fixe (la plus ancienne entrée est
/// évincée au débordement) et compteurs cumulés. Propriété exclusive du
/// scorer : seul son tick la mute, et elle est remise à neutre à chaque
/// démarrage de session.
pub struct PerformanceHistory {
    /// Attempts whose pitch landed inside tolerance.
    pub pitch_hits: u32,
    /// Every scored tick inside an expected note, hit or not.
    pub pitch_attempts: u32,
    volume_readings: VecDeque<f32>,
    recent_scores: VecDeque<f32>,
    volume_capacity: usize,
    score_capacity: usize,
    /// Dernières métriques non lissées, relevées par la tâche d'affichage.
    pub current_metrics: PerformanceMetrics,
}

impl PerformanceHistory {
    /// Historique vide (état Idle).
    #[must_use]
    pub fn new(volume_capacity: usize, score_capacity: usize) -> Self {
        Self {
            pitch_hits: 0,
            pitch_attempts: 0,
            volume_readings: VecDeque::with_capacity(volume_capacity),
            recent_scores: VecDeque::with_capacity(score_capacity),
            volume_capacity,
            score_capacity,
            current_metrics: PerformanceMetrics::default(),
        }
    }

    /// Remise à la baseline neutre d'un démarrage de session : fenêtres
    /// vides, compteurs à zéro, un unique score seed dans la fenêtre.
    pub fn reset_for_start(&mut self, seed_score: f32) {
        self.pitch_hits = 0;
        self.pitch_attempts = 0;
        self.volume_readings.clear();
        self.recent_scores.clear();
        self.recent_scores.push_back(seed_score);
        self.current_metrics = PerformanceMetrics {
            overall_score: seed_score,
            ..PerformanceMetrics::default()
        };
    }

    /// Efface tout (état Idle, aucun seed).
    pub fn clear(&mut self) {
        self.pitch_hits = 0;
        self.pitch_attempts = 0;
        self.volume_readings.clear();
        self.recent_scores.clear();
        self.current_metrics = PerformanceMetrics::default();
    }

    /// Push a volume reading, evicting the oldest past capacity.
    pub fn push_volume(&mut self, volume: f32) {
        self.volume_readings.push_back(volume);
        if self.volume_readings.len() > self.volume_capacity {
            self.volume_readings.pop_front();
        }
    }

    /// Moyenne et variance de la fenêtre de volume. (0, 0) si vide.
    #[must_use]
    pub fn volume_stats(&self) -> (f32, f32) {
        if self.volume_readings.is_empty() {
            return (0.0, 0.0);
        }
        let n = self.volume_readings.len() as f32;
        let mean: f32 = self.volume_readings.iter().sum::<f32>() / n;
        let variance: f32 = self
            .volume_readings
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f32>()
            / n;
        (mean, variance)
    }

    /// Push a per-tick raw score, evicting the oldest past capacity.
    pub fn push_score(&mut self, score: f32) {
        self.recent_scores.push_back(score);
        if self.recent_scores.len() > self.score_capacity {
            self.recent_scores.pop_front();
        }
    }

    /// Moyenne de la fenêtre de scores. 0 si vide.
    #[must_use]
    pub fn windowed_score(&self) -> f32 {
        if self.recent_scores.is_empty() {
            return 0.0;
        }
        self.recent_scores.iter().sum::<f32>() / self.recent_scores.len() as f32
    }

    /// `hits / attempts × 100`, ou 0 sans aucune tentative.
    #[must_use]
    pub fn pitch_accuracy(&self) -> f32 {
        if self.pitch_attempts == 0 {
            return 0.0;
        }
        (self.pitch_hits as f32 / self.pitch_attempts as f32 * 100.0).min(100.0)
    }

    /// Number of volume readings currently windowed.
    #[must_use]
    pub fn volume_window_len(&self) -> usize {
        self.volume_readings.len()
    }

    /// Number of scores currently windowed.
    #[must_use]
    pub fn score_window_len(&self) -> usize {
        self.recent_scores.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_never_exceed_capacity() {
        let mut history = PerformanceHistory::new(10, 20);
        for i in 0..500 {
            history.push_volume(i as f32);
            history.push_score(i as f32);
        }
        assert_eq!(history.volume_window_len(), 10);
        assert_eq!(history.score_window_len(), 20);
    }

    #[test]
    fn oldest_entries_are_evicted() {
        let mut history = PerformanceHistory::new(10, 3);
        history.push_score(10.0);
        history.push_score(20.0);
        history.push_score(30.0);
        history.push_score(40.0);
        // [20, 30, 40] after eviction of 10
        assert!((history.windowed_score() - 30.0).abs() < f32::EPSILON);
    }

    #[test]
    fn windowed_score_is_the_mean() {
        let mut history = PerformanceHistory::new(10, 20);
        for s in [50.0, 60.0, 70.0] {
            history.push_score(s);
        }
        assert!((history.windowed_score() - 60.0).abs() < f32::EPSILON);
    }

    #[test]
    fn pitch_accuracy_zero_without_attempts() {
        let history = PerformanceHistory::new(10, 20);
        assert!(history.pitch_accuracy().abs() < f32::EPSILON);
    }

    #[test]
    fn pitch_accuracy_never_exceeds_hundred() {
        let mut history = PerformanceHistory::new(10, 20);
        history.pitch_hits = 7;
        history.pitch_attempts = 7;
        assert!((history.pitch_accuracy() - 100.0).abs() < f32::EPSILON);
        history.pitch_attempts = 10;
        assert!((history.pitch_accuracy() - 70.0).abs() < f32::EPSILON);
    }

    #[test]
    fn volume_stats_mean_and_variance() {
        let mut history = PerformanceHistory::new(10, 20);
        for v in [40.0, 50.0, 60.0] {
            history.push_volume(v);
        }
        let (mean, variance) = history.volume_stats();
        assert!((mean - 50.0).abs() < f32::EPSILON);
        // ((10)^2 + 0 + (10)^2) / 3
        assert!((variance - 200.0 / 3.0).abs() < 1e-3);
    }

    #[test]
    fn reset_seeds_a_single_neutral_score() {
        let mut history = PerformanceHistory::new(10, 20);
        history.pitch_hits = 5;
        history.pitch_attempts = 9;
        history.push_volume(30.0);
        history.push_score(90.0);

        history.reset_for_start(50.0);
        assert_eq!(history.pitch_hits, 0);
        assert_eq!(history.pitch_attempts, 0);
        assert_eq!(history.volume_window_len(), 0);
        assert_eq!(history.score_window_len(), 1);
        assert!((history.windowed_score() - 50.0).abs() < f32::EPSILON);
        assert!((history.current_metrics.overall_score - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn clear_leaves_no_seed() {
        let mut history = PerformanceHistory::new(10, 20);
        history.reset_for_start(50.0);
        history.clear();
        assert_eq!(history.score_window_len(), 0);
        assert!(history.windowed_score().abs() < f32::EPSILON);
    }
}
