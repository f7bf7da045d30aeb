use vx_core::config::EngineConfig;
use vx_core::types::ExpectedNote;

/// Oracle de notes attendues : fonction pure du temps écoulé.
///
/// Motif mélodique répétitif (offsets en demi-tons sur une fréquence de
/// base), granularité d'une note par `note_duration_secs`, tolérance fixe.
/// Placeholder : un vrai déploiement brancherait ici le timing de la
/// chanson sans toucher au contrat du scorer, qui ne consomme que
/// `Option<ExpectedNote>`.
///
/// # Example
/// ```
/// use vx_score::melody::MelodySequencer;
/// use vx_core::config::EngineConfig;
///
/// let seq = MelodySequencer::new(&EngineConfig::default());
/// let note = seq.expected_at(0.5).unwrap();
/// assert!((note.pitch_hz - 200.0).abs() < 0.01);
/// ```
pub struct MelodySequencer {
    base_freq_hz: f32,
    pattern: Vec<i32>,
    note_duration_secs: f32,
    tolerance_hz: f32,
}

impl MelodySequencer {
    /// Construit le séquenceur depuis une configuration déjà validée.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            base_freq_hz: config.base_freq_hz,
            pattern: config.melody_pattern.clone(),
            note_duration_secs: config.note_duration_secs,
            tolerance_hz: config.tolerance_hz,
        }
    }

    /// Note attendue "maintenant". Déterministe : même temps, même note.
    ///
    /// Returns `None` for negative time (song not started).
    #[must_use]
    pub fn expected_at(&self, song_time_secs: f64) -> Option<ExpectedNote> {
        if song_time_secs < 0.0 {
            return None;
        }

        let slot = (song_time_secs / f64::from(self.note_duration_secs)).floor();
        let index = (slot as u64 % self.pattern.len() as u64) as usize;
        let semitone_offset = self.pattern[index];
        let pitch_hz = self.base_freq_hz * 2.0_f32.powf(semitone_offset as f32 / 12.0);

        Some(ExpectedNote {
            start_time_secs: (slot as f32) * self.note_duration_secs,
            duration_secs: self.note_duration_secs,
            pitch_hz,
            tolerance_hz: self.tolerance_hz,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequencer() -> MelodySequencer {
        MelodySequencer::new(&EngineConfig::default())
    }

    #[test]
    fn deterministic_for_same_time() {
        let seq = sequencer();
        assert_eq!(seq.expected_at(3.7), seq.expected_at(3.7));
    }

    #[test]
    fn follows_semitone_pattern() {
        let seq = sequencer();
        // Pattern [0, 2, 4, 2, 0, -2, 0] over base 200 Hz, 1 s per note
        let n0 = match seq.expected_at(0.0) {
            Some(n) => n,
            None => panic!("expected a note at t=0"),
        };
        assert!((n0.pitch_hz - 200.0).abs() < 0.01);

        let n1 = match seq.expected_at(1.0) {
            Some(n) => n,
            None => panic!("expected a note at t=1"),
        };
        let two_semitones = 200.0 * 2.0_f32.powf(2.0 / 12.0);
        assert!((n1.pitch_hz - two_semitones).abs() < 0.01);

        let n5 = match seq.expected_at(5.5) {
            Some(n) => n,
            None => panic!("expected a note at t=5.5"),
        };
        let minus_two = 200.0 * 2.0_f32.powf(-2.0 / 12.0);
        assert!((n5.pitch_hz - minus_two).abs() < 0.01);
    }

    #[test]
    fn pattern_repeats_after_full_cycle() {
        let seq = sequencer();
        let a = seq.expected_at(2.5).map(|n| n.pitch_hz);
        let b = seq.expected_at(9.5).map(|n| n.pitch_hz);
        assert_eq!(a, b);
    }

    #[test]
    fn note_boundaries_align_to_duration() {
        let seq = sequencer();
        let n = match seq.expected_at(4.9) {
            Some(n) => n,
            None => panic!("expected a note"),
        };
        assert!((n.start_time_secs - 4.0).abs() < f32::EPSILON);
        assert!((n.duration_secs - 1.0).abs() < f32::EPSILON);
        assert!((n.tolerance_hz - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn negative_time_has_no_note() {
        assert!(sequencer().expected_at(-0.1).is_none());
    }
}
