use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Configuration complète du moteur de scoring vocal.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine, calée
/// sur les constantes empiriques du pipeline (seuils d'activité, bande
/// vocale, fenêtres glissantes). `validate()` rejette toute combinaison
/// incohérente avant le premier tick.
///
/// # Example
/// ```
/// use vx_core::config::EngineConfig;
/// let config = EngineConfig::default();
/// assert_eq!(config.score_tick_ms, 200);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EngineConfig {
    // === Analyse du signal ===
    /// Taille de frame d'analyse en samples.
    pub frame_size: usize,
    /// Borne basse de la bande vocale (Hz).
    pub min_pitch_hz: f32,
    /// Borne haute de la bande vocale (Hz).
    pub max_pitch_hz: f32,
    /// Seuil de confiance de l'autocorrélation (somme non normalisée).
    pub correlation_threshold: f32,
    /// Facteur d'échelle RMS → volume [0, 100].
    pub volume_scale: f32,
    /// Gate de loudness en dessous duquel la détection de pitch est sautée.
    pub pitch_gate: f32,
    /// Seuil de voicing : `is_active = volume > activity_threshold`.
    pub activity_threshold: f32,

    // === Mélodie attendue (oracle placeholder) ===
    /// Fréquence de base de la mélodie (Hz).
    pub base_freq_hz: f32,
    /// Motif mélodique répétitif, en demi-tons relatifs à la base.
    pub melody_pattern: Vec<i32>,
    /// Granularité d'une note attendue (secondes).
    pub note_duration_secs: f32,
    /// Bande de tolérance autour de la note attendue (±Hz).
    pub tolerance_hz: f32,

    // === Scoring ===
    /// Poids du sous-score de pitch.
    pub pitch_weight: f32,
    /// Poids du sous-score de timing.
    pub timing_weight: f32,
    /// Poids du sous-score de volume.
    pub volume_weight: f32,
    /// Crédit d'effort : voicing sans pitch confiant pendant une note.
    pub effort_score: f32,
    /// Crédit de silence correct : silence sans note attendue.
    pub rest_score: f32,
    /// Timing : voicing pendant une note attendue.
    pub timing_on_note: f32,
    /// Timing : voicing sans note attendue.
    pub timing_off_note: f32,
    /// Timing : silence.
    pub timing_rest: f32,
    /// Bande de volume confortable, borne basse (exclusive).
    pub comfort_min: f32,
    /// Bande de volume confortable, borne haute (exclusive).
    pub comfort_max: f32,
    /// Pénalité multiplicative hors bande confortable.
    pub loudness_penalty: f32,
    /// Capacité de la fenêtre glissante de volume.
    pub volume_window: usize,
    /// Capacité de la fenêtre glissante de scores par tick.
    pub score_window: usize,
    /// Score neutre injecté au démarrage d'une session.
    pub seed_score: f32,

    // === Cadences ===
    /// Période du tick de scoring (ms).
    pub score_tick_ms: u64,
    /// Période du tick d'affichage (ms). Les métriques lissées sont
    /// publiées un tick d'affichage sur deux.
    pub display_tick_ms: u64,
    /// Facteur α de l'EMA des métriques affichées.
    pub metrics_smoothing: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_size: 2048,
            min_pitch_hz: 80.0,
            max_pitch_hz: 800.0,
            correlation_threshold: 0.2,
            volume_scale: 1000.0,
            pitch_gate: 5.0,
            activity_threshold: 8.0,
            base_freq_hz: 200.0,
            melody_pattern: vec![0, 2, 4, 2, 0, -2, 0],
            note_duration_secs: 1.0,
            tolerance_hz: 50.0,
            pitch_weight: 0.5,
            timing_weight: 0.3,
            volume_weight: 0.2,
            effort_score: 10.0,
            rest_score: 80.0,
            timing_on_note: 85.0,
            timing_off_note: 60.0,
            timing_rest: 90.0,
            comfort_min: 15.0,
            comfort_max: 80.0,
            loudness_penalty: 0.7,
            volume_window: 10,
            score_window: 20,
            seed_score: 50.0,
            score_tick_ms: 200,
            display_tick_ms: 500,
            metrics_smoothing: 0.3,
        }
    }
}

impl EngineConfig {
    /// Rejette toute configuration incohérente avant la construction du moteur.
    ///
    /// # Errors
    /// Returns `CoreError::Config` describing the first invalid field found.
    ///
    /// # Example
    /// ```
    /// use vx_core::config::EngineConfig;
    /// let mut config = EngineConfig::default();
    /// config.tolerance_hz = 0.0;
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.frame_size == 0 {
            return Err(CoreError::Config("frame_size doit être > 0".into()));
        }
        if !(self.min_pitch_hz > 0.0 && self.min_pitch_hz < self.max_pitch_hz) {
            return Err(CoreError::Config(format!(
                "bande vocale invalide : {}–{} Hz",
                self.min_pitch_hz, self.max_pitch_hz
            )));
        }
        if self.correlation_threshold <= 0.0 {
            return Err(CoreError::Config(
                "correlation_threshold doit être > 0".into(),
            ));
        }
        if self.volume_scale <= 0.0 {
            return Err(CoreError::Config("volume_scale doit être > 0".into()));
        }
        if self.pitch_gate < 0.0 || self.activity_threshold < 0.0 {
            return Err(CoreError::Config(
                "les gates d'activité doivent être >= 0".into(),
            ));
        }
        if self.base_freq_hz <= 0.0 {
            return Err(CoreError::Config("base_freq_hz doit être > 0".into()));
        }
        if self.melody_pattern.is_empty() {
            return Err(CoreError::Config("melody_pattern est vide".into()));
        }
        if self.note_duration_secs <= 0.0 {
            return Err(CoreError::Config("note_duration_secs doit être > 0".into()));
        }
        if self.tolerance_hz <= 0.0 {
            return Err(CoreError::Config("tolerance_hz doit être > 0".into()));
        }
        let weights = [self.pitch_weight, self.timing_weight, self.volume_weight];
        if weights.iter().any(|w| !(0.0..=1.0).contains(w)) {
            return Err(CoreError::Config(
                "chaque poids doit être dans [0, 1]".into(),
            ));
        }
        let sum: f32 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-3 {
            return Err(CoreError::Config(format!(
                "la somme des poids doit valoir 1.0 (actuelle : {sum})"
            )));
        }
        if self.comfort_min >= self.comfort_max {
            return Err(CoreError::Config(
                "bande confortable invalide : comfort_min >= comfort_max".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.loudness_penalty) {
            return Err(CoreError::Config(
                "loudness_penalty doit être dans [0, 1]".into(),
            ));
        }
        if self.volume_window == 0 || self.score_window == 0 {
            return Err(CoreError::Config(
                "les fenêtres glissantes doivent avoir une capacité > 0".into(),
            ));
        }
        if self.score_tick_ms == 0 || self.display_tick_ms == 0 {
            return Err(CoreError::Config("les périodes de tick doivent être > 0".into()));
        }
        if !(self.metrics_smoothing > 0.0 && self.metrics_smoothing <= 1.0) {
            return Err(CoreError::Config(
                "metrics_smoothing doit être dans (0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize, Default)]
struct ConfigFile {
    analysis: Option<AnalysisSection>,
    melody: Option<MelodySection>,
    scoring: Option<ScoringSection>,
    display: Option<DisplaySection>,
}

/// Analysis section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
struct AnalysisSection {
    frame_size: Option<usize>,
    min_pitch_hz: Option<f32>,
    max_pitch_hz: Option<f32>,
    correlation_threshold: Option<f32>,
    volume_scale: Option<f32>,
    pitch_gate: Option<f32>,
    activity_threshold: Option<f32>,
}

/// Melody section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct MelodySection {
    base_freq_hz: Option<f32>,
    pattern: Option<Vec<i32>>,
    note_duration_secs: Option<f32>,
    tolerance_hz: Option<f32>,
}

/// Scoring section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct ScoringSection {
    pitch_weight: Option<f32>,
    timing_weight: Option<f32>,
    volume_weight: Option<f32>,
    effort_score: Option<f32>,
    rest_score: Option<f32>,
    timing_on_note: Option<f32>,
    timing_off_note: Option<f32>,
    timing_rest: Option<f32>,
    comfort_min: Option<f32>,
    comfort_max: Option<f32>,
    loudness_penalty: Option<f32>,
    volume_window: Option<usize>,
    score_window: Option<usize>,
    seed_score: Option<f32>,
    tick_ms: Option<u64>,
}

/// Display section of the TOML config, all fields optional.
#[derive(Deserialize)]
struct DisplaySection {
    tick_ms: Option<u64>,
    metrics_smoothing: Option<f32>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// La configuration résultante est validée avant d'être retournée.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if the merged
/// configuration fails `validate()`.
///
/// # Example
/// ```no_run
/// use vx_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml"));
/// ```
#[allow(clippy::too_many_lines)]
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;

    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))?;

    let mut config = EngineConfig::default();

    if let Some(a) = file.analysis {
        if let Some(v) = a.frame_size {
            config.frame_size = v;
        }
        if let Some(v) = a.min_pitch_hz {
            config.min_pitch_hz = v;
        }
        if let Some(v) = a.max_pitch_hz {
            config.max_pitch_hz = v;
        }
        if let Some(v) = a.correlation_threshold {
            config.correlation_threshold = v;
        }
        if let Some(v) = a.volume_scale {
            config.volume_scale = v;
        }
        if let Some(v) = a.pitch_gate {
            config.pitch_gate = v;
        }
        if let Some(v) = a.activity_threshold {
            config.activity_threshold = v;
        }
    }

    if let Some(m) = file.melody {
        if let Some(v) = m.base_freq_hz {
            config.base_freq_hz = v;
        }
        if let Some(v) = m.pattern {
            config.melody_pattern = v;
        }
        if let Some(v) = m.note_duration_secs {
            config.note_duration_secs = v;
        }
        if let Some(v) = m.tolerance_hz {
            config.tolerance_hz = v;
        }
    }

    if let Some(s) = file.scoring {
        if let Some(v) = s.pitch_weight {
            config.pitch_weight = v;
        }
        if let Some(v) = s.timing_weight {
            config.timing_weight = v;
        }
        if let Some(v) = s.volume_weight {
            config.volume_weight = v;
        }
        if let Some(v) = s.effort_score {
            config.effort_score = v;
        }
        if let Some(v) = s.rest_score {
            config.rest_score = v;
        }
        if let Some(v) = s.timing_on_note {
            config.timing_on_note = v;
        }
        if let Some(v) = s.timing_off_note {
            config.timing_off_note = v;
        }
        if let Some(v) = s.timing_rest {
            config.timing_rest = v;
        }
        if let Some(v) = s.comfort_min {
            config.comfort_min = v;
        }
        if let Some(v) = s.comfort_max {
            config.comfort_max = v;
        }
        if let Some(v) = s.loudness_penalty {
            config.loudness_penalty = v;
        }
        if let Some(v) = s.volume_window {
            config.volume_window = v;
        }
        if let Some(v) = s.score_window {
            config.score_window = v;
        }
        if let Some(v) = s.seed_score {
            config.seed_score = v;
        }
        if let Some(v) = s.tick_ms {
            config.score_tick_ms = v;
        }
    }

    if let Some(d) = file.display {
        if let Some(v) = d.tick_ms {
            config.display_tick_ms = v;
        }
        if let Some(v) = d.metrics_smoothing {
            config.metrics_smoothing = v;
        }
    }

    config.validate()?;
    Ok(config)
}
