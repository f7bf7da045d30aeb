use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use triple_buffer::TripleBuffer;

use vx_audio::analyzer::SignalAnalyzer;
use vx_audio::capture::MicCapture;
use vx_audio::error::AudioError;
use vx_core::clock::SongClock;
use vx_core::config::EngineConfig;
use vx_core::error::CoreError;
use vx_core::note::note_name;
use vx_core::types::{AnalysisSample, DebugSnapshot, PerformanceMetrics};

use crate::melody::MelodySequencer;
use crate::scorer::{PerformanceScorer, TickReport};
use crate::smoothing::MetricsSmoother;

/// Moteur de session : acquisition micro, tick de scoring rapide, tick
/// d'affichage lent, publication triple-bufferisée vers l'UI.
///
/// Deux états : Idle (aucun historique, score à zéro) et Scoring (deux
/// threads périodiques actifs). Une seule session à la fois ; le micro est
/// détenu exclusivement par le thread de scoring et relâché sur tous les
/// chemins de sortie.
///
/// # Example
/// ```no_run
/// use vx_score::session::ScoringEngine;
/// use vx_core::config::EngineConfig;
///
/// let mut engine = ScoringEngine::new(EngineConfig::default()).unwrap();
/// engine.start().unwrap();
/// let score = engine.score();
/// engine.stop();
/// ```
pub struct ScoringEngine {
    config: EngineConfig,
    session: Option<ActiveSession>,
}

/// Threads et sorties publiées d'une session en cours.
struct ActiveSession {
    running: Arc<AtomicBool>,
    score_thread: JoinHandle<()>,
    display_thread: JoinHandle<()>,
    score_out: triple_buffer::Output<f32>,
    metrics_out: triple_buffer::Output<PerformanceMetrics>,
    debug_out: triple_buffer::Output<DebugSnapshot>,
}

impl ScoringEngine {
    /// Construit un moteur Idle. La configuration est validée ici, jamais
    /// au moment d'un tick.
    ///
    /// # Errors
    /// Returns `CoreError::Config` for any invalid constant.
    pub fn new(config: EngineConfig) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            config,
            session: None,
        })
    }

    /// Transition Idle → Scoring.
    ///
    /// Bloque brièvement le temps d'acquérir le micro. L'absence de
    /// périphérique (ou un refus de permission) est fatale et remontée à
    /// l'appelant ; aucun retry automatique. Un `start()` sur une session
    /// déjà active est un no-op.
    ///
    /// # Errors
    /// Returns the device acquisition failure, or an internal error if the
    /// worker threads cannot be spawned.
    pub fn start(&mut self) -> Result<()> {
        if self.is_scoring() {
            return Ok(());
        }
        // Une session précédente terminée (perte de périphérique) se purge ici.
        self.stop();

        let running = Arc::new(AtomicBool::new(true));

        let (mut score_in, score_out) = TripleBuffer::new(&0.0f32).split();
        let (mut report_in, report_out) = TripleBuffer::new(&TickReport::default()).split();
        let (metrics_in, metrics_out) = TripleBuffer::new(&PerformanceMetrics::default()).split();
        let (debug_in, debug_out) = TripleBuffer::new(&DebugSnapshot::default()).split();

        // Handshake d'acquisition : le stream cpal n'est pas Send, le
        // thread de scoring le construit lui-même et remonte le résultat.
        let (ready_tx, ready_rx) = flume::bounded::<Result<u32, AudioError>>(1);

        let config = self.config.clone();
        let running_score = Arc::clone(&running);
        let score_thread = thread::Builder::new()
            .name("vx-score".to_string())
            .spawn(move || {
                let mut capture = match MicCapture::start_default() {
                    Ok(capture) => capture,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(capture.sample_rate()));
                run_scoring_loop(
                    &mut capture,
                    &config,
                    &running_score,
                    &mut score_in,
                    &mut report_in,
                );
            })?;

        match ready_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(sample_rate)) => {
                log::info!("Session de scoring démarrée @ {sample_rate}Hz");
            }
            Ok(Err(e)) => {
                running.store(false, Ordering::Relaxed);
                let _ = score_thread.join();
                return Err(e.into());
            }
            Err(_) => {
                // Acquisition bloquée : on ne join pas un thread
                // potentiellement coincé dans le driver, le flag le fera
                // sortir dès que l'appel rendra la main.
                running.store(false, Ordering::Relaxed);
                anyhow::bail!("Acquisition du micro : délai dépassé");
            }
        }

        let config = self.config.clone();
        let running_display = Arc::clone(&running);
        let display_thread = match thread::Builder::new()
            .name("vx-display".to_string())
            .spawn(move || {
                run_display_loop(&config, &running_display, report_out, metrics_in, debug_in);
            }) {
            Ok(handle) => handle,
            Err(e) => {
                running.store(false, Ordering::Relaxed);
                let _ = score_thread.join();
                return Err(e.into());
            }
        };

        self.session = Some(ActiveSession {
            running,
            score_thread,
            display_thread,
            score_out,
            metrics_out,
            debug_out,
        });
        Ok(())
    }

    /// Transition Scoring → Idle : annule les deux tâches périodiques puis
    /// relâche le micro. Un tick déjà en vol se termine ; aucun nouveau
    /// tick ne démarre après l'annulation. Idempotent, sûr sans session.
    pub fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.running.store(false, Ordering::Relaxed);
            if session.score_thread.join().is_err() {
                log::warn!("Le thread de scoring s'est terminé en panique");
            }
            if session.display_thread.join().is_err() {
                log::warn!("Le thread d'affichage s'est terminé en panique");
            }
            log::info!("Session de scoring arrêtée");
        }
    }

    /// Stop + remise à zéro des sorties publiées (score 0, métriques 0).
    pub fn reset(&mut self) {
        self.stop();
    }

    /// `true` si une session tourne (le thread de scoring est vivant).
    #[must_use]
    pub fn is_scoring(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| !s.score_thread.is_finished())
    }

    /// Score visible : moyenne fenêtrée au dixième, ~5 Hz. 0 en Idle.
    pub fn score(&mut self) -> f32 {
        self.session
            .as_mut()
            .map_or(0.0, |s| *s.score_out.read())
    }

    /// Métriques lissées (EMA), ~1 Hz. Zéro en Idle.
    pub fn metrics(&mut self) -> PerformanceMetrics {
        self.session
            .as_mut()
            .map_or_else(PerformanceMetrics::default, |s| *s.metrics_out.read())
    }

    /// Instantané de diagnostic, ~2 Hz. Par défaut en Idle.
    pub fn debug_snapshot(&mut self) -> DebugSnapshot {
        self.session
            .as_mut()
            .map_or_else(DebugSnapshot::default, |s| s.debug_out.read().clone())
    }
}

impl Drop for ScoringEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Boucle de scoring, cadence fixe (`score_tick_ms`).
///
/// À chaque tick : draine le ring de capture, ne garde que la frame la plus
/// récente (on visualise le direct, pas l'historique — aucun backlog), puis
/// analyse, consulte le séquenceur avec le temps écoulé du même tick, score
/// et publie. La perte du périphérique arrête la boucle proprement.
fn run_scoring_loop(
    capture: &mut MicCapture,
    config: &EngineConfig,
    running: &AtomicBool,
    score_in: &mut triple_buffer::Input<f32>,
    report_in: &mut triple_buffer::Input<TickReport>,
) {
    let analyzer = SignalAnalyzer::new(config);
    let melody = MelodySequencer::new(config);
    let mut scorer = PerformanceScorer::new(config);
    scorer.start_session();

    let clock = SongClock::start();
    let sample_rate = capture.sample_rate();
    let frame_size = config.frame_size;
    let tick_period = Duration::from_millis(config.score_tick_ms);
    let mut sample_buf: Vec<f32> = Vec::with_capacity(frame_size * 2);

    while running.load(Ordering::Relaxed) {
        if capture.has_failed() {
            log::error!("Périphérique audio perdu en cours de session, arrêt du scoring");
            break;
        }

        capture.read_samples(&mut sample_buf);
        if sample_buf.len() > frame_size {
            let excess = sample_buf.len() - frame_size;
            sample_buf.drain(..excess);
        }

        let expected = melody.expected_at(clock.elapsed_secs());
        let sample = if sample_buf.len() == frame_size {
            analyzer.analyze(&sample_buf, sample_rate)
        } else {
            // Pas encore une frame complète : tick neutre
            AnalysisSample::default()
        };

        let mut report = scorer.tick(&sample, expected.as_ref());
        if !report.score.is_finite() {
            // Garde-fou de bord de tick : jamais de session tuée par un
            // tick dégénéré.
            log::warn!("Tick de scoring dégénéré, échantillon neutre substitué");
            report = TickReport::default();
        }

        score_in.write(report.score);
        report_in.write(report);

        thread::sleep(tick_period);
    }
}

/// Boucle d'affichage, cadence lente (`display_tick_ms`).
///
/// Publie l'instantané de debug à chaque tick et les métriques lissées un
/// tick sur deux (500 ms / 1000 ms par défaut). Ne lit que le dernier
/// rapport complet du scorer : chaque champ reflète un seul et même tick.
fn run_display_loop(
    config: &EngineConfig,
    running: &AtomicBool,
    mut report_out: triple_buffer::Output<TickReport>,
    mut metrics_in: triple_buffer::Input<PerformanceMetrics>,
    mut debug_in: triple_buffer::Input<DebugSnapshot>,
) {
    let mut smoother = MetricsSmoother::new(config.metrics_smoothing);
    let tick_period = Duration::from_millis(config.display_tick_ms);
    let mut iteration: u64 = 0;

    while running.load(Ordering::Relaxed) {
        thread::sleep(tick_period);
        iteration += 1;

        let report = report_out.read().clone();

        debug_in.write(DebugSnapshot {
            pitch_hz: report.sample.pitch_hz,
            volume: report.sample.volume,
            is_active: report.sample.is_active,
            note_name: report
                .sample
                .pitch_hz
                .map_or_else(|| "N/A".to_string(), note_name),
            expected: report.expected,
        });

        if iteration.is_multiple_of(2) {
            let smoothed = smoother.smooth(&report.metrics);
            metrics_in.write(smoothed);
        }
    }
}
