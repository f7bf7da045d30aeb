use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;

use vx_core::config::EngineConfig;
use vx_score::session::ScoringEngine;

pub mod cli;

fn main() -> Result<()> {
    // 1. Parser CLI
    let cli = cli::Cli::parse();

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level.parse().unwrap_or(log::LevelFilter::Warn))
        .init();

    // 3. Charger la config (fichier si présent, sinon valeurs par défaut)
    let config = if cli.config.exists() {
        vx_core::config::load_config(&cli.config)?
    } else {
        log::info!(
            "Pas de fichier de config à {}, utilisation des défauts",
            cli.config.display()
        );
        EngineConfig::default()
    };

    // 4. Construire le moteur (la config est validée ici) et démarrer
    let mut engine = ScoringEngine::new(config)?;
    engine.start()?;
    println!("Session démarrée — chantez ! (Ctrl-C pour arrêter)");

    // 5. Arrêt propre sur Ctrl-C
    let running = Arc::new(AtomicBool::new(true));
    let running_handler = Arc::clone(&running);
    ctrlc::set_handler(move || {
        running_handler.store(false, Ordering::Relaxed);
    })?;

    // 6. Boucle de reporting console : score à 2 Hz, métriques à 1 Hz
    let started = Instant::now();
    let mut iteration: u64 = 0;
    while running.load(Ordering::Relaxed) && engine.is_scoring() {
        std::thread::sleep(Duration::from_millis(500));
        iteration += 1;

        let score = engine.score();
        let debug = engine.debug_snapshot();
        let voicing = if debug.is_active { "♪" } else { " " };
        let expected = debug
            .expected
            .map_or_else(|| "—".to_string(), |n| format!("{:.0} Hz", n.pitch_hz));
        println!(
            "{voicing} score {score:5.1} | volume {:5.1} | note {:>4} | attendu {expected}",
            debug.volume, debug.note_name
        );

        if iteration.is_multiple_of(2) {
            let metrics = engine.metrics();
            log::info!(
                "métriques lissées : pitch {:.1} | timing {:.1} | volume {:.1} | global {:.1}",
                metrics.pitch_accuracy,
                metrics.timing_accuracy,
                metrics.volume_consistency,
                metrics.overall_score
            );
        }

        if cli.duration > 0 && started.elapsed().as_secs() >= cli.duration {
            break;
        }
    }

    // 7. Score final avant de relâcher le micro
    let final_score = engine.score();
    let final_metrics = engine.metrics();
    engine.stop();

    println!("Score final : {final_score:.1}");
    println!(
        "Justesse {:.1} | Timing {:.1} | Régularité {:.1}",
        final_metrics.pitch_accuracy,
        final_metrics.timing_accuracy,
        final_metrics.volume_consistency
    );

    Ok(())
}
