use std::path::PathBuf;

use clap::Parser;

/// voxscore — Real-time vocal performance scoring engine.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Durée de la session en secondes. 0 = jusqu'à Ctrl-C.
    #[arg(long, default_value_t = 0)]
    pub duration: u64,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}
