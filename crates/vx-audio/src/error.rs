use thiserror::Error;

/// Errors originating from the audio module.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No audio input device found, or permission denied.
    #[error("Aucun périphérique audio d'entrée trouvé")]
    NoInputDevice,

    /// The input configuration could not be queried.
    #[error("Configuration d'entrée indisponible : {0}")]
    InputConfig(String),

    /// Audio stream error (build or play).
    #[error("Erreur de stream audio : {0}")]
    Stream(String),
}
