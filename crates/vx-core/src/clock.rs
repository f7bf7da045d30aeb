use std::time::Instant;

/// Horloge de chanson : secondes écoulées depuis le début de la session.
///
/// Le séquenceur de notes attendues ne consomme que cette valeur ; la
/// mélodie réelle est hors périmètre. Redémarrable via `restart()`.
///
/// # Example
/// ```
/// use vx_core::clock::SongClock;
/// let clock = SongClock::start();
/// assert!(clock.elapsed_secs() >= 0.0);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct SongClock {
    started_at: Instant,
}

impl SongClock {
    /// Démarre l'horloge à l'instant présent.
    #[must_use]
    pub fn start() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }

    /// Secondes écoulées depuis `start()` / le dernier `restart()`.
    #[inline]
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    /// Remet l'horloge à zéro.
    pub fn restart(&mut self) {
        self.started_at = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_monotonic() {
        let clock = SongClock::start();
        let a = clock.elapsed_secs();
        let b = clock.elapsed_secs();
        assert!(b >= a);
        assert!(a >= 0.0);
    }

    #[test]
    fn restart_rewinds_to_zero() {
        let mut clock = SongClock::start();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(clock.elapsed_secs() > 0.0);
        clock.restart();
        assert!(clock.elapsed_secs() < 0.005);
    }
}
