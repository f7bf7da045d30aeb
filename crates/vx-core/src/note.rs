/// Fréquence du La 440 (A4), référence du tempérament égal.
pub const A4_HZ: f32 = 440.0;

/// Les 12 noms de la gamme chromatique, à partir de Do.
const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Nom de la note la plus proche d'une fréquence donnée.
///
/// Distance en demi-tons depuis C4 (= A4·2^(−9/12)), arrondie à l'entier le
/// plus proche ; octave = floor(demi-tons / 12) + 4. Les fréquences nulles
/// ou négatives donnent "N/A".
///
/// # Example
/// ```
/// use vx_core::note::note_name;
/// assert_eq!(note_name(440.0), "A4");
/// assert_eq!(note_name(261.63), "C4");
/// assert_eq!(note_name(0.0), "N/A");
/// ```
#[must_use]
pub fn note_name(freq_hz: f32) -> String {
    if freq_hz <= 0.0 || !freq_hz.is_finite() {
        return "N/A".to_string();
    }

    let c4 = A4_HZ * 2.0_f32.powf(-9.0 / 12.0);
    let semitones_from_c4 = (12.0 * (freq_hz / c4).log2()).round() as i32;
    let octave = semitones_from_c4.div_euclid(12) + 4;
    let index = semitones_from_c4.rem_euclid(12) as usize;

    format!("{}{octave}", NOTE_NAMES[index])
}
