//! Procedural music synthesis configuration.

/// Tempo of the composition at playback rate 1.0 (gate steps per second)
const BASE_SPEED: f32 = 2.0;

/// Root pitch multiplier at playback rate 1.0 (Hz per MIDI-ish unit)
const BASE_PITCH: f32 = 261.63;

/// Glicol composition (procedural music code) at the given playback rate.
///
/// Like slowing a tape, a lower rate lowers both tempo and pitch.
pub fn composition(playback_rate: f32) -> String {
    let rate = if playback_rate.is_finite() && playback_rate > 0.0 {
        playback_rate
    } else {
        1.0
    };
    let speed = BASE_SPEED * rate;
    let pitch = BASE_PITCH * rate;
    format!(
        r#"
~gate: speed {speed:.3} >> seq 60 _60 _~a 48
~a: choose 48 48 48 72 0 0 0
~amp: ~gate >> envperc 0.001 0.1
~pit: ~gate >> mul {pitch:.3}
~lead: saw ~pit >> mul ~amp >> lpf ~mod 5.0 >> mul 0.1
~mod: sin 0.2 >> mul 1300 >> add 1500
~kick: speed {speed:.3} >> seq 60 _ 60 _ >> bd 0.2 >> mul 0.6
o: mix ~lead ~kick >> plate 0.1
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_rate_halves_tempo_and_pitch() {
        let normal = composition(1.0);
        let slow = composition(0.5);
        assert!(normal.contains("speed 2.000"));
        assert!(slow.contains("speed 1.000"));
        assert!(slow.contains("mul 130.815"));
    }

    #[test]
    fn test_invalid_rate_falls_back_to_normal() {
        assert_eq!(composition(0.0), composition(1.0));
        assert_eq!(composition(f32::NAN), composition(1.0));
    }
}
