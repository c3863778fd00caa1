//! Pitch representation in hertz.
//!
//! Notes map onto twelve-tone equal temperament with the semitone index
//! `n = 12 * octave + pitch_class + accidental`, counting C0 as 0.
//! That places A4 at index 57, the 440 Hz reference.
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SignalError};

pub const A4_HZ: f64 = 440.0;
pub const A4_INDEX: i32 = 57;

/// Semitones above C within one octave, for the natural notes.
fn pitch_class(letter: char) -> Option<i32> {
    match letter.to_ascii_lowercase() {
        'c' => Some(0),
        'd' => Some(2),
        'e' => Some(4),
        'f' => Some(5),
        'g' => Some(7),
        'a' => Some(9),
        'b' => Some(11),
        _ => None,
    }
}

/// Frequency value in hertz. Always strictly positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Frequency {
    hertz: f64,
}

impl Frequency {
    pub fn new(hertz: f64) -> Result<Frequency> {
        if !hertz.is_finite() || hertz <= 0.0 {
            return Err(SignalError::InvalidFrequency(hertz));
        }
        Ok(Frequency { hertz })
    }

    /// Parse a note name such as `"A4"`, `"c#3"` or `"Bb0"`.
    pub fn from_pitch(pitch: &str) -> Result<Frequency> {
        let invalid = || SignalError::InvalidPitchString(pitch.to_string());
        let chars: Vec<char> = pitch.chars().collect();
        if chars.len() < 2 || chars.len() > 3 {
            return Err(invalid());
        }

        let class = pitch_class(chars[0]).ok_or_else(invalid)?;
        let accidental = match chars.len() {
            3 => match chars[1] {
                '#' => 1,
                'b' => -1,
                _ => return Err(invalid()),
            },
            _ => 0,
        };
        let octave = chars[chars.len() - 1].to_digit(10).ok_or_else(invalid)? as i32;

        Frequency::from_semitone_index(12 * octave + class + accidental)
    }

    /// Equal-tempered frequency of the absolute semitone index `n`.
    pub fn from_semitone_index(n: i32) -> Result<Frequency> {
        Frequency::new(A4_HZ * 2f64.powf((n as f64 - A4_INDEX as f64) / 12.0))
    }

    pub fn hertz(&self) -> f64 {
        self.hertz
    }

    /// A new frequency `semitones` away from this one.
    pub fn transpose(&self, semitones: i32) -> Result<Frequency> {
        self.transpose_by_interval(semitones, 1, 12)
    }

    /// Move by `n_intervals * interval_class` steps of an octave divided into
    /// `octave_div` equal parts. A zero `octave_div` leaves the pitch unchanged.
    /// Fails when the result underflows to 0 Hz or overflows to infinity.
    pub fn transpose_by_interval(&self, n_intervals: i32, interval_class: i32, octave_div: u32) -> Result<Frequency> {
        if octave_div == 0 {
            return Ok(*self);
        }
        let steps = n_intervals as f64 * interval_class as f64;
        Frequency::new(self.hertz * 2f64.powf(steps / octave_div as f64))
    }

    /// The `k`th harmonic, where the fundamental is the first.
    pub fn harmonic(&self, k: usize) -> Result<Frequency> {
        if k == 0 {
            return Err(SignalError::InvalidHarmonic(k));
        }
        Frequency::new(self.hertz * k as f64)
    }

    /// Harmonics 1 through `n` in ascending order.
    pub fn spectrum(&self, n: usize) -> Result<Vec<Frequency>> {
        self.spectrum_with_step(n, 1)
    }

    /// `n` partials at multiples `1, 1 + step, 1 + 2 * step, ...` of the fundamental.
    /// A step of 2 yields the odd harmonics.
    pub fn spectrum_with_step(&self, n: usize, step: usize) -> Result<Vec<Frequency>> {
        (0..n)
            .map(|i| Frequency::new(self.hertz * (1.0 + i as f64 * step as f64)))
            .collect()
    }
}

impl FromStr for Frequency {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Frequency> {
        Frequency::from_pitch(s)
    }
}

impl TryFrom<f64> for Frequency {
    type Error = SignalError;

    fn try_from(hertz: f64) -> Result<Frequency> {
        Frequency::new(hertz)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} Hz", self.hertz)
    }
}
