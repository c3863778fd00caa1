//! Additive synthesis of sawtooth, square and triangle timbres.
//!
//! A voice sums weighted sine partials on the harmonic series of its
//! fundamental, scales the sum down if its peak exceeds 1, then shapes it
//! with an envelope. The voice lasts exactly as long as its envelope.
//!
//! `harmonics` counts partials. The sawtooth uses harmonics `1..=harmonics`
//! with weights `1/k`, all in phase. The square uses the first `harmonics`
//! odd harmonics with weights `1/k`. The triangle uses the same odd harmonics
//! with weights `1/k^2` and alternating sign `+, -, +, ...`.
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::error::{Result, SignalError};
use crate::freq::Frequency;
use crate::gen::{sine_samples, sine_samples_with_rate};
use crate::signal::{Oscillator, Signal, Synthesized};
use crate::synth::{self, SampleBuffer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sawtooth,
    Square,
    Triangle,
}

impl Waveform {
    /// Distance between the harmonic numbers of neighbouring partials.
    pub fn step(self) -> usize {
        match self {
            Waveform::Sawtooth => 1,
            Waveform::Square | Waveform::Triangle => 2,
        }
    }

    /// Weight of the `i`th partial (counting from 0), whose harmonic number is `k`.
    pub fn weight(self, i: usize, k: usize) -> f32 {
        match self {
            Waveform::Sawtooth | Waveform::Square => 1.0 / k as f32,
            Waveform::Triangle => {
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                sign / (k * k) as f32
            }
        }
    }

    /// Frequencies and weights of the first `harmonics` partials.
    pub fn partials(self, fundamental: Frequency, harmonics: usize) -> Result<Vec<(Frequency, f32)>> {
        Ok(fundamental
            .spectrum_with_step(harmonics, self.step())?
            .into_iter()
            .enumerate()
            .map(|(i, f)| (f, self.weight(i, 1 + i * self.step())))
            .collect())
    }
}

fn sum_partials(partials: &[SampleBuffer], n: usize) -> SampleBuffer {
    partials.iter().fold(vec![0.0; n], |mut acc, partial| {
        acc.iter_mut().zip(partial).for_each(|(a, s)| *a += s);
        acc
    })
}

/// Gain that brings the peak of `buffer` down to 1, or 1 when it is already in range.
fn headroom(buffer: &[f32]) -> f32 {
    let peak = synth::peak(buffer);
    if peak > 1.0 {
        1.0 / peak
    } else {
        1.0
    }
}

/// A rendered additive voice.
#[derive(Debug, Clone)]
pub struct AdditiveWave {
    waveform: Waveform,
    frequency: Frequency,
    envelope: Envelope,
    harmonics: usize,
    scale: f32,
    signal: Signal,
}

impl AdditiveWave {
    pub fn new(waveform: Waveform, frequency: Frequency, envelope: Envelope, harmonics: usize, sample_rate: u32) -> Result<AdditiveWave> {
        if harmonics == 0 {
            return Err(SignalError::InvalidHarmonic(harmonics));
        }
        if sample_rate == 0 {
            return Err(SignalError::InvalidSampleRate(sample_rate));
        }
        let n = envelope.len(sample_rate);
        let partials = waveform.partials(frequency, harmonics)?;
        debug!("rendering {:?} at {} from {} partials, {} samples", waveform, frequency, harmonics, n);

        let rendered: Vec<SampleBuffer> = partials
            .par_iter()
            .map(|(f, weight)| {
                let mut partial = sine_samples(f.hertz(), 1.0, 0.0, n, sample_rate);
                synth::amp_scale(&mut partial, *weight);
                partial
            })
            .collect();

        let mut summed = sum_partials(&rendered, n);
        let scale = headroom(&summed);
        synth::amp_scale(&mut summed, scale);
        let signal = envelope.apply(&Signal::mono(summed, sample_rate)?);

        Ok(AdditiveWave {
            waveform,
            frequency,
            envelope,
            harmonics,
            scale,
            signal,
        })
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn harmonics(&self) -> usize {
        self.harmonics
    }
}

impl Synthesized for AdditiveWave {
    fn signal(&self) -> &Signal {
        &self.signal
    }
}

impl Oscillator for AdditiveWave {
    /// Each partial keeps its own phase accumulator scaled by the same rate,
    /// so the whole spectrum bends together. The normalization gain of the
    /// plain rendering is reused.
    fn render_with_rate(&self, len: usize, rate: &dyn Fn(usize) -> f64) -> Result<Signal> {
        let sample_rate = self.signal.sample_rate();
        let rendered: Vec<SampleBuffer> = self
            .waveform
            .partials(self.frequency, self.harmonics)?
            .iter()
            .map(|(f, weight)| {
                let mut partial = sine_samples_with_rate(f.hertz(), 1.0, 0.0, len, sample_rate, rate);
                synth::amp_scale(&mut partial, *weight);
                partial
            })
            .collect();
        let mut summed = sum_partials(&rendered, len);
        synth::amp_scale(&mut summed, self.scale);
        Ok(self.envelope.apply(&Signal::mono(summed, sample_rate)?))
    }
}

macro_rules! additive_voice {
    ($(#[$doc:meta])* $name:ident, $waveform:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name(AdditiveWave);

        impl $name {
            pub fn new(frequency: Frequency, envelope: Envelope, harmonics: usize, sample_rate: u32) -> Result<$name> {
                AdditiveWave::new($waveform, frequency, envelope, harmonics, sample_rate).map($name)
            }

            pub fn wave(&self) -> &AdditiveWave {
                &self.0
            }
        }

        impl Synthesized for $name {
            fn signal(&self) -> &Signal {
                self.0.signal()
            }
        }

        impl Oscillator for $name {
            fn render_with_rate(&self, len: usize, rate: &dyn Fn(usize) -> f64) -> Result<Signal> {
                self.0.render_with_rate(len, rate)
            }
        }
    };
}

additive_voice!(
    /// Every harmonic at `1/k`.
    Sawtooth,
    Waveform::Sawtooth
);
additive_voice!(
    /// Odd harmonics at `1/k`.
    Square,
    Waveform::Square
);
additive_voice!(
    /// Odd harmonics at `1/k^2`, alternating in sign.
    Triangle,
    Waveform::Triangle
);
