//! Attack, decay, sustain and release amplitude curves.
//!
//! Each stage is a straight line that includes both of its end points, so
//! the attack starts exactly at 0 and the release ends exactly at 0.
//! When the curve is laid over a signal shorter than the envelope, the
//! stages are consumed in order: attack and decay are honored first, and
//! sustain then release are cut short or dropped. Samples past the end of
//! the envelope are silenced.
use crate::error::{Result, SignalError};
use crate::signal::Signal;
use crate::synth::{samples_of_dur, SampleBuffer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    attack: f64,
    decay: f64,
    sustain: f64,
    release: f64,
    peak_level: f32,
    sustain_level: f32,
}

/// Value `j` of an `n` point line from `from` to `to`.
#[inline]
fn ramp(from: f32, to: f32, j: usize, n: usize) -> f32 {
    if n <= 1 {
        return from;
    }
    from + (to - from) * (j as f32 / (n - 1) as f32)
}

impl Envelope {
    /// Stage durations are in seconds. `peak_level` is expected to be at least
    /// `sustain_level`, but that is left to the caller.
    pub fn new(attack: f64, decay: f64, sustain: f64, release: f64, peak_level: f32, sustain_level: f32) -> Result<Envelope> {
        for (name, secs) in [("attack", attack), ("decay", decay), ("sustain", sustain), ("release", release)] {
            if !secs.is_finite() || secs < 0.0 {
                return Err(SignalError::InvalidEnvelope(format!("{} of {}s must be 0 or greater", name, secs)));
            }
        }
        for (name, level) in [("peak level", peak_level), ("sustain level", sustain_level)] {
            if !(0.0..=1.0).contains(&level) {
                return Err(SignalError::InvalidEnvelope(format!("{} of {} must be within [0, 1]", name, level)));
            }
        }
        Ok(Envelope {
            attack,
            decay,
            sustain,
            release,
            peak_level,
            sustain_level,
        })
    }

    /// Build from `(attack, decay, sustain, release, peak_level, sustain_level)`.
    pub fn from_adsr(adsr: (f64, f64, f64, f64, f32, f32)) -> Result<Envelope> {
        let (a, d, s, r, peak, sus) = adsr;
        Envelope::new(a, d, s, r, peak, sus)
    }

    pub fn adsr(&self) -> (f64, f64, f64, f64, f32, f32) {
        (self.attack, self.decay, self.sustain, self.release, self.peak_level, self.sustain_level)
    }

    /// Total length in seconds.
    pub fn duration(&self) -> f64 {
        self.attack + self.decay + self.sustain + self.release
    }

    pub fn peak_level(&self) -> f32 {
        self.peak_level
    }

    pub fn sustain_level(&self) -> f32 {
        self.sustain_level
    }

    /// Sample index at which each stage ends, rounded cumulatively so the
    /// stage lengths always add up to `len(sample_rate)`.
    pub fn stage_ends(&self, sample_rate: u32) -> [usize; 4] {
        let mut elapsed = 0.0;
        let mut ends = [0usize; 4];
        for (end, secs) in ends.iter_mut().zip([self.attack, self.decay, self.sustain, self.release]) {
            elapsed += secs;
            *end = samples_of_dur(elapsed, sample_rate);
        }
        ends
    }

    /// Number of samples the envelope spans.
    pub fn len(&self, sample_rate: u32) -> usize {
        self.stage_ends(sample_rate)[3]
    }

    pub fn is_empty(&self, sample_rate: u32) -> bool {
        self.len(sample_rate) == 0
    }

    /// Amplitude multiplier at sample `index`. Zero once the envelope has ended.
    pub fn level_at(&self, index: usize, sample_rate: u32) -> f32 {
        let ends = self.stage_ends(sample_rate);
        self.level_within(index, &ends)
    }

    fn level_within(&self, index: usize, ends: &[usize; 4]) -> f32 {
        let [attack_end, decay_end, sustain_end, release_end] = *ends;
        if index < attack_end {
            ramp(0.0, self.peak_level, index, attack_end)
        } else if index < decay_end {
            ramp(self.peak_level, self.sustain_level, index - attack_end, decay_end - attack_end)
        } else if index < sustain_end {
            self.sustain_level
        } else if index < release_end {
            ramp(self.sustain_level, 0.0, index - sustain_end, release_end - sustain_end)
        } else {
            0.0
        }
    }

    /// The full curve, one multiplier per sample.
    pub fn curve(&self, sample_rate: u32) -> SampleBuffer {
        let ends = self.stage_ends(sample_rate);
        (0..ends[3]).map(|i| self.level_within(i, &ends)).collect()
    }

    /// A new signal with every channel multiplied by the curve.
    pub fn apply(&self, signal: &Signal) -> Signal {
        let ends = self.stage_ends(signal.sample_rate());
        signal.map_channels(|samples| {
            samples
                .iter()
                .enumerate()
                .map(|(i, &sample)| sample * self.level_within(i, &ends))
                .collect()
        })
    }
}
