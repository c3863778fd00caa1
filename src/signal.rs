//! Rendered sample buffers and the operations every synthesized voice shares.
use std::path::Path;

use itertools::Itertools;
use log::trace;

use crate::error::{Result, SignalError};
use crate::render::{self, AudioOutput};
use crate::synth::{self, samples_of_dur, SampleBuffer};
use crate::synth_config::SynthConfig;

/// Sample data of one signal. Stereo channels always have equal length.
#[derive(Debug, Clone, PartialEq)]
pub enum Channels {
    Mono(SampleBuffer),
    Stereo(SampleBuffer, SampleBuffer),
}

/// A finite buffer of samples tagged with its sample rate.
///
/// Operations never mutate the receiver; shortening, splitting or scaling
/// always produce fresh buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    channels: Channels,
    sample_rate: u32,
}

fn check_rate(sample_rate: u32) -> Result<()> {
    if sample_rate == 0 {
        return Err(SignalError::InvalidSampleRate(sample_rate));
    }
    Ok(())
}

impl Signal {
    pub fn mono(samples: SampleBuffer, sample_rate: u32) -> Result<Signal> {
        check_rate(sample_rate)?;
        Ok(Signal {
            channels: Channels::Mono(samples),
            sample_rate,
        })
    }

    pub fn stereo(left: SampleBuffer, right: SampleBuffer, sample_rate: u32) -> Result<Signal> {
        check_rate(sample_rate)?;
        if left.len() != right.len() {
            return Err(SignalError::ChannelMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        Ok(Signal {
            channels: Channels::Stereo(left, right),
            sample_rate,
        })
    }

    pub fn from_channels(channels: Channels, sample_rate: u32) -> Result<Signal> {
        match channels {
            Channels::Mono(samples) => Signal::mono(samples, sample_rate),
            Channels::Stereo(left, right) => Signal::stereo(left, right, sample_rate),
        }
    }

    /// Split frame-interleaved samples (`L R L R ...` for stereo) into channels.
    pub fn from_interleaved(samples: &[f32], channel_count: u16, sample_rate: u32) -> Result<Signal> {
        match channel_count {
            1 => Signal::mono(samples.to_vec(), sample_rate),
            2 => {
                if samples.len() % 2 != 0 {
                    return Err(SignalError::ChannelMismatch {
                        left: samples.len() / 2 + 1,
                        right: samples.len() / 2,
                    });
                }
                let (left, right): (SampleBuffer, SampleBuffer) = samples.iter().tuples::<(_, _)>().map(|(l, r)| (*l, *r)).unzip();
                Signal::stereo(left, right, sample_rate)
            }
            n => Err(SignalError::UnsupportedChannels(n)),
        }
    }

    /// `len` samples of silence with `channel_count` channels.
    pub fn silence(len: usize, channel_count: u16, sample_rate: u32) -> Result<Signal> {
        match channel_count {
            1 => Signal::mono(vec![0.0; len], sample_rate),
            2 => Signal::stereo(vec![0.0; len], vec![0.0; len], sample_rate),
            n => Err(SignalError::UnsupportedChannels(n)),
        }
    }

    pub fn channels(&self) -> &Channels {
        &self.channels
    }

    pub fn into_channels(self) -> Channels {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        match self.channels {
            Channels::Mono(_) => 1,
            Channels::Stereo(_, _) => 2,
        }
    }

    pub fn is_stereo(&self) -> bool {
        self.channel_count() == 2
    }

    /// Length in samples per channel.
    pub fn len(&self) -> usize {
        self.samples().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// The mono samples, or the left channel of a stereo signal.
    pub fn samples(&self) -> &[f32] {
        match &self.channels {
            Channels::Mono(samples) => samples,
            Channels::Stereo(left, _) => left,
        }
    }

    pub fn right(&self) -> Option<&[f32]> {
        match &self.channels {
            Channels::Mono(_) => None,
            Channels::Stereo(_, right) => Some(right),
        }
    }

    /// Samples in frame order, `L R L R ...` for stereo.
    pub fn to_interleaved(&self) -> SampleBuffer {
        match &self.channels {
            Channels::Mono(samples) => samples.clone(),
            Channels::Stereo(left, right) => left.iter().interleave(right.iter()).copied().collect(),
        }
    }

    /// Apply `f` to every channel. `f` must preserve length.
    pub fn map_channels<F>(&self, f: F) -> Signal
    where
        F: Fn(&[f32]) -> SampleBuffer,
    {
        let channels = match &self.channels {
            Channels::Mono(samples) => Channels::Mono(f(samples)),
            Channels::Stereo(left, right) => Channels::Stereo(f(left), f(right)),
        };
        Signal {
            channels,
            sample_rate: self.sample_rate,
        }
    }

    fn slice(&self, start: usize, end: usize) -> Signal {
        self.map_channels(|samples| samples[start..end].to_vec())
    }

    /// Average the channels into one.
    pub fn to_mono(&self) -> Signal {
        let samples = match &self.channels {
            Channels::Mono(samples) => samples.clone(),
            Channels::Stereo(left, right) => left.iter().zip(right).map(|(l, r)| 0.5 * (l + r)).collect(),
        };
        Signal {
            channels: Channels::Mono(samples),
            sample_rate: self.sample_rate,
        }
    }

    /// Copy a mono signal into both channels. Stereo signals are returned as is.
    pub fn to_stereo(&self) -> Signal {
        let channels = match &self.channels {
            Channels::Mono(samples) => Channels::Stereo(samples.clone(), samples.clone()),
            stereo => stereo.clone(),
        };
        Signal {
            channels,
            sample_rate: self.sample_rate,
        }
    }

    fn check_seconds(&self, seconds: f64) -> Result<usize> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(SignalError::InvalidDuration(format!("{}s is not a length of time", seconds)));
        }
        let n = samples_of_dur(seconds, self.sample_rate);
        if n > self.len() {
            return Err(SignalError::InvalidDuration(format!(
                "{}s exceeds the signal duration of {}s",
                seconds,
                self.duration()
            )));
        }
        Ok(n)
    }

    /// Remove `seconds` worth of samples from the start, or from the end when `from_end` is set.
    pub fn trim(&self, seconds: f64, from_end: bool) -> Result<Signal> {
        let n = self.check_seconds(seconds)?;
        if from_end {
            Ok(self.slice(0, self.len() - n))
        } else {
            Ok(self.slice(n, self.len()))
        }
    }

    /// Keep only the samples between `start` and `end` seconds.
    pub fn trim_range(&self, start: f64, end: f64) -> Result<Signal> {
        let from = self.check_seconds(start)?;
        let to = self.check_seconds(end)?;
        if to < from {
            return Err(SignalError::InvalidDuration(format!("range {}s..{}s ends before it starts", start, end)));
        }
        Ok(self.slice(from, to))
    }

    /// Cut the signal at each point in seconds, returning `points.len() + 1` pieces.
    ///
    /// Points must be strictly increasing and within `[0, duration]`.
    pub fn split(&self, points: &[f64]) -> Result<Vec<Signal>> {
        let duration = self.duration();
        let invalid = |point: f64| SignalError::InvalidSplitPoint { point, duration };

        if let Some((_, &later)) = points.iter().tuple_windows().find(|(a, b)| b <= a) {
            return Err(invalid(later));
        }

        let mut cuts = Vec::with_capacity(points.len() + 2);
        cuts.push(0);
        for &point in points {
            if !point.is_finite() || point < 0.0 {
                return Err(invalid(point));
            }
            let cut = samples_of_dur(point, self.sample_rate);
            if cut > self.len() {
                return Err(invalid(point));
            }
            cuts.push(cut);
        }
        cuts.push(self.len());

        trace!("splitting {} samples at {:?}", self.len(), &cuts[1..cuts.len() - 1]);
        Ok(cuts.iter().tuple_windows().map(|(&a, &b)| self.slice(a, b)).collect())
    }

    /// Drop leading and trailing frames in which every channel is exactly zero.
    pub fn strip_silence(&self) -> Signal {
        let audible = |i: usize| match &self.channels {
            Channels::Mono(samples) => samples[i] != 0.0,
            Channels::Stereo(left, right) => left[i] != 0.0 || right[i] != 0.0,
        };
        match (0..self.len()).find(|&i| audible(i)) {
            Some(first) => {
                let last = (0..self.len()).rev().find(|&i| audible(i)).unwrap_or(first);
                self.slice(first, last + 1)
            }
            None => self.slice(0, 0),
        }
    }

    /// The signal played back to back `n` times.
    pub fn repeat(&self, n: usize) -> Signal {
        self.map_channels(|samples| samples.repeat(n))
    }

    pub fn gain(&self, amp: f32) -> Signal {
        self.map_channels(|samples| {
            let mut out = samples.to_vec();
            synth::amp_scale(&mut out, amp);
            out
        })
    }

    /// Largest absolute sample across all channels.
    pub fn peak(&self) -> f32 {
        match &self.channels {
            Channels::Mono(samples) => synth::peak(samples),
            Channels::Stereo(left, right) => synth::peak(left).max(synth::peak(right)),
        }
    }

    /// Scale so the peak is exactly 1. Silence is returned unchanged.
    pub fn normalize(&self) -> Signal {
        let peak = self.peak();
        if peak == 0.0 {
            return self.clone();
        }
        self.gain(1.0 / peak)
    }
}

/// Capabilities shared by every synthesizable voice.
///
/// Generators and composites own a rendered [`Signal`] and forward the
/// shared operations to it.
pub trait Synthesized {
    fn signal(&self) -> &Signal;

    fn sample_rate(&self) -> u32 {
        self.signal().sample_rate()
    }

    fn duration(&self) -> f64 {
        self.signal().duration()
    }

    fn trim(&self, seconds: f64, from_end: bool) -> Result<Signal> {
        self.signal().trim(seconds, from_end)
    }

    fn split(&self, points: &[f64]) -> Result<Vec<Signal>> {
        self.signal().split(points)
    }

    /// Hand the buffer to an audio output.
    fn play(&self, output: &mut dyn AudioOutput) -> Result<()> {
        output.play(self.signal())
    }

    /// Write a WAV file with the default export settings.
    fn write_wav(&self, path: &Path) -> Result<()> {
        render::write_wav(self.signal(), path, &SynthConfig::default())
    }

    fn write_wav_with(&self, path: &Path, config: &SynthConfig) -> Result<()> {
        render::write_wav(self.signal(), path, config)
    }
}

impl Synthesized for Signal {
    fn signal(&self) -> &Signal {
        self
    }
}

/// A generator that can re-render itself from its phase function.
///
/// Rendered samples alone cannot be frequency modulated; oscillators expose
/// their phase generation so the instantaneous frequency can vary per sample.
pub trait Oscillator: Synthesized {
    /// Render `len` samples where the phase advance at sample `i` is the
    /// nominal advance scaled by `rate(i)`. A constant rate of 1 reproduces
    /// the plain rendering.
    fn render_with_rate(&self, len: usize, rate: &dyn Fn(usize) -> f64) -> Result<Signal>;
}
