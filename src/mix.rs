//! Sample-domain algebra over lists of signals.
//!
//! Every function borrows its inputs and returns fresh signals. Inputs must
//! share a sample rate. When mono and stereo inputs meet in [`mix`] or
//! [`concatenate`], the mono ones are copied into both channels.
use log::debug;

use crate::error::{Result, SignalError};
use crate::signal::{Channels, Signal};
use crate::synth::{samples_of_dur, SampleBuffer};

/// The shared sample rate of `signals`.
fn common_rate(signals: &[&Signal]) -> Result<u32> {
    let first = signals.first().ok_or(SignalError::NoSignals)?;
    let expected = first.sample_rate();
    match signals.iter().find(|s| s.sample_rate() != expected) {
        Some(other) => Err(SignalError::SampleRateMismatch {
            expected,
            found: other.sample_rate(),
        }),
        None => Ok(expected),
    }
}

fn any_stereo(signals: &[&Signal]) -> bool {
    signals.iter().any(|s| s.is_stereo())
}

fn padded(samples: &[f32], len: usize) -> SampleBuffer {
    let mut out = samples.to_vec();
    out.resize(len, 0.0);
    out
}

/// Pad every signal with trailing silence up to the longest one.
/// Channel layouts are kept as they are.
pub fn equalize_len(signals: &[&Signal]) -> Result<Vec<Signal>> {
    if signals.is_empty() {
        return Ok(Vec::new());
    }
    common_rate(signals)?;
    let longest = signals.iter().map(|s| s.len()).max().unwrap_or(0);
    Ok(signals
        .iter()
        .map(|s| s.map_channels(|samples| padded(samples, longest)))
        .collect())
}

/// Sum signals sample by sample after padding them to equal length.
///
/// The sum is not normalized and may exceed [-1, 1]; scale it with
/// [`Signal::gain`] or [`Signal::normalize`] when that matters.
pub fn mix(signals: &[&Signal]) -> Result<Signal> {
    let sample_rate = common_rate(signals)?;
    let longest = signals.iter().map(|s| s.len()).max().unwrap_or(0);

    let add = |acc: &mut SampleBuffer, samples: &[f32]| acc.iter_mut().zip(samples).for_each(|(a, s)| *a += s);

    if any_stereo(signals) {
        let mut left = vec![0.0; longest];
        let mut right = vec![0.0; longest];
        for signal in signals {
            add(&mut left, signal.samples());
            add(&mut right, signal.right().unwrap_or(signal.samples()));
        }
        Signal::stereo(left, right, sample_rate)
    } else {
        let mut sum = vec![0.0; longest];
        for signal in signals {
            add(&mut sum, signal.samples());
        }
        Signal::mono(sum, sample_rate)
    }
}

/// Place signals one after another.
pub fn concatenate(signals: &[&Signal]) -> Result<Signal> {
    let sample_rate = common_rate(signals)?;
    let total: usize = signals.iter().map(|s| s.len()).sum();

    if any_stereo(signals) {
        let mut left = Vec::with_capacity(total);
        let mut right = Vec::with_capacity(total);
        for signal in signals {
            left.extend_from_slice(signal.samples());
            right.extend_from_slice(signal.right().unwrap_or(signal.samples()));
        }
        Signal::stereo(left, right, sample_rate)
    } else {
        let mut joined = Vec::with_capacity(total);
        for signal in signals {
            joined.extend_from_slice(signal.samples());
        }
        Signal::mono(joined, sample_rate)
    }
}

/// `b` placed directly after `a`.
pub fn append(a: &Signal, b: &Signal) -> Result<Signal> {
    concatenate(&[a, b])
}

/// The signal played back to back `n` times.
pub fn repeat(signal: &Signal, n: usize) -> Signal {
    signal.repeat(n)
}

/// Echo effect: the dry signal mixed with `repeats` copies of itself, copy
/// `k` starting `k * delay_seconds` later and attenuated by `feedback^k`.
pub fn delay(signal: &Signal, delay_seconds: f64, feedback: f32, repeats: usize) -> Result<Signal> {
    if !delay_seconds.is_finite() || delay_seconds < 0.0 {
        return Err(SignalError::InvalidDuration(format!("delay of {}s", delay_seconds)));
    }
    if !(0.0..1.0).contains(&feedback) {
        return Err(SignalError::InvalidParameter {
            name: "feedback",
            value: feedback as f64,
        });
    }
    if repeats == 0 {
        return Err(SignalError::InvalidParameter {
            name: "repeats",
            value: 0.0,
        });
    }
    debug!("delay of {}s with {} repeats at feedback {}", delay_seconds, repeats, feedback);

    let echoes: Vec<Signal> = (1..=repeats)
        .map(|k| {
            let offset = samples_of_dur(k as f64 * delay_seconds, signal.sample_rate());
            let gain = feedback.powi(k as i32);
            signal.map_channels(|samples| {
                let mut echo = vec![0.0; offset];
                echo.extend(samples.iter().map(|s| s * gain));
                echo
            })
        })
        .collect();

    let mut layers: Vec<&Signal> = Vec::with_capacity(repeats + 1);
    layers.push(signal);
    layers.extend(echoes.iter());
    mix(&layers)
}

/// Split a signal's channels into separate mono signals.
pub fn split_channels(signal: &Signal) -> Result<Vec<Signal>> {
    match signal.channels() {
        Channels::Mono(samples) => Ok(vec![Signal::mono(samples.clone(), signal.sample_rate())?]),
        Channels::Stereo(left, right) => Ok(vec![
            Signal::mono(left.clone(), signal.sample_rate())?,
            Signal::mono(right.clone(), signal.sample_rate())?,
        ]),
    }
}
