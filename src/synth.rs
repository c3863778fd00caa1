//! Numeric settings shared by the generators.
//!
//! Offers the default sample rate and convenient aliases for the standard
//! constants at the precision the phase math runs in.
#![allow(non_upper_case_globals)]

pub const pi: f64 = std::f64::consts::PI;
pub const pi2: f64 = pi * 2f64;

/// Sample values nominally in -1 to 1
pub type SampleBuffer = Vec<f32>;

pub const SR: u32 = 44100;

/// Number of whole samples covering `seconds` at `sample_rate`.
#[inline]
pub fn samples_of_dur(seconds: f64, sample_rate: u32) -> usize {
    (seconds * sample_rate as f64).round().max(0.0) as usize
}

/// Peak absolute sample value.
#[inline]
pub fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().map(|&sample| sample.abs()).fold(0.0, f32::max)
}

pub fn amp_scale(buffer: &mut [f32], amp: f32) {
    buffer.iter_mut().for_each(|sample| *sample *= amp)
}
