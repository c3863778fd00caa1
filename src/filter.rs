//! Butterworth style filters built from cascaded biquad sections.
//!
//! Each filter runs over the signal forward and then backward, which cancels
//! the phase shift of the sections and squares their magnitude response.
//! Odd orders are rounded up to the next even order.
use biquad::{Biquad, Coefficients, DirectForm1, Hertz, Type as FilterType};
use log::debug;

use crate::error::{Result, SignalError};
use crate::signal::Signal;
use crate::synth::{pi, SampleBuffer};

const MAX_ORDER: usize = 16;

fn invalid(name: &'static str, value: f64) -> SignalError {
    SignalError::InvalidParameter { name, value }
}

fn check_order(order: usize) -> Result<usize> {
    if order == 0 || order > MAX_ORDER {
        return Err(invalid("filter order", order as f64));
    }
    Ok((order + 1) / 2)
}

fn check_cutoff(name: &'static str, hertz: f64, sample_rate: u32) -> Result<()> {
    if !hertz.is_finite() || hertz <= 0.0 || hertz >= sample_rate as f64 / 2.0 {
        return Err(invalid(name, hertz));
    }
    Ok(())
}

fn check_band(low_hz: f64, high_hz: f64, sample_rate: u32) -> Result<()> {
    check_cutoff("low cutoff", low_hz, sample_rate)?;
    check_cutoff("high cutoff", high_hz, sample_rate)?;
    if high_hz <= low_hz {
        return Err(invalid("high cutoff", high_hz));
    }
    Ok(())
}

/// Pole quality factors of an even-order Butterworth response, one per section.
fn butterworth_qs(sections: usize) -> Vec<f32> {
    let n = 2 * sections;
    (1..=sections)
        .map(|k| (1.0 / (2.0 * ((2 * k - 1) as f64 * pi / (2 * n) as f64).cos())) as f32)
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum Response {
    LowPass,
    HighPass,
    BandPass,
    Notch,
}

fn coefficients(response: Response, sample_rate: u32, f0: f64, q: f32) -> Result<Coefficients<f32>> {
    let kind = match response {
        Response::LowPass => FilterType::LowPass,
        Response::HighPass => FilterType::HighPass,
        Response::BandPass => FilterType::BandPass,
        Response::Notch => FilterType::Notch,
    };
    let fs = Hertz::<f32>::from_hz(sample_rate as f32).map_err(|_| SignalError::InvalidSampleRate(sample_rate))?;
    let f0 = Hertz::<f32>::from_hz(f0 as f32).map_err(|e| SignalError::Filter(format!("{:?}", e)))?;
    Coefficients::<f32>::from_params(kind, fs, f0, q).map_err(|e| SignalError::Filter(format!("{:?}", e)))
}

fn run_sections(samples: &[f32], sections: &[Coefficients<f32>]) -> SampleBuffer {
    sections.iter().fold(samples.to_vec(), |buffer, coeffs| {
        let mut section = DirectForm1::<f32>::new(*coeffs);
        buffer.iter().map(|&x| section.run(x)).collect()
    })
}

/// Forward pass, then a backward pass with fresh filter state.
fn zero_phase(samples: &[f32], sections: &[Coefficients<f32>]) -> SampleBuffer {
    let mut forward = run_sections(samples, sections);
    forward.reverse();
    let mut backward = run_sections(&forward, sections);
    backward.reverse();
    backward
}

fn apply(signal: &Signal, sections: Vec<Coefficients<f32>>) -> Signal {
    signal.map_channels(|samples| zero_phase(samples, &sections))
}

pub fn low_pass(signal: &Signal, cutoff_hz: f64, order: usize) -> Result<Signal> {
    let sections = check_order(order)?;
    check_cutoff("cutoff", cutoff_hz, signal.sample_rate())?;
    debug!("low pass at {} Hz, order {}", cutoff_hz, order);
    let coeffs = butterworth_qs(sections)
        .into_iter()
        .map(|q| coefficients(Response::LowPass, signal.sample_rate(), cutoff_hz, q))
        .collect::<Result<Vec<_>>>()?;
    Ok(apply(signal, coeffs))
}

pub fn high_pass(signal: &Signal, cutoff_hz: f64, order: usize) -> Result<Signal> {
    let sections = check_order(order)?;
    check_cutoff("cutoff", cutoff_hz, signal.sample_rate())?;
    debug!("high pass at {} Hz, order {}", cutoff_hz, order);
    let coeffs = butterworth_qs(sections)
        .into_iter()
        .map(|q| coefficients(Response::HighPass, signal.sample_rate(), cutoff_hz, q))
        .collect::<Result<Vec<_>>>()?;
    Ok(apply(signal, coeffs))
}

/// Center frequency and quality factor of the band `[low_hz, high_hz]`.
fn band(low_hz: f64, high_hz: f64) -> (f64, f32) {
    let center = (low_hz * high_hz).sqrt();
    (center, (center / (high_hz - low_hz)) as f32)
}

/// Keep the band between `low_hz` and `high_hz`.
pub fn band_pass(signal: &Signal, low_hz: f64, high_hz: f64, order: usize) -> Result<Signal> {
    let sections = check_order(order)?;
    check_band(low_hz, high_hz, signal.sample_rate())?;
    let (center, q) = band(low_hz, high_hz);
    debug!("band pass {}..{} Hz, order {}", low_hz, high_hz, order);
    let coeffs = (0..sections)
        .map(|_| coefficients(Response::BandPass, signal.sample_rate(), center, q))
        .collect::<Result<Vec<_>>>()?;
    Ok(apply(signal, coeffs))
}

/// Remove the band between `low_hz` and `high_hz`.
pub fn band_stop(signal: &Signal, low_hz: f64, high_hz: f64, order: usize) -> Result<Signal> {
    let sections = check_order(order)?;
    check_band(low_hz, high_hz, signal.sample_rate())?;
    let (center, q) = band(low_hz, high_hz);
    debug!("band stop {}..{} Hz, order {}", low_hz, high_hz, order);
    let coeffs = (0..sections)
        .map(|_| coefficients(Response::Notch, signal.sample_rate(), center, q))
        .collect::<Result<Vec<_>>>()?;
    Ok(apply(signal, coeffs))
}
