//! Primitive generators: sine tones, white noise and rests.
use log::trace;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, SignalError};
use crate::freq::Frequency;
use crate::signal::{Oscillator, Signal, Synthesized};
use crate::synth::{pi2, samples_of_dur, SampleBuffer};

pub(crate) fn check_duration(duration: f64) -> Result<()> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(SignalError::InvalidDuration(format!("{}s, values of 0 or greater are permitted", duration)));
    }
    Ok(())
}

pub(crate) fn check_amplitude(amplitude: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&amplitude) {
        return Err(SignalError::InvalidAmplitude(amplitude));
    }
    Ok(())
}

/// `n` samples of `amplitude * sin(2 pi f i / sr + phase)`.
pub(crate) fn sine_samples(hertz: f64, amplitude: f32, phase: f64, n: usize, sample_rate: u32) -> SampleBuffer {
    let step = pi2 * hertz / sample_rate as f64;
    (0..n)
        .map(|i| (amplitude as f64 * (step * i as f64 + phase).sin()) as f32)
        .collect()
}

/// Sine samples from an accumulated phase whose advance at sample `i` is scaled by `rate(i)`.
pub(crate) fn sine_samples_with_rate(
    hertz: f64,
    amplitude: f32,
    phase: f64,
    n: usize,
    sample_rate: u32,
    rate: &dyn Fn(usize) -> f64,
) -> SampleBuffer {
    let step = pi2 * hertz / sample_rate as f64;
    let mut theta = phase;
    let mut samples = Vec::with_capacity(n);
    for i in 0..n {
        samples.push((amplitude as f64 * theta.sin()) as f32);
        theta = (theta + step * rate(i)).rem_euclid(pi2);
    }
    samples
}

/// A sine tone.
///
/// Every independently built `Sine` starts at its own phase offset (0 unless
/// given). To continue a tone without a discontinuity, start the next one at
/// [`Sine::end_phase`].
#[derive(Debug, Clone)]
pub struct Sine {
    frequency: Frequency,
    amplitude: f32,
    phase: f64,
    signal: Signal,
}

impl Sine {
    pub fn new(frequency: Frequency, duration: f64, amplitude: f32, sample_rate: u32) -> Result<Sine> {
        Sine::with_phase(frequency, duration, amplitude, 0.0, sample_rate)
    }

    /// A sine tone starting at `phase` radians.
    pub fn with_phase(frequency: Frequency, duration: f64, amplitude: f32, phase: f64, sample_rate: u32) -> Result<Sine> {
        check_duration(duration)?;
        check_amplitude(amplitude)?;
        if !phase.is_finite() {
            return Err(SignalError::InvalidParameter { name: "phase", value: phase });
        }
        let n = samples_of_dur(duration, sample_rate);
        let signal = Signal::mono(sine_samples(frequency.hertz(), amplitude, phase, n, sample_rate), sample_rate)?;
        trace!("sine {} for {} samples", frequency, n);
        Ok(Sine {
            frequency,
            amplitude,
            phase,
            signal,
        })
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Phase in `[0, 2 pi)` of the sample that would follow the last one.
    pub fn end_phase(&self) -> f64 {
        let cycles = self.frequency.hertz() * self.signal.len() as f64 / self.signal.sample_rate() as f64;
        (self.phase + pi2 * cycles.fract()).rem_euclid(pi2)
    }
}

impl Synthesized for Sine {
    fn signal(&self) -> &Signal {
        &self.signal
    }
}

impl Oscillator for Sine {
    fn render_with_rate(&self, len: usize, rate: &dyn Fn(usize) -> f64) -> Result<Signal> {
        let sample_rate = self.signal.sample_rate();
        let samples = sine_samples_with_rate(self.frequency.hertz(), self.amplitude, self.phase, len, sample_rate, rate);
        Signal::mono(samples, sample_rate)
    }
}

/// White noise drawn uniformly from `[-amplitude, amplitude]`.
#[derive(Debug, Clone)]
pub struct Noise {
    amplitude: f32,
    signal: Signal,
}

fn white<R: Rng>(rng: &mut R, n: usize, amplitude: f32) -> SampleBuffer {
    (0..n).map(|_| rng.gen_range(-amplitude..=amplitude)).collect()
}

impl Noise {
    pub fn new(duration: f64, amplitude: f32, sample_rate: u32) -> Result<Noise> {
        Noise::from_rng(&mut rand::thread_rng(), duration, amplitude, sample_rate)
    }

    /// Reproducible noise for a given seed.
    pub fn seeded(duration: f64, amplitude: f32, sample_rate: u32, seed: u64) -> Result<Noise> {
        Noise::from_rng(&mut StdRng::seed_from_u64(seed), duration, amplitude, sample_rate)
    }

    fn from_rng<R: Rng>(rng: &mut R, duration: f64, amplitude: f32, sample_rate: u32) -> Result<Noise> {
        check_duration(duration)?;
        check_amplitude(amplitude)?;
        let n = samples_of_dur(duration, sample_rate);
        let signal = Signal::mono(white(rng, n, amplitude), sample_rate)?;
        Ok(Noise { amplitude, signal })
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }
}

impl Synthesized for Noise {
    fn signal(&self) -> &Signal {
        &self.signal
    }
}

/// Silence.
#[derive(Debug, Clone)]
pub struct Rest {
    signal: Signal,
}

impl Rest {
    pub fn new(duration: f64, sample_rate: u32) -> Result<Rest> {
        check_duration(duration)?;
        let signal = Signal::mono(vec![0.0; samples_of_dur(duration, sample_rate)], sample_rate)?;
        Ok(Rest { signal })
    }
}

impl Synthesized for Rest {
    fn signal(&self) -> &Signal {
        &self.signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hz(hertz: f64) -> Frequency {
        Frequency::new(hertz).unwrap()
    }

    #[test]
    fn test_sine_quarter_points() {
        let sine = Sine::new(hz(1.0), 1.0, 1.0, 8).unwrap();
        let expected = [0.0, 0.70710677, 1.0, 0.70710677, 0.0, -0.70710677, -1.0, -0.70710677];
        assert_eq!(sine.signal().len(), 8);
        for (actual, expected) in sine.signal().samples().iter().zip(expected) {
            assert!((actual - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sine_length_and_amplitude() {
        let sine = Sine::new(hz(440.0), 0.5, 0.25, 44100).unwrap();
        assert_eq!(sine.signal().len(), 22050);
        assert!(sine.signal().peak() <= 0.25);
        assert!(sine.signal().peak() > 0.249);
        assert_eq!(sine.signal().samples()[0], 0.0);
    }

    #[test]
    fn test_sine_rejects_bad_arguments() {
        assert!(matches!(Sine::new(hz(440.0), -1.0, 0.5, 44100), Err(SignalError::InvalidDuration(_))));
        assert!(matches!(Sine::new(hz(440.0), 1.0, 1.5, 44100), Err(SignalError::InvalidAmplitude(_))));
        assert!(matches!(Sine::new(hz(440.0), 1.0, 0.5, 0), Err(SignalError::InvalidSampleRate(0))));
    }

    #[test]
    fn test_sine_phase_offset() {
        let sine = Sine::with_phase(hz(1.0), 1.0, 1.0, std::f64::consts::FRAC_PI_2, 4).unwrap();
        assert!((sine.signal().samples()[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_end_phase_continues_tone() {
        let sr = 44100;
        let whole = Sine::new(hz(330.0), 0.2, 1.0, sr).unwrap();
        let head = Sine::new(hz(330.0), 0.1, 1.0, sr).unwrap();
        let tail = Sine::with_phase(hz(330.0), 0.1, 1.0, head.end_phase(), sr).unwrap();
        let joined: Vec<f32> = head.signal().samples().iter().chain(tail.signal().samples()).copied().collect();
        for (a, b) in whole.signal().samples().iter().zip(joined.iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_unit_rate_matches_plain_rendering() {
        let sine = Sine::new(hz(261.63), 0.05, 0.8, 44100).unwrap();
        let again = sine.render_with_rate(sine.signal().len(), &|_| 1.0).unwrap();
        for (a, b) in sine.signal().samples().iter().zip(again.samples()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_noise_is_bounded() {
        let noise = Noise::new(0.1, 0.3, 44100).unwrap();
        assert_eq!(noise.signal().len(), 4410);
        assert!(noise.signal().samples().iter().all(|s| s.abs() <= 0.3));
        assert!(noise.signal().peak() > 0.0);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let a = Noise::seeded(0.01, 1.0, 44100, 7).unwrap();
        let b = Noise::seeded(0.01, 1.0, 44100, 7).unwrap();
        let c = Noise::seeded(0.01, 1.0, 44100, 8).unwrap();
        assert_eq!(a.signal(), b.signal());
        assert_ne!(a.signal(), c.signal());
    }

    #[test]
    fn test_noise_mean_is_near_zero() {
        let noise = Noise::seeded(1.0, 1.0, 44100, 1).unwrap();
        let mean: f32 = noise.signal().samples().iter().sum::<f32>() / noise.signal().len() as f32;
        assert!(mean.abs() < 0.02);
    }

    #[test]
    fn test_rest_is_silent() {
        let rest = Rest::new(1.0, 44100).unwrap();
        assert_eq!(rest.signal().len(), 44100);
        assert!(rest.signal().samples().iter().all(|&s| s == 0.0));
        assert!(Rest::new(-1.0, 44100).is_err());
    }
}
