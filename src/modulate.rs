//! Amplitude and frequency modulation of a carrier by a modulator signal.
//!
//! The output is as long as the shorter of the two inputs. A stereo
//! modulator is mixed down to mono before use.
use log::debug;

use crate::error::{Result, SignalError};
use crate::signal::{Oscillator, Signal, Synthesized};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModulationMode {
    /// `carrier[i] * (1 + depth * modulator[i])`
    Amplitude,
    /// Phase advance of the carrier scaled by `1 + depth * modulator[i]`.
    Frequency,
}

/// What gets modulated.
///
/// Rendered samples can only be amplitude modulated. Frequency modulation
/// re-runs the carrier's phase function, so it needs an [`Oscillator`].
#[derive(Clone, Copy)]
pub enum Carrier<'a> {
    Samples(&'a Signal),
    Oscillator(&'a dyn Oscillator),
}

impl<'a> Carrier<'a> {
    fn signal(&self) -> &'a Signal {
        match *self {
            Carrier::Samples(signal) => signal,
            Carrier::Oscillator(osc) => osc.signal(),
        }
    }
}

/// Borrows a carrier and a modulator and combines them on [`Modulator::render`].
pub struct Modulator<'a> {
    carrier: Carrier<'a>,
    modulator: &'a Signal,
    mode: ModulationMode,
    depth: f32,
}

impl<'a> Modulator<'a> {
    pub fn new(carrier: Carrier<'a>, modulator: &'a Signal, mode: ModulationMode, depth: f32) -> Result<Modulator<'a>> {
        let expected = carrier.signal().sample_rate();
        if modulator.sample_rate() != expected {
            return Err(SignalError::SampleRateMismatch {
                expected,
                found: modulator.sample_rate(),
            });
        }
        if !(0.0..=1.0).contains(&depth) {
            return Err(SignalError::InvalidParameter {
                name: "modulation depth",
                value: depth as f64,
            });
        }
        if let (ModulationMode::Frequency, Carrier::Samples(_)) = (mode, carrier) {
            return Err(SignalError::UnsupportedModulation);
        }
        Ok(Modulator {
            carrier,
            modulator,
            mode,
            depth,
        })
    }

    /// Amplitude modulation of any signal.
    pub fn amplitude(carrier: &'a Signal, modulator: &'a Signal, depth: f32) -> Result<Modulator<'a>> {
        Modulator::new(Carrier::Samples(carrier), modulator, ModulationMode::Amplitude, depth)
    }

    /// Frequency modulation of an oscillator.
    pub fn frequency(carrier: &'a dyn Oscillator, modulator: &'a Signal, depth: f32) -> Result<Modulator<'a>> {
        Modulator::new(Carrier::Oscillator(carrier), modulator, ModulationMode::Frequency, depth)
    }

    pub fn mode(&self) -> ModulationMode {
        self.mode
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    /// Length of the rendered output in samples.
    pub fn len(&self) -> usize {
        self.carrier.signal().len().min(self.modulator.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn render(&self) -> Result<Signal> {
        let len = self.len();
        let modulator = self.modulator.to_mono();
        let m = &modulator.samples()[..len];
        debug!("{:?} modulation at depth {} over {} samples", self.mode, self.depth, len);

        match (self.mode, self.carrier) {
            (ModulationMode::Amplitude, carrier) => Ok(carrier.signal().map_channels(|samples| {
                samples[..len]
                    .iter()
                    .zip(m)
                    .map(|(c, m)| c * (1.0 + self.depth * m))
                    .collect()
            })),
            (ModulationMode::Frequency, Carrier::Oscillator(osc)) => {
                let depth = self.depth as f64;
                osc.render_with_rate(len, &|i| 1.0 + depth * m[i] as f64)
            }
            (ModulationMode::Frequency, Carrier::Samples(_)) => Err(SignalError::UnsupportedModulation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freq::Frequency;
    use crate::gen::{Rest, Sine};

    fn mono(samples: Vec<f32>) -> Signal {
        Signal::mono(samples, 10).unwrap()
    }

    #[test]
    fn test_amplitude_modulation_formula() {
        let carrier = mono(vec![1.0, 0.5, -0.5, 1.0]);
        let modulator = mono(vec![0.0, 1.0, -1.0, 0.5]);
        let out = Modulator::amplitude(&carrier, &modulator, 0.5).unwrap().render().unwrap();
        assert_eq!(out.samples(), &[1.0, 0.75, -0.25, 1.25]);
    }

    #[test]
    fn test_output_takes_shorter_length() {
        let carrier = mono(vec![1.0; 6]);
        let modulator = mono(vec![0.0; 4]);
        let out = Modulator::amplitude(&carrier, &modulator, 1.0).unwrap().render().unwrap();
        assert_eq!(out.len(), 4);

        let out = Modulator::amplitude(&modulator, &carrier, 1.0).unwrap().render().unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn test_stereo_carrier_keeps_both_channels() {
        let carrier = Signal::stereo(vec![1.0, 1.0], vec![-1.0, -1.0], 10).unwrap();
        let modulator = mono(vec![1.0, -1.0]);
        let out = Modulator::amplitude(&carrier, &modulator, 1.0).unwrap().render().unwrap();
        assert_eq!(out.samples(), &[2.0, 0.0]);
        assert_eq!(out.right(), Some(&[-2.0, 0.0][..]));
    }

    #[test]
    fn test_rejects_mismatched_rates() {
        let carrier = Signal::mono(vec![0.0; 4], 10).unwrap();
        let modulator = Signal::mono(vec![0.0; 4], 20).unwrap();
        assert!(matches!(
            Modulator::amplitude(&carrier, &modulator, 0.5),
            Err(SignalError::SampleRateMismatch { expected: 10, found: 20 })
        ));
    }

    #[test]
    fn test_rejects_depth_out_of_range() {
        let carrier = mono(vec![0.0; 4]);
        assert!(matches!(
            Modulator::amplitude(&carrier, &carrier, 1.5),
            Err(SignalError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_frequency_mode_needs_an_oscillator() {
        let carrier = mono(vec![0.0; 4]);
        let result = Modulator::new(Carrier::Samples(&carrier), &carrier, ModulationMode::Frequency, 0.5);
        assert!(matches!(result, Err(SignalError::UnsupportedModulation)));
    }

    #[test]
    fn test_silent_modulator_leaves_fm_carrier_unchanged() {
        let sine = Sine::new(Frequency::new(440.0).unwrap(), 0.1, 1.0, 44100).unwrap();
        let silence = Rest::new(0.1, 44100).unwrap();
        let out = Modulator::frequency(&sine, silence.signal(), 1.0).unwrap().render().unwrap();
        for (a, b) in sine.signal().samples().iter().zip(out.samples()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_fm_with_constant_offset_shifts_pitch() {
        // a constant modulator of 1 at depth 1 doubles the instantaneous frequency
        let sr = 44100;
        let sine = Sine::new(Frequency::new(200.0).unwrap(), 0.1, 1.0, sr).unwrap();
        let octave = Sine::new(Frequency::new(400.0).unwrap(), 0.1, 1.0, sr).unwrap();
        let constant = Signal::mono(vec![1.0; sine.signal().len()], sr).unwrap();
        let out = Modulator::frequency(&sine, &constant, 1.0).unwrap().render().unwrap();
        for (a, b) in octave.signal().samples().iter().zip(out.samples()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_fm_differs_from_carrier_under_vibrato() {
        let sr = 44100;
        let sine = Sine::new(Frequency::new(440.0).unwrap(), 0.2, 1.0, sr).unwrap();
        let lfo = Sine::new(Frequency::new(6.0).unwrap(), 0.2, 1.0, sr).unwrap();
        let out = Modulator::frequency(&sine, lfo.signal(), 0.05).unwrap().render().unwrap();
        assert_eq!(out.len(), sine.signal().len());
        assert!(out.peak() <= 1.0);
        let max_diff = sine
            .signal()
            .samples()
            .iter()
            .zip(out.samples())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max);
        assert!(max_diff > 0.1);
    }
}
