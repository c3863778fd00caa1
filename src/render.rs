//! Getting samples out of the process: WAV files and audio devices.
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use hound::{SampleFormat, WavSpec, WavWriter};
use log::{trace, warn};

use crate::error::{Result, SignalError};
use crate::signal::Signal;
use crate::synth_config::{BitDepth, SynthConfig};

/// Something that can play a rendered signal.
pub trait AudioOutput {
    fn play(&mut self, signal: &Signal) -> Result<()>;
}

fn wav_spec(signal: &Signal, bit_depth: BitDepth) -> WavSpec {
    let (bits_per_sample, sample_format) = match bit_depth {
        BitDepth::Int16 => (16, SampleFormat::Int),
        BitDepth::Float32 => (32, SampleFormat::Float),
    };
    WavSpec {
        channels: signal.channel_count(),
        sample_rate: signal.sample_rate(),
        bits_per_sample,
        sample_format,
    }
}

/// Interleaved samples scaled by `attenuation` and clamped to [-1, 1].
pub fn prepare(signal: &Signal, attenuation: f32) -> Vec<f32> {
    let mut clipped = 0usize;
    let samples: Vec<f32> = signal
        .to_interleaved()
        .into_iter()
        .map(|s| {
            let scaled = s * attenuation;
            if scaled.abs() > 1.0 {
                clipped += 1;
            }
            scaled.clamp(-1.0, 1.0)
        })
        .collect();
    if clipped > 0 {
        warn!("clamped {} of {} samples to [-1, 1]", clipped, samples.len());
    }
    samples
}

/// Write `signal` to `path` at its own sample rate and channel count.
pub fn write_wav(signal: &Signal, path: &Path, config: &SynthConfig) -> Result<()> {
    config.validate()?;
    let spec = wav_spec(signal, config.bit_depth);
    let samples = prepare(signal, config.attenuation);

    let mut writer = WavWriter::create(path, spec)?;
    match config.bit_depth {
        BitDepth::Int16 => {
            for s in samples {
                writer.write_sample((s * i16::MAX as f32) as i16)?;
            }
        }
        BitDepth::Float32 => {
            for s in samples {
                writer.write_sample(s)?;
            }
        }
    }
    writer.finalize()?;
    trace!("wrote {} frames of {} channel audio to {}", signal.len(), spec.channels, path.display());
    Ok(())
}

/// Callbacks that must pass with nothing left to play before the last
/// filled device buffer is known to have been heard.
const TAIL_CALLBACKS: usize = 2;

/// Playback progress shared between device callbacks and the waiting caller.
#[cfg_attr(not(feature = "playback"), allow(dead_code))]
#[derive(Debug, Default)]
struct Progress {
    drained: AtomicUsize,
    error: Mutex<Option<String>>,
}

#[cfg_attr(not(feature = "playback"), allow(dead_code))]
impl Progress {
    /// Copy the next frames into `data`, padding with silence once they run out.
    fn fill(&self, frames: &[f32], cursor: &mut usize, data: &mut [f32]) {
        if *cursor >= frames.len() {
            self.drained.fetch_add(1, Ordering::AcqRel);
        }
        for out in data.iter_mut() {
            *out = frames.get(*cursor).copied().unwrap_or(0.0);
            *cursor += 1;
        }
    }

    fn fail(&self, message: String) {
        if let Ok(mut error) = self.error.lock() {
            error.get_or_insert(message);
        }
    }

    /// `None` while playing, then the outcome.
    fn outcome(&self) -> Option<Result<()>> {
        if let Some(message) = self.error.lock().ok().and_then(|error| error.clone()) {
            return Some(Err(SignalError::Playback(message)));
        }
        if self.drained.load(Ordering::Acquire) >= TAIL_CALLBACKS {
            return Some(Ok(()));
        }
        None
    }
}

#[cfg(feature = "playback")]
pub use device::CpalOutput;

#[cfg(feature = "playback")]
mod device {
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use log::{debug, error};

    use super::{prepare, AudioOutput, Progress};
    use crate::error::{Result, SignalError};
    use crate::signal::Signal;
    use crate::synth_config::SynthConfig;

    /// Extra time allowed past the signal's duration before giving up on the device.
    const GRACE: Duration = Duration::from_secs(2);

    /// Plays signals on the default output device, blocking until they finish.
    pub struct CpalOutput {
        device: cpal::Device,
        channels: u16,
        attenuation: f32,
    }

    impl CpalOutput {
        pub fn new(config: &SynthConfig) -> Result<CpalOutput> {
            config.validate()?;
            let host = cpal::default_host();
            let device = host
                .default_output_device()
                .ok_or_else(|| SignalError::Playback("no default output device available".to_string()))?;
            let default_config = device
                .default_output_config()
                .map_err(|e| SignalError::Playback(format!("failed to fetch default output config: {}", e)))?;
            Ok(CpalOutput {
                device,
                channels: default_config.channels(),
                attenuation: config.attenuation,
            })
        }
    }

    /// Frames of `signal` laid out for a device with `channels` outputs.
    fn device_frames(signal: &Signal, attenuation: f32, channels: u16) -> Vec<f32> {
        let stereo = prepare(&signal.to_stereo(), attenuation);
        let channels = channels as usize;
        stereo
            .chunks(2)
            .flat_map(|frame| (0..channels).map(move |ch| if channels == 1 { 0.5 * (frame[0] + frame[1]) } else { frame[ch.min(1)] }))
            .collect()
    }

    impl AudioOutput for CpalOutput {
        fn play(&mut self, signal: &Signal) -> Result<()> {
            let stream_config = cpal::StreamConfig {
                channels: self.channels,
                sample_rate: cpal::SampleRate(signal.sample_rate()),
                buffer_size: cpal::BufferSize::Default,
            };
            let frames = device_frames(signal, self.attenuation, self.channels);
            let progress = Arc::new(Progress::default());
            debug!("playing {}s on {} channels", signal.duration(), self.channels);

            let stream = self
                .device
                .build_output_stream(
                    &stream_config,
                    {
                        let progress = Arc::clone(&progress);
                        let mut cursor = 0;
                        move |data: &mut [f32], _| progress.fill(&frames, &mut cursor, data)
                    },
                    {
                        let progress = Arc::clone(&progress);
                        move |err| {
                            error!("output stream error: {}", err);
                            progress.fail(err.to_string());
                        }
                    },
                    None,
                )
                .map_err(|e| SignalError::Playback(format!("failed to build output stream: {}", e)))?;
            stream
                .play()
                .map_err(|e| SignalError::Playback(format!("failed to start output stream: {}", e)))?;

            let deadline = Instant::now() + Duration::from_secs_f64(signal.duration()) + GRACE;
            loop {
                if let Some(outcome) = progress.outcome() {
                    return outcome;
                }
                if Instant::now() > deadline {
                    return Err(SignalError::Playback("output device stopped requesting samples".to_string()));
                }
                thread::sleep(Duration::from_millis(10));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::signal_from_wav;
    use crate::signal::Synthesized;

    struct Recorder {
        played: Vec<Signal>,
    }

    impl AudioOutput for Recorder {
        fn play(&mut self, signal: &Signal) -> Result<()> {
            self.played.push(signal.clone());
            Ok(())
        }
    }

    #[test]
    fn test_progress_waits_for_the_last_buffer() {
        let progress = Progress::default();
        let frames = [0.1, 0.2, 0.3];
        let mut cursor = 0;
        let mut data = [1.0; 2];

        progress.fill(&frames, &mut cursor, &mut data);
        assert_eq!(data, [0.1, 0.2]);
        assert!(progress.outcome().is_none());

        progress.fill(&frames, &mut cursor, &mut data);
        assert_eq!(data, [0.3, 0.0]);
        // the final frames were only handed over, not yet heard
        assert!(progress.outcome().is_none());

        progress.fill(&frames, &mut cursor, &mut data);
        assert_eq!(data, [0.0, 0.0]);
        assert!(progress.outcome().is_none());
        progress.fill(&frames, &mut cursor, &mut data);
        assert!(matches!(progress.outcome(), Some(Ok(()))));
    }

    #[test]
    fn test_progress_reports_stream_errors() {
        let progress = Progress::default();
        let mut cursor = 0;
        let mut data = [0.0; 4];
        progress.fill(&[0.5; 64], &mut cursor, &mut data);
        progress.fail("device unplugged".to_string());
        progress.fail("later error".to_string());
        match progress.outcome() {
            Some(Err(SignalError::Playback(message))) => assert_eq!(message, "device unplugged"),
            other => panic!("expected a playback error, got {:?}", other),
        }
    }

    #[test]
    fn test_prepare_attenuates_and_clamps() {
        let signal = Signal::stereo(vec![1.0, 4.0], vec![-0.5, -5.0], 10).unwrap();
        assert_eq!(prepare(&signal, 0.5), vec![0.5, -0.25, 1.0, -1.0]);
    }

    #[test]
    fn test_play_hands_signal_to_output() {
        let signal = Signal::mono(vec![0.1, 0.2], 10).unwrap();
        let mut recorder = Recorder { played: Vec::new() };
        signal.play(&mut recorder).unwrap();
        assert_eq!(recorder.played, vec![signal]);
    }

    #[test]
    fn test_float_export_keeps_samples() {
        let path = std::env::temp_dir().join("rdasp-render-float.wav");
        let signal = Signal::stereo(vec![0.5, -1.0, 0.25], vec![0.0, 1.0, -0.25], 22050).unwrap();
        let config = SynthConfig::new(22050, 1.0, BitDepth::Float32).unwrap();
        signal.write_wav_with(&path, &config).unwrap();

        let spec = hound::WavReader::open(&path).unwrap().spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 32);
        assert_eq!(signal_from_wav(&path).unwrap(), signal);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_default_export_is_attenuated_16_bit() {
        let path = std::env::temp_dir().join("rdasp-render-int.wav");
        let signal = Signal::mono(vec![1.0, -1.0, 0.5], 44100).unwrap();
        signal.write_wav(&path).unwrap();

        let spec = hound::WavReader::open(&path).unwrap().spec();
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
        let read = signal_from_wav(&path).unwrap();
        for (a, b) in read.samples().iter().zip([0.3, -0.3, 0.15]) {
            assert!((a - b).abs() < 1e-3);
        }
        std::fs::remove_file(&path).unwrap();
    }
}
