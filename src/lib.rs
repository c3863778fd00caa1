//! Offline additive synthesis over fully rendered sample buffers.
//!
//! Build a [`Frequency`] and an [`Envelope`], render primitive or additive
//! voices into [`Signal`]s, then modulate, filter and combine them before
//! handing the buffer to a WAV writer or an audio output.
pub mod synth;
pub mod error;
pub mod freq;
pub mod envelope;
pub mod signal;
pub mod gen;
pub mod additive;
pub mod modulate;
pub mod mix;
pub mod filter;
pub mod render;
pub mod reader;
pub mod synth_config;

pub use additive::{AdditiveWave, Sawtooth, Square, Triangle, Waveform};
pub use envelope::Envelope;
pub use error::{Result, SignalError};
pub use freq::Frequency;
pub use gen::{Noise, Rest, Sine};
pub use modulate::{Carrier, ModulationMode, Modulator};
pub use reader::signal_from_wav;
pub use signal::{Channels, Oscillator, Signal, Synthesized};
pub use synth_config::{BitDepth, SynthConfig};
