use thiserror::Error;

/// Everything that can go wrong while building, combining or exporting signals.
///
/// All variants are raised synchronously at the point of construction or
/// combination. No operation returns a partial result alongside an error.
#[derive(Debug, Error)]
pub enum SignalError {
    #[error("invalid frequency: {0} Hz, values greater than 0 are permitted")]
    InvalidFrequency(f64),

    #[error("invalid pitch {0:?}: expected a letter A-G, an optional # or b, and an octave 0-9")]
    InvalidPitchString(String),

    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("invalid split point {point}s for a signal of {duration}s")]
    InvalidSplitPoint { point: f64, duration: f64 },

    #[error("sample rates differ: {expected} Hz and {found} Hz")]
    SampleRateMismatch { expected: u32, found: u32 },

    #[error("invalid sample rate: {0}, values greater than 0 are permitted")]
    InvalidSampleRate(u32),

    #[error("invalid amplitude: {0}, values between 0 and 1 are permitted")]
    InvalidAmplitude(f32),

    #[error("invalid harmonic: {0}, values of 1 or greater are permitted")]
    InvalidHarmonic(usize),

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("stereo channels differ in length: {left} and {right} samples")]
    ChannelMismatch { left: usize, right: usize },

    #[error("unsupported channel count: {0}, mono and stereo are permitted")]
    UnsupportedChannels(u16),

    #[error("at least one signal is required")]
    NoSignals,

    #[error("frequency modulation needs an oscillator carrier, not rendered samples")]
    UnsupportedModulation,

    #[error("filter design failed: {0}")]
    Filter(String),

    #[error("playback failed: {0}")]
    Playback(String),

    #[error(transparent)]
    Wav(#[from] hound::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SignalError>;
