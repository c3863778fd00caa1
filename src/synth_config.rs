use std::fs;
use std::path::Path;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignalError};
use crate::synth::SR;

/// Sample encoding of exported WAV files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitDepth {
    Int16,
    Float32,
}

/// Rendering and export settings.
///
/// Every field has a default, so a JSON file only needs to name the ones it changes:
///
/// ```json
/// { "sample_rate": 48000, "bit_depth": "float32" }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    pub sample_rate: u32,
    /// Gain applied to every sample before it is written or played.
    pub attenuation: f32,
    pub bit_depth: BitDepth,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            sample_rate: SR,
            attenuation: 0.3,
            bit_depth: BitDepth::Int16,
        }
    }
}

impl SynthConfig {
    pub fn new(sample_rate: u32, attenuation: f32, bit_depth: BitDepth) -> Result<SynthConfig> {
        let config = SynthConfig {
            sample_rate,
            attenuation,
            bit_depth,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read a config from a JSON file and validate it.
    pub fn from_file(path: &Path) -> Result<SynthConfig> {
        let text = fs::read_to_string(path)?;
        let config: SynthConfig = serde_json::from_str(&text)?;
        trace!("loaded {:?} from {}", config, path.display());
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(SignalError::InvalidSampleRate(self.sample_rate));
        }
        if !(0.0..=1.0).contains(&self.attenuation) {
            return Err(SignalError::InvalidAmplitude(self.attenuation));
        }
        Ok(())
    }
}
