#![allow(dead_code)]

use std::path::PathBuf;

use rdasp::synth_config::{BitDepth, SynthConfig};

pub fn test_audio_name(config: &SynthConfig, label: &str) -> PathBuf {
    let name = format!("rdasp_{}_sample-rate_{}", label, config.sample_rate);
    std::env::temp_dir().join(format!("{}.wav", name))
}

/// Lossless export settings so read-back samples can be compared directly.
pub fn test_config() -> SynthConfig {
    SynthConfig {
        sample_rate: 44100,
        attenuation: 1.0,
        bit_depth: BitDepth::Float32,
    }
}

macro_rules! assert_approx_eq {
    ($a:expr, $b:expr, $tolerance:expr) => {{
        let (a, b) = ($a as f64, $b as f64);
        assert!((a - b).abs() <= $tolerance as f64, "{} is not within {} of {}", a, $tolerance, b);
    }};
}
