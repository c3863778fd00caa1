use std::path::Path;

use hound::{SampleFormat, WavReader};
use log::trace;

use crate::error::Result;
use crate::signal::Signal;

/// Read a mono or stereo WAV file into a signal.
///
/// Integer samples are scaled into [-1, 1) by their bit depth; float samples
/// are taken as they are.
pub fn signal_from_wav(path: &Path) -> Result<Signal> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    trace!("reading {} ({:?})", path.display(), spec);

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|s| s as f32 * scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };
    Signal::from_interleaved(&interleaved, spec.channels, spec.sample_rate)
}

#[cfg(test)]
mod test_unit {
    use super::*;
    use crate::error::SignalError;

    fn write(path: &Path, spec: hound::WavSpec, samples: &[i32]) {
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn int_spec(channels: u16, bits_per_sample: u16) -> hound::WavSpec {
        hound::WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample,
            sample_format: SampleFormat::Int,
        }
    }

    #[test]
    fn test_reads_stereo_pcm() {
        let path = std::env::temp_dir().join("rdasp-reader-stereo.wav");
        write(&path, int_spec(2, 16), &[16384, -16384, -32768, 0]);
        let signal = signal_from_wav(&path).unwrap();
        assert_eq!(signal.sample_rate(), 8000);
        assert_eq!(signal.samples(), &[0.5, -1.0]);
        assert_eq!(signal.right(), Some(&[-0.5, 0.0][..]));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_reads_24_bit_pcm() {
        let path = std::env::temp_dir().join("rdasp-reader-24.wav");
        write(&path, int_spec(1, 24), &[1 << 22]);
        assert_eq!(signal_from_wav(&path).unwrap().samples(), &[0.5]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_rejects_surround() {
        let path = std::env::temp_dir().join("rdasp-reader-quad.wav");
        write(&path, int_spec(4, 16), &[0, 0, 0, 0]);
        assert!(matches!(signal_from_wav(&path), Err(SignalError::UnsupportedChannels(4))));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("rdasp-reader-missing.wav");
        assert!(signal_from_wav(&path).is_err());
    }
}
