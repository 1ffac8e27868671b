use std::io::Cursor;
use std::path::Path;

use super::{AudioError, AudioResult, PromptSpeech};

/// Sample rate every piece of reference audio is normalized to.
pub const PROMPT_SAMPLE_RATE: u32 = 16_000;

/// Decode WAV bytes into mono float samples at their native rate.
///
/// Integer formats are normalized by their bit depth; multi-channel audio is
/// downmixed by averaging each frame.
fn decode_wav_mono(data: &[u8]) -> AudioResult<(Vec<f32>, u32)> {
    let reader = hound::WavReader::new(Cursor::new(data))?;
    let spec = reader.spec();

    if spec.channels == 0 {
        return Err(AudioError::Unsupported("WAV declares zero channels".to_string()));
    }

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioError::Unsupported(format!(
                    "{}-bit integer samples",
                    spec.bits_per_sample
                )));
            }
            let max_val = (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_val))
                .collect::<Result<_, _>>()?
        }
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
    };

    let channels = spec.channels as usize;
    let mono = if channels == 1 {
        samples
    } else {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok((mono, spec.sample_rate))
}

/// Resample audio to the target sample rate (linear interpolation)
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let new_len = (samples.len() as f64 / ratio) as usize;

    let mut resampled = Vec::with_capacity(new_len);
    for i in 0..new_len {
        let src_pos = i as f64 * ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let current = samples[idx.min(samples.len() - 1)];
        let next = samples[(idx + 1).min(samples.len() - 1)];
        resampled.push(current + (next - current) * frac);
    }

    resampled
}

/// Decode an uploaded reference clip into 16 kHz mono speech.
pub fn decode_prompt_speech(data: &[u8]) -> AudioResult<PromptSpeech> {
    let (samples, rate) = decode_wav_mono(data)?;
    let samples = resample_linear(&samples, rate, PROMPT_SAMPLE_RATE);
    Ok(PromptSpeech::new(samples, PROMPT_SAMPLE_RATE))
}

/// Read and decode a reference clip from disk into 16 kHz mono speech.
pub fn load_prompt_speech_file(path: &Path) -> AudioResult<PromptSpeech> {
    let data = std::fs::read(path)?;
    decode_prompt_speech(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audio::encode_wav_with_rate;

    fn stereo_wav(frames: &[(i16, i16)], rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &(l, r) in frames {
                writer.write_sample(l).unwrap();
                writer.write_sample(r).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_mono_16k_passthrough() {
        let wav = encode_wav_with_rate(&[0.5, -0.5, 0.25], PROMPT_SAMPLE_RATE).unwrap();
        let speech = decode_prompt_speech(&wav).unwrap();
        assert_eq!(speech.sample_rate, PROMPT_SAMPLE_RATE);
        assert_eq!(speech.samples, vec![0.5, -0.5, 0.25]);
    }

    #[test]
    fn test_decode_downmixes_stereo() {
        let wav = stereo_wav(&[(16384, -16384), (16384, 16384)], PROMPT_SAMPLE_RATE);
        let speech = decode_prompt_speech(&wav).unwrap();
        assert_eq!(speech.samples, vec![0.0, 0.5]);
    }

    #[test]
    fn test_decode_resamples_to_16k() {
        let wav = encode_wav_with_rate(&vec![0.1; 48_000], 48_000).unwrap();
        let speech = decode_prompt_speech(&wav).unwrap();
        assert_eq!(speech.samples.len(), 16_000);
        assert!((speech.duration_secs() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_prompt_speech(b"definitely not a wav file");
        assert!(matches!(result, Err(AudioError::Wav(_))));
    }

    #[test]
    fn test_resample_linear_interpolates() {
        let out = resample_linear(&[0.0, 1.0], 1, 2);
        assert_eq!(out, vec![0.0, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_load_prompt_speech_file_missing() {
        let result = load_prompt_speech_file(Path::new("/nonexistent/sample.wav"));
        assert!(matches!(result, Err(AudioError::Io(_))));
    }
}
