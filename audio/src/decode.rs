use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::error::AudioError;
use crate::waveform::{SAMPLE_RATE, Waveform};

/// Decodes an audio file to a mono waveform at [`SAMPLE_RATE`].
///
/// WAV goes through `hound`; every other container (mp3, m4a, webm, ogg)
/// through symphonia. Multi-channel audio is mixed down by averaging and
/// other sample rates are resampled linearly.
pub fn load(path: &Path) -> Result<Waveform, AudioError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let (samples, src_rate) = match ext.as_deref() {
        Some("wav") => decode_wav(path)?,
        _ => decode_compressed(path, ext.as_deref())?,
    };

    if samples.is_empty() {
        return Err(AudioError::Empty {
            path: path.to_path_buf(),
        });
    }

    debug!(
        path = %path.display(),
        samples = samples.len(),
        src_rate,
        "decoded audio"
    );

    Ok(Waveform::new(
        resample_linear(&samples, src_rate, SAMPLE_RATE),
        SAMPLE_RATE,
    ))
}

fn decode_wav(path: &Path) -> Result<(Vec<f32>, u32), AudioError> {
    let reader = hound::WavReader::open(path).map_err(|e| AudioError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| AudioError::Decode {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })?
        }
    };

    Ok((mixdown(&interleaved, channels), spec.sample_rate))
}

fn decode_compressed(path: &Path, ext: Option<&str>) -> Result<(Vec<f32>, u32), AudioError> {
    let file = File::open(path).map_err(|e| AudioError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = ext {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::NoAudioTrack {
            path: path.to_path_buf(),
        })?;
    let track_id = track.id;
    let src_rate = track.codec_params.sample_rate.unwrap_or(SAMPLE_RATE);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut mono = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(AudioError::Decode {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let channels = spec.channels.count();
                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                mono.extend(mixdown(buf.samples(), channels));
            }
            // Corrupt packets are skipped, the stream may still recover.
            Err(SymphoniaError::DecodeError(reason)) => {
                debug!(path = %path.display(), reason, "skipping undecodable packet");
            }
            Err(e) => {
                return Err(AudioError::Decode {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok((mono, src_rate))
}

fn mixdown(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Linear interpolation resampler for mono f32 samples.
fn resample_linear(input: &[f32], src_hz: u32, dst_hz: u32) -> Vec<f32> {
    if src_hz == dst_hz || input.is_empty() {
        return input.to_vec();
    }

    let out_len = (input.len() as u64 * dst_hz as u64 / src_hz as u64) as usize;
    let mut out = vec![0.0f32; out_len];

    for (i, y) in out.iter_mut().enumerate() {
        let src_pos = i as f64 * src_hz as f64 / dst_hz as f64;
        let idx = src_pos.floor() as usize;
        let frac = (src_pos - idx as f64) as f32;

        let a = input.get(idx).copied().unwrap_or(0.0);
        let b = input.get(idx + 1).copied().unwrap_or(a);
        *y = a * (1.0 - frac) + b * frac;
    }

    out
}
