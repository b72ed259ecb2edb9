use std::path::Path;

use crate::foundation::error::{RedubError, RedubResult};
use crate::media::ffmpeg::{ensure_parent_dir, ffmpeg_command, run_tool};

/// Sample rate of the mixdown bed and of every clip normalized into it.
pub const CANONICAL_SAMPLE_RATE: u32 = 44_100;

/// Channel count of the mixdown bed.
pub const CANONICAL_CHANNELS: u16 = 2;

#[derive(Clone, Debug, PartialEq)]
/// Interleaved signed 16-bit PCM.
pub struct PcmBuffer {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count.
    pub channels: u16,
    /// Interleaved samples, `frames * channels` long.
    pub interleaved: Vec<i16>,
}

impl PcmBuffer {
    /// Canonical-format silence lasting `duration_ms`.
    pub fn silent(duration_ms: u64) -> Self {
        let frames = ms_to_frames(duration_ms, CANONICAL_SAMPLE_RATE);
        Self {
            sample_rate: CANONICAL_SAMPLE_RATE,
            channels: CANONICAL_CHANNELS,
            interleaved: vec![0; frames * usize::from(CANONICAL_CHANNELS)],
        }
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.interleaved.len() / usize::from(self.channels)
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    pub fn is_canonical(&self) -> bool {
        self.sample_rate == CANONICAL_SAMPLE_RATE && self.channels == CANONICAL_CHANNELS
    }
}

/// Frame index of a millisecond offset at `sample_rate`.
pub fn ms_to_frames(ms: u64, sample_rate: u32) -> usize {
    (u128::from(ms) * u128::from(sample_rate) / 1000) as usize
}

fn canonical_spec() -> hound::WavSpec {
    hound::WavSpec {
        channels: CANONICAL_CHANNELS,
        sample_rate: CANONICAL_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

/// Decode any audio file into canonical 16-bit stereo 44.1 kHz PCM.
///
/// WAV files already in the canonical layout are read directly; everything else goes through
/// `ffmpeg` for resampling and channel mapping.
pub fn decode_canonical(path: &Path) -> RedubResult<PcmBuffer> {
    if let Some(pcm) = read_canonical_wav(path)? {
        return Ok(pcm);
    }
    decode_with_ffmpeg(path)
}

fn read_canonical_wav(path: &Path) -> RedubResult<Option<PcmBuffer>> {
    let Ok(reader) = hound::WavReader::open(path) else {
        return Ok(None);
    };
    if reader.spec() != canonical_spec() {
        return Ok(None);
    }
    let interleaved = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RedubError::media(format!("failed to read '{}': {e}", path.display())))?;
    Ok(Some(PcmBuffer {
        sample_rate: CANONICAL_SAMPLE_RATE,
        channels: CANONICAL_CHANNELS,
        interleaved,
    }))
}

fn decode_with_ffmpeg(path: &Path) -> RedubResult<PcmBuffer> {
    let stdout = run_tool(
        ffmpeg_command()
            .arg("-i")
            .arg(path)
            .args([
                "-vn",
                "-f",
                "s16le",
                "-acodec",
                "pcm_s16le",
                "-ac",
                &CANONICAL_CHANNELS.to_string(),
                "-ar",
                &CANONICAL_SAMPLE_RATE.to_string(),
                "pipe:1",
            ]),
        &format!("decode of '{}'", path.display()),
        RedubError::media,
    )?;

    let frame_bytes = 2 * usize::from(CANONICAL_CHANNELS);
    if !stdout.len().is_multiple_of(frame_bytes) {
        return Err(RedubError::media(format!(
            "decoded audio of '{}' is not aligned to whole stereo frames ({} bytes)",
            path.display(),
            stdout.len()
        )));
    }
    let interleaved = stdout
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();

    Ok(PcmBuffer {
        sample_rate: CANONICAL_SAMPLE_RATE,
        channels: CANONICAL_CHANNELS,
        interleaved,
    })
}

/// Write PCM as a 16-bit WAV file.
pub fn write_wav(pcm: &PcmBuffer, out_path: &Path) -> RedubResult<()> {
    ensure_parent_dir(out_path)?;
    let spec = hound::WavSpec {
        channels: pcm.channels,
        sample_rate: pcm.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let wav_err =
        |e: hound::Error| RedubError::media(format!("failed to write '{}': {e}", out_path.display()));

    let mut writer = hound::WavWriter::create(out_path, spec).map_err(wav_err)?;
    for &sample in &pcm.interleaved {
        writer.write_sample(sample).map_err(wav_err)?;
    }
    writer.finalize().map_err(wav_err)
}

/// Write canonical silence lasting `duration_ms` (at least 1 ms).
pub fn write_silence_wav(out_path: &Path, duration_ms: u64) -> RedubResult<()> {
    write_wav(&PcmBuffer::silent(duration_ms.max(1)), out_path)
}

#[cfg(test)]
#[path = "../../tests/unit/media/pcm.rs"]
mod tests;
