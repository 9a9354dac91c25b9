use super::decode::AudioBuffer;
use std::path::Path;

/// Write `buffer` as a 16-bit PCM WAV file, creating parent directories as needed.
pub fn write_wav(path: &Path, buffer: &AudioBuffer) -> Result<(), hound::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let spec = hound::WavSpec {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in &buffer.samples {
        let scaled = (sample * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32);
        writer.write_sample(scaled as i16)?;
    }
    writer.finalize()
}
