use crate::core::{AudioFormat, AudioMetadata};
use crate::error::{SpliceError, SpliceResult};
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Read stream parameters from any container symphonia understands
pub fn probe<P: AsRef<Path>>(path: P) -> SpliceResult<AudioMetadata> {
    let path = path.as_ref();
    let file = Box::new(File::open(path)?);
    let mss = MediaSourceStream::new(file, Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| SpliceError::Probe(format!("{}: no audio track", path.display())))?;
    let params = &track.codec_params;

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| SpliceError::Probe(format!("{}: unknown sample rate", path.display())))?;
    let channels = params
        .channels
        .map(|c| c.count() as u32)
        .ok_or_else(|| SpliceError::Probe(format!("{}: unknown channel count", path.display())))?;
    let codec = symphonia::default::get_codecs()
        .get_codec(params.codec)
        .map(|d| d.short_name.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let mut metadata = AudioMetadata::new(sample_rate, channels, codec)?;
    if let Some(bits) = params.bits_per_sample {
        metadata = metadata.with_bits_per_sample(bits);
    }
    if let Some(frames) = params.n_frames {
        metadata = metadata.with_duration(Duration::from_secs_f64(frames as f64 / f64::from(sample_rate)));
    }
    Ok(metadata)
}

/// Whether a file can be fed to the engine without transcoding
pub fn is_working_format<P: AsRef<Path>>(path: P, format: &AudioFormat) -> SpliceResult<bool> {
    let path = path.as_ref();
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));
    if !is_wav {
        return Ok(false);
    }

    let metadata = probe(path)?;
    Ok(metadata.sample_rate == format.sample_rate()
        && metadata.channels == format.channels().count()
        && metadata.bits_per_sample == Some(format.bit_depth().bits()))
}
