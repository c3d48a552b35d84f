//! Stem decoding - symphonia to interleaved stereo at the device rate

use std::io::Cursor;
use std::path::Path;
use stemdeck_audio::{BackendError, PcmBuffer, StemDecoder, StemSource};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

/// Errors that can occur while decoding a stem
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio track found")]
    NoAudioTrack,
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Resample error: {0}")]
    Resample(String),
}

/// A decoded stem
#[derive(Debug, Clone)]
pub struct LoadedStem {
    /// Interleaved stereo at the loader's target rate
    pub pcm: PcmBuffer,
    /// Title tag, if the file carries one
    pub title: Option<String>,
    /// Sample rate before resampling
    pub source_sample_rate: u32,
    /// Channel count before stereo conversion
    pub source_channels: u16,
}

/// Stem decoder using Symphonia, resampled with rubato
#[derive(Debug, Clone)]
pub struct TrackLoader {
    target_sample_rate: u32,
}

impl Default for TrackLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackLoader {
    /// Create a loader targeting 48kHz
    pub fn new() -> Self {
        Self::with_sample_rate(48000)
    }

    /// Create a loader targeting the output device's rate
    pub fn with_sample_rate(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Decode an audio file
    pub fn load(&self, path: &Path) -> Result<LoadedStem, LoadError> {
        let file = std::fs::File::open(path)?;
        let extension = path.extension().and_then(|e| e.to_str());
        self.decode_stream(Box::new(file), extension)
    }

    /// Decode encoded audio held in memory
    pub fn load_bytes(&self, data: &[u8], extension: Option<&str>) -> Result<LoadedStem, LoadError> {
        self.decode_stream(Box::new(Cursor::new(data.to_vec())), extension)
    }

    fn decode_stream(
        &self,
        source: Box<dyn MediaSource>,
        extension: Option<&str>,
    ) -> Result<LoadedStem, LoadError> {
        let mss = MediaSourceStream::new(source, Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(LoadError::NoAudioTrack)?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let source_sample_rate = codec_params.sample_rate.unwrap_or(44100);
        let mut channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(2);

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let title = format.metadata().current().and_then(|meta| {
            meta.tags()
                .iter()
                .find(|tag| {
                    tag.std_key == Some(symphonia::core::meta::StandardTagKey::TrackTitle)
                })
                .map(|tag| tag.value.to_string())
        });

        let mut samples: Vec<f32> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(_) => break,
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping undecodable packet");
                    continue;
                }
            };

            let spec = *decoded.spec();
            channels = spec.channels.count() as u16;
            let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(sample_buf.samples());
        }

        if samples.is_empty() {
            return Err(LoadError::Decode("stream holds no audio".into()));
        }

        let stereo = to_stereo(&samples, channels);
        let samples = if source_sample_rate != self.target_sample_rate {
            resample_stereo(&stereo, source_sample_rate, self.target_sample_rate)?
        } else {
            stereo
        };

        Ok(LoadedStem {
            pcm: PcmBuffer::new(samples, self.target_sample_rate),
            title,
            source_sample_rate,
            source_channels: channels,
        })
    }
}

impl StemDecoder for TrackLoader {
    fn decode(&self, source: &StemSource) -> Result<PcmBuffer, BackendError> {
        let loaded = match source {
            StemSource::Path(path) => self.load(path),
            StemSource::Bytes { data, extension } => self.load_bytes(data, extension.as_deref()),
            StemSource::Pcm(pcm) if pcm.sample_rate == self.target_sample_rate => {
                return Ok(pcm.clone())
            }
            StemSource::Pcm(pcm) => {
                return resample_stereo(&pcm.samples, pcm.sample_rate, self.target_sample_rate)
                    .map(|samples| PcmBuffer::new(samples, self.target_sample_rate))
                    .map_err(|e| BackendError::Decode(e.to_string()))
            }
        };
        loaded
            .map(|stem| stem.pcm)
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

/// Interleaved stereo from any channel count; mono is duplicated, extra
/// channels beyond the first two are dropped
fn to_stereo(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        2 => samples.to_vec(),
        0 | 1 => samples.iter().flat_map(|&s| [s, s]).collect(),
        n => samples
            .chunks_exact(n as usize)
            .flat_map(|frame| [frame[0], frame[1]])
            .collect(),
    }
}

/// Resample interleaved stereo
fn resample_stereo(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>, LoadError> {
    use rubato::{FftFixedInOut, Resampler};

    const CHANNELS: usize = 2;
    let frames = samples.len() / CHANNELS;

    let mut resampler =
        FftFixedInOut::<f32>::new(source_rate as usize, target_rate as usize, 1024, CHANNELS)
            .map_err(|e| LoadError::Resample(e.to_string()))?;

    // Deinterleave
    let deinterleaved: Vec<Vec<f32>> = (0..CHANNELS)
        .map(|ch| (0..frames).map(|f| samples[f * CHANNELS + ch]).collect())
        .collect();

    let chunk_size = resampler.input_frames_next();
    let mut output: Vec<Vec<f32>> = vec![Vec::new(); CHANNELS];

    let mut pos = 0;
    while pos + chunk_size <= frames {
        let input_refs: Vec<&[f32]> = deinterleaved
            .iter()
            .map(|ch| &ch[pos..pos + chunk_size])
            .collect();

        let resampled = resampler
            .process(&input_refs, None)
            .map_err(|e| LoadError::Resample(e.to_string()))?;

        for (ch, data) in resampled.into_iter().enumerate() {
            output[ch].extend(data);
        }
        pos += chunk_size;
    }

    // Tail, padded with zeros and trimmed back to its proportional length
    if pos < frames {
        let remaining = frames - pos;
        let padded: Vec<Vec<f32>> = deinterleaved
            .iter()
            .map(|ch| {
                let mut v = ch[pos..].to_vec();
                v.resize(chunk_size, 0.0);
                v
            })
            .collect();
        let input_refs: Vec<&[f32]> = padded.iter().map(|v| v.as_slice()).collect();

        let resampled = resampler
            .process(&input_refs, None)
            .map_err(|e| LoadError::Resample(e.to_string()))?;
        let tail_frames = remaining * target_rate as usize / source_rate as usize;
        for (ch, data) in resampled.into_iter().enumerate() {
            output[ch].extend(&data[..tail_frames.min(data.len())]);
        }
    }

    // Reinterleave
    let output_frames = output[0].len();
    let mut interleaved = Vec::with_capacity(output_frames * CHANNELS);
    for frame_idx in 0..output_frames {
        for channel in &output {
            interleaved.push(channel[frame_idx]);
        }
    }

    Ok(interleaved)
}
