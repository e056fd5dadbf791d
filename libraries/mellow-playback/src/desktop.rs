//! Desktop transport: symphonia decode, cpal output
//!
//! A load decodes the whole file into interleaved stereo f32 and resamples
//! it to the device rate with rubato; the cpal callback then walks that
//! buffer. The stream is built on the media thread and never leaves it.

use crate::error::{PlaybackError, Result};
use crate::transport::Transport;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, error, warn};

/// State shared with the cpal callback
struct OutputState {
    samples: Mutex<Arc<Vec<f32>>>,
    position: AtomicUsize,
    playing: AtomicBool,
    finished: AtomicBool,
    volume: AtomicU32,
}

impl OutputState {
    fn volume(&self) -> f32 {
        f32::from_bits(self.volume.load(Ordering::Relaxed))
    }

    fn fill(&self, output: &mut [f32], channels: usize) {
        if !self.playing.load(Ordering::Acquire) {
            output.fill(0.0);
            return;
        }

        let samples = Arc::clone(&self.samples.lock().unwrap_or_else(PoisonError::into_inner));
        let volume = self.volume();
        let mut pos = self.position.load(Ordering::Relaxed);

        // Source is stereo; the device may have any channel count.
        for frame in output.chunks_mut(channels.max(1)) {
            if pos + 1 >= samples.len() {
                frame.fill(0.0);
                continue;
            }
            let (left, right) = (samples[pos] * volume, samples[pos + 1] * volume);
            for (i, out) in frame.iter_mut().enumerate() {
                *out = match (channels, i) {
                    (1, _) => (left + right) * 0.5,
                    (_, 0) => left,
                    (_, 1) => right,
                    _ => 0.0,
                };
            }
            pos += 2;
        }

        self.position.store(pos, Ordering::Relaxed);
        if pos + 1 >= samples.len() {
            self.playing.store(false, Ordering::Release);
            self.finished.store(true, Ordering::Release);
        }
    }
}

/// Audio output on the default cpal device
pub struct CpalTransport {
    device: Device,
    config: StreamConfig,
    state: Arc<OutputState>,
    stream: Option<Stream>,
}

impl CpalTransport {
    /// Open the default output device
    ///
    /// Call this inside the controller's transport factory.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| PlaybackError::transport("no output device"))?;

        let config = device
            .default_output_config()
            .map_err(|e| PlaybackError::transport(e.to_string()))?
            .config();

        debug!(
            sample_rate = config.sample_rate,
            channels = config.channels,
            "Opened output device"
        );

        Ok(Self {
            device,
            config,
            state: Arc::new(OutputState {
                samples: Mutex::new(Arc::new(Vec::new())),
                position: AtomicUsize::new(0),
                playing: AtomicBool::new(false),
                finished: AtomicBool::new(false),
                volume: AtomicU32::new(1.0_f32.to_bits()),
            }),
            stream: None,
        })
    }

    fn build_stream(&self) -> Result<Stream> {
        let state = Arc::clone(&self.state);
        let channels = usize::from(self.config.channels);
        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| state.fill(data, channels),
                |err| error!(error = %err, "Audio stream error"),
                None,
            )
            .map_err(|e| PlaybackError::transport(e.to_string()))
    }
}

impl Transport for CpalTransport {
    fn load(&mut self, path: &Path) -> Result<()> {
        self.stop();

        let decoded = decode_file(path)?;
        let samples = resample_stereo(&decoded.samples, decoded.sample_rate, self.config.sample_rate)?;
        debug!(
            path = %path.display(),
            frames = samples.len() / 2,
            "Decoded"
        );

        *self.state.samples.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(samples);
        self.state.position.store(0, Ordering::Relaxed);
        self.state.finished.store(false, Ordering::Release);
        self.stream = Some(self.build_stream()?);
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let stream = self
            .stream
            .as_ref()
            .ok_or_else(|| PlaybackError::transport("nothing loaded"))?;
        self.state.playing.store(true, Ordering::Release);
        stream.play().map_err(|e| PlaybackError::transport(e.to_string()))
    }

    fn pause(&mut self) -> Result<()> {
        self.state.playing.store(false, Ordering::Release);
        if let Some(stream) = &self.stream {
            stream.pause().map_err(|e| PlaybackError::transport(e.to_string()))?;
        }
        Ok(())
    }

    fn stop(&mut self) {
        self.state.playing.store(false, Ordering::Release);
        self.state.finished.store(false, Ordering::Release);
        // Dropping the stream releases the device.
        self.stream.take();
        *self.state.samples.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(Vec::new());
        self.state.position.store(0, Ordering::Relaxed);
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.volume.store(volume.to_bits(), Ordering::Relaxed);
    }

    fn is_finished(&self) -> bool {
        self.stream.is_some() && self.state.finished.load(Ordering::Acquire)
    }
}

struct DecodedAudio {
    /// Interleaved stereo
    samples: Vec<f32>,
    sample_rate: u32,
}

fn decode_file(path: &Path) -> Result<DecodedAudio> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| PlaybackError::transport(format!("Failed to probe file: {e}")))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| PlaybackError::transport("No audio tracks found"))?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| PlaybackError::transport(format!("Failed to create decoder: {e}")))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(PlaybackError::transport(format!("Failed to read packet: {e}"))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(error = e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => return Err(PlaybackError::transport(format!("Decode failed: {e}"))),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count();
        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);

        for frame in buffer.samples().chunks(channels.max(1)) {
            match frame {
                [mono] => samples.extend_from_slice(&[*mono, *mono]),
                [left, right, ..] => samples.extend_from_slice(&[*left, *right]),
                [] => {}
            }
        }
    }

    if samples.is_empty() {
        return Err(PlaybackError::transport("File contains no audio"));
    }

    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

/// Sinc rate conversion of interleaved stereo
fn resample_stereo(samples: &[f32], from: u32, to: u32) -> Result<Vec<f32>> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    let frames = samples.len() / 2;
    if from == to || from == 0 || to == 0 || frames == 0 {
        return Ok(samples.to_vec());
    }

    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Cubic,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(f64::from(to) / f64::from(from), 2.0, params, frames, 2)
        .map_err(|e| PlaybackError::transport(format!("Failed to create resampler: {e}")))?;

    let mut deinterleaved = vec![Vec::with_capacity(frames); 2];
    for frame in samples.chunks_exact(2) {
        deinterleaved[0].push(frame[0]);
        deinterleaved[1].push(frame[1]);
    }

    let resampled = resampler
        .process(&deinterleaved, None)
        .map_err(|e| PlaybackError::transport(format!("Resampling failed: {e}")))?;

    let out_frames = resampled.first().map_or(0, Vec::len);
    let mut interleaved = Vec::with_capacity(out_frames * 2);
    for i in 0..out_frames {
        for channel in &resampled {
            interleaved.push(channel[i]);
        }
    }
    Ok(interleaved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_is_untouched() {
        let samples = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(resample_stereo(&samples, 44100, 44100).unwrap(), samples);
    }

    #[test]
    fn frame_count_scales_with_ratio() {
        let frames = 4410;
        let samples: Vec<f32> = (0..frames * 2).map(|i| ((i / 2) as f32 * 0.01).sin()).collect();

        let up = resample_stereo(&samples, 22050, 44100).unwrap();
        assert_eq!(up.len() % 2, 0);
        let up_frames = up.len() / 2;
        assert!(up_frames.abs_diff(frames * 2) <= frames / 50, "{up_frames}");

        let down = resample_stereo(&samples, 48000, 24000).unwrap();
        let down_frames = down.len() / 2;
        assert!(down_frames.abs_diff(frames / 2) <= frames / 50, "{down_frames}");
    }

    #[test]
    fn callback_marks_end_of_buffer() {
        let state = OutputState {
            samples: Mutex::new(Arc::new(vec![0.5, 0.5, 0.25, 0.25])),
            position: AtomicUsize::new(0),
            playing: AtomicBool::new(true),
            finished: AtomicBool::new(false),
            volume: AtomicU32::new(0.5_f32.to_bits()),
        };

        let mut out = vec![1.0; 8];
        state.fill(&mut out, 2);

        assert_eq!(&out[..4], &[0.25, 0.25, 0.125, 0.125]);
        assert_eq!(&out[4..], &[0.0; 4]);
        assert!(state.finished.load(Ordering::Acquire));
        assert!(!state.playing.load(Ordering::Acquire));
    }

    #[test]
    fn paused_callback_outputs_silence() {
        let state = OutputState {
            samples: Mutex::new(Arc::new(vec![1.0; 16])),
            position: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            volume: AtomicU32::new(1.0_f32.to_bits()),
        };

        let mut out = vec![1.0; 4];
        state.fill(&mut out, 2);
        assert_eq!(out, vec![0.0; 4]);
        assert_eq!(state.position.load(Ordering::Relaxed), 0);
    }
}
