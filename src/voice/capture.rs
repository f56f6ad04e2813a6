//! Microphone stream for one utterance
//!
//! A [`MicStream`] is opened when listening starts and dropped once the phrase
//! is captured. Samples arrive as 16 kHz mono whatever the device's channel
//! count.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, Stream, SupportedStreamConfigRange};

use crate::{Error, Result};

/// Sample rate for audio capture (16kHz for speech)
pub const SAMPLE_RATE: u32 = 16000;

/// Live microphone input, buffering samples until drained
///
/// Holds a `cpal` stream, which is not `Send`; open and drop it on the
/// listening thread.
pub struct MicStream {
    pending: Arc<Mutex<Vec<f32>>>,
    _stream: Stream,
}

impl MicStream {
    /// Open the default input device and start streaming
    ///
    /// # Errors
    ///
    /// Returns error if no usable input device or format exists
    pub fn open() -> Result<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let ranges: Vec<SupportedStreamConfigRange> = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .filter(speech_capable)
            .collect();

        // Mono saves downmixing; anything else is averaged per frame
        let range = ranges
            .iter()
            .find(|c| c.channels() == 1)
            .or_else(|| ranges.first())
            .cloned()
            .ok_or_else(|| Error::Audio("no 16 kHz f32 input config".to_string()))?;

        let config = range.with_sample_rate(SampleRate(SAMPLE_RATE)).config();
        let channels = usize::from(config.channels);

        let pending = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&pending);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut buf) = sink.lock() {
                        buf.extend(downmix(data, channels));
                    }
                },
                |err| tracing::error!(error = %err, "microphone stream error"),
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;
        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            channels,
            "microphone open"
        );

        Ok(Self {
            pending,
            _stream: stream,
        })
    }

    /// Sample the room for `window` and return only that ambient audio
    pub fn ambient(&self, window: Duration) -> Vec<f32> {
        self.drain();
        std::thread::sleep(window);
        self.drain()
    }

    /// Samples received since the previous drain
    #[must_use]
    pub fn drain(&self) -> Vec<f32> {
        self.pending
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }
}

fn speech_capable(range: &SupportedStreamConfigRange) -> bool {
    let rate = SampleRate(SAMPLE_RATE);
    range.sample_format() == SampleFormat::F32
        && range.min_sample_rate() <= rate
        && range.max_sample_rate() >= rate
}

/// Average interleaved frames down to one channel
fn downmix(data: &[f32], channels: usize) -> impl Iterator<Item = f32> + '_ {
    let width = channels.max(1);

    #[allow(clippy::cast_precision_loss)]
    data.chunks(width)
        .map(move |frame| frame.iter().sum::<f32>() / frame.len() as f32)
}

/// Encode mono samples as 16-bit PCM WAV for upload to STT services
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn samples_to_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let audio_err = |e: hound::Error| Error::Audio(e.to_string());

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut wav = std::io::Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    let mut writer = hound::WavWriter::new(&mut wav, spec).map_err(audio_err)?;

    for &sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        let pcm = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        writer.write_sample(pcm).map_err(audio_err)?;
    }

    writer.finalize().map_err(audio_err)?;
    Ok(wav.into_inner())
}

/// RMS energy of audio samples
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rms() {
        assert!(rms(&[]) < f32::EPSILON);
        assert!(rms(&[0.0; 100]) < 0.001);
        assert!(rms(&[0.5; 100]) > 0.4);
    }

    #[test]
    fn test_downmix_stereo() {
        let mono: Vec<f32> = downmix(&[0.2, 0.4, -1.0, 1.0], 2).collect();
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!(mono[1].abs() < 1e-6);
    }

    #[test]
    fn test_downmix_mono_passthrough() {
        let mono: Vec<f32> = downmix(&[0.1, 0.2, 0.3], 1).collect();
        assert_eq!(mono, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_wav_clamps_overdriven_samples() {
        let wav = samples_to_wav(&[2.0, -2.0], SAMPLE_RATE).unwrap();
        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let pcm: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(pcm, vec![i16::MAX, -i16::MAX]);
    }
}
