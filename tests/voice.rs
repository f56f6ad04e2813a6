//! Voice pipeline integration tests
//!
//! Tests voice components without requiring audio hardware

use nura::voice::{SAMPLE_RATE, SegmentLimits, SegmenterState, SpeechSegmenter, samples_to_wav};
use std::io::Cursor;

mod common;

/// Generate sine wave audio samples
fn generate_sine_samples(frequency: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin()
        })
        .collect()
}

/// Generate silence
fn generate_silence(duration_secs: f32) -> Vec<f32> {
    let num_samples = (SAMPLE_RATE as f32 * duration_secs) as usize;
    vec![0.0; num_samples]
}

fn quiet_room_segmenter() -> SpeechSegmenter {
    SpeechSegmenter::calibrated(&generate_silence(0.5), SAMPLE_RATE, SegmentLimits::default())
}

#[test]
fn test_segmenter_starts_idle() {
    let segmenter = quiet_room_segmenter();

    assert_eq!(segmenter.state(), SegmenterState::Idle);
    assert_eq!(segmenter.buffered(), 0);
}

#[test]
fn test_silence_does_not_trigger() {
    let mut segmenter = quiet_room_segmenter();

    assert!(!segmenter.process(&generate_silence(1.0)));
    assert!(!segmenter.process(&generate_sine_samples(440.0, 0.5, 0.005)));
    assert_eq!(segmenter.state(), SegmenterState::Idle);
}

#[test]
fn test_phrase_ends_after_trailing_silence() {
    let mut segmenter = quiet_room_segmenter();

    segmenter.process(&generate_sine_samples(440.0, 0.5, 0.3));
    assert_eq!(segmenter.state(), SegmenterState::Speaking);

    // A short pause is part of the phrase
    assert!(!segmenter.process(&generate_silence(0.6)));
    assert_eq!(segmenter.state(), SegmenterState::Speaking);

    assert!(segmenter.process(&generate_silence(0.3)));
    assert_eq!(segmenter.state(), SegmenterState::Complete);
}

#[test]
fn test_speech_buffer_accumulation() {
    let mut segmenter = quiet_room_segmenter();

    let chunk1 = generate_sine_samples(440.0, 0.1, 0.3);
    segmenter.process(&chunk1);

    let chunk2 = generate_sine_samples(440.0, 0.1, 0.3);
    segmenter.process(&chunk2);

    assert_eq!(segmenter.buffered(), chunk1.len() + chunk2.len());
}

#[test]
fn test_take_phrase_resets() {
    let mut segmenter = quiet_room_segmenter();

    let speech = generate_sine_samples(440.0, 0.4, 0.3);
    segmenter.process(&speech);
    segmenter.process(&generate_silence(1.0));

    let phrase = segmenter.take_phrase();
    assert!(phrase.len() >= speech.len());

    assert_eq!(segmenter.state(), SegmenterState::Idle);
    assert_eq!(segmenter.buffered(), 0);
}

#[test]
fn test_noise_burst_is_discarded() {
    let mut segmenter = quiet_room_segmenter();

    segmenter.process(&generate_sine_samples(440.0, 0.1, 0.3));
    assert_eq!(segmenter.state(), SegmenterState::Speaking);

    assert!(!segmenter.process(&generate_silence(1.0)));
    assert_eq!(segmenter.state(), SegmenterState::Idle);
    assert_eq!(segmenter.buffered(), 0);
}

#[test]
fn test_phrase_time_limit() {
    let mut segmenter = quiet_room_segmenter();
    let limit = SegmentLimits::default().phrase_limit;

    let mut chunks = 0;
    while !segmenter.process(&generate_sine_samples(440.0, 0.5, 0.3)) {
        chunks += 1;
        assert!(chunks < 20, "phrase limit never reached");
    }

    let expected = (limit.as_secs_f32() * SAMPLE_RATE as f32) as usize;
    assert_eq!(segmenter.take_phrase().len(), expected);
}

#[test]
fn test_samples_to_wav() {
    let samples = generate_sine_samples(440.0, 0.1, 0.5);
    let wav_data = samples_to_wav(&samples, SAMPLE_RATE).unwrap();

    // Check WAV header magic
    assert_eq!(&wav_data[0..4], b"RIFF");
    assert_eq!(&wav_data[8..12], b"WAVE");

    // WAV header is 44 bytes
    assert!(wav_data.len() > 44);
}

#[test]
fn test_wav_readback() {
    let original_samples: Vec<f32> = vec![0.0, 0.5, -0.5, 1.0, -1.0, 0.25];
    let wav_data = samples_to_wav(&original_samples, SAMPLE_RATE).unwrap();

    let mut reader = hound::WavReader::new(Cursor::new(wav_data)).unwrap();

    let spec = reader.spec();
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 16);

    let read_samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(read_samples.len(), original_samples.len());
    assert_eq!(read_samples[3], i16::MAX);
}
