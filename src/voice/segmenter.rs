//! Utterance endpointing
//!
//! Splits a live sample stream into one spoken phrase using RMS energy: speech
//! begins when a chunk crosses the calibrated threshold and ends after a run
//! of silence or when the phrase time limit is reached.

use std::time::Duration;

use super::capture::rms;

/// Lowest energy threshold regardless of calibration
pub const ENERGY_FLOOR: f32 = 0.01;

/// Multiplier applied to ambient noise energy
const AMBIENT_MARGIN: f32 = 1.5;

/// State of the segmenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// Waiting for speech
    Idle,
    /// Speech started, accumulating
    Speaking,
    /// Phrase complete, buffer ready
    Complete,
}

/// Timing limits for one phrase
#[derive(Debug, Clone, Copy)]
pub struct SegmentLimits {
    /// Trailing silence that ends a phrase
    pub silence: Duration,
    /// Maximum phrase length
    pub phrase_limit: Duration,
    /// Speech shorter than this is treated as noise
    pub min_speech: Duration,
}

impl Default for SegmentLimits {
    fn default() -> Self {
        Self {
            silence: Duration::from_millis(800),
            phrase_limit: Duration::from_secs(5),
            min_speech: Duration::from_millis(300),
        }
    }
}

/// Detects the start and end of a spoken phrase
pub struct SpeechSegmenter {
    threshold: f32,
    silence_samples: usize,
    limit_samples: usize,
    min_speech_samples: usize,
    state: SegmenterState,
    buffer: Vec<f32>,
    silence_counter: usize,
}

impl SpeechSegmenter {
    /// Create a segmenter with a fixed energy threshold
    #[must_use]
    pub fn new(threshold: f32, sample_rate: u32, limits: SegmentLimits) -> Self {
        let samples = |d: Duration| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let n = (d.as_secs_f64() * f64::from(sample_rate)) as usize;
            n
        };

        Self {
            threshold: threshold.max(ENERGY_FLOOR),
            silence_samples: samples(limits.silence),
            limit_samples: samples(limits.phrase_limit),
            min_speech_samples: samples(limits.min_speech),
            state: SegmenterState::Idle,
            buffer: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Create a segmenter whose threshold is derived from ambient noise
    #[must_use]
    pub fn calibrated(ambient: &[f32], sample_rate: u32, limits: SegmentLimits) -> Self {
        let threshold = rms(ambient) * AMBIENT_MARGIN;
        tracing::debug!(threshold, "calibrated for ambient noise");
        Self::new(threshold, sample_rate, limits)
    }

    /// Feed a chunk of samples; returns true once a phrase is complete
    pub fn process(&mut self, samples: &[f32]) -> bool {
        if samples.is_empty() {
            return self.state == SegmenterState::Complete;
        }

        let energy = rms(samples);
        let is_speech = energy > self.threshold;

        match self.state {
            SegmenterState::Idle => {
                if is_speech {
                    self.state = SegmenterState::Speaking;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech detected");
                }
            }
            SegmenterState::Speaking => {
                self.buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                let spoken = self.buffer.len().saturating_sub(self.silence_counter);

                if self.buffer.len() >= self.limit_samples {
                    tracing::debug!(samples = self.buffer.len(), "phrase time limit reached");
                    self.buffer.truncate(self.limit_samples);
                    self.state = SegmenterState::Complete;
                } else if self.silence_counter > self.silence_samples {
                    if spoken >= self.min_speech_samples {
                        tracing::debug!(samples = self.buffer.len(), "phrase complete");
                        self.state = SegmenterState::Complete;
                    } else {
                        tracing::trace!("noise burst, resetting");
                        self.reset();
                    }
                }
            }
            SegmenterState::Complete => {}
        }

        self.state == SegmenterState::Complete
    }

    /// Take the captured phrase and reset to idle
    pub fn take_phrase(&mut self) -> Vec<f32> {
        let phrase = std::mem::take(&mut self.buffer);
        self.reset();
        phrase
    }

    /// Reset to idle
    pub fn reset(&mut self) {
        self.state = SegmenterState::Idle;
        self.buffer.clear();
        self.silence_counter = 0;
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> SegmenterState {
        self.state
    }

    /// Energy threshold in use
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Samples accumulated so far
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}
