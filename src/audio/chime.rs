use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use std::f32::consts::PI;
use std::thread;

const SAMPLE_RATE: u32 = 44100;
const DURATION_SECONDS: f32 = 0.8;
const GLIDE_SECONDS: f32 = 0.4; // Pitch rises for the first half, then holds
const START_FREQ: f32 = 880.0; // A5
const END_FREQ: f32 = 1320.0;
const PEAK_GAIN: f32 = 0.5;
const FLOOR_GAIN: f32 = 0.01;

/// Synthesize the end-of-interval tone: a sine gliding up a fifth with an
/// exponential decay, so it rings rather than cuts off.
fn chime_samples() -> Vec<f32> {
    let total = (SAMPLE_RATE as f32 * DURATION_SECONDS) as usize;
    let dt = 1.0 / SAMPLE_RATE as f32;
    let mut samples = Vec::with_capacity(total);
    let mut angle = 0.0f32;

    for i in 0..total {
        let t = i as f32 * dt;
        let freq = if t < GLIDE_SECONDS {
            START_FREQ * (END_FREQ / START_FREQ).powf(t / GLIDE_SECONDS)
        } else {
            END_FREQ
        };
        let gain = PEAK_GAIN * (FLOOR_GAIN / PEAK_GAIN).powf(t / DURATION_SECONDS);
        samples.push(angle.sin() * gain);
        angle += 2.0 * PI * freq * dt;
    }

    samples
}

/// Play the completion chime, fire-and-forget.
///
/// Sound is best-effort: a missing output device or a sink failure is
/// logged and swallowed, the timer never waits on or observes playback.
pub fn play_completion_chime() {
    thread::spawn(|| {
        if let Err(e) = play_blocking() {
            eprintln!("Failed to play chime: {}", e);
        }
    });
}

fn play_blocking() -> Result<(), Box<dyn std::error::Error>> {
    let (_stream, stream_handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&stream_handle)?;
    sink.append(SamplesBuffer::new(1, SAMPLE_RATE, chime_samples()));
    sink.sleep_until_end();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chime_length_matches_duration() {
        let samples = chime_samples();
        assert_eq!(samples.len(), (44100.0 * 0.8) as usize);
    }

    #[test]
    fn test_chime_starts_silent_and_stays_within_peak() {
        let samples = chime_samples();
        assert_eq!(samples[0], 0.0);
        assert!(samples.iter().all(|s| s.abs() <= PEAK_GAIN));
    }

    #[test]
    fn test_chime_envelope_decays() {
        let samples = chime_samples();
        let tenth = samples.len() / 10;
        let head_peak = samples[..tenth]
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        let tail_peak = samples[samples.len() - tenth..]
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(head_peak > 0.3, "head peak {}", head_peak);
        assert!(tail_peak < 0.02, "tail peak {}", tail_peak);
    }
}
