//! Output device thread

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use stemdeck_audio::DeckRenderer;

/// Scratch for devices that are not stereo (8192 frames)
const SCRATCH_LEN: usize = 16384;

/// Open the default output device, report its sample rate, then play
/// whatever the renderer produces until `shutdown` is set
///
/// The device is opened first because stems are resampled to its rate
/// before the renderer exists.
pub fn run_audio_thread(
    rate_tx: Sender<Result<u32, String>>,
    renderer_rx: Receiver<DeckRenderer>,
    shutdown: Arc<AtomicBool>,
) {
    let host = cpal::default_host();
    let Some(device) = host.default_output_device() else {
        let _ = rate_tx.send(Err("No audio output device found".into()));
        return;
    };

    let config = match device.default_output_config() {
        Ok(c) => c,
        Err(e) => {
            let _ = rate_tx.send(Err(format!("Failed to get audio config: {}", e)));
            return;
        }
    };

    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;
    tracing::info!(
        device = %device.name().unwrap_or_default(),
        sample_rate,
        channels,
        "audio device opened"
    );
    if rate_tx.send(Ok(sample_rate)).is_err() {
        return;
    }

    // Session setup failed or the app quit before starting
    let Ok(renderer) = renderer_rx.recv() else {
        return;
    };

    // Pre-allocated so the callback never allocates
    let mut scratch = vec![0.0f32; SCRATCH_LEN];

    let stream = device.build_output_stream(
        &config.into(),
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            if channels == 2 {
                renderer.process(data);
                return;
            }

            let frames = data.len() / channels.max(1);
            let Some(stereo) = scratch.get_mut(..frames * 2) else {
                data.fill(0.0);
                return;
            };
            renderer.process(stereo);
            fold_stereo(stereo, data, channels);
        },
        |err| {
            tracing::error!(error = %err, "audio stream error");
        },
        None,
    );

    let stream = match stream {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to create audio stream");
            return;
        }
    };

    if let Err(e) = stream.play() {
        tracing::error!(error = %e, "failed to start audio");
        return;
    }

    while !shutdown.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(10));
    }
    tracing::info!("audio thread stopped");
}

/// Map interleaved stereo onto a device with `channels` outputs
///
/// Mono gets the average; wider layouts get left/right on the first two
/// outputs and silence elsewhere.
fn fold_stereo(stereo: &[f32], out: &mut [f32], channels: usize) {
    if channels == 0 {
        return;
    }
    for (frame, pair) in out.chunks_mut(channels).zip(stereo.chunks(2)) {
        if channels == 1 {
            frame[0] = (pair[0] + pair[1]) * 0.5;
            continue;
        }
        frame.fill(0.0);
        frame[0] = pair[0];
        frame[1] = pair[1];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_to_mono() {
        let stereo = [1.0, 0.0, 0.5, 0.5];
        let mut out = [9.0; 2];
        fold_stereo(&stereo, &mut out, 1);
        assert_eq!(out, [0.5, 0.5]);
    }

    #[test]
    fn test_fold_to_surround() {
        let stereo = [0.25, -0.25];
        let mut out = [9.0; 4];
        fold_stereo(&stereo, &mut out, 4);
        assert_eq!(out, [0.25, -0.25, 0.0, 0.0]);
    }
}
