use std::path::Path;
use std::time::Duration;

use error_stack::{IntoReport, Result, ResultExt};
use log::{debug, info};
use piano_overlay::config::PianoConfig;
use piano_overlay::error::OverlayError;
use piano_overlay::session::{driver::SessionDriver, PianoSession};
use piano_overlay::transport::{simulated::SimulatedHandTracker, FrameSource, FrameThrottle};
use tokio::time::{interval, Instant, MissedTickBehavior};

use super::{log_events, write_svg, CanvasArgs};

/// How often the simulated camera captures a frame.
const CAMERA_FRAME_INTERVAL: Duration = Duration::from_millis(33);

pub async fn run_demo(
  config: &PianoConfig,
  canvas: &CanvasArgs,
  frames: usize,
  seed: u64,
  output: Option<&Path>,
) -> Result<(), OverlayError> {
  let session = PianoSession::new(config)?;
  let mut throttle = FrameThrottle::new(config.target_fps);
  // admitted frames are at least one throttle interval apart, so the simulated clock
  // never runs ahead of the session's
  let mut tracker = SimulatedHandTracker::new(config.navigation_state()?, seed)
    .with_timing(throttle.interval(), config.gesture_cooldown());

  let (driver, events, f) = SessionDriver::new(session, canvas.svg_surface());
  let driver_task = tokio::spawn(f);
  let listener = tokio::spawn(log_events(events));

  info!(
    "simulating {} camera frames, sending at most {} per second",
    frames, config.target_fps
  );

  let mut camera = interval(CAMERA_FRAME_INTERVAL);
  camera.set_missed_tick_behavior(MissedTickBehavior::Skip);
  let mut dropped = 0;
  for _ in 0..frames {
    camera.tick().await;
    if !throttle.admit(Instant::now().into_std()) {
      dropped += 1;
      continue;
    }

    // the simulated tracker only does work for frames that were actually sent
    match tracker.next_payload() {
      Some(payload) => driver.submit_frame(payload).await?,
      None => break,
    }
  }
  debug!("throttle dropped {} camera frames", dropped);

  drop(driver);
  let surface = driver_task
    .await
    .into_report()
    .change_context(OverlayError::SessionClosed)?;
  let summary = listener
    .await
    .into_report()
    .change_context(OverlayError::SessionClosed)?;

  info!(
    "demo finished after {} frames: {} notes played, {} octave changes",
    summary.frames, summary.notes_played, summary.octave_changes
  );

  match output {
    Some(path) => write_svg(&surface, Some(path)),
    None => Ok(()),
  }
}
