use std::path::Path;

use error_stack::{IntoReport, Result, ResultExt};
use log::{info, warn};
use piano_overlay::config::PianoConfig;
use piano_overlay::error::OverlayError;
use piano_overlay::session::{driver::SessionDriver, PianoSession};
use piano_overlay::transport::{replay::JsonLinesSource, FrameSource, FrameThrottle};
use tokio::time::{interval, MissedTickBehavior};

use super::{log_events, write_svg, CanvasArgs};

pub async fn run_replay(
  config: &PianoConfig,
  canvas: &CanvasArgs,
  frames: &Path,
  output: Option<&Path>,
  realtime: bool,
) -> Result<(), OverlayError> {
  let mut source = JsonLinesSource::open(frames)?;
  let session = PianoSession::new(config)?;

  let (driver, events, f) = SessionDriver::new(session, canvas.svg_surface());
  let driver_task = tokio::spawn(f);
  let listener = tokio::spawn(log_events(events));

  let mut ticker = realtime.then(|| {
    let mut t = interval(FrameThrottle::new(config.target_fps).interval());
    t.set_missed_tick_behavior(MissedTickBehavior::Delay);
    t
  });

  while let Some(payload) = source.next_payload() {
    if let Some(t) = ticker.as_mut() {
      t.tick().await;
    }
    driver.submit_frame(payload).await?;
  }

  // let the loop drain the queued frames before it exits
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
    "replayed {} frames from {}: {} notes played, {} octave changes",
    summary.frames,
    frames.display(),
    summary.notes_played,
    summary.octave_changes
  );
  if source.skipped() > 0 {
    warn!("{} lines could not be decoded", source.skipped());
  }

  match output {
    Some(path) => write_svg(&surface, Some(path)),
    None => Ok(()),
  }
}
