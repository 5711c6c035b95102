//! Per-session glue: turns a stream of frame payloads into rendered frames.
//!
//! [`PianoSession`] is the synchronous core, called once per frame result. The
//! [`driver`] module wraps it in a tokio task that receives frames over a channel.

pub mod driver;
pub mod tracker;

use std::time::Instant;

use error_stack::Result;
use log::debug;

use self::tracker::{active_notes_display, NoteOnset, NoteTracker};
use crate::config::PianoConfig;
use crate::drawing::RenderSurface;
use crate::error::OverlayError;
use crate::gesture::{AppliedGesture, GestureDebouncer, GestureFeedback};
use crate::keyboard::octave::{NavigationState, OctaveStatus};
use crate::payload::FramePayload;
use crate::render::KeyboardRenderer;

/// What happened while handling one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
  pub gesture: Option<AppliedGesture>,
  pub onsets: Vec<NoteOnset>,
  /// The "now playing" line, e.g. `DO4 + MI4`.
  pub notes_display: String,
  pub status: OctaveStatus,
}

pub struct PianoSession {
  nav: NavigationState,
  debouncer: GestureDebouncer,
  feedback: GestureFeedback,
  tracker: NoteTracker,
  renderer: KeyboardRenderer,
  last_payload: FramePayload,
}

impl PianoSession {
  pub fn new(config: &PianoConfig) -> Result<PianoSession, OverlayError> {
    let nav = config.navigation_state()?;
    debug!("starting piano session, {}", nav.status());
    Ok(PianoSession {
      nav,
      debouncer: GestureDebouncer::new(config.gesture_cooldown()),
      feedback: GestureFeedback::new(),
      tracker: NoteTracker::new(config.note_debounce()),
      renderer: KeyboardRenderer::new(),
      last_payload: FramePayload::idle(),
    })
  }

  pub fn navigation(&self) -> &NavigationState {
    &self.nav
  }

  pub fn feedback(&self) -> &GestureFeedback {
    &self.feedback
  }

  pub fn octave_status(&self) -> OctaveStatus {
    self.nav.status()
  }

  /// Handles one frame result from the hand tracker: applies any navigation gesture,
  /// redraws the keyboard for the (possibly moved) octave window, then reports which
  /// notes started sounding.
  pub fn handle_frame(
    &mut self,
    surface: &mut dyn RenderSurface,
    payload: FramePayload,
    now: Instant,
  ) -> FrameOutcome {
    let gesture = self.debouncer.maybe_apply(&payload, &mut self.nav, now);
    if let Some(g) = gesture {
      self.feedback.trigger(g.direction, now);
    }

    self.renderer.render(surface, &self.nav, &payload);

    let onsets = self.tracker.update(&payload.active_notes, now);
    let notes_display = active_notes_display(&payload.active_notes);
    self.last_payload = payload;

    FrameOutcome {
      gesture,
      onsets,
      notes_display,
      status: self.nav.status(),
    }
  }

  /// Draws the most recent frame again, e.g. after the surface was resized.
  pub fn redraw(&self, surface: &mut dyn RenderSurface) {
    self.renderer.render(surface, &self.nav, &self.last_payload);
  }

  /// Moves the window down an octave (the "previous" button) and redraws in the idle state.
  pub fn go_previous(&mut self, surface: &mut dyn RenderSurface) -> bool {
    let moved = self.nav.go_previous();
    self.show_idle(surface);
    moved
  }

  /// Moves the window up an octave (the "next" button) and redraws in the idle state.
  pub fn go_next(&mut self, surface: &mut dyn RenderSurface) -> bool {
    let moved = self.nav.go_next();
    self.show_idle(surface);
    moved
  }

  fn show_idle(&mut self, surface: &mut dyn RenderSurface) {
    self.last_payload = FramePayload::idle();
    self.tracker.reset();
    self.renderer.render(surface, &self.nav, &self.last_payload);
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;
  use crate::drawing::recording::RecordingSurface;
  use crate::payload::{decode_payload, Direction};
  use crate::render::IDLE_STATUS;

  fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
  }

  #[test]
  fn gesture_moves_window_before_rendering() {
    let mut session = PianoSession::new(&PianoConfig::default()).unwrap();
    let mut surface = RecordingSurface::new(1280.0, 720.0);
    let payload =
      decode_payload(r#"{"hand_detected": true, "hands_count": 1, "navigation": {"direction": "right"}}"#)
        .unwrap();

    let t = Instant::now();
    let outcome = session.handle_frame(&mut surface, payload, t);
    let gesture = outcome.gesture.unwrap();
    assert_eq!(gesture.direction, Direction::Right);
    assert_eq!(outcome.status.offset, 1);
    assert!(surface.texts().contains(&"Octaves: 3-5"));
    assert_eq!(session.feedback().highlighted(t + ms(100)), Some(Direction::Right));
  }

  #[test]
  fn repeated_gesture_frames_move_once_per_cooldown() {
    let mut session = PianoSession::new(&PianoConfig::default()).unwrap();
    let mut surface = RecordingSurface::new(1280.0, 720.0);
    let payload =
      decode_payload(r#"{"hand_detected": true, "navigation": {"direction": "right"}}"#).unwrap();

    let t = Instant::now();
    for i in 0..15 {
      session.handle_frame(&mut surface, payload.clone(), t + ms(i * 66));
    }
    assert_eq!(session.navigation().offset(), 1);
  }

  #[test]
  fn note_onsets_and_display() {
    let mut session = PianoSession::new(&PianoConfig::default()).unwrap();
    let mut surface = RecordingSurface::new(1280.0, 720.0);
    let payload = decode_payload(
      r#"{"hand_detected": true, "hands_count": 1, "active_notes": [
        {"note": "DO4", "finger": "index", "hand": "Right"},
        {"note": "MI4", "finger": "middle", "hand": "Right"}
      ]}"#,
    )
    .unwrap();

    let t = Instant::now();
    let first = session.handle_frame(&mut surface, payload.clone(), t);
    assert_eq!(first.onsets.len(), 2);
    assert_eq!(first.notes_display, "DO4 + MI4");

    let second = session.handle_frame(&mut surface, payload, t + ms(66));
    assert!(second.onsets.is_empty());

    let idle = session.handle_frame(&mut surface, FramePayload::idle(), t + ms(133));
    assert_eq!(idle.notes_display, "-");
  }

  #[test]
  fn navigation_buttons_redraw_idle() {
    let mut session = PianoSession::new(&PianoConfig::default()).unwrap();
    let mut surface = RecordingSurface::new(1280.0, 720.0);

    assert!(!session.go_previous(&mut surface));
    assert!(session.go_next(&mut surface));
    assert!(session.go_next(&mut surface));
    assert!(!session.go_next(&mut surface));

    let texts = surface.texts();
    assert!(texts.contains(&IDLE_STATUS));
    assert!(texts.contains(&"Octaves: 4-6"));
    assert_eq!(session.octave_status().to_string(), "Octaves: 4-6 of 2-6");
  }

  #[test]
  fn redraw_repeats_last_frame() {
    let mut session = PianoSession::new(&PianoConfig::default()).unwrap();
    let mut surface = RecordingSurface::new(1280.0, 720.0);
    let payload = decode_payload(
      r#"{"hand_detected": true, "active_notes": [{"note": "LA3", "finger": "ring", "hand": "Left"}]}"#,
    )
    .unwrap();
    session.handle_frame(&mut surface, payload, Instant::now());

    let mut resized = RecordingSurface::new(640.0, 360.0);
    session.redraw(&mut resized);
    assert!(resized.texts().contains(&"Note: LA3"));
  }
}
