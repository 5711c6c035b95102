use std::time::{Duration, Instant};

use log::{debug, info};

use crate::keyboard::octave::NavigationState;
use crate::payload::{Direction, FramePayload};

/// Minimum time between two applied navigation gestures.
pub const DEFAULT_GESTURE_COOLDOWN: Duration = Duration::from_millis(1000);

/// How long the directional indicator stays lit after a gesture fires.
pub const INDICATOR_DURATION: Duration = Duration::from_millis(500);

/// How long the "moving to ..." help text stays up after a gesture fires.
pub const HELP_TEXT_DURATION: Duration = Duration::from_millis(2000);

pub const DEFAULT_HELP_TEXT: &str = "Point left or right to change octaves";

/// A navigation gesture that made it through the debouncer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedGesture {
  pub direction: Direction,
  pub previous_offset: u8,
  pub new_offset: u8,
}

impl AppliedGesture {
  /// False when the gesture fired but the window was already at the edge.
  pub fn moved(&self) -> bool {
    self.previous_offset != self.new_offset
  }
}

/// Rate-limits navigation gestures coming from the hand tracker.
///
/// The tracker reports a pointing gesture on every frame the hand holds it, so without
/// a cooldown a single point would scroll through the whole range.
#[derive(Debug, Clone)]
pub struct GestureDebouncer {
  cooldown: Duration,
  last_applied: Option<Instant>,
}

impl Default for GestureDebouncer {
  fn default() -> Self {
    GestureDebouncer::new(DEFAULT_GESTURE_COOLDOWN)
  }
}

impl GestureDebouncer {
  pub fn new(cooldown: Duration) -> GestureDebouncer {
    GestureDebouncer {
      cooldown,
      last_applied: None,
    }
  }

  pub fn cooldown(&self) -> Duration {
    self.cooldown
  }

  /// Applies the payload's navigation gesture to `nav`, unless there isn't one or the
  /// previous gesture was applied less than one cooldown ago.
  ///
  /// A gesture flagged as an octave change that carries an explicit target offset jumps
  /// straight to that offset (clamped to the valid range). Anything else steps one
  /// octave in the gesture's direction.
  pub fn maybe_apply(
    &mut self,
    payload: &FramePayload,
    nav: &mut NavigationState,
    now: Instant,
  ) -> Option<AppliedGesture> {
    let gesture = payload.navigation?;

    if let Some(last) = self.last_applied {
      let elapsed = now.saturating_duration_since(last);
      if elapsed < self.cooldown {
        debug!(
          "ignoring {} gesture, {}ms into {}ms cooldown",
          gesture.direction.as_str(),
          elapsed.as_millis(),
          self.cooldown.as_millis()
        );
        return None;
      }
    }
    self.last_applied = Some(now);

    let previous_offset = nav.offset();
    match (gesture.octave_change, gesture.new_octave_offset) {
      (true, Some(target)) => {
        nav.set_offset(target);
      }
      _ => match gesture.direction {
        Direction::Left => {
          nav.go_previous();
        }
        Direction::Right => {
          nav.go_next();
        }
      },
    }

    let applied = AppliedGesture {
      direction: gesture.direction,
      previous_offset,
      new_offset: nav.offset(),
    };
    info!(
      "applied {} gesture: octave offset {} -> {}",
      applied.direction.as_str(),
      applied.previous_offset,
      applied.new_offset
    );
    Some(applied)
  }
}

/// Transient on-screen acknowledgement of the last gesture: a directional
/// indicator and a help text line, each with its own expiry.
#[derive(Debug, Clone, Default)]
pub struct GestureFeedback {
  last: Option<(Direction, Instant)>,
}

impl GestureFeedback {
  pub fn new() -> GestureFeedback {
    GestureFeedback::default()
  }

  pub fn trigger(&mut self, direction: Direction, now: Instant) {
    self.last = Some((direction, now));
  }

  /// The direction whose indicator should be highlighted at `now`, if any.
  pub fn highlighted(&self, now: Instant) -> Option<Direction> {
    match self.last {
      Some((dir, at)) if now.saturating_duration_since(at) < INDICATOR_DURATION => Some(dir),
      _ => None,
    }
  }

  pub fn help_text(&self, now: Instant) -> &'static str {
    match self.last {
      Some((Direction::Left, at)) if now.saturating_duration_since(at) < HELP_TEXT_DURATION => {
        "Moving to the previous octave..."
      }
      Some((Direction::Right, at)) if now.saturating_duration_since(at) < HELP_TEXT_DURATION => {
        "Moving to the next octave..."
      }
      _ => DEFAULT_HELP_TEXT,
    }
  }

  /// The next instant at which the feedback changes on its own, if any.
  pub fn next_expiry(&self, now: Instant) -> Option<Instant> {
    let (_, at) = self.last?;
    [at + INDICATOR_DURATION, at + HELP_TEXT_DURATION]
      .into_iter()
      .find(|deadline| *deadline > now)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::keyboard::octave::OctaveRange;
  use crate::payload::NavigationGesture;

  fn gesture(direction: Direction) -> FramePayload {
    FramePayload {
      hand_detected: true,
      hands_count: 1,
      active_notes: vec![],
      navigation: Some(NavigationGesture {
        direction,
        octave_change: false,
        new_octave_offset: None,
      }),
    }
  }

  fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
  }

  #[test]
  fn payload_without_gesture_is_ignored() {
    let mut debouncer = GestureDebouncer::default();
    let mut nav = NavigationState::new(OctaveRange::default());
    let now = Instant::now();

    assert_eq!(debouncer.maybe_apply(&FramePayload::idle(), &mut nav, now), None);
    assert_eq!(nav.offset(), 0);

    // an ignored payload doesn't start the cooldown
    assert!(debouncer
      .maybe_apply(&gesture(Direction::Right), &mut nav, now + ms(10))
      .is_some());
  }

  #[test]
  fn gestures_inside_cooldown_are_rejected() {
    let mut debouncer = GestureDebouncer::new(ms(1000));
    let mut nav = NavigationState::new(OctaveRange::default());
    let t = Instant::now();
    let right = gesture(Direction::Right);

    let first = debouncer.maybe_apply(&right, &mut nav, t).unwrap();
    assert_eq!((first.previous_offset, first.new_offset), (0, 1));

    assert_eq!(debouncer.maybe_apply(&right, &mut nav, t + ms(200)), None);
    assert_eq!(nav.offset(), 1);

    let third = debouncer.maybe_apply(&right, &mut nav, t + ms(1100)).unwrap();
    assert_eq!((third.previous_offset, third.new_offset), (1, 2));
  }

  #[test]
  fn cooldown_is_measured_from_last_applied_gesture() {
    let mut debouncer = GestureDebouncer::new(ms(1000));
    let mut nav = NavigationState::new(OctaveRange::default());
    let t = Instant::now();
    let right = gesture(Direction::Right);

    debouncer.maybe_apply(&right, &mut nav, t).unwrap();
    // rejected gestures don't push the window back
    assert!(debouncer.maybe_apply(&right, &mut nav, t + ms(900)).is_none());
    assert!(debouncer.maybe_apply(&right, &mut nav, t + ms(1000)).is_some());
  }

  #[test]
  fn direction_steps_when_no_explicit_offset() {
    let mut debouncer = GestureDebouncer::new(Duration::ZERO);
    let mut nav = NavigationState::with_offset(OctaveRange::default(), 1);
    let t = Instant::now();

    let applied = debouncer
      .maybe_apply(&gesture(Direction::Left), &mut nav, t)
      .unwrap();
    assert_eq!(applied.direction, Direction::Left);
    assert_eq!(nav.offset(), 0);

    // at the bottom edge, the gesture still fires but doesn't move
    let applied = debouncer
      .maybe_apply(&gesture(Direction::Left), &mut nav, t + ms(1))
      .unwrap();
    assert!(!applied.moved());
    assert_eq!(nav.offset(), 0);
  }

  #[test]
  fn explicit_offset_is_used_for_octave_change() {
    let mut debouncer = GestureDebouncer::default();
    let mut nav = NavigationState::new(OctaveRange::default());
    let mut payload = gesture(Direction::Right);
    payload.navigation = Some(NavigationGesture {
      direction: Direction::Right,
      octave_change: true,
      new_octave_offset: Some(2),
    });

    let applied = debouncer
      .maybe_apply(&payload, &mut nav, Instant::now())
      .unwrap();
    assert_eq!(applied.new_offset, 2);
    assert_eq!(nav.offset(), 2);
  }

  #[test]
  fn explicit_offset_out_of_range_is_clamped() {
    let mut debouncer = GestureDebouncer::default();
    let mut nav = NavigationState::new(OctaveRange::default());
    let mut payload = gesture(Direction::Right);
    payload.navigation = Some(NavigationGesture {
      direction: Direction::Right,
      octave_change: true,
      new_octave_offset: Some(9),
    });

    debouncer.maybe_apply(&payload, &mut nav, Instant::now());
    assert_eq!(nav.offset(), 2);
  }

  #[test]
  fn feedback_expires_indicator_before_help_text() {
    let mut feedback = GestureFeedback::new();
    let t = Instant::now();
    assert_eq!(feedback.highlighted(t), None);
    assert_eq!(feedback.help_text(t), DEFAULT_HELP_TEXT);
    assert_eq!(feedback.next_expiry(t), None);

    feedback.trigger(Direction::Left, t);
    assert_eq!(feedback.highlighted(t + ms(100)), Some(Direction::Left));
    assert_eq!(feedback.help_text(t + ms(100)), "Moving to the previous octave...");
    assert_eq!(feedback.next_expiry(t + ms(100)), Some(t + ms(500)));

    assert_eq!(feedback.highlighted(t + ms(600)), None);
    assert_eq!(feedback.help_text(t + ms(600)), "Moving to the previous octave...");
    assert_eq!(feedback.next_expiry(t + ms(600)), Some(t + ms(2000)));

    assert_eq!(feedback.help_text(t + ms(2000)), DEFAULT_HELP_TEXT);
    assert_eq!(feedback.next_expiry(t + ms(2000)), None);
  }
}
