use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{FrameSource, FrameThrottle};
use crate::gesture::DEFAULT_GESTURE_COOLDOWN;
use crate::keyboard::layout::{compute_layout, BAND_HEIGHT_FRACTION, BAND_TOP_FRACTION};
use crate::keyboard::octave::NavigationState;
use crate::payload::{ActiveNote, Direction, FramePayload, NavigationGesture, NormalizedPosition};

const FINGERS: [&str; 5] = ["thumb", "index", "middle", "ring", "pinky"];

/// Chance per frame that the hand leaves / re-enters the camera's view.
const VISIBILITY_FLIP_CHANCE: f64 = 0.02;

/// Chance per frame of a pointing gesture while the hand is in view.
const GESTURE_CHANCE: f64 = 0.015;

#[derive(Debug, Clone)]
struct Fingertip {
  name: &'static str,
  x: f64,
  y: f64,
}

/// Produces plausible frame results without a camera: one right hand drifting over
/// the keyboard, raising and lowering fingers, and now and then pointing left or right.
///
/// Like the real tracker, it keeps its own copy of the octave window so fingertips map
/// to the notes currently on screen, and it reports the target offset of each gesture.
/// It also honors the same gesture cooldown as the session, on a clock that advances one
/// frame interval per frame, so its window never runs ahead of the one on screen.
pub struct SimulatedHandTracker {
  rng: StdRng,
  nav: NavigationState,
  fingertips: Vec<Fingertip>,
  hand_visible: bool,
  frames_left: Option<usize>,
  frame_interval: Duration,
  gesture_cooldown: Duration,
  clock: Duration,
  last_gesture: Option<Duration>,
}

impl SimulatedHandTracker {
  pub fn new(nav: NavigationState, seed: u64) -> SimulatedHandTracker {
    let mut rng = StdRng::seed_from_u64(seed);
    let hand_x = rng.gen_range(0.2..0.8);
    let fingertips = FINGERS
      .iter()
      .enumerate()
      .map(|(i, name)| Fingertip {
        name: *name,
        x: (hand_x + (i as f64 - 2.0) * 0.04).clamp(0.0, 1.0),
        y: rng.gen_range(0.3..0.6),
      })
      .collect();

    SimulatedHandTracker {
      rng,
      nav,
      fingertips,
      hand_visible: true,
      frames_left: None,
      frame_interval: FrameThrottle::default().interval(),
      gesture_cooldown: DEFAULT_GESTURE_COOLDOWN,
      clock: Duration::ZERO,
      last_gesture: None,
    }
  }

  /// Sets the time between produced frames and the minimum time between gestures.
  /// These should match the rate frames are sent at and the session's cooldown.
  pub fn with_timing(mut self, frame_interval: Duration, gesture_cooldown: Duration) -> Self {
    self.frame_interval = frame_interval;
    self.gesture_cooldown = gesture_cooldown;
    self
  }

  /// Stops producing frames after `n` more.
  pub fn with_frame_limit(mut self, n: usize) -> Self {
    self.frames_left = Some(n);
    self
  }

  pub fn navigation(&self) -> &NavigationState {
    &self.nav
  }

  fn step_fingers(&mut self) {
    let drift = self.rng.gen_range(-0.01..0.01);
    for tip in self.fingertips.iter_mut() {
      tip.x = (tip.x + drift).clamp(0.0, 0.999);
      tip.y = (tip.y + self.rng.gen_range(-0.05..0.05)).clamp(0.0, 0.7);
    }
  }

  fn active_notes(&self) -> Vec<ActiveNote> {
    // the mapping only depends on normalized coordinates, so any positive canvas size works
    let layout = compute_layout(1.0, 1.0, &self.nav);
    let band_bottom = BAND_TOP_FRACTION + BAND_HEIGHT_FRACTION;

    self
      .fingertips
      .iter()
      .filter(|tip| tip.y >= BAND_TOP_FRACTION && tip.y <= band_bottom)
      .filter_map(|tip| {
        let key = layout.key_at_normalized(tip.x, tip.y)?;
        Some(ActiveNote {
          note: key.identity(),
          finger: tip.name.to_string(),
          hand: "Right".to_string(),
          position: Some(NormalizedPosition { x: tip.x, y: tip.y }),
        })
      })
      .collect()
  }

  fn maybe_gesture(&mut self) -> Option<NavigationGesture> {
    if !self.rng.gen_bool(GESTURE_CHANCE) {
      return None;
    }
    if let Some(last) = self.last_gesture {
      if self.clock.saturating_sub(last) < self.gesture_cooldown {
        return None;
      }
    }
    self.last_gesture = Some(self.clock);

    let direction = if self.rng.gen_bool(0.5) {
      Direction::Left
    } else {
      Direction::Right
    };
    let octave_change = match direction {
      Direction::Left => self.nav.go_previous(),
      Direction::Right => self.nav.go_next(),
    };
    Some(NavigationGesture {
      direction,
      octave_change,
      new_octave_offset: Some(self.nav.offset()),
    })
  }

  fn next_frame(&mut self) -> FramePayload {
    if self.rng.gen_bool(VISIBILITY_FLIP_CHANCE) {
      self.hand_visible = !self.hand_visible;
    }
    if !self.hand_visible {
      return FramePayload::idle();
    }

    self.step_fingers();
    let navigation = self.maybe_gesture();
    FramePayload {
      hand_detected: true,
      hands_count: 1,
      active_notes: self.active_notes(),
      navigation,
    }
  }
}

impl FrameSource for SimulatedHandTracker {
  fn next_payload(&mut self) -> Option<FramePayload> {
    if let Some(n) = self.frames_left.as_mut() {
      if *n == 0 {
        return None;
      }
      *n -= 1;
    }

    let payload = self.next_frame();
    self.clock += self.frame_interval;
    Some(payload)
  }
}
