//! Where frame payloads come from, and how fast frames are sent out for processing.
pub mod replay;
pub mod simulated;

use std::time::{Duration, Instant};

use crate::payload::FramePayload;

/// Frames per second sent to the hand tracker.
pub const DEFAULT_TARGET_FPS: u32 = 15;

/// Anything that produces frame results: a live connection to the hand tracker,
/// a recording, or a simulator.
pub trait FrameSource {
  /// Returns the next frame result, or `None` once the source is exhausted.
  fn next_payload(&mut self) -> Option<FramePayload>;
}

impl<I: Iterator<Item = FramePayload>> FrameSource for std::iter::Fuse<I> {
  fn next_payload(&mut self) -> Option<FramePayload> {
    self.next()
  }
}

/// Caps the rate at which camera frames are forwarded to the hand tracker.
///
/// The camera delivers frames faster than the tracker can process them; frames arriving
/// less than one interval after the last admitted frame are dropped.
#[derive(Debug, Clone)]
pub struct FrameThrottle {
  interval: Duration,
  last_admitted: Option<Instant>,
}

impl FrameThrottle {
  /// `target_fps` of 0 is treated as 1.
  pub fn new(target_fps: u32) -> FrameThrottle {
    let fps = target_fps.max(1);
    FrameThrottle {
      interval: Duration::from_secs_f64(1.0 / fps as f64),
      last_admitted: None,
    }
  }

  pub fn interval(&self) -> Duration {
    self.interval
  }

  /// Returns true if a frame captured at `now` should be sent.
  pub fn admit(&mut self, now: Instant) -> bool {
    if let Some(last) = self.last_admitted {
      if now.saturating_duration_since(last) < self.interval {
        return false;
      }
    }
    self.last_admitted = Some(now);
    true
  }
}

impl Default for FrameThrottle {
  fn default() -> Self {
    FrameThrottle::new(DEFAULT_TARGET_FPS)
  }
}
