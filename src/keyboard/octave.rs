//! The octave window: which slice of the instrument's full range is currently on screen.
//!
//! The instrument spans `min..=max` octaves, but only `visible` of them are drawn at once.
//! The window's position is an offset from `min`, and moves one octave at a time when the
//! user presses the previous / next buttons or points left / right.
//!
//!   min                               max
//!    2      3      4      5      6
//!   [=====================]               offset 0 -> octaves 2-4
//!          [=====================]        offset 1 -> octaves 3-5
//!                 [=====================] offset 2 -> octaves 4-6

use std::fmt::Display;

use error_stack::{report, Result};
use log::{debug, warn};

use super::notes::Octave;
use crate::error::OverlayError;

/// Immutable description of the instrument's octave range and how much of it is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OctaveRange {
  min: u8,
  max: u8,
  visible: u8,
  total: u8,
}

impl OctaveRange {
  /// Creates a range whose total octave count is derived from `min` and `max`.
  pub fn new(min: u8, max: u8, visible: u8) -> Result<OctaveRange, OverlayError> {
    let total = max.saturating_sub(min).saturating_add(1);
    Self::with_total(min, max, visible, total)
  }

  /// Creates a range with an explicitly configured total octave count.
  pub fn with_total(min: u8, max: u8, visible: u8, total: u8) -> Result<OctaveRange, OverlayError> {
    let invalid = |msg: String| report!(OverlayError::InvalidOctaveRange(msg));

    if Octave::new(min).is_none() {
      return Err(invalid(format!("min octave {min} out of range")));
    }
    if Octave::new(max).is_none() {
      return Err(invalid(format!("max octave {max} out of range")));
    }

    if min > max {
      return Err(invalid(format!("min octave {min} is above max octave {max}")));
    }
    if visible == 0 {
      return Err(invalid("at least one octave must be visible".to_string()));
    }
    if total == 0 {
      return Err(invalid("total octave count must be at least 1".to_string()));
    }
    if visible > total {
      return Err(invalid(format!(
        "{visible} visible octaves requested, but the range only has {total}"
      )));
    }

    Ok(OctaveRange {
      min,
      max,
      visible,
      total,
    })
  }

  pub fn min(&self) -> u8 {
    self.min
  }

  pub fn max(&self) -> u8 {
    self.max
  }

  pub fn visible(&self) -> u8 {
    self.visible
  }

  pub fn total(&self) -> u8 {
    self.total
  }

  /// The largest offset that keeps the whole window inside the range.
  pub fn max_offset(&self) -> u8 {
    self.total - self.visible
  }
}

impl Default for OctaveRange {
  fn default() -> Self {
    OctaveRange {
      min: 2,
      max: 6,
      visible: 3,
      total: 5,
    }
  }
}

/// The currently selected octave window. One of these lives for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationState {
  range: OctaveRange,
  offset: u8,
}

impl NavigationState {
  pub fn new(range: OctaveRange) -> NavigationState {
    NavigationState { range, offset: 0 }
  }

  /// Starts the window at `offset`, clamped to the valid range.
  pub fn with_offset(range: OctaveRange, offset: u8) -> NavigationState {
    let mut nav = NavigationState::new(range);
    nav.set_offset(offset);
    nav
  }

  pub fn range(&self) -> &OctaveRange {
    &self.range
  }

  pub fn offset(&self) -> u8 {
    self.offset
  }

  pub fn can_go_previous(&self) -> bool {
    self.offset > 0
  }

  pub fn can_go_next(&self) -> bool {
    self.offset < self.range.max_offset()
  }

  /// Moves the window down one octave. Returns false (and does nothing) at the bottom.
  pub fn go_previous(&mut self) -> bool {
    if !self.can_go_previous() {
      return false;
    }
    self.offset -= 1;
    debug!("octave offset decreased to {}", self.offset);
    true
  }

  /// Moves the window up one octave. Returns false (and does nothing) at the top.
  pub fn go_next(&mut self) -> bool {
    if !self.can_go_next() {
      return false;
    }
    self.offset += 1;
    debug!("octave offset increased to {}", self.offset);
    true
  }

  /// Jumps straight to `offset`. Out-of-range targets are clamped so the window
  /// never leaves the instrument's range. Returns true if the offset changed.
  pub fn set_offset(&mut self, offset: u8) -> bool {
    let max_offset = self.range.max_offset();
    let clamped = if offset > max_offset {
      warn!("octave offset {offset} out of range, clamping to {max_offset}");
      max_offset
    } else {
      offset
    };

    let changed = clamped != self.offset;
    self.offset = clamped;
    changed
  }

  /// Returns the (start, end) octaves of the visible window, inclusive.
  ///
  /// `end` is capped at the range's max octave, so a window that would run past the
  /// top of the instrument is reported truncated.
  pub fn visible_octave_span(&self) -> (u8, u8) {
    let start = self.range.min.saturating_add(self.offset);
    let end = start
      .saturating_add(self.range.visible - 1)
      .min(self.range.max);
    (start, end)
  }

  pub fn status(&self) -> OctaveStatus {
    let (start, end) = self.visible_octave_span();
    OctaveStatus {
      start,
      end,
      min: self.range.min,
      max: self.range.max,
      offset: self.offset,
      previous_enabled: self.can_go_previous(),
      next_enabled: self.can_go_next(),
    }
  }
}

/// Snapshot of the navigation state for the UI layer: the visible span, the full
/// range, and whether the previous / next controls should be enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OctaveStatus {
  pub start: u8,
  pub end: u8,
  pub min: u8,
  pub max: u8,
  pub offset: u8,
  pub previous_enabled: bool,
  pub next_enabled: bool,
}

impl Display for OctaveStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "Octaves: {}-{} of {}-{}",
      self.start, self.end, self.min, self.max
    )
  }
}
