use log::debug;

use super::notes::{KeyId, NoteName, Octave, NOTES_PER_OCTAVE};
use super::octave::NavigationState;
use crate::drawing::{Float, Point, Rect, Size};

/// Horizontal padding on each side of the key band, in pixels.
const SIDE_MARGIN: Float = 2.0;

/// Gap between neighbouring keys, in pixels.
const KEY_GAP: Float = 1.0;

/// Top of the key band, as a fraction of the canvas height.
pub const BAND_TOP_FRACTION: Float = 0.05;

/// Height of the key band, as a fraction of the canvas height.
pub const BAND_HEIGHT_FRACTION: Float = 0.35;

/// Black keys are drawn at this fraction of the band height.
const BLACK_KEY_HEIGHT_FRACTION: Float = 0.6;

/// Geometry of a single on-screen key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeySpec {
  pub note: NoteName,
  pub octave: Octave,
  pub x: Float,
  pub y: Float,
  pub width: Float,
  pub height: Float,
  pub is_black: bool,
}

impl KeySpec {
  pub fn id(&self) -> KeyId {
    KeyId::new(self.note, self.octave)
  }

  /// The key's identity string (e.g. `DO4`), matched against `active_notes` in the payload.
  pub fn identity(&self) -> String {
    self.id().to_string()
  }

  pub fn rect(&self) -> Rect {
    Rect::new(self.x, self.y, self.width, self.height)
  }
}

/// The computed geometry of the whole keyboard for one canvas size and octave window.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardLayout {
  canvas: Size,
  band: Rect,
  slot_width: Float,
  slot_count: usize,
  keys: Vec<KeySpec>,
}

impl KeyboardLayout {
  fn empty(canvas: Size) -> KeyboardLayout {
    KeyboardLayout {
      canvas,
      band: Rect::new(0.0, 0.0, 0.0, 0.0),
      slot_width: 0.0,
      slot_count: 0,
      keys: vec![],
    }
  }

  pub fn keys(&self) -> &[KeySpec] {
    &self.keys
  }

  pub fn len(&self) -> usize {
    self.keys.len()
  }

  pub fn is_empty(&self) -> bool {
    self.keys.is_empty()
  }

  pub fn canvas(&self) -> Size {
    self.canvas
  }

  /// The vertical band the keyboard occupies, spanning the full canvas width.
  pub fn band(&self) -> Rect {
    self.band
  }

  pub fn slot_width(&self) -> Float {
    self.slot_width
  }

  pub fn find(&self, id: &KeyId) -> Option<&KeySpec> {
    self.keys.iter().find(|k| k.id() == *id)
  }

  /// Returns the key whose slot contains the given pixel position.
  ///
  /// Every key owns a full-height slot of the band, so a point below a black key
  /// still belongs to that black key.
  pub fn key_at(&self, p: Point) -> Option<&KeySpec> {
    if self.is_empty() || self.slot_width <= 0.0 || !p.x.is_finite() || !p.y.is_finite() {
      return None;
    }
    if p.y < self.band.y || p.y >= self.band.bottom() {
      return None;
    }

    let offset = p.x - SIDE_MARGIN;
    if offset < 0.0 {
      return None;
    }
    let index = (offset / self.slot_width).floor() as usize;
    self.keys.get(index)
  }

  /// Returns the key under a point in normalized `[0, 1]` coordinates, the way the
  /// hand tracker maps fingertips to notes: the band spans 5%..=40% of the height
  /// and the full width is divided evenly between the visible slots.
  pub fn key_at_normalized(&self, x: Float, y: Float) -> Option<&KeySpec> {
    if !x.is_finite() || !y.is_finite() || self.slot_count == 0 {
      return None;
    }
    if y < BAND_TOP_FRACTION || y > BAND_TOP_FRACTION + BAND_HEIGHT_FRACTION {
      return None;
    }
    if !(0.0..1.0).contains(&x) {
      return None;
    }

    let index = (x * self.slot_count as Float).floor() as usize;
    self.keys.get(index)
  }
}

/// Computes the geometry of every visible key.
///
/// The keyboard occupies a horizontal band starting 5% down the canvas and 35% tall.
/// The band is split into `visible * 12` equal slots regardless of key color, and each
/// key fills its slot minus a one pixel gap. Black keys hang from the top of the band at
/// 60% of its height.
///
/// Returns an empty layout for a canvas without a positive, finite size. Octaves past the
/// range's max are left out rather than wrapped around, so the layout may hold fewer than
/// `visible * 12` keys.
pub fn compute_layout(width: Float, height: Float, nav: &NavigationState) -> KeyboardLayout {
  let canvas = Size::new(width, height);
  if !canvas.is_drawable() {
    debug!("not computing layout for invalid canvas size {width}x{height}");
    return KeyboardLayout::empty(canvas);
  }

  let range = nav.range();
  let top = (height * BAND_TOP_FRACTION).round();
  let band_height = (height * BAND_HEIGHT_FRACTION).round();
  let slot_count = range.visible() as usize * NOTES_PER_OCTAVE;
  let slot_width = (width - 2.0 * SIDE_MARGIN) / slot_count as Float;
  let key_width = (slot_width - KEY_GAP).max(0.0);
  let key_y = top + 2.0;

  let mut keys = Vec::with_capacity(slot_count);
  for octave_index in 0..range.visible() {
    let octave_num = range.min() as u16 + nav.offset() as u16 + octave_index as u16;
    if octave_num > range.max() as u16 {
      break;
    }
    // octave_num <= max, and max was validated as an Octave
    let octave = match Octave::new(octave_num as u8) {
      Some(o) => o,
      None => break,
    };

    for note in NoteName::ALL {
      let slot = octave_index as usize * NOTES_PER_OCTAVE + note.index();
      let is_black = note.is_black();
      let key_height = if is_black {
        band_height * BLACK_KEY_HEIGHT_FRACTION
      } else {
        (band_height - 4.0).max(0.0)
      };

      keys.push(KeySpec {
        note,
        octave,
        x: SIDE_MARGIN + slot as Float * slot_width,
        y: key_y,
        width: key_width,
        height: key_height,
        is_black,
      });
    }
  }

  KeyboardLayout {
    canvas,
    band: Rect::new(0.0, top, width, band_height),
    slot_width,
    slot_count,
    keys,
  }
}
