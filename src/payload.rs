//! The per-frame result sent back by the hand tracker.
//!
//! A payload looks like this on the wire:
//!
//! ```text
//! {
//!   "hand_detected": true,
//!   "hands_count": 1,
//!   "active_notes": [
//!     { "note": "DO4", "finger": "index", "hand": "Right", "position": { "x": 0.31, "y": 0.22 } }
//!   ],
//!   "navigation": { "direction": "left", "octave_change": true, "new_octave_offset": 0 }
//! }
//! ```
//!
//! Everything except `hand_detected` may be omitted. Integer fields are read as any JSON
//! integer and clamped into range, so one odd value doesn't cost the whole frame.

use std::collections::HashSet;

use error_stack::{IntoReport, Result, ResultExt};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::OverlayError;
use crate::keyboard::notes::KeyId;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FramePayload {
  pub hand_detected: bool,

  #[serde(default, deserialize_with = "clamped_count")]
  pub hands_count: u32,

  #[serde(default)]
  pub active_notes: Vec<ActiveNote>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub navigation: Option<NavigationGesture>,
}

impl FramePayload {
  /// The payload used before any frame result has arrived: no hands, no notes.
  pub fn idle() -> FramePayload {
    FramePayload::default()
  }

  /// Every active note that names a real key. Identities are parsed the same way
  /// everywhere, so `do4` and `DO4` highlight the same key.
  pub fn active_keys(&self) -> HashSet<KeyId> {
    self.active_notes.iter().filter_map(|n| n.key_id()).collect()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveNote {
  /// Key identity, e.g. `SOLS3`.
  pub note: String,

  #[serde(default)]
  pub finger: String,

  #[serde(default)]
  pub hand: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub position: Option<NormalizedPosition>,
}

impl ActiveNote {
  /// Parses the note's identity. Notes the keyboard doesn't know about return `None`.
  pub fn key_id(&self) -> Option<KeyId> {
    self.note.parse().ok()
  }

  /// The position, if present and usable for drawing a marker.
  pub fn marker_position(&self) -> Option<NormalizedPosition> {
    self.position.filter(|p| p.is_valid())
  }
}

/// A position in normalized frame coordinates, `(0, 0)` top-left to `(1, 1)` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPosition {
  pub x: f64,
  pub y: f64,
}

impl NormalizedPosition {
  pub fn is_valid(&self) -> bool {
    let in_unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
    in_unit(self.x) && in_unit(self.y)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
  Left,
  Right,
}

impl Direction {
  pub fn as_str(&self) -> &'static str {
    match self {
      Direction::Left => "left",
      Direction::Right => "right",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationGesture {
  pub direction: Direction,

  /// Set by the tracker when the gesture should move the octave window.
  #[serde(default)]
  pub octave_change: bool,

  /// Explicit target offset computed by the tracker, if it sent one.
  #[serde(
    default,
    skip_serializing_if = "Option::is_none",
    deserialize_with = "clamped_offset"
  )]
  pub new_octave_offset: Option<u8>,
}

fn clamped_count<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
  let raw = i64::deserialize(deserializer)?;
  let count = raw.clamp(0, u32::MAX as i64) as u32;
  if count as i64 != raw {
    warn!("hands_count {raw} out of range, using {count}");
  }
  Ok(count)
}

/// Negative targets become 0; anything above `u8::MAX` saturates. The navigation state
/// clamps the result again against the real octave range.
fn clamped_offset<'de, D: Deserializer<'de>>(
  deserializer: D,
) -> std::result::Result<Option<u8>, D::Error> {
  let raw = match Option::<i64>::deserialize(deserializer)? {
    Some(raw) => raw,
    None => return Ok(None),
  };
  let offset = raw.clamp(0, u8::MAX as i64) as u8;
  if offset as i64 != raw {
    warn!("new_octave_offset {raw} out of range, using {offset}");
  }
  Ok(Some(offset))
}

/// Decodes a single JSON frame payload.
pub fn decode_payload(json: &str) -> Result<FramePayload, OverlayError> {
  serde_json::from_str(json)
    .into_report()
    .change_context(OverlayError::PayloadDecodingError)
    .attach_printable_lazy(|| format!("payload: {}", truncate(json, 120)))
}

pub fn encode_payload(payload: &FramePayload) -> Result<String, OverlayError> {
  serde_json::to_string(payload)
    .into_report()
    .change_context(OverlayError::PayloadDecodingError)
}

fn truncate(s: &str, max_chars: usize) -> &str {
  match s.char_indices().nth(max_chars) {
    Some((i, _)) => &s[..i],
    None => s,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decodes_full_payload() {
    let json = r#"{
      "hand_detected": true,
      "hands_count": 2,
      "active_notes": [
        {"note": "DO4", "finger": "index", "hand": "Right", "position": {"x": 0.25, "y": 0.2}},
        {"note": "MI4", "finger": "middle", "hand": "Left"}
      ],
      "navigation": {"direction": "right", "octave_change": true, "new_octave_offset": 2}
    }"#;

    let p = decode_payload(json).unwrap();
    assert!(p.hand_detected);
    assert_eq!(p.hands_count, 2);
    assert_eq!(p.active_notes.len(), 2);
    assert_eq!(
      p.active_notes[0].position,
      Some(NormalizedPosition { x: 0.25, y: 0.2 })
    );
    assert_eq!(p.active_notes[1].position, None);
    assert_eq!(
      p.navigation,
      Some(NavigationGesture {
        direction: Direction::Right,
        octave_change: true,
        new_octave_offset: Some(2),
      })
    );
    let keys: HashSet<String> = p.active_keys().iter().map(|k| k.to_string()).collect();
    assert_eq!(keys, HashSet::from(["DO4".to_string(), "MI4".to_string()]));
  }

  #[test]
  fn missing_optional_fields_take_defaults() {
    let p = decode_payload(r#"{"hand_detected": false}"#).unwrap();
    assert_eq!(p, FramePayload::idle());

    let p = decode_payload(r#"{"hand_detected": true, "navigation": {"direction": "left"}}"#)
      .unwrap();
    let nav = p.navigation.unwrap();
    assert_eq!(nav.direction, Direction::Left);
    assert!(!nav.octave_change);
    assert_eq!(nav.new_octave_offset, None);
  }

  #[test]
  fn malformed_json_is_a_decoding_error() {
    for bad in ["", "{", r#"{"hands_count": 1}"#, r#"{"hand_detected": true, "navigation": {"direction": "up"}}"#] {
      let err = decode_payload(bad).unwrap_err();
      assert_eq!(err.current_context(), &OverlayError::PayloadDecodingError);
    }
  }

  #[test]
  fn out_of_range_integers_are_clamped_not_fatal() {
    let json = r#"{
      "hand_detected": true,
      "hands_count": -1,
      "active_notes": [{"note": "DO4", "finger": "index", "hand": "Right"}],
      "navigation": {"direction": "left", "octave_change": true, "new_octave_offset": -1}
    }"#;
    let p = decode_payload(json).unwrap();
    assert_eq!(p.hands_count, 0);
    assert_eq!(p.active_notes[0].note, "DO4");
    assert_eq!(p.navigation.unwrap().new_octave_offset, Some(0));

    let json = r#"{
      "hand_detected": true,
      "hands_count": 300,
      "active_notes": [{"note": "MI4"}],
      "navigation": {"direction": "right", "octave_change": true, "new_octave_offset": 300}
    }"#;
    let p = decode_payload(json).unwrap();
    assert_eq!(p.hands_count, 300);
    assert_eq!(p.active_notes[0].note, "MI4");
    assert_eq!(p.navigation.unwrap().new_octave_offset, Some(255));

    let p = decode_payload(r#"{"hand_detected": true, "navigation": {"direction": "right", "new_octave_offset": null}}"#)
      .unwrap();
    assert_eq!(p.navigation.unwrap().new_octave_offset, None);
  }

  #[test]
  fn lowercase_identities_match_the_same_key() {
    let p = decode_payload(r#"{"hand_detected": true, "active_notes": [{"note": "do4"}, {"note": "??"}]}"#)
      .unwrap();
    let keys = p.active_keys();
    assert_eq!(keys.len(), 1);
    assert!(keys.contains(&"DO4".parse::<KeyId>().unwrap()));
  }

  #[test]
  fn marker_position_rejects_out_of_range_coordinates() {
    let mut note = ActiveNote {
      note: "DO4".to_string(),
      finger: "thumb".to_string(),
      hand: "Left".to_string(),
      position: Some(NormalizedPosition { x: 0.5, y: 0.5 }),
    };
    assert!(note.marker_position().is_some());

    note.position = Some(NormalizedPosition { x: 1.5, y: 0.5 });
    assert!(note.marker_position().is_none());

    note.position = Some(NormalizedPosition { x: f64::NAN, y: 0.5 });
    assert!(note.marker_position().is_none());

    note.position = None;
    assert!(note.marker_position().is_none());
  }

  #[test]
  fn encoded_payload_omits_absent_navigation() {
    let json = encode_payload(&FramePayload::idle()).unwrap();
    assert_eq!(
      json,
      r#"{"hand_detected":false,"hands_count":0,"active_notes":[]}"#
    );
  }
}
