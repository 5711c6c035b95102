use std::fmt::Display;
use std::str::FromStr;

use bounded_integer::bounded_integer;
use error_stack::{report, Report};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::error::OverlayError;

/// Number of chromatic notes in one octave.
pub const NOTES_PER_OCTAVE: usize = 12;

bounded_integer! {
  /// An absolute octave number, as it appears at the end of a key identity like `DO4`.
  ///
  /// Key identities carry a single octave digit, so anything past 9 is rejected.
  /// Use `Octave::new`, which returns an `Option`, when converting arbitrary input.
  pub struct Octave { 0..9 }
}

/// One of the twelve chromatic notes, in keyboard order, named the way the
/// hand tracker names them (solfège, with an `S` suffix for sharps).
#[derive(Debug, FromPrimitive, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub enum NoteName {
  Do = 0,
  DoSharp,
  Re,
  ReSharp,
  Mi,
  Fa,
  FaSharp,
  Sol,
  SolSharp,
  La,
  LaSharp,
  Si,
}

impl NoteName {
  pub const ALL: [NoteName; NOTES_PER_OCTAVE] = [
    NoteName::Do,
    NoteName::DoSharp,
    NoteName::Re,
    NoteName::ReSharp,
    NoteName::Mi,
    NoteName::Fa,
    NoteName::FaSharp,
    NoteName::Sol,
    NoteName::SolSharp,
    NoteName::La,
    NoteName::LaSharp,
    NoteName::Si,
  ];

  /// Looks up a note by its position in the octave (0 = DO).
  pub fn from_index(index: usize) -> Option<NoteName> {
    FromPrimitive::from_usize(index)
  }

  pub fn index(&self) -> usize {
    *self as usize
  }

  /// Sharps are drawn as black keys.
  pub fn is_black(&self) -> bool {
    use NoteName::*;
    matches!(self, DoSharp | ReSharp | FaSharp | SolSharp | LaSharp)
  }

  pub fn as_str(&self) -> &'static str {
    use NoteName::*;
    match self {
      Do => "DO",
      DoSharp => "DOS",
      Re => "RE",
      ReSharp => "RES",
      Mi => "MI",
      Fa => "FA",
      FaSharp => "FAS",
      Sol => "SOL",
      SolSharp => "SOLS",
      La => "LA",
      LaSharp => "LAS",
      Si => "SI",
    }
  }
}

impl Into<u8> for NoteName {
  fn into(self) -> u8 {
    self as u8
  }
}

impl Display for NoteName {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for NoteName {
  type Err = Report<OverlayError>;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let upper = s.trim().to_ascii_uppercase();
    NoteName::ALL
      .iter()
      .find(|n| n.as_str() == upper)
      .copied()
      .ok_or_else(|| report!(OverlayError::InvalidKeyIdentity(s.to_string())))
  }
}

/// Identifies a single key on the keyboard: a note name at an absolute octave.
///
/// This is the join key between the layout and the notes reported by the hand tracker,
/// and its string form (`DO4`, `SOLS3`, ...) is what travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyId {
  pub note: NoteName,
  pub octave: Octave,
}

impl KeyId {
  pub fn new(note: NoteName, octave: Octave) -> KeyId {
    KeyId { note, octave }
  }
}

impl Display for KeyId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}{}", self.note.as_str(), self.octave.get())
  }
}

impl FromStr for KeyId {
  type Err = Report<OverlayError>;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || report!(OverlayError::InvalidKeyIdentity(s.to_string()));

    let trimmed = s.trim();
    let digits_start = trimmed
      .find(|c: char| c.is_ascii_digit())
      .ok_or_else(invalid)?;
    let (name, digits) = trimmed.split_at(digits_start);
    if name.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
      return Err(invalid());
    }

    let note = name
      .parse::<NoteName>()
      .map_err(|_| invalid())?;
    let octave = digits
      .parse::<u8>()
      .ok()
      .and_then(Octave::new)
      .ok_or_else(invalid)?;

    Ok(KeyId { note, octave })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn octave(n: u8) -> Octave {
    Octave::new(n).unwrap()
  }

  #[test]
  fn chromatic_order_starts_at_do() {
    assert_eq!(NoteName::from_index(0), Some(NoteName::Do));
    assert_eq!(NoteName::from_index(7), Some(NoteName::Sol));
    assert_eq!(NoteName::from_index(11), Some(NoteName::Si));
    assert_eq!(NoteName::from_index(12), None);

    for (i, note) in NoteName::ALL.iter().enumerate() {
      assert_eq!(note.index(), i);
    }
  }

  #[test]
  fn exactly_five_black_keys_per_octave() {
    let black: Vec<&str> = NoteName::ALL
      .iter()
      .filter(|n| n.is_black())
      .map(|n| n.as_str())
      .collect();
    assert_eq!(black, vec!["DOS", "RES", "FAS", "SOLS", "LAS"]);
  }

  #[test]
  fn key_id_display() {
    assert_eq!(KeyId::new(NoteName::Do, octave(4)).to_string(), "DO4");
    assert_eq!(KeyId::new(NoteName::SolSharp, octave(3)).to_string(), "SOLS3");
  }

  #[test]
  fn key_id_parses_wire_names() {
    let id: KeyId = "DO4".parse().unwrap();
    assert_eq!(id, KeyId::new(NoteName::Do, octave(4)));

    let id: KeyId = "SOLS3".parse().unwrap();
    assert_eq!(id, KeyId::new(NoteName::SolSharp, octave(3)));

    let id: KeyId = "las6".parse().unwrap();
    assert_eq!(id, KeyId::new(NoteName::LaSharp, octave(6)));
  }

  #[test]
  fn key_id_rejects_malformed_names() {
    for bad in ["H4", "DO", "DOX4", "4", "", "DO4X", "DO12"] {
      let res = bad.parse::<KeyId>();
      assert!(res.is_err(), "expected {bad:?} to be rejected");
      assert_eq!(
        res.unwrap_err().current_context(),
        &OverlayError::InvalidKeyIdentity(bad.to_string())
      );
    }
  }
}
