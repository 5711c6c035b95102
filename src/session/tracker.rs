use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::payload::ActiveNote;

/// Minimum time a note has to be gone before pressing it again counts as a new onset.
pub const DEFAULT_NOTE_DEBOUNCE: Duration = Duration::from_millis(100);

/// A note that started sounding on this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteOnset {
  pub note: String,
  pub finger: String,
  pub hand: String,
}

/// Tracks which notes are held from one frame to the next and reports note onsets.
///
/// The hand tracker reports the set of notes under raised fingers on every frame, so a
/// held note shows up again and again. Only the first frame of a press is an onset.
/// Tracking jitter can drop a held note for a frame or two; a note that comes back
/// within the debounce window is treated as still held.
#[derive(Debug, Clone)]
pub struct NoteTracker {
  debounce: Duration,
  held: HashSet<String>,
  last_seen: HashMap<String, Instant>,
}

impl Default for NoteTracker {
  fn default() -> Self {
    NoteTracker::new(DEFAULT_NOTE_DEBOUNCE)
  }
}

impl NoteTracker {
  pub fn new(debounce: Duration) -> NoteTracker {
    NoteTracker {
      debounce,
      held: HashSet::new(),
      last_seen: HashMap::new(),
    }
  }

  pub fn is_held(&self, note: &str) -> bool {
    self.held.contains(note)
  }

  /// Feeds one frame's active notes into the tracker and returns the onsets it contains.
  pub fn update(&mut self, active: &[ActiveNote], now: Instant) -> Vec<NoteOnset> {
    let mut onsets = vec![];
    let mut current = HashSet::new();

    for n in active {
      if !current.insert(n.note.clone()) {
        // two fingers on the same key
        continue;
      }
      if self.held.contains(&n.note) {
        continue;
      }

      let bounced = self
        .last_seen
        .get(&n.note)
        .map(|seen| now.saturating_duration_since(*seen) < self.debounce)
        .unwrap_or(false);
      if bounced {
        trace!("suppressing re-trigger of {}", n.note);
        continue;
      }

      debug!("note on: {} ({} {})", n.note, n.hand, n.finger);
      onsets.push(NoteOnset {
        note: n.note.clone(),
        finger: n.finger.clone(),
        hand: n.hand.clone(),
      });
    }

    for note in &current {
      self.last_seen.insert(note.clone(), now);
    }
    // forget notes that have been released for longer than the debounce window
    let debounce = self.debounce;
    self
      .last_seen
      .retain(|_, seen| now.saturating_duration_since(*seen) < debounce);

    self.held = current;
    onsets
  }

  pub fn reset(&mut self) {
    self.held.clear();
    self.last_seen.clear();
  }
}

/// The "now playing" line: note names joined with ` + `, or `-` when nothing is playing.
pub fn active_notes_display(active: &[ActiveNote]) -> String {
  if active.is_empty() {
    return "-".to_string();
  }
  active
    .iter()
    .map(|n| n.note.as_str())
    .collect::<Vec<_>>()
    .join(" + ")
}
