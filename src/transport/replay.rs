use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use error_stack::{IntoReport, Result, ResultExt};
use log::{debug, warn};

use super::FrameSource;
use crate::error::OverlayError;
use crate::payload::{decode_payload, FramePayload};

/// Replays frame results recorded one JSON payload per line.
///
/// Blank lines are ignored. Lines that don't decode are logged and skipped, so one bad
/// frame doesn't end the replay.
pub struct JsonLinesSource<R> {
  reader: R,
  line_number: usize,
  skipped: usize,
}

impl JsonLinesSource<BufReader<File>> {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, OverlayError> {
    let path = path.as_ref();
    let file = File::open(path)
      .into_report()
      .change_context_lazy(|| OverlayError::FrameSourceError(format!("cannot open {}", path.display())))?;
    debug!("replaying frames from {}", path.display());
    Ok(JsonLinesSource::new(BufReader::new(file)))
  }
}

impl<R: BufRead> JsonLinesSource<R> {
  pub fn new(reader: R) -> JsonLinesSource<R> {
    JsonLinesSource {
      reader,
      line_number: 0,
      skipped: 0,
    }
  }

  /// Number of lines that failed to decode so far.
  pub fn skipped(&self) -> usize {
    self.skipped
  }
}

impl<R: BufRead> FrameSource for JsonLinesSource<R> {
  fn next_payload(&mut self) -> Option<FramePayload> {
    let mut line = String::new();
    loop {
      line.clear();
      match self.reader.read_line(&mut line) {
        Ok(0) => return None,
        Ok(_) => {}
        Err(e) => {
          warn!("error reading frame recording at line {}: {e}", self.line_number + 1);
          return None;
        }
      }
      self.line_number += 1;

      let trimmed = line.trim();
      if trimmed.is_empty() {
        continue;
      }

      match decode_payload(trimmed) {
        Ok(payload) => return Some(payload),
        Err(err) => {
          warn!("skipping line {}: {err:?}", self.line_number);
          self.skipped += 1;
        }
      }
    }
  }
}
