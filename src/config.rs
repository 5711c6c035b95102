//! Configuration file support.
//!
//! Configuration is an INI file; every key is optional and falls back to its default:
//!
//! ```ini
//! [octaves]
//! min_octave = 2
//! max_octave = 6
//! visible_octaves = 3
//! total_octaves = 5
//! initial_offset = 0
//!
//! [gestures]
//! gesture_cooldown_ms = 1000
//! note_debounce_ms = 100
//!
//! [transport]
//! target_fps = 15
//!
//! [logging]
//! log_level = info
//! ```

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use error_stack::{report, IntoReport, Result, ResultExt};
use ini::{Ini, Properties};
use log::{debug, LevelFilter};

use crate::error::OverlayError;
use crate::keyboard::octave::{NavigationState, OctaveRange};

#[derive(Debug, Clone, PartialEq)]
pub struct PianoConfig {
  pub min_octave: u8,
  pub max_octave: u8,
  pub visible_octaves: u8,
  /// Derived from `min_octave` and `max_octave` when not set explicitly.
  pub total_octaves: Option<u8>,
  pub initial_offset: u8,

  pub gesture_cooldown_ms: u64,
  pub note_debounce_ms: u64,

  pub target_fps: u32,

  pub log_level: LevelFilter,
}

impl Default for PianoConfig {
  fn default() -> Self {
    PianoConfig {
      min_octave: 2,
      max_octave: 6,
      visible_octaves: 3,
      total_octaves: None,
      initial_offset: 0,
      gesture_cooldown_ms: 1000,
      note_debounce_ms: 100,
      target_fps: 15,
      log_level: LevelFilter::Info,
    }
  }
}

impl PianoConfig {
  pub fn load<P: AsRef<Path>>(path: P) -> Result<PianoConfig, OverlayError> {
    let path = path.as_ref();
    debug!("loading config from {}", path.display());
    let source = std::fs::read_to_string(path)
      .into_report()
      .change_context(OverlayError::ConfigParseError)
      .attach_printable_lazy(|| format!("reading {}", path.display()))?;
    Self::from_ini_str(source)
  }

  pub fn from_ini_str<S: AsRef<str>>(source: S) -> Result<PianoConfig, OverlayError> {
    let ini = Ini::load_from_str(source.as_ref())
      .into_report()
      .change_context(OverlayError::ConfigParseError)?;

    let mut conf = PianoConfig::default();

    if let Some(section) = ini.section(Some("octaves")) {
      set_from(section, "min_octave", &mut conf.min_octave)?;
      set_from(section, "max_octave", &mut conf.max_octave)?;
      set_from(section, "visible_octaves", &mut conf.visible_octaves)?;
      set_from(section, "initial_offset", &mut conf.initial_offset)?;
      conf.total_octaves = get_parsed(section, "total_octaves")?;
    }

    if let Some(section) = ini.section(Some("gestures")) {
      set_from(section, "gesture_cooldown_ms", &mut conf.gesture_cooldown_ms)?;
      set_from(section, "note_debounce_ms", &mut conf.note_debounce_ms)?;
    }

    if let Some(section) = ini.section(Some("transport")) {
      set_from(section, "target_fps", &mut conf.target_fps)?;
      if conf.target_fps == 0 {
        return Err(invalid_value("target_fps", "0"));
      }
    }

    if let Some(section) = ini.section(Some("logging")) {
      set_from(section, "log_level", &mut conf.log_level)?;
    }

    // catch a bad octave range here rather than at session start
    conf.octave_range()?;
    Ok(conf)
  }

  pub fn total_octaves(&self) -> u8 {
    self
      .total_octaves
      .unwrap_or_else(|| self.max_octave.saturating_sub(self.min_octave).saturating_add(1))
  }

  pub fn octave_range(&self) -> Result<OctaveRange, OverlayError> {
    OctaveRange::with_total(
      self.min_octave,
      self.max_octave,
      self.visible_octaves,
      self.total_octaves(),
    )
  }

  /// A fresh navigation state, positioned at `initial_offset`.
  pub fn navigation_state(&self) -> Result<NavigationState, OverlayError> {
    let range = self.octave_range()?;
    Ok(NavigationState::with_offset(range, self.initial_offset))
  }

  pub fn gesture_cooldown(&self) -> Duration {
    Duration::from_millis(self.gesture_cooldown_ms)
  }

  pub fn note_debounce(&self) -> Duration {
    Duration::from_millis(self.note_debounce_ms)
  }

  /// The `RUST_LOG` style filter string for `env_logger`.
  pub fn log_filter(&self) -> String {
    self.log_level.to_string().to_lowercase()
  }
}

fn invalid_value(key: &str, value: &str) -> error_stack::Report<OverlayError> {
  report!(OverlayError::InvalidConfigValue {
    key: key.to_string(),
    value: value.to_string(),
  })
}

fn get_parsed<T: FromStr>(section: &Properties, key: &str) -> Result<Option<T>, OverlayError> {
  match section.get(key) {
    Some(val) => val
      .trim()
      .parse::<T>()
      .map(Some)
      .map_err(|_| invalid_value(key, val)),
    None => Ok(None),
  }
}

fn set_from<T: FromStr>(section: &Properties, key: &str, target: &mut T) -> Result<(), OverlayError> {
  if let Some(val) = get_parsed(section, key)? {
    *target = val;
  }
  Ok(())
}
