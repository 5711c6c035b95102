use error_stack::Context;
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayError {
  /// The drawing surface has a non-positive (or non-finite) width or height.
  InvalidGeometry {
    width: f64,
    height: f64,
  },

  /// The navigation / layout configuration leaves nothing to draw.
  MissingConfiguration(String),

  /// A drawing call on a [`crate::drawing::RenderSurface`] failed.
  SurfaceFailure(String),

  InvalidOctaveRange(String),
  InvalidKeyIdentity(String),

  ConfigParseError,
  InvalidConfigValue {
    key: String,
    value: String,
  },

  PayloadDecodingError,

  /// A frame source (recording file, simulator, ...) could not be opened or read.
  FrameSourceError(String),

  SessionClosed,
}

impl Context for OverlayError {}

impl Display for OverlayError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    use OverlayError::*;
    match self {
      InvalidGeometry { width, height } => {
        write!(f, "invalid surface geometry: {width}x{height}")
      }

      MissingConfiguration(msg) => write!(f, "missing keyboard configuration: {msg}"),

      SurfaceFailure(msg) => write!(f, "drawing surface failure: {msg}"),

      InvalidOctaveRange(msg) => write!(f, "invalid octave range: {msg}"),

      InvalidKeyIdentity(id) => write!(f, "invalid key identity: {id:?}"),

      ConfigParseError => write!(f, "failed to parse configuration"),

      InvalidConfigValue { key, value } => {
        write!(f, "invalid value {value:?} for configuration key {key}")
      }

      PayloadDecodingError => write!(f, "failed to decode frame payload"),

      FrameSourceError(msg) => write!(f, "frame source error: {msg}"),

      SessionClosed => write!(f, "piano session is no longer running"),
    }
  }
}
