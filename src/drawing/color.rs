use palette::Srgba;

use crate::keyboard::notes::NoteName;

/// 8-bit sRGB color with alpha. Alpha 255 is fully opaque.
pub type Color = Srgba<u8>;

/// Builds a color from 8-bit channels and a CSS-style alpha in `0.0..=1.0`.
pub fn rgba(r: u8, g: u8, b: u8, a: f32) -> Color {
  let alpha = (a.clamp(0.0, 1.0) * 255.0).round() as u8;
  Srgba::new(r, g, b, alpha)
}

pub fn rgb(r: u8, g: u8, b: u8) -> Color {
  Srgba::new(r, g, b, 255)
}

pub fn white() -> Color {
  rgb(255, 255, 255)
}

pub fn black() -> Color {
  rgb(0, 0, 0)
}

// region: keyboard palette

/// Translucent backdrop behind the whole key band.
pub fn band_background() -> Color {
  rgba(0, 0, 0, 0.3)
}

/// Border color when a note is being played.
pub fn border_playing() -> Color {
  rgb(0, 255, 0)
}

/// Border color when a hand is in view but nothing is pressed.
pub fn border_hand_detected() -> Color {
  rgb(255, 255, 0)
}

/// Default border color.
pub fn border_accent() -> Color {
  rgb(0, 255, 255)
}

pub fn black_key_base() -> Color {
  rgba(30, 30, 30, 0.8)
}

pub fn white_key_base() -> Color {
  rgba(255, 255, 255, 0.4)
}

pub fn active_key_stroke() -> Color {
  white()
}

pub fn inactive_key_stroke() -> Color {
  rgba(100, 100, 100, 0.6)
}

/// Marker fill for a note that couldn't be identified.
pub fn unknown_marker_fill() -> Color {
  rgb(255, 0, 0)
}

pub fn status_panel_background() -> Color {
  rgba(0, 0, 0, 0.8)
}

pub fn caption_text() -> Color {
  rgba(255, 255, 255, 0.8)
}

/// Highlight color for an active key. Naturals run through the rainbow from DO (red)
/// to SI (pink); each sharp gets a darker companion of its own.
pub fn note_color(note: NoteName) -> Color {
  use NoteName::*;
  let (r, g, b) = match note {
    Do => (255, 107, 107),
    DoSharp => (255, 152, 0),
    Re => (255, 142, 83),
    ReSharp => (255, 193, 7),
    Mi => (255, 235, 59),
    Fa => (76, 175, 80),
    FaSharp => (139, 195, 74),
    Sol => (33, 150, 243),
    SolSharp => (63, 81, 181),
    La => (156, 39, 176),
    LaSharp => (142, 36, 170),
    Si => (233, 30, 99),
  };
  rgba(r, g, b, 0.9)
}

// endregion

/// Formats a color for use in CSS / SVG attributes.
///
/// Opaque colors are written as `#rrggbb`, everything else as `rgba(r, g, b, a)`
/// with the alpha rounded to two decimal places.
pub fn css_color(col: &Color) -> String {
  if col.alpha == 255 {
    return format!("#{:02x}{:02x}{:02x}", col.red, col.green, col.blue);
  }

  let alpha = (col.alpha as f32 / 255.0 * 100.0).round() / 100.0;
  format!("rgba({}, {}, {}, {})", col.red, col.green, col.blue, alpha)
}
