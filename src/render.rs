use error_stack::{report, Result, ResultExt};
use log::{error, warn};

use crate::drawing::color::{self, Color};
use crate::drawing::{Point, Rect, RenderSurface, TextStyle};
use crate::error::OverlayError;
use crate::keyboard::layout::{compute_layout, KeySpec, KeyboardLayout};
use crate::keyboard::octave::NavigationState;
use crate::payload::{ActiveNote, FramePayload};

const BORDER_WIDTH: f64 = 4.0;
const KEY_STROKE_WIDTH: f64 = 1.0;

const STATUS_PANEL: Rect = Rect {
  x: 10.0,
  y: 10.0,
  width: 450.0,
  height: 120.0,
};
const STATUS_TEXT_X: f64 = 20.0;
const STATUS_TEXT_TOP: f64 = 30.0;

const MARKER_RADIUS: f64 = 8.0;
const MARKER_OUTLINE_WIDTH: f64 = 2.0;

pub const IDLE_STATUS: &str = "Waiting for hands...";
pub const IDLE_PROMPT: &str = "Raise your fingers to play";
pub const HAND_PROMPT: &str = "Raise your fingers over the keys";
pub const CAPTION: &str = "Raise your fingers over the keys to play";

/// Which of the three status panel layouts a frame gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
  /// Exactly one note is being played.
  Note,
  /// Several notes at once.
  Chord,
  /// A hand is in view, but isn't playing anything.
  HandDetected,
  Idle,
}

impl StatusKind {
  pub fn for_payload(payload: &FramePayload) -> StatusKind {
    match (payload.active_notes.len(), payload.hand_detected) {
      (1, _) => StatusKind::Note,
      (n, _) if n > 1 => StatusKind::Chord,
      (_, true) => StatusKind::HandDetected,
      _ => StatusKind::Idle,
    }
  }
}

/// Draws the keyboard overlay for one frame.
#[derive(Debug, Clone, Default)]
pub struct KeyboardRenderer {}

impl KeyboardRenderer {
  pub fn new() -> KeyboardRenderer {
    KeyboardRenderer {}
  }

  /// Paints the keyboard, key highlights, status panel and finger markers for `payload`.
  ///
  /// Never fails: a surface without a drawable size is left untouched, and a failing
  /// drawing call is logged and ends the frame early, leaving whatever was drawn so far.
  pub fn render(
    &self,
    surface: &mut dyn RenderSurface,
    nav: &NavigationState,
    payload: &FramePayload,
  ) {
    if let Err(err) = self.try_render(surface, nav, payload) {
      match err.current_context() {
        OverlayError::InvalidGeometry { .. } => warn!("skipping render: {err}"),
        OverlayError::MissingConfiguration(_) => error!("skipping render: {err:?}"),
        _ => error!("keyboard render failed: {err:?}"),
      }
    }
  }

  /// Like [`render`](Self::render), but hands back the reason a frame was skipped or cut short.
  pub fn try_render(
    &self,
    surface: &mut dyn RenderSurface,
    nav: &NavigationState,
    payload: &FramePayload,
  ) -> Result<(), OverlayError> {
    let size = surface.size();
    if !size.is_drawable() {
      return Err(report!(OverlayError::InvalidGeometry {
        width: size.width,
        height: size.height,
      }));
    }

    // a skipped frame still wipes the previous one
    surface.clear()?;

    let layout = compute_layout(size.width, size.height, nav);
    if layout.is_empty() {
      let (start, end) = nav.visible_octave_span();
      return Err(report!(OverlayError::MissingConfiguration(format!(
        "no playable octave in window {start}-{end}"
      ))));
    }

    draw_band(surface, &layout, payload)?;
    draw_keys(surface, &layout, payload).attach_printable("while drawing keys")?;
    draw_status(surface, nav, payload).attach_printable("while drawing status panel")?;
    draw_markers(surface, payload).attach_printable("while drawing finger markers")?;

    if payload.hand_detected {
      let style = TextStyle::new(14.0, color::caption_text()).bold().centered();
      let at = Point {
        x: size.width / 2.0,
        y: size.height - 20.0,
      };
      surface.fill_text(CAPTION, at, style)?;
    }

    Ok(())
  }
}

/// Picks the band's border color: playing beats hand-in-view beats the default accent.
pub fn border_color(payload: &FramePayload) -> Color {
  if !payload.active_notes.is_empty() {
    color::border_playing()
  } else if payload.hand_detected {
    color::border_hand_detected()
  } else {
    color::border_accent()
  }
}

fn draw_band(
  surface: &mut dyn RenderSurface,
  layout: &KeyboardLayout,
  payload: &FramePayload,
) -> Result<(), OverlayError> {
  let band = layout.band();
  surface.fill_rect(band, color::band_background())?;

  let outline = Rect::new(2.0, band.y, band.width - 4.0, band.height);
  surface.stroke_rect(outline, border_color(payload), BORDER_WIDTH)
}

fn draw_keys(
  surface: &mut dyn RenderSurface,
  layout: &KeyboardLayout,
  payload: &FramePayload,
) -> Result<(), OverlayError> {
  let active = payload.active_keys();

  for key in layout.keys() {
    let identity = key.identity();
    let is_active = active.contains(&key.id());
    let (fill, stroke) = key_colors(key, is_active);

    surface.fill_rect(key.rect(), fill)?;
    surface.stroke_rect(key.rect(), stroke, KEY_STROKE_WIDTH)?;

    let label_color = if key.is_black || is_active {
      color::white()
    } else {
      color::black()
    };
    let (font_size, label_lift) = if key.is_black { (10.0, 8.0) } else { (12.0, 12.0) };
    let style = TextStyle::new(font_size, label_color).bold().centered();
    let at = Point {
      x: key.x + key.width / 2.0,
      y: key.y + key.height - label_lift,
    };
    surface.fill_text(&identity, at, style)?;
  }
  Ok(())
}

/// Returns the (fill, stroke) colors for a key.
pub fn key_colors(key: &KeySpec, is_active: bool) -> (Color, Color) {
  if is_active {
    (color::note_color(key.note), color::active_key_stroke())
  } else if key.is_black {
    (color::black_key_base(), color::inactive_key_stroke())
  } else {
    (color::white_key_base(), color::inactive_key_stroke())
  }
}

fn draw_status(
  surface: &mut dyn RenderSurface,
  nav: &NavigationState,
  payload: &FramePayload,
) -> Result<(), OverlayError> {
  surface.fill_rect(STATUS_PANEL, color::status_panel_background())?;

  let line = |offset: f64| Point {
    x: STATUS_TEXT_X,
    y: STATUS_TEXT_TOP + offset,
  };
  let notes = &payload.active_notes;

  let next_line = match StatusKind::for_payload(payload) {
    StatusKind::Note => {
      let style = TextStyle::new(18.0, color::border_playing()).bold();
      let note = &notes[0];
      surface.fill_text(&format!("Note: {}", note.note), line(0.0), style)?;
      surface.fill_text(
        &format!("Finger: {} ({})", note.finger, note.hand),
        line(25.0),
        style,
      )?;
      50.0
    }
    StatusKind::Chord => {
      let style = TextStyle::new(18.0, color::border_playing()).bold();
      surface.fill_text(&format!("Chord: {} notes", notes.len()), line(0.0), style)?;
      let names: Vec<&str> = notes.iter().map(|n| n.note.as_str()).collect();
      let style = TextStyle::new(14.0, color::border_playing()).bold();
      surface.fill_text(&format!("Notes: {}", names.join(", ")), line(25.0), style)?;
      50.0
    }
    StatusKind::HandDetected => {
      let style = TextStyle::new(16.0, color::border_hand_detected()).bold();
      surface.fill_text(
        &format!("{} hand(s) detected", payload.hands_count),
        line(0.0),
        style,
      )?;
      surface.fill_text(HAND_PROMPT, line(20.0), style)?;
      45.0
    }
    StatusKind::Idle => {
      let style = TextStyle::new(16.0, color::white()).bold();
      surface.fill_text(IDLE_STATUS, line(0.0), style)?;
      surface.fill_text(IDLE_PROMPT, line(20.0), style)?;
      45.0
    }
  };

  let (start, end) = nav.visible_octave_span();
  let style = TextStyle::new(14.0, color::white()).bold();
  surface.fill_text(&format!("Octaves: {start}-{end}"), line(next_line), style)
}

fn draw_markers(surface: &mut dyn RenderSurface, payload: &FramePayload) -> Result<(), OverlayError> {
  let size = surface.size();
  for note in &payload.active_notes {
    let pos = match note.marker_position() {
      Some(p) => p,
      None => continue,
    };
    let center = Point {
      x: pos.x * size.width,
      y: pos.y * size.height,
    };

    surface.fill_circle(center, MARKER_RADIUS, marker_color(note))?;
    surface.stroke_circle(center, MARKER_RADIUS, color::white(), MARKER_OUTLINE_WIDTH)?;

    if let Some(initial) = note.finger.chars().next() {
      let style = TextStyle::new(10.0, color::white()).bold().centered();
      let at = Point {
        x: center.x,
        y: center.y - 12.0,
      };
      surface.fill_text(&initial.to_string(), at, style)?;
    }
  }
  Ok(())
}

fn marker_color(note: &ActiveNote) -> Color {
  note
    .key_id()
    .map(|id| color::note_color(id.note))
    .unwrap_or_else(color::unknown_marker_fill)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::drawing::recording::{DrawCommand, RecordingSurface};
  use crate::keyboard::octave::OctaveRange;
  use crate::payload::NormalizedPosition;

  fn nav(offset: u8) -> NavigationState {
    NavigationState::with_offset(OctaveRange::default(), offset)
  }

  fn note(name: &str, finger: &str, position: Option<(f64, f64)>) -> ActiveNote {
    ActiveNote {
      note: name.to_string(),
      finger: finger.to_string(),
      hand: "Right".to_string(),
      position: position.map(|(x, y)| NormalizedPosition { x, y }),
    }
  }

  fn playing(notes: Vec<ActiveNote>) -> FramePayload {
    FramePayload {
      hand_detected: true,
      hands_count: 1,
      active_notes: notes,
      navigation: None,
    }
  }

  /// Fill and stroke colors of every key rect, keyed by the label drawn right after it.
  fn key_paint(surface: &RecordingSurface) -> Vec<(String, Color, Color)> {
    let cmds = surface.commands();
    let mut out = vec![];
    for (i, cmd) in cmds.iter().enumerate() {
      if let DrawCommand::FillRect(_, fill) = cmd {
        if let (
          Some(DrawCommand::StrokeRect(_, stroke, w)),
          Some(DrawCommand::FillText(label, _, _)),
        ) = (cmds.get(i + 1), cmds.get(i + 2))
        {
          if *w == KEY_STROKE_WIDTH {
            out.push((label.clone(), *fill, *stroke));
          }
        }
      }
    }
    out
  }

  #[test]
  fn active_key_gets_note_color_and_others_stay_neutral() {
    let mut surface = RecordingSurface::new(1280.0, 720.0);
    let payload = playing(vec![note("DO4", "index", None)]);
    KeyboardRenderer::new().render(&mut surface, &nav(0), &payload);

    let paint = key_paint(&surface);
    assert_eq!(paint.len(), 36);
    for (label, fill, stroke) in paint {
      let id: crate::keyboard::notes::KeyId = label.parse().unwrap();
      if label == "DO4" {
        assert_eq!(fill, color::note_color(id.note));
        assert_eq!(stroke, color::active_key_stroke());
      } else {
        if id.note.is_black() {
          assert_eq!(fill, color::black_key_base(), "{label}");
        } else {
          assert_eq!(fill, color::white_key_base(), "{label}");
        }
        assert_eq!(stroke, color::inactive_key_stroke(), "{label}");
      }
    }
    assert_ne!(color::active_key_stroke(), color::inactive_key_stroke());
  }

  #[test]
  fn lowercase_active_note_still_highlights_its_key() {
    let mut surface = RecordingSurface::new(1280.0, 720.0);
    let payload = playing(vec![note("do4", "index", Some((0.5, 0.2)))]);
    KeyboardRenderer::new().render(&mut surface, &nav(0), &payload);

    let do_color = color::note_color(crate::keyboard::notes::NoteName::Do);
    let highlighted: Vec<String> = key_paint(&surface)
      .into_iter()
      .filter(|(_, fill, _)| *fill == do_color)
      .map(|(label, _, _)| label)
      .collect();
    assert_eq!(highlighted, vec!["DO4"]);
    assert_eq!(surface.filled_circles()[0].2, do_color);
  }

  #[test]
  fn zero_width_surface_is_not_touched() {
    let mut surface = RecordingSurface::new(0.0, 720.0);
    KeyboardRenderer::new().render(&mut surface, &nav(0), &playing(vec![]));
    assert!(surface.is_empty());

    let err = KeyboardRenderer::new()
      .try_render(&mut surface, &nav(0), &FramePayload::idle())
      .unwrap_err();
    assert!(matches!(
      err.current_context(),
      OverlayError::InvalidGeometry { .. }
    ));
  }

  #[test]
  fn idle_payload_draws_idle_status_without_highlights_or_markers() {
    let mut surface = RecordingSurface::new(1280.0, 720.0);
    KeyboardRenderer::new().render(&mut surface, &nav(0), &FramePayload::idle());

    let texts = surface.texts();
    assert!(texts.contains(&IDLE_STATUS));
    assert!(texts.contains(&IDLE_PROMPT));
    assert!(texts.contains(&"Octaves: 2-4"));
    assert!(!texts.contains(&CAPTION));
    assert!(surface.filled_circles().is_empty());

    let neutral = [color::black_key_base(), color::white_key_base()];
    assert!(key_paint(&surface)
      .iter()
      .all(|(_, fill, _)| neutral.contains(fill)));
  }

  #[test]
  fn frame_starts_with_clear_then_band() {
    let mut surface = RecordingSurface::new(1280.0, 720.0);
    KeyboardRenderer::new().render(&mut surface, &nav(0), &FramePayload::idle());
    let cmds = surface.commands();
    assert_eq!(cmds[0], DrawCommand::Clear);
    assert_eq!(
      cmds[1],
      DrawCommand::FillRect(Rect::new(0.0, 36.0, 1280.0, 252.0), color::band_background())
    );
    assert_eq!(
      cmds[2],
      DrawCommand::StrokeRect(
        Rect::new(2.0, 36.0, 1276.0, 252.0),
        color::border_accent(),
        BORDER_WIDTH
      )
    );
  }

  #[test]
  fn border_color_follows_priority() {
    assert_eq!(border_color(&FramePayload::idle()), color::border_accent());
    assert_eq!(border_color(&playing(vec![])), color::border_hand_detected());
    let mut notes_without_hand = playing(vec![note("RE4", "thumb", None)]);
    notes_without_hand.hand_detected = false;
    assert_eq!(border_color(&notes_without_hand), color::border_playing());
  }

  #[test]
  fn status_panel_layouts() {
    let r = KeyboardRenderer::new();

    let mut surface = RecordingSurface::new(1280.0, 720.0);
    r.render(&mut surface, &nav(1), &playing(vec![note("MI4", "middle", None)]));
    let texts = surface.texts();
    assert!(texts.contains(&"Note: MI4"));
    assert!(texts.contains(&"Finger: middle (Right)"));
    assert!(texts.contains(&"Octaves: 3-5"));

    let mut surface = RecordingSurface::new(1280.0, 720.0);
    let chord = playing(vec![note("DO4", "thumb", None), note("MI4", "middle", None)]);
    r.render(&mut surface, &nav(0), &chord);
    let texts = surface.texts();
    assert!(texts.contains(&"Chord: 2 notes"));
    assert!(texts.contains(&"Notes: DO4, MI4"));

    let mut surface = RecordingSurface::new(1280.0, 720.0);
    let mut hands = playing(vec![]);
    hands.hands_count = 2;
    r.render(&mut surface, &nav(2), &hands);
    let texts = surface.texts();
    assert!(texts.contains(&"2 hand(s) detected"));
    assert!(texts.contains(&HAND_PROMPT));
    assert!(texts.contains(&"Octaves: 4-6"));
    assert!(texts.contains(&CAPTION));
  }

  #[test]
  fn markers_only_for_notes_with_valid_positions() {
    let mut surface = RecordingSurface::new(1000.0, 500.0);
    let payload = playing(vec![
      note("DO4", "index", Some((0.5, 0.2))),
      note("MI4", "middle", None),
      note("FA4", "ring", Some((1.7, 0.2))),
      note("??", "pinky", Some((0.1, 0.1))),
    ]);
    KeyboardRenderer::new().render(&mut surface, &nav(0), &payload);

    let circles = surface.filled_circles();
    assert_eq!(circles.len(), 2);
    assert_eq!(
      circles[0],
      (
        Point { x: 500.0, y: 100.0 },
        MARKER_RADIUS,
        color::note_color(crate::keyboard::notes::NoteName::Do)
      )
    );
    assert_eq!(circles[1].2, color::unknown_marker_fill());

    let texts = surface.texts();
    assert!(texts.contains(&"i"));
    assert!(texts.contains(&"p"));
    assert!(!texts.contains(&"m"));
  }

  #[test]
  fn surface_failure_leaves_partial_frame() {
    let mut surface = RecordingSurface::failing_after(1280.0, 720.0, 5);
    KeyboardRenderer::new().render(&mut surface, &nav(0), &playing(vec![]));
    assert_eq!(surface.commands().len(), 5);

    let mut surface = RecordingSurface::failing_after(1280.0, 720.0, 5);
    let err = KeyboardRenderer::new()
      .try_render(&mut surface, &nav(0), &playing(vec![]))
      .unwrap_err();
    assert!(matches!(
      err.current_context(),
      OverlayError::SurfaceFailure(_)
    ));
  }

  #[test]
  fn window_without_playable_octave_is_skipped() {
    // total > max - min + 1 lets the offset move the whole window past max
    let range = OctaveRange::with_total(2, 3, 1, 4).unwrap();
    let nav = NavigationState::with_offset(range, 3);
    let mut surface = RecordingSurface::new(1280.0, 720.0);

    let err = KeyboardRenderer::new()
      .try_render(&mut surface, &nav, &FramePayload::idle())
      .unwrap_err();
    assert!(matches!(
      err.current_context(),
      OverlayError::MissingConfiguration(_)
    ));
    // the previous frame is wiped, nothing else is drawn
    assert_eq!(surface.commands(), &[DrawCommand::Clear]);
  }
}
