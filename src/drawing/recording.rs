use error_stack::{report, Result};

use super::color::Color;
use super::{Float, Point, Rect, RenderSurface, Size, TextStyle};
use crate::error::OverlayError;

/// One call made against a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
  Clear,
  FillRect(Rect, Color),
  StrokeRect(Rect, Color, Float),
  FillCircle(Point, Float, Color),
  StrokeCircle(Point, Float, Color, Float),
  FillText(String, Point, TextStyle),
}

/// A [`RenderSurface`] that just remembers what was drawn on it.
///
/// Used to inspect frames in tests. It can also be told to start failing after a
/// number of calls, to exercise error handling.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
  size: Size,
  commands: Vec<DrawCommand>,
  fail_after: Option<usize>,
}

impl RecordingSurface {
  pub fn new(width: Float, height: Float) -> RecordingSurface {
    RecordingSurface {
      size: Size::new(width, height),
      commands: vec![],
      fail_after: None,
    }
  }

  /// Returns a surface that accepts `n` drawing calls and fails every call after that.
  pub fn failing_after(width: Float, height: Float, n: usize) -> RecordingSurface {
    RecordingSurface {
      fail_after: Some(n),
      ..RecordingSurface::new(width, height)
    }
  }

  pub fn commands(&self) -> &[DrawCommand] {
    &self.commands
  }

  pub fn is_empty(&self) -> bool {
    self.commands.is_empty()
  }

  /// All text drawn since the surface was created, in draw order.
  pub fn texts(&self) -> Vec<&str> {
    self
      .commands
      .iter()
      .filter_map(|c| match c {
        DrawCommand::FillText(s, _, _) => Some(s.as_str()),
        _ => None,
      })
      .collect()
  }

  pub fn filled_rects(&self) -> Vec<(Rect, Color)> {
    self
      .commands
      .iter()
      .filter_map(|c| match c {
        DrawCommand::FillRect(r, col) => Some((*r, *col)),
        _ => None,
      })
      .collect()
  }

  pub fn filled_circles(&self) -> Vec<(Point, Float, Color)> {
    self
      .commands
      .iter()
      .filter_map(|c| match c {
        DrawCommand::FillCircle(p, r, col) => Some((*p, *r, *col)),
        _ => None,
      })
      .collect()
  }

  fn record(&mut self, cmd: DrawCommand) -> Result<(), OverlayError> {
    if let Some(n) = self.fail_after {
      if self.commands.len() >= n {
        return Err(report!(OverlayError::SurfaceFailure(format!(
          "surface rejected {:?}",
          cmd
        ))));
      }
    }
    self.commands.push(cmd);
    Ok(())
  }
}

impl RenderSurface for RecordingSurface {
  fn size(&self) -> Size {
    self.size
  }

  fn clear(&mut self) -> Result<(), OverlayError> {
    self.record(DrawCommand::Clear)
  }

  fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), OverlayError> {
    self.record(DrawCommand::FillRect(rect, color))
  }

  fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: Float) -> Result<(), OverlayError> {
    self.record(DrawCommand::StrokeRect(rect, color, line_width))
  }

  fn fill_circle(&mut self, center: Point, radius: Float, color: Color) -> Result<(), OverlayError> {
    self.record(DrawCommand::FillCircle(center, radius, color))
  }

  fn stroke_circle(
    &mut self,
    center: Point,
    radius: Float,
    color: Color,
    line_width: Float,
  ) -> Result<(), OverlayError> {
    self.record(DrawCommand::StrokeCircle(center, radius, color, line_width))
  }

  fn fill_text(&mut self, text: &str, at: Point, style: TextStyle) -> Result<(), OverlayError> {
    self.record(DrawCommand::FillText(text.to_string(), at, style))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::drawing::color::white;

  #[test]
  fn records_commands_in_order() {
    let mut s = RecordingSurface::new(100.0, 100.0);
    s.clear().unwrap();
    s.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), white()).unwrap();
    s.fill_text("hi", Point { x: 0.0, y: 0.0 }, TextStyle::new(12.0, white()))
      .unwrap();

    assert_eq!(s.commands().len(), 3);
    assert_eq!(s.commands()[0], DrawCommand::Clear);
    assert_eq!(s.texts(), vec!["hi"]);
    assert_eq!(s.filled_rects().len(), 1);
  }

  #[test]
  fn failing_surface_rejects_calls_past_limit() {
    let mut s = RecordingSurface::failing_after(100.0, 100.0, 1);
    assert!(s.clear().is_ok());
    let err = s
      .fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), white())
      .unwrap_err();
    assert!(matches!(
      err.current_context(),
      OverlayError::SurfaceFailure(_)
    ));
    assert_eq!(s.commands().len(), 1);
  }
}
