//! Types for describing 2D shapes, plus the [`RenderSurface`] trait that the
//! keyboard renderer draws onto.
pub mod color;
pub mod recording;
pub mod svg;

use error_stack::Result;

use self::color::Color;
use crate::error::OverlayError;

/// Just a typedef for the floating point type used for coordinates, etc.
pub type Float = f64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
  pub x: Float,
  pub y: Float,
}

impl From<(Float, Float)> for Point {
  fn from(p: (Float, Float)) -> Self {
    Point { x: p.0, y: p.1 }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
  pub width: Float,
  pub height: Float,
}

impl Size {
  pub fn new(width: Float, height: Float) -> Size {
    Size { width, height }
  }

  /// True if both dimensions are finite and strictly positive.
  pub fn is_drawable(&self) -> bool {
    self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
  }
}

/// An axis-aligned rectangle, with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
  pub x: Float,
  pub y: Float,
  pub width: Float,
  pub height: Float,
}

impl Rect {
  pub fn new(x: Float, y: Float, width: Float, height: Float) -> Rect {
    Rect {
      x,
      y,
      width,
      height,
    }
  }

  pub fn right(&self) -> Float {
    self.x + self.width
  }

  pub fn bottom(&self) -> Float {
    self.y + self.height
  }

  pub fn center(&self) -> Point {
    Point {
      x: self.x + self.width / 2.0,
      y: self.y + self.height / 2.0,
    }
  }

  /// Inclusive of the top / left edges, exclusive of the bottom / right edges,
  /// so that adjacent rects never both contain a point.
  pub fn contains(&self, p: Point) -> bool {
    p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
  Left,
  Center,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
  pub font_size: Float,
  pub bold: bool,
  pub align: TextAlign,
  pub color: Color,
}

impl TextStyle {
  pub fn new(font_size: Float, color: Color) -> TextStyle {
    TextStyle {
      font_size,
      bold: false,
      align: TextAlign::Left,
      color,
    }
  }

  pub fn bold(mut self) -> Self {
    self.bold = true;
    self
  }

  pub fn centered(mut self) -> Self {
    self.align = TextAlign::Center;
    self
  }

  /// CSS-style font shorthand, e.g. `bold 14px Arial`.
  pub fn font(&self) -> String {
    if self.bold {
      format!("bold {}px Arial", self.font_size)
    } else {
      format!("{}px Arial", self.font_size)
    }
  }
}

/// A 2D drawing target with pixel dimensions.
///
/// The surface is owned by whoever is displaying it; the renderer only borrows it
/// for the duration of a single frame. Every drawing call may fail, e.g. if the
/// backing store has gone away.
pub trait RenderSurface {
  fn size(&self) -> Size;

  fn clear(&mut self) -> Result<(), OverlayError>;

  fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), OverlayError>;

  fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: Float) -> Result<(), OverlayError>;

  fn fill_circle(&mut self, center: Point, radius: Float, color: Color) -> Result<(), OverlayError>;

  fn stroke_circle(
    &mut self,
    center: Point,
    radius: Float,
    color: Color,
    line_width: Float,
  ) -> Result<(), OverlayError>;

  fn fill_text(&mut self, text: &str, at: Point, style: TextStyle) -> Result<(), OverlayError>;
}
