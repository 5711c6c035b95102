use error_stack::Result;

use super::color::{css_color, Color};
use super::{Float, Point, Rect, RenderSurface, Size, TextAlign, TextStyle};
use crate::error::OverlayError;

/// A [`RenderSurface`] that accumulates SVG elements, for rendering frames
/// to a file instead of a live canvas.
#[derive(Debug, Clone)]
pub struct SvgSurface {
  size: Size,
  elements: Vec<String>,
}

impl SvgSurface {
  pub fn new(width: Float, height: Float) -> SvgSurface {
    SvgSurface {
      size: Size::new(width, height),
      elements: vec![],
    }
  }

  pub fn element_count(&self) -> usize {
    self.elements.len()
  }

  /// Returns a standalone SVG document containing everything drawn so far.
  pub fn to_document(&self) -> String {
    let Size { width, height } = self.size;
    let mut doc = format!(
      r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    doc.push('\n');
    for el in &self.elements {
      doc.push_str("  ");
      doc.push_str(el);
      doc.push('\n');
    }
    doc.push_str("</svg>\n");
    doc
  }
}

fn escape_text(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&apos;"),
      _ => out.push(c),
    }
  }
  out
}

impl RenderSurface for SvgSurface {
  fn size(&self) -> Size {
    self.size
  }

  fn clear(&mut self) -> Result<(), OverlayError> {
    self.elements.clear();
    Ok(())
  }

  fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<(), OverlayError> {
    let Rect {
      x,
      y,
      width,
      height,
    } = rect;
    let fill = css_color(&color);
    self.elements.push(format!(
      r#"<rect x="{x}" y="{y}" width="{width}" height="{height}" fill="{fill}"/>"#
    ));
    Ok(())
  }

  fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: Float) -> Result<(), OverlayError> {
    let Rect {
      x,
      y,
      width,
      height,
    } = rect;
    let stroke = css_color(&color);
    self.elements.push(format!(
      r#"<rect x="{x}" y="{y}" width="{width}" height="{height}" fill="none" stroke="{stroke}" stroke-width="{line_width}"/>"#
    ));
    Ok(())
  }

  fn fill_circle(&mut self, center: Point, radius: Float, color: Color) -> Result<(), OverlayError> {
    let Point { x, y } = center;
    let fill = css_color(&color);
    self.elements.push(format!(
      r#"<circle cx="{x}" cy="{y}" r="{radius}" fill="{fill}"/>"#
    ));
    Ok(())
  }

  fn stroke_circle(
    &mut self,
    center: Point,
    radius: Float,
    color: Color,
    line_width: Float,
  ) -> Result<(), OverlayError> {
    let Point { x, y } = center;
    let stroke = css_color(&color);
    self.elements.push(format!(
      r#"<circle cx="{x}" cy="{y}" r="{radius}" fill="none" stroke="{stroke}" stroke-width="{line_width}"/>"#
    ));
    Ok(())
  }

  fn fill_text(&mut self, text: &str, at: Point, style: TextStyle) -> Result<(), OverlayError> {
    let Point { x, y } = at;
    let fill = css_color(&style.color);
    let anchor = match style.align {
      TextAlign::Left => "start",
      TextAlign::Center => "middle",
    };
    let weight = if style.bold { "bold" } else { "normal" };
    let size = style.font_size;
    let text = escape_text(text);
    self.elements.push(format!(
      r#"<text x="{x}" y="{y}" font-family="Arial" font-size="{size}" font-weight="{weight}" text-anchor="{anchor}" fill="{fill}">{text}</text>"#
    ));
    Ok(())
  }
}
