use std::fs;
use std::path::Path;

use error_stack::{IntoReport, Result, ResultExt};
use piano_overlay::config::PianoConfig;
use piano_overlay::error::OverlayError;
use piano_overlay::payload::{decode_payload, FramePayload};
use piano_overlay::render::KeyboardRenderer;

use super::{write_svg, CanvasArgs};

pub fn run_render(
  config: &PianoConfig,
  canvas: &CanvasArgs,
  payload: Option<&Path>,
  output: Option<&Path>,
) -> Result<(), OverlayError> {
  let payload = match payload {
    Some(path) => {
      let json = fs::read_to_string(path)
        .into_report()
        .change_context_lazy(|| OverlayError::FrameSourceError(format!("cannot read {}", path.display())))?;
      decode_payload(&json)?
    }
    None => FramePayload::idle(),
  };

  let nav = config.navigation_state()?;
  let mut surface = canvas.svg_surface();
  KeyboardRenderer::new().try_render(&mut surface, &nav, &payload)?;
  write_svg(&surface, output)
}
