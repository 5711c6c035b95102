use error_stack::Result;
use piano_overlay::config::PianoConfig;
use piano_overlay::error::OverlayError;
use piano_overlay::keyboard::layout::compute_layout;

use super::CanvasArgs;

pub fn run_layout(config: &PianoConfig, canvas: &CanvasArgs) -> Result<(), OverlayError> {
  let nav = config.navigation_state()?;
  let layout = compute_layout(canvas.width, canvas.height, &nav);

  println!("{}", nav.status());
  if layout.is_empty() {
    println!("(no keys: canvas {}x{})", canvas.width, canvas.height);
    return Ok(());
  }

  let band = layout.band();
  println!(
    "band: y={} height={} slot width={:.2}",
    band.y,
    band.height,
    layout.slot_width()
  );
  for key in layout.keys() {
    println!(
      "{:<6} {:<5} x={:>8.2} y={:>6.1} w={:>6.2} h={:>6.1}",
      key.identity(),
      if key.is_black { "black" } else { "white" },
      key.x,
      key.y,
      key.width,
      key.height
    );
  }
  Ok(())
}
