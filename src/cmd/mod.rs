mod demo;
mod layout;
mod render;
mod replay;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use error_stack::{IntoReport, Result, ResultExt};
use log::{debug, info};
use piano_overlay::config::PianoConfig;
use piano_overlay::drawing::svg::SvgSurface;
use piano_overlay::error::OverlayError;
use piano_overlay::session::driver::SessionEvent;
use tokio::sync::mpsc;

use self::{demo::run_demo, layout::run_layout, render::run_render, replay::run_replay};

#[derive(Args, Debug, Clone, Copy)]
pub struct CanvasArgs {
  /// Canvas width in pixels
  #[clap(long, default_value_t = 1280.0)]
  width: f64,

  /// Canvas height in pixels
  #[clap(long, default_value_t = 720.0)]
  height: f64,

  /// Octave offset to start at, overriding the config file
  #[clap(long)]
  offset: Option<u8>,
}

impl CanvasArgs {
  /// Applies the command line overrides on top of the loaded config.
  fn apply(&self, config: &PianoConfig) -> PianoConfig {
    let mut config = config.clone();
    if let Some(offset) = self.offset {
      config.initial_offset = offset;
    }
    config
  }

  fn svg_surface(&self) -> SvgSurface {
    SvgSurface::new(self.width, self.height)
  }
}

#[derive(Subcommand)]
pub enum CliCommand {
  /// Prints the geometry of every visible key
  Layout {
    #[clap(flatten)]
    canvas: CanvasArgs,
  },

  /// Renders a single frame payload (JSON) to an SVG file
  Render {
    /// Payload file. Renders the idle keyboard if omitted.
    #[clap(value_parser)]
    payload: Option<PathBuf>,

    /// Where to write the SVG. Defaults to stdout.
    #[clap(long, short, value_parser)]
    output: Option<PathBuf>,

    #[clap(flatten)]
    canvas: CanvasArgs,
  },

  /// Replays a recording of frame payloads, one JSON object per line
  Replay {
    #[clap(value_parser)]
    frames: PathBuf,

    /// Write the last rendered frame to this SVG file
    #[clap(long, short, value_parser)]
    output: Option<PathBuf>,

    /// Play frames back at the configured frame rate instead of as fast as possible
    #[clap(long)]
    realtime: bool,

    #[clap(flatten)]
    canvas: CanvasArgs,
  },

  /// Runs a session fed by a simulated hand tracker
  Demo {
    /// Number of camera frames to simulate
    #[clap(long, default_value_t = 300)]
    frames: usize,

    /// Random seed for the simulated hand
    #[clap(long, default_value_t = 1)]
    seed: u64,

    /// Write the last rendered frame to this SVG file
    #[clap(long, short, value_parser)]
    output: Option<PathBuf>,

    #[clap(flatten)]
    canvas: CanvasArgs,
  },
}

impl CliCommand {
  pub async fn run(&self, config: &PianoConfig) -> Result<(), OverlayError> {
    match self {
      Self::Layout { canvas } => run_layout(&canvas.apply(config), canvas),

      Self::Render {
        payload,
        output,
        canvas,
      } => run_render(&canvas.apply(config), canvas, payload.as_deref(), output.as_deref()),

      Self::Replay {
        frames,
        output,
        realtime,
        canvas,
      } => run_replay(&canvas.apply(config), canvas, frames, output.as_deref(), *realtime).await,

      Self::Demo {
        frames,
        seed,
        output,
        canvas,
      } => run_demo(&canvas.apply(config), canvas, *frames, *seed, output.as_deref()).await,
    }
  }
}

/// Writes an SVG document to `output`, or to stdout if there isn't one.
fn write_svg(surface: &SvgSurface, output: Option<&Path>) -> Result<(), OverlayError> {
  let doc = surface.to_document();
  match output {
    Some(path) => {
      fs::write(path, doc)
        .into_report()
        .change_context_lazy(|| OverlayError::SurfaceFailure(format!("cannot write {}", path.display())))?;
      info!("wrote {}", path.display());
    }
    None => print!("{doc}"),
  }
  Ok(())
}

/// Totals reported at the end of a replay or demo run.
#[derive(Debug, Default)]
struct RunSummary {
  frames: usize,
  notes_played: usize,
  octave_changes: usize,
}

/// Logs session events as they arrive until the driver loop exits.
async fn log_events(mut events: mpsc::Receiver<SessionEvent>) -> RunSummary {
  let mut summary = RunSummary::default();
  while let Some(event) = events.recv().await {
    match event {
      SessionEvent::FrameHandled(outcome) => {
        summary.frames += 1;
        for onset in &outcome.onsets {
          info!("note on: {} ({} {})", onset.note, onset.hand, onset.finger);
        }
        summary.notes_played += outcome.onsets.len();
      }
      SessionEvent::OctaveChanged(status) => {
        summary.octave_changes += 1;
        info!("{}", status);
      }
      SessionEvent::FeedbackChanged {
        highlighted,
        help_text,
      } => debug!("feedback: {:?} / {}", highlighted, help_text),
    }
  }
  summary
}
