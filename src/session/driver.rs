//! Runs a [`PianoSession`] on its own tokio task.
//!
//! [`SessionDriver::new`] returns a handle, a receiver for [`SessionEvent`]s, and a Future
//! that runs the event loop. The Future needs to be spawned (or `await`ed) for anything to
//! happen. It resolves to the render surface once the loop exits, so callers can inspect
//! or save the final frame.
//!
//! The loop waits on three things: commands from the handle, the done signal, and the
//! expiry of the current gesture feedback (so the indicator turns off without needing a
//! new frame).

use std::pin::Pin;
use std::time::Duration;

use error_stack::{IntoReport, Result, ResultExt};
use futures::Future;
use log::{debug, info, warn};
use tokio::{
  sync::mpsc,
  time::{sleep, sleep_until, Instant, Sleep},
};

use super::{FrameOutcome, PianoSession};
use crate::drawing::RenderSurface;
use crate::error::OverlayError;
use crate::keyboard::octave::OctaveStatus;
use crate::payload::{Direction, FramePayload};

/// Requests sent to the driver loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
  /// A frame result arrived from the hand tracker.
  Frame(FramePayload),

  /// The "previous octave" button was pressed.
  PreviousOctave,

  /// The "next octave" button was pressed.
  NextOctave,

  /// Draw the last frame again.
  Redraw,
}

/// Notifications from the driver loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
  FrameHandled(FrameOutcome),

  /// The octave window moved, either from a button or a gesture.
  OctaveChanged(OctaveStatus),

  /// The gesture indicator or help text changed.
  FeedbackChanged {
    highlighted: Option<Direction>,
    help_text: &'static str,
  },
}

/// Inputs to the loop, after pulling from whichever source was ready.
#[derive(Debug)]
enum Action {
  Command(SessionCommand),
  FeedbackExpired,
}

pub struct SessionDriver {
  command_tx: mpsc::Sender<SessionCommand>,
  done_tx: mpsc::Sender<()>,
}

impl SessionDriver {
  pub fn new<S>(
    session: PianoSession,
    surface: S,
  ) -> (
    SessionDriver,
    mpsc::Receiver<SessionEvent>,
    impl Future<Output = S>,
  )
  where
    S: RenderSurface + Send + 'static,
  {
    let (command_tx, command_rx) = mpsc::channel(128);
    let (done_tx, done_rx) = mpsc::channel(1);
    let (event_tx, event_rx) = mpsc::channel(128);

    let internal = SessionDriverInternal {
      session,
      surface,
      events: event_tx,
      feedback_timeout: None,
    };
    let driver = SessionDriver { command_tx, done_tx };
    (driver, event_rx, internal.run(command_rx, done_rx))
  }

  pub async fn send(&self, cmd: SessionCommand) -> Result<(), OverlayError> {
    self
      .command_tx
      .send(cmd)
      .await
      .into_report()
      .change_context(OverlayError::SessionClosed)
  }

  pub async fn submit_frame(&self, payload: FramePayload) -> Result<(), OverlayError> {
    self.send(SessionCommand::Frame(payload)).await
  }

  /// Signals the loop to exit. Commands still queued when it sees the signal are dropped.
  pub async fn done(&self) -> Result<(), OverlayError> {
    self
      .done_tx
      .send(())
      .await
      .into_report()
      .change_context(OverlayError::SessionClosed)
  }
}

struct SessionDriverInternal<S> {
  session: PianoSession,
  surface: S,
  events: mpsc::Sender<SessionEvent>,
  feedback_timeout: Option<Pin<Box<Sleep>>>,
}

impl<S: RenderSurface + Send + 'static> SessionDriverInternal<S> {
  async fn run(
    mut self,
    mut commands: mpsc::Receiver<SessionCommand>,
    mut done_signal: mpsc::Receiver<()>,
  ) -> S {
    loop {
      // bail out if instructed
      if done_signal.try_recv().is_ok() {
        debug!("done signal received, exiting");
        break;
      }

      // with no feedback showing, wait on a timeout that never fires to keep the select! simple
      let mut feedback_timeout = &mut Box::pin(sleep(Duration::MAX));
      if let Some(t) = &mut self.feedback_timeout {
        feedback_timeout = t;
      }

      // Dropping the handle closes both channels. The done branch is then disabled, so any
      // queued commands are still handled before `commands` reports the close.
      let action = tokio::select! {
        Some(_) = done_signal.recv() => {
          debug!("done signal received, exiting");
          break;
        }

        _ = feedback_timeout => Action::FeedbackExpired,

        cmd = commands.recv() => match cmd {
          Some(cmd) => Action::Command(cmd),
          None => {
            info!("all session handles dropped, exiting");
            break;
          }
        },
      };

      self.perform(action).await;
    }

    self.surface
  }

  async fn perform(&mut self, action: Action) {
    use SessionCommand::*;

    let now = Instant::now();
    match action {
      Action::Command(Frame(payload)) => {
        let outcome = self
          .session
          .handle_frame(&mut self.surface, payload, now.into_std());
        let gesture = outcome.gesture;
        self.emit(SessionEvent::FrameHandled(outcome)).await;

        if let Some(g) = gesture {
          if g.moved() {
            self.emit(SessionEvent::OctaveChanged(self.session.octave_status())).await;
          }
          self.emit_feedback(now).await;
        }
      }

      Action::Command(PreviousOctave) => {
        if self.session.go_previous(&mut self.surface) {
          self.emit(SessionEvent::OctaveChanged(self.session.octave_status())).await;
        }
      }

      Action::Command(NextOctave) => {
        if self.session.go_next(&mut self.surface) {
          self.emit(SessionEvent::OctaveChanged(self.session.octave_status())).await;
        }
      }

      Action::Command(Redraw) => self.session.redraw(&mut self.surface),

      Action::FeedbackExpired => {
        debug!("gesture feedback timeout triggered");
        self.emit_feedback(now).await;
      }
    }
  }

  /// Reports the current feedback state and arms the timeout for its next change.
  async fn emit_feedback(&mut self, now: Instant) {
    let feedback = self.session.feedback();
    let std_now = now.into_std();
    let event = SessionEvent::FeedbackChanged {
      highlighted: feedback.highlighted(std_now),
      help_text: feedback.help_text(std_now),
    };

    self.feedback_timeout = feedback
      .next_expiry(std_now)
      .map(|deadline| Box::pin(sleep_until(Instant::from_std(deadline))));

    self.emit(event).await;
  }

  async fn emit(&self, event: SessionEvent) {
    if let Err(e) = self.events.send(event).await {
      warn!("session event dropped, nobody is listening: {:?}", e.0);
    }
  }
}
