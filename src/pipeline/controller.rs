use futures_util::Stream;

use crate::dispatcher::Console;
use crate::notification::Notification;
use crate::run_loop::{self, RunLoop, Termination};

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("Failed to initialise gstreamer")]
    Init(#[source] glib::Error),
    #[error("Can't resolve stream URI")]
    Uri(#[source] anyhow::Error),
    #[error("Can't create playback pipeline")]
    Construction(#[source] glib::BoolError),
    #[error("Can't configure playback pipeline")]
    Configuration(#[source] anyhow::Error),
    #[error("Playback pipeline has no bus")]
    NoBus,
    #[error("Can't create run loop")]
    RunLoop(#[source] std::io::Error),
    #[error("Can't start playback")]
    Start(#[source] gstreamer::StateChangeError),
    #[error("Player is {0:?}")]
    InvalidState(PlayerState),
}

/// The engine side of playback: something which can be started, stopped, and which produces notifications
pub trait Pipeline {
    type Notifications: Stream<Item = Notification> + Unpin;

    /// Subscribe to notifications. Must be called before [`Pipeline::play`] so that none are missed.
    fn notifications(&self) -> Result<Self::Notifications, PlayerError>;

    /// Request the playing state
    fn play(&mut self) -> Result<(), PlayerError>;

    /// Force the inactive state. Calling this more than once has no further effect.
    fn stop(&mut self);

    /// Dump a description of the pipeline for debugging, if enabled
    fn debug_pipeline(&self) {}
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayerState {
    Constructed,
    Playing,
    Stopped,
}

/// Owns a pipeline and the run loop which waits on it
pub struct Player<P: Pipeline, C: Console> {
    state: PlayerState,
    console: C,
    run_loop: Option<RunLoop>,
    notifications: Option<P::Notifications>,
    pipeline: Option<P>,
}

impl<P: Pipeline, C: Console> Player<P, C> {
    /// Create the run loop and attach to the pipeline's notifications
    pub fn new(pipeline: P, console: C) -> Result<Self, PlayerError> {
        let run_loop = RunLoop::new().map_err(PlayerError::RunLoop)?;
        let notifications = pipeline.notifications()?;

        Ok(Self {
            state: PlayerState::Constructed,
            console,
            run_loop: Some(run_loop),
            notifications: Some(notifications),
            pipeline: Some(pipeline),
        })
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// A handle which stops playback, for example when the operator cancels.
    ///
    /// Returns `None` once the run loop has been released.
    pub fn terminate_handle(&self) -> Option<run_loop::Handle> {
        self.run_loop.as_ref().map(RunLoop::handle)
    }

    /// Request the playing state. On failure everything is released and the player is stopped.
    pub fn start(&mut self) -> Result<(), PlayerError> {
        if self.state != PlayerState::Constructed {
            return Err(PlayerError::InvalidState(self.state));
        }

        let result = self
            .pipeline
            .as_mut()
            .ok_or(PlayerError::InvalidState(self.state))
            .and_then(Pipeline::play);

        match result {
            Ok(()) => {
                self.state = PlayerState::Playing;
                Ok(())
            }
            Err(err) => {
                self.shutdown();
                Err(err)
            }
        }
    }

    /// Block until playback ends, then shut down
    pub fn run(&mut self) -> Result<Termination, PlayerError> {
        if self.state != PlayerState::Playing {
            return Err(PlayerError::InvalidState(self.state));
        }

        let (run_loop, notifications) = match (self.run_loop.take(), self.notifications.take()) {
            (Some(run_loop), Some(notifications)) => (run_loop, notifications),
            _ => return Err(PlayerError::InvalidState(self.state)),
        };

        self.console.info(format_args!("Waiting on playback loop ..."));

        let termination = run_loop.run(notifications, &mut self.console);

        if termination == Termination::Error {
            if let Some(pipeline) = &self.pipeline {
                pipeline.debug_pipeline();
            }
        }

        self.console.info(format_args!("End of playback"));

        self.shutdown();

        Ok(termination)
    }

    /// Release the run loop, then stop and release the pipeline
    pub fn shutdown(&mut self) {
        if self.state == PlayerState::Stopped {
            return;
        }

        let terminate_handle = self.terminate_handle();

        drop(self.notifications.take());
        drop(self.run_loop.take());

        debug_assert!(terminate_handle.map_or(true, |handle| handle.is_closed()));

        if let Some(mut pipeline) = self.pipeline.take() {
            pipeline.stop();
        }

        self.state = PlayerState::Stopped;

        tracing::debug!("Player shut down");
    }
}

impl<P: Pipeline, C: Console> Drop for Player<P, C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
