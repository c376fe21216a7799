//! The blocking wait context which playback runs inside

use std::sync::{Arc, Mutex, PoisonError};

use futures_util::{FutureExt, Stream, StreamExt};
use tokio::sync::oneshot;

use crate::dispatcher::{Console, Dispatcher, Flow};
use crate::notification::Notification;

/// Why the run loop stopped
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Termination {
    EndOfStream,
    Error,
    /// The operator pressed Ctrl+C
    Interrupted,
    /// The notification stream closed, or every termination handle was dropped
    Abandoned,
}

/// Requests that the run loop terminates.
///
/// Handles are cheap to clone and all share one underlying signal, so only the first request has any effect.
#[derive(Clone)]
pub struct Handle {
    sender: Arc<Mutex<Option<oneshot::Sender<Termination>>>>,
}

impl Handle {
    /// Request termination. Returns `true` if this call stopped the loop, `false` if it was already stopped.
    pub fn request(&self, reason: Termination) -> bool {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            Some(sender) => {
                tracing::debug!("Termination requested: {:?}", reason);
                sender.send(reason).is_ok()
            }
            None => false,
        }
    }

    /// True once the loop has been asked to stop, or once the loop itself has been released
    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(true, oneshot::Sender::is_closed)
    }
}

/// Resolves when a [`Handle`] requests termination
#[must_use = "Signals must be awaited or polled"]
pub struct Signal {
    signal: oneshot::Receiver<Termination>,
}

impl Signal {
    pub fn new() -> (Handle, Self) {
        let (sender, signal) = oneshot::channel();
        (
            Handle {
                sender: Arc::new(Mutex::new(Some(sender))),
            },
            Signal { signal },
        )
    }
}

impl std::future::Future for Signal {
    type Output = Termination;

    fn poll(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        self.signal
            .poll_unpin(cx)
            .map(|reason| reason.unwrap_or(Termination::Abandoned))
    }
}

/// Feed `notifications` to `dispatcher` in order until termination is signalled.
///
/// Nothing more is read from `notifications` once the dispatcher asks to terminate.
pub async fn drive<S, C>(
    mut notifications: S,
    dispatcher: &mut Dispatcher<'_, C>,
    mut signal: Signal,
) -> Termination
where
    S: Stream<Item = Notification> + Unpin,
    C: Console,
{
    loop {
        tokio::select! {
            biased;

            reason = &mut signal => return reason,
            notification = notifications.next() => match notification {
                Some(notification) => {
                    if dispatcher.dispatch(notification) == Flow::Terminate {
                        return signal.await;
                    }
                }
                None => {
                    tracing::warn!("Notification stream closed");
                    return Termination::Abandoned;
                }
            },
        }
    }
}

/// Run `playback` until it completes or `interrupt` resolves, in which case termination is requested through `handle`.
///
/// `interrupt` is dropped with the run, so it never outlives playback.
pub async fn until_interrupted(
    playback: impl std::future::Future<Output = Termination>,
    interrupt: impl std::future::Future<Output = ()>,
    handle: Handle,
) -> Termination {
    tokio::select! {
        biased;

        termination = playback => termination,
        () = interrupt => {
            handle.request(Termination::Interrupted);
            Termination::Interrupted
        }
    }
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {:#}", err);
        std::future::pending::<()>().await;
    }
}

/// A single threaded runtime which blocks the calling thread until playback terminates
pub struct RunLoop {
    runtime: tokio::runtime::Runtime,
    handle: Handle,
    signal: Signal,
}

impl RunLoop {
    pub fn new() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (handle, signal) = Signal::new();

        Ok(Self {
            runtime,
            handle,
            signal,
        })
    }

    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Block until termination is requested, either by the dispatcher or by Ctrl+C.
    ///
    /// The loop is consumed, so it is released as soon as this returns.
    pub fn run<S, C>(self, notifications: S, console: &mut C) -> Termination
    where
        S: Stream<Item = Notification> + Unpin,
        C: Console,
    {
        let Self {
            runtime,
            handle,
            signal,
        } = self;

        let interrupt_handle = handle.clone();

        let termination = runtime.block_on(async {
            let mut dispatcher = Dispatcher::new(console, handle);

            until_interrupted(
                drive(notifications, &mut dispatcher, signal),
                ctrl_c(),
                interrupt_handle,
            )
            .await
        });

        tracing::debug!("Run loop stopped: {:?}", termination);

        termination
    }
}
