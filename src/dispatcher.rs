//! Turns pipeline notifications into console output, and stops the run loop when playback is over

use crate::notification::Notification;
use crate::run_loop::{Handle, Termination};

/// Where operator-visible lines are written
pub trait Console {
    /// An informational line, written to stdout
    fn info(&mut self, line: std::fmt::Arguments);

    /// An error line, written to stderr
    fn error(&mut self, line: std::fmt::Arguments);
}

/// Writes to the process's stdout and stderr
#[derive(Clone, Copy, Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn info(&mut self, line: std::fmt::Arguments) {
        println!("{}", line);
    }

    fn error(&mut self, line: std::fmt::Arguments) {
        eprintln!("{}", line);
    }
}

/// Whether the run loop should keep going after a notification
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Terminate,
}

pub struct Dispatcher<'c, C: Console> {
    console: &'c mut C,
    termination: Handle,
}

impl<'c, C: Console> Dispatcher<'c, C> {
    pub fn new(console: &'c mut C, termination: Handle) -> Self {
        Self {
            console,
            termination,
        }
    }

    fn terminate(&self, reason: Termination) -> Flow {
        if !self.termination.request(reason) {
            tracing::debug!("Run loop already stopping, ignoring {:?}", reason);
        }
        Flow::Terminate
    }

    pub fn dispatch(&mut self, notification: Notification) -> Flow {
        match notification {
            Notification::StateChanged {
                source,
                from_pipeline,
                old,
                current,
                pending,
            } => {
                if from_pipeline {
                    self.console
                        .info(format_args!("State changed [{}] {} > {}", source, old, current));
                } else {
                    tracing::trace!(
                        target: concat!(module_path!(), "::state_change"),
                        "[{}] {} > {} ({})",
                        source,
                        old,
                        current,
                        pending
                    );
                }
                Flow::Continue
            }
            Notification::Error {
                source,
                message,
                debug,
            } => {
                self.console.error(format_args!(
                    "Error received [{}] ({}, {})",
                    source,
                    message,
                    debug.as_deref().unwrap_or_default()
                ));
                self.terminate(Termination::Error)
            }
            Notification::EndOfStream => {
                self.console.info(format_args!("EOS"));
                self.terminate(Termination::EndOfStream)
            }
            Notification::Other => Flow::Continue,
        }
    }
}

/// A console which records lines rather than printing them
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingConsole {
    pub info: Vec<String>,
    pub errors: Vec<String>,
}

#[cfg(test)]
impl Console for RecordingConsole {
    fn info(&mut self, line: std::fmt::Arguments) {
        self.info.push(line.to_string());
    }

    fn error(&mut self, line: std::fmt::Arguments) {
        self.errors.push(line.to_string());
    }
}
