//! Drives a gstreamer playbin from construction to shutdown

mod controller;
mod playbin;

pub use controller::{Pipeline, Player, PlayerError, PlayerState};
pub use playbin::Playbin;
