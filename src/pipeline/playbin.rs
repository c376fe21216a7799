//! A wrapper around a gstreamer playbin

use anyhow::Context;
use futures_util::stream::{LocalBoxStream, StreamExt};
use gstreamer::prelude::*;
use gstreamer_audio::prelude::*;

use crate::config::Config;
use super::controller::{Pipeline, PlayerError};
use crate::notification::Notification;

const MAX_VOLUME_PERCENT: u32 = 1000;

pub struct Playbin {
    element: gstreamer::Element,
    is_stopped: bool,
}

impl Playbin {
    /// Create a playbin which will fetch and render `uri`
    pub fn new(uri: &str, config: &Config) -> Result<Self, PlayerError> {
        let element = gstreamer::ElementFactory::make("playbin")
            .name("pipeline")
            .property("uri", uri)
            .build()
            .map_err(PlayerError::Construction)?;

        let playbin = Self {
            element,
            is_stopped: false,
        };

        playbin
            .configure(config)
            .map_err(PlayerError::Configuration)?;

        Ok(playbin)
    }

    fn configure(&self, config: &Config) -> anyhow::Result<()> {
        if config.audio_only {
            let flags = self.element.property_value("flags");
            let flags_class = glib::FlagsClass::with_type(flags.type_())
                .context("Failed to create a flags class")?;
            let flags = flags_class
                .builder_with_value(flags)
                .context("Playbin flags have the wrong type")?
                .unset_by_nick("text")
                .unset_by_nick("video")
                .build()
                .context("Failed to set flags")?;
            self.element.set_property_from_value("flags", &flags);
        }

        if let Some(buffering_duration) = config.buffering_duration {
            let duration_nanos: i64 = buffering_duration
                .as_nanos()
                .try_into()
                .context("Bad buffer duration")?;

            self.element.set_property("buffer-duration", duration_nanos);
        }

        if let Some(volume) = config.volume {
            let volume = volume.min(MAX_VOLUME_PERCENT);
            tracing::debug!("Initial Volume: {}%", volume);

            self.element
                .dynamic_cast_ref::<gstreamer_audio::StreamVolume>()
                .context("Playbin has no volume")?
                .set_volume(
                    gstreamer_audio::StreamVolumeFormat::Linear,
                    f64::from(volume) / 100.0,
                );
        }

        Ok(())
    }

    fn do_debug_pipeline(&self) -> anyhow::Result<()> {
        let gst_debug_dump_dot_dir = std::env::var("GST_DEBUG_DUMP_DOT_DIR")
            .context("Failed to get GST_DEBUG_DUMP_DOT_DIR")?;

        let bin = self
            .element
            .downcast_ref::<gstreamer::Bin>()
            .context("Playbin is not a bin")?;

        bin.debug_to_dot_file_with_ts(
            gstreamer::DebugGraphDetails::all(),
            env!("CARGO_PKG_NAME"),
        );

        tracing::info!("Created dotfile in {}", gst_debug_dump_dot_dir);

        Ok(())
    }
}

impl Pipeline for Playbin {
    type Notifications = LocalBoxStream<'static, Notification>;

    fn notifications(&self) -> Result<Self::Notifications, PlayerError> {
        let bus = self.element.bus().ok_or(PlayerError::NoBus)?;
        let pipeline = self.element.clone();

        Ok(bus
            .stream()
            .map(move |message| Notification::from_message(&message, &pipeline))
            .boxed_local())
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        let success = self
            .element
            .set_state(gstreamer::State::Playing)
            .map_err(PlayerError::Start)?;
        tracing::debug!("Requested PLAYING: {:?}", success);
        Ok(())
    }

    fn stop(&mut self) {
        if std::mem::replace(&mut self.is_stopped, true) {
            return;
        }

        if let Err(err) = self.element.set_state(gstreamer::State::Null) {
            tracing::error!("Failed to set the playbin to NULL: {:#}", err);
        }
    }

    fn debug_pipeline(&self) {
        if std::env::var_os("GST_DEBUG_DUMP_DOT_DIR").is_none() {
            return;
        }

        if let Err(err) = self.do_debug_pipeline() {
            tracing::error!("{:#}", err);
        }
    }
}

impl Drop for Playbin {
    fn drop(&mut self) {
        self.stop();
    }
}
