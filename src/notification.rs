//! Notifications emitted by the playback engine, decoupled from gstreamer's message types

use gstreamer::prelude::*;

/// The state of a pipeline or element
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PipelineState {
    VoidPending,
    Null,
    Ready,
    Paused,
    Playing,
    Unknown,
}

impl From<gstreamer::State> for PipelineState {
    fn from(state: gstreamer::State) -> Self {
        match state {
            gstreamer::State::VoidPending => Self::VoidPending,
            gstreamer::State::Null => Self::Null,
            gstreamer::State::Ready => Self::Ready,
            gstreamer::State::Paused => Self::Paused,
            gstreamer::State::Playing => Self::Playing,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::VoidPending => "VOID_PENDING",
            Self::Null => "NULL",
            Self::Ready => "READY",
            Self::Paused => "PAUSED",
            Self::Playing => "PLAYING",
            Self::Unknown => "UNKNOWN!",
        })
    }
}

/// A single message from the pipeline bus
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    StateChanged {
        source: String,
        /// True if the message originated from the top-level pipeline rather than one of its children
        from_pipeline: bool,
        old: PipelineState,
        current: PipelineState,
        pending: PipelineState,
    },
    Error {
        source: String,
        message: String,
        debug: Option<String>,
    },
    EndOfStream,
    Other,
}

fn source_name(message: &gstreamer::Message) -> String {
    message
        .src()
        .map_or_else(|| String::from("unknown"), |src| src.name().to_string())
}

impl Notification {
    /// Classify `message`, comparing its source against `pipeline` by identity
    pub fn from_message(message: &gstreamer::Message, pipeline: &gstreamer::Element) -> Self {
        use gstreamer::MessageView;

        match message.view() {
            MessageView::StateChanged(state_change) => Self::StateChanged {
                source: source_name(message),
                from_pipeline: message
                    .src()
                    .map_or(false, |src| src == pipeline.upcast_ref::<gstreamer::Object>()),
                old: state_change.old().into(),
                current: state_change.current().into(),
                pending: state_change.pending().into(),
            },
            MessageView::Error(err) => Self::Error {
                source: source_name(message),
                message: err.error().message().to_string(),
                debug: err.debug().map(|debug| debug.to_string()),
            },
            MessageView::Eos(..) => Self::EndOfStream,
            _ => {
                tracing::trace!(
                    target: concat!(module_path!(), "::ignored"),
                    "{:?} from {}",
                    message.type_(),
                    source_name(message)
                );
                Self::Other
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use gstreamer::prelude::*;

    use super::*;

    #[test]
    fn state_names_match_gstreamer() {
        assert_eq!(PipelineState::from(gstreamer::State::Null).to_string(), "NULL");
        assert_eq!(PipelineState::from(gstreamer::State::Ready).to_string(), "READY");
        assert_eq!(PipelineState::from(gstreamer::State::Paused).to_string(), "PAUSED");
        assert_eq!(PipelineState::from(gstreamer::State::Playing).to_string(), "PLAYING");
        assert_eq!(
            PipelineState::from(gstreamer::State::VoidPending).to_string(),
            "VOID_PENDING"
        );
    }

    fn pipeline_with_child() -> (gstreamer::Pipeline, gstreamer::Bin) {
        gstreamer::init().unwrap();

        let pipeline = gstreamer::Pipeline::with_name("pipeline");
        let child = gstreamer::Bin::with_name("decoder");
        pipeline.add(&child).unwrap();

        (pipeline, child)
    }

    fn state_changed_from(src: &impl IsA<gstreamer::Object>) -> gstreamer::Message {
        gstreamer::message::StateChanged::builder(
            gstreamer::State::Paused,
            gstreamer::State::Playing,
            gstreamer::State::VoidPending,
        )
        .src(src)
        .build()
    }

    #[test]
    fn state_change_from_pipeline() {
        let (pipeline, _child) = pipeline_with_child();

        let notification =
            Notification::from_message(&state_changed_from(&pipeline), pipeline.upcast_ref());

        assert_eq!(
            notification,
            Notification::StateChanged {
                source: "pipeline".into(),
                from_pipeline: true,
                old: PipelineState::Paused,
                current: PipelineState::Playing,
                pending: PipelineState::VoidPending,
            }
        );
    }

    #[test]
    fn state_change_from_child_element() {
        let (pipeline, child) = pipeline_with_child();

        let notification =
            Notification::from_message(&state_changed_from(&child), pipeline.upcast_ref());

        match notification {
            Notification::StateChanged {
                source,
                from_pipeline,
                ..
            } => {
                assert_eq!(source, "decoder");
                assert!(!from_pipeline);
            }
            other => panic!("Expected a state change, got {:?}", other),
        }
    }

    #[test]
    fn error_names_its_source() {
        let (pipeline, child) = pipeline_with_child();

        let message =
            gstreamer::message::Error::builder(gstreamer::ResourceError::NotFound, "No such file")
                .src(&child)
                .build();

        assert_eq!(
            Notification::from_message(&message, pipeline.upcast_ref()),
            Notification::Error {
                source: "decoder".into(),
                message: "No such file".into(),
                debug: None,
            }
        );
    }

    #[test]
    fn error_with_debug_info() {
        let (pipeline, _child) = pipeline_with_child();

        let message =
            gstreamer::message::Error::builder(gstreamer::CoreError::Failed, "Internal error")
                .src(&pipeline)
                .debug("gstbin.c(42): details")
                .build();

        assert_eq!(
            Notification::from_message(&message, pipeline.upcast_ref()),
            Notification::Error {
                source: "pipeline".into(),
                message: "Internal error".into(),
                debug: Some("gstbin.c(42): details".into()),
            }
        );
    }

    #[test]
    fn end_of_stream() {
        let (pipeline, _child) = pipeline_with_child();

        let message = gstreamer::message::Eos::builder().src(&pipeline).build();

        assert_eq!(
            Notification::from_message(&message, pipeline.upcast_ref()),
            Notification::EndOfStream
        );
    }

    #[test]
    fn state_names_are_padded() {
        assert_eq!(format!("{:<8}|", PipelineState::Null), "NULL    |");
    }
}
