//! Accepts either a URI or a local path to play

use std::path::Path;

use anyhow::{Context, Result};

/// True if gstreamer has a source for `candidate`'s scheme, or it names a remote location.
/// Gstreamer must already be initialised.
fn is_uri(candidate: &str) -> bool {
    let Ok(url) = url::Url::parse(candidate) else {
        return false;
    };

    // A single letter scheme is a Windows drive, not a URI
    if url.scheme().len() <= 1 {
        return false;
    }

    candidate.contains("://")
        || protocol_is_supported(gstreamer::URIType::Src, url.scheme())
}

/// gstreamer-rs 0.21 has no safe binding for `gst_uri_protocol_is_supported`
fn protocol_is_supported(type_: gstreamer::URIType, protocol: &str) -> bool {
    use gstreamer::glib::translate::{from_glib, IntoGlib, ToGlibPtr};
    unsafe {
        from_glib(gstreamer::ffi::gst_uri_protocol_is_supported(
            type_.into_glib(),
            protocol.to_glib_none().0,
        ))
    }
}

/// Convert `stream` into a URI which playbin understands, turning local paths into `file://` URIs
pub fn resolve(stream: &str) -> Result<String> {
    let path = Path::new(stream);

    if !path.exists() && is_uri(stream) {
        return Ok(stream.into());
    }

    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to get the current directory")?
            .join(path)
    };

    let uri = url::Url::from_file_path(&path)
        .map_err(|()| anyhow::Error::msg(format!("Cannot convert {:?} to a URI", path)))?;

    tracing::debug!("Resolved {:?} to {}", stream, uri);

    Ok(uri.into())
}
