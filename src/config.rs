//! A description of the rplay configuration file

use std::{collections::BTreeMap, fmt, time::Duration};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;

/// Which log messages are shown, as a `tracing` targets filter
#[derive(Clone)]
pub struct LogLevelFilter {
    pub filter: Targets,
}

/// Either a filter string such as `"rplay=debug,warn"`, or a table of target to level
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum LogLevelSource {
    Directives(String),
    Levels(BTreeMap<String, String>),
}

impl<'de> serde::Deserialize<'de> for LogLevelFilter {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let filter = match LogLevelSource::deserialize(deserializer)? {
            LogLevelSource::Directives(directives) => {
                directives.parse().map_err(D::Error::custom)?
            }
            LogLevelSource::Levels(levels) => levels
                .into_iter()
                .map(|(target, level)| match level.parse::<LevelFilter>() {
                    Ok(level) => Ok((target, level)),
                    Err(err) => Err(D::Error::custom(format!(
                        "Bad level for {target:?}: {err}, got {level:?}"
                    ))),
                })
                .collect::<Result<Targets, _>>()?,
        };

        Ok(Self { filter })
    }
}

impl fmt::Display for LogLevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.filter.fmt(f)
    }
}

impl fmt::Debug for LogLevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_string().fmt(f)
    }
}

impl Default for LogLevelFilter {
    fn default() -> Self {
        Self {
            filter: Targets::new().with_default(tracing::Level::WARN),
        }
    }
}

/// A description of the rplay configuration file
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: LogLevelFilter,

    /// How much data playbin buffers for network streams
    #[serde(with = "humantime_serde")]
    pub buffering_duration: Option<Duration>,

    /// Disable video and subtitle rendering
    pub audio_only: bool,

    /// Playback volume as a percentage
    pub volume: Option<u32>,
}

impl Config {
    pub fn from_file(path: impl AsRef<std::path::Path> + Copy) -> Self {
        std::fs::read_to_string(path)
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    tracing::debug!(
                        "No config file at {:?}, using defaults",
                        path.as_ref().display()
                    );
                } else {
                    tracing::error!(
                        "Failed to read config file {:?}: {}",
                        path.as_ref().display(),
                        err
                    );
                }
            })
            .and_then(|config| {
                toml::from_str(&config).map_err(|err| {
                    tracing::error!(
                        "Failed to parse config file {:?}: {}",
                        path.as_ref().display(),
                        err
                    );
                })
            })
            .unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevelFilter::default(),
            buffering_duration: None,
            audio_only: false,
            volume: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_default() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.buffering_duration, None);
        assert!(!config.audio_only);
        assert_eq!(config.volume, None);
        let filter = &config.log_level.filter;
        assert!(filter.would_enable("rplay", &tracing::Level::WARN));
        assert!(!filter.would_enable("rplay", &tracing::Level::INFO));
    }

    #[test]
    fn full_config() {
        let config: Config = toml::from_str(
            r#"
log_level = "rplay=debug,warn"
buffering_duration = "5s 500ms"
audio_only = true
volume = 80
"#,
        )
        .unwrap();

        assert_eq!(config.buffering_duration, Some(Duration::from_millis(5500)));
        assert!(config.audio_only);
        assert_eq!(config.volume, Some(80));
        let filter = &config.log_level.filter;
        assert!(filter.would_enable("rplay", &tracing::Level::DEBUG));
        assert!(!filter.would_enable("other", &tracing::Level::INFO));
    }

    #[test]
    fn log_level_table() {
        let config: Config = toml::from_str(
            r#"
[log_level]
rplay = "trace"
"rplay::dispatcher" = "off"
"#,
        )
        .unwrap();

        let filter = &config.log_level.filter;
        assert!(filter.would_enable("rplay::run_loop", &tracing::Level::TRACE));
        assert!(!filter.would_enable("rplay::dispatcher", &tracing::Level::ERROR));
        assert_eq!(filter.default_level(), None);
    }

    #[test]
    fn log_level_string_sets_the_default() {
        let config: Config = toml::from_str(r#"log_level = "info""#).unwrap();

        let filter = &config.log_level.filter;
        assert_eq!(filter.default_level(), Some(LevelFilter::INFO));
        assert!(filter.would_enable("rplay::dispatcher", &tracing::Level::INFO));
        assert!(!filter.would_enable("rplay::dispatcher", &tracing::Level::DEBUG));
    }

    #[test]
    fn log_level_string_with_targets_and_default() {
        let config: Config =
            toml::from_str(r#"log_level = "rplay::run_loop=trace,error""#).unwrap();

        let filter = &config.log_level.filter;
        assert_eq!(filter.default_level(), Some(LevelFilter::ERROR));
        assert!(filter.would_enable("rplay::run_loop", &tracing::Level::TRACE));
        assert!(!filter.would_enable("rplay::config", &tracing::Level::WARN));
    }

    #[test]
    fn log_level_of_the_wrong_type_is_rejected() {
        assert!(toml::from_str::<Config>("log_level = 3").is_err());
    }

    #[test]
    fn bad_log_level_is_rejected() {
        let err = toml::from_str::<Config>("log_level = { rplay = \"loud\" }").unwrap_err();
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn missing_file_is_default() {
        let config = Config::from_file("/nonexistent/rplay.toml");
        assert!(!config.audio_only);
    }
}
