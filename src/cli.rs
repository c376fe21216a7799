//! Command line arguments

pub const DEFAULT_CONFIG_PATH: &str = match option_env!("RPLAY_CONFIG_PATH") {
    Some(path) => path,
    None => "rplay.toml",
};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Play { stream: String, config_path: String },
    PrintVersion,
    PrintHelp,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("No stream specified")]
    NoStream,
    #[error("No config specified")]
    NoConfig,
    #[error("Unhandled argument {0:?}")]
    UnhandledArgument(String),
}

pub fn usage(program: &str) -> String {
    format!(
        "Usage: {} [-c|--config <PATH>] [STREAM_URL]\n       {} -V|--version",
        program, program
    )
}

/// Parse the arguments following the program name
pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Action, UsageError> {
    let mut config_path = String::from(DEFAULT_CONFIG_PATH);
    let mut stream = None;

    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                config_path = args.next().ok_or(UsageError::NoConfig)?;
                continue;
            }
            "-V" | "--version" => return Ok(Action::PrintVersion),
            "-h" | "--help" => return Ok(Action::PrintHelp),
            _ => (),
        }

        if stream.is_some() || arg.is_empty() || arg.starts_with('-') {
            return Err(UsageError::UnhandledArgument(arg));
        }

        stream = Some(arg);
    }

    Ok(Action::Play {
        stream: stream.ok_or(UsageError::NoStream)?,
        config_path,
    })
}
