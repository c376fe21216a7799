#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::process::ExitCode;

use tracing_subscriber::{prelude::*, reload};

mod cli;
mod config;
mod dispatcher;
mod notification;
mod pipeline;
mod run_loop;
mod stream_uri;

use pipeline::{Player, PlayerError};

/// The process status for failures, i.e. -1
const EXIT_FAILURE: u8 = 255;

fn main() -> ExitCode {
    let (log_filter, log_filter_handle) =
        reload::Layer::new(config::LogLevelFilter::default().filter);

    tracing_subscriber::registry()
        .with(log_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut args = std::env::args();
    let program = args
        .next()
        .unwrap_or_else(|| String::from(env!("CARGO_PKG_NAME")));

    let (stream, config_path) = match cli::parse(args) {
        Ok(cli::Action::Play {
            stream,
            config_path,
        }) => (stream, config_path),
        Ok(cli::Action::PrintVersion) => {
            println!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Ok(cli::Action::PrintHelp) => {
            println!("{}", cli::usage(&program));
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{}", err);
            println!("{}", cli::usage(&program));
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let config = config::Config::from_file(config_path.as_str());

    if let Err(err) = log_filter_handle.reload(config.log_level.filter.clone()) {
        tracing::error!("Failed to set log level to {}: {}", config.log_level, err);
    }

    tracing::debug!("Config: {:?}", config);

    match play(&stream, &config) {
        Ok(termination) => {
            tracing::info!("Playback finished: {:?}", termination);
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_failure(err, &mut dispatcher::StdConsole);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Tell the operator why playback could not run, keeping the full error chain for debug logs
fn report_failure(err: PlayerError, console: &mut impl dispatcher::Console) {
    let err = anyhow::Error::from(err);
    console.error(format_args!("{}", err));
    tracing::debug!("{:#}", err);
}

fn play(stream: &str, config: &config::Config) -> Result<run_loop::Termination, PlayerError> {
    gstreamer::init().map_err(PlayerError::Init)?;

    let (major, minor, micro, nano) = gstreamer::version();
    println!("Running on gstreamer {}:{}:{}:{}", major, minor, micro, nano);

    let uri = stream_uri::resolve(stream).map_err(PlayerError::Uri)?;

    let playbin = pipeline::Playbin::new(&uri, config)?;

    let mut player = Player::new(playbin, dispatcher::StdConsole)?;

    player.start()?;
    let termination = player.run()?;

    tracing::debug!("Player is {:?}", player.state());

    Ok(termination)
}
