//! CLI binary to write to, clear and print a seqlog file.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use seqlog::{
    DEFAULT_FILE_NAME, FileLog, FileLogConfig, Level, TimestampFormat, default_log_path,
};
use tracing::debug;

/// CLI-specific error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Log library error
    #[error(transparent)]
    Log(#[from] seqlog::Error),
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Log file path; defaults to `--name` inside the user cache directory
    #[arg(long, env = "SEQLOG_FILE")]
    file: Option<PathBuf>,

    /// Log file name used when no explicit path is given
    #[arg(long, default_value = DEFAULT_FILE_NAME, env = "SEQLOG_NAME")]
    name: String,

    /// Header line written at the top of a fresh log file
    #[arg(long, env = "SEQLOG_HEADER")]
    header: Option<String>,

    /// Timestamp entries in local time instead of UTC
    #[arg(long)]
    local_time: bool,

    /// Echo every written line to the console
    #[arg(long)]
    mirror: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Append an entry with the given level
    Log {
        /// Entry level: debug, info, warn or error
        #[arg(short, long, default_value = "info")]
        level: Level,
        /// Message words, joined with spaces
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Append an INFO entry
    Info {
        /// Message words, joined with spaces
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Append a WARN entry
    Warn {
        /// Message words, joined with spaces
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Append an ERROR entry
    Error {
        /// Message words, joined with spaces
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Truncate the log file
    Clear,
    /// Print the log file contents
    Cat,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let args = Args::parse();

    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let path = match args.file {
        Some(path) => path,
        None => default_log_path(&args.name)?,
    };
    debug!("Using log file {}", path.display());

    let timestamp_format = if args.local_time {
        TimestampFormat::Local
    } else {
        TimestampFormat::Rfc3339
    };

    let mut builder = FileLogConfig::builder()
        .path(path)
        .timestamp_format(timestamp_format)
        .mirror_to_console(args.mirror);

    if let Some(header) = args.header {
        builder = builder.header(move || Some(header.clone()));
    }

    let log = FileLog::new(builder.build()?)?;

    match args.command {
        Command::Log { level, message } => log.log(level, message.join(" ")),
        Command::Info { message } => log.info(message.join(" ")),
        Command::Warn { message } => log.warn(message.join(" ")),
        Command::Error { message } => log.error(message.join(" ")),
        Command::Clear => log.clear(),
        Command::Cat => {
            let contents = log.read_all().await?;
            print!("{contents}");
        }
    }

    log.shutdown().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_command_parses_level() {
        let args = Args::try_parse_from(["seqlog", "log", "--level", "warning", "disk", "full"])
            .unwrap();
        match args.command {
            Command::Log { level, message } => {
                assert_eq!(level, Level::Warn);
                assert_eq!(message, ["disk", "full"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_log_command_defaults_to_info() {
        let args = Args::try_parse_from(["seqlog", "log", "hello"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Log {
                level: Level::Info,
                ..
            }
        ));
    }

    #[test]
    fn test_log_command_rejects_unknown_level() {
        assert!(Args::try_parse_from(["seqlog", "log", "--level", "fatal", "boom"]).is_err());
    }
}
