//! Command-line argument parsing for the recordstream watcher.

use thiserror::Error;

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Connect and print events until interrupted
    Listen(ListenArgs),
}

/// Options for the `Listen` command. `None` fields fall back to the
/// environment and then to defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListenArgs {
    pub url: Option<String>,
    pub token: Option<String>,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ArgsError {
    #[error("missing value for {flag}")]
    MissingValue { flag: String },

    #[error("unknown argument: {0}")]
    UnknownArgument(String),
}

pub const USAGE: &str = "\
Usage: recordstream [OPTIONS]

Options:
  -u, --url <URL>        Server base URL (env: RECORDSTREAM_URL)
      --token <TOKEN>    Authorization header value (env: RECORDSTREAM_AUTH_TOKEN)
  -t, --topic <TOPIC>    Topic to subscribe to; repeatable (default: *)
  -V, --version          Print version
  -h, --help             Print help
";

/// Parse command-line arguments.
///
/// `--version` and `--help` win over everything else.
///
/// # Examples
///
/// ```
/// use recordstream::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["recordstream".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), Ok(CliCommand::Version));
/// ```
pub fn parse_args<I>(args: I) -> Result<CliCommand, ArgsError>
where
    I: Iterator<Item = String>,
{
    let mut listen = ListenArgs::default();
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        let (flag, inline) = match arg.split_once('=') {
            Some((flag, value)) if flag.starts_with("--") => {
                (flag.to_string(), Some(value.to_string()))
            }
            _ => (arg, None),
        };

        match flag.as_str() {
            "--version" | "-V" => return Ok(CliCommand::Version),
            "--help" | "-h" => return Ok(CliCommand::Help),
            "--url" | "-u" => listen.url = Some(take_value(&flag, inline, &mut args)?),
            "--token" => listen.token = Some(take_value(&flag, inline, &mut args)?),
            "--topic" | "-t" => listen.topics.push(take_value(&flag, inline, &mut args)?),
            _ => return Err(ArgsError::UnknownArgument(flag)),
        }
    }

    Ok(CliCommand::Listen(listen))
}

fn take_value<I>(flag: &str, inline: Option<String>, args: &mut I) -> Result<String, ArgsError>
where
    I: Iterator<Item = String>,
{
    inline
        .or_else(|| args.next())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ArgsError::MissingValue {
            flag: flag.to_string(),
        })
}
