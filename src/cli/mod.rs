//! CLI for the `recordstream` watcher binary.
//!
//! ```ignore
//! use recordstream::cli::{parse_args, CliCommand};
//!
//! match parse_args(std::env::args())? {
//!     CliCommand::Version => println!("{}", recordstream::cli::version_string()),
//!     CliCommand::Help => print!("{}", recordstream::cli::USAGE),
//!     CliCommand::Listen(args) => { /* connect and print */ }
//! }
//! ```

pub mod args;
pub mod version;

pub use args::{parse_args, ArgsError, CliCommand, ListenArgs, USAGE};
pub use version::{version_string, VERSION};

use crate::config::RealtimeConfig;

/// Topic used when none is given on the command line.
pub const DEFAULT_TOPIC: &str = "*";

impl ListenArgs {
    /// Apply command-line overrides on top of `base`.
    pub fn apply(&self, base: RealtimeConfig) -> RealtimeConfig {
        let mut config = base;
        if let Some(url) = &self.url {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(token) = &self.token {
            config.auth_token = Some(token.clone());
        }
        config
    }

    /// Topics to subscribe to, defaulting to every collection.
    pub fn topics_or_default(&self) -> Vec<String> {
        if self.topics.is_empty() {
            vec![DEFAULT_TOPIC.to_string()]
        } else {
            self.topics.clone()
        }
    }
}
