//! Configuration for feedauth: the feed list it checks, and layered tool
//! settings that fill in whatever wasn't passed on the command line.

use std::path::PathBuf;

pub use clap::ArgMatches;
use clap::parser::ValueSource;
pub use config::Config as FeedAuthConfig;
use config::{Environment, File, FileFormat};

pub use error::{FeedAuthConfigError, Result};
pub use feeds::{load_feeds, locate_feeds_file, normalize_feed, RawFeed, FEEDS_FILE_NAME};

mod error;
mod feeds;

const RC_FILE_NAMES: [&str; 4] = ["feedauthrc", ".feedauthrc", "feedauthrc.toml", ".feedauthrc.toml"];

pub trait FeedAuthConfigLayer {
    fn layer_config(&mut self, _matches: &ArgMatches, _config: &FeedAuthConfig) -> miette::Result<()> {
        Ok(())
    }
}

/// Whether the argument `id` was given explicitly on the command line, as
/// opposed to being defaulted. Explicit arguments always beat layered
/// settings.
pub fn from_command_line(matches: &ArgMatches, id: &str) -> bool {
    matches!(matches.value_source(id), Some(ValueSource::CommandLine))
}

pub struct FeedAuthConfigOptions {
    global: bool,
    env: bool,
    pkg_root: Option<PathBuf>,
    global_config_file: Option<PathBuf>,
}

impl Default for FeedAuthConfigOptions {
    fn default() -> Self {
        FeedAuthConfigOptions {
            global: true,
            env: true,
            pkg_root: None,
            global_config_file: None,
        }
    }
}

impl FeedAuthConfigOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    pub fn env(mut self, env: bool) -> Self {
        self.env = env;
        self
    }

    pub fn pkg_root(mut self, root: Option<PathBuf>) -> Self {
        self.pkg_root = root;
        self
    }

    pub fn global_config_file(mut self, file: Option<PathBuf>) -> Self {
        self.global_config_file = file;
        self
    }

    pub fn load(self) -> Result<FeedAuthConfig> {
        let mut builder = FeedAuthConfig::builder();
        if self.global {
            if let Some(config_file) = self.global_config_file {
                let path = config_file.display().to_string();
                builder = builder.add_source(File::new(&path, FileFormat::Toml).required(false));
            }
        }
        if self.env {
            builder = builder.add_source(Environment::with_prefix("feedauth_config"));
        }
        if let Some(root) = self.pkg_root {
            for name in RC_FILE_NAMES {
                let path = root.join(name).display().to_string();
                builder = builder.add_source(File::new(&path, FileFormat::Toml).required(false));
            }
        }
        Ok(builder.build()?)
    }
}
