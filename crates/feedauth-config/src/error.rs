use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FeedAuthConfigError {
    /// Failed to load layered settings from an rc file or the environment.
    #[error(transparent)]
    #[diagnostic(code(feedauth_config::settings_error), url(docsrs))]
    ConfigError(#[from] config::ConfigError),

    /// No feed configuration file exists at any of the places we look.
    #[error("Failed to locate {0}.")]
    #[diagnostic(
        code(feedauth_config::feeds_file_not_found),
        url(docsrs),
        help("Place it in your project root or pass --config <path>.")
    )]
    FeedsFileNotFound(String),

    /// The feed configuration file exists but could not be read.
    #[error("Failed to read feed configuration at {}.", .1.display())]
    #[diagnostic(code(feedauth_config::feeds_file_read_error), url(docsrs))]
    FeedsFileReadError(#[source] std::io::Error, PathBuf),

    /// The feed configuration file is not valid JSON, or doesn't have the
    /// expected shape.
    #[error("Failed to parse feed configuration at {}.", .1.display())]
    #[diagnostic(
        code(feedauth_config::feeds_file_parse_error),
        url(docsrs),
        help("Expected a feed object, or an object with a `feeds` array of feed objects.")
    )]
    FeedsFileParseError(#[source] serde_json::Error, PathBuf),

    /// A feed has no `registryUrl`.
    #[error("Missing registryUrl for feed at index {0}.")]
    #[diagnostic(code(feedauth_config::missing_registry_url), url(docsrs))]
    MissingRegistryUrl(usize),

    /// A feed's `registryUrl` isn't an Azure Artifacts npm registry URL.
    #[error("Invalid registryUrl `{url}` for feed at index {index}.")]
    #[diagnostic(
        code(feedauth_config::invalid_registry_url),
        url(docsrs),
        help("Registry URLs look like https://pkgs.dev.azure.com/<organization>/[<project>/]_packaging/<feed>/npm/registry/")
    )]
    InvalidRegistryUrl { index: usize, url: String },

    /// The configuration file lists no feeds at all.
    #[error("No feeds configured in {}.", .0.display())]
    #[diagnostic(code(feedauth_config::no_feeds), url(docsrs))]
    NoFeeds(PathBuf),
}

pub type Result<T> = std::result::Result<T, FeedAuthConfigError>;
