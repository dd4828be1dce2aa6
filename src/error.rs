use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum FeedAuthError {
    /// Something was wrong with the feed configuration or layered settings.
    #[error(transparent)]
    #[diagnostic(transparent)]
    ConfigError(#[from] feedauth_config::FeedAuthConfigError),

    /// Reading or writing an `.npmrc` failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    NpmrcError(#[from] feedauth_npmrc::NpmrcError),

    /// There were no feeds to check.
    #[error("No feeds to check.")]
    #[diagnostic(code(feedauth::no_feeds), url(docsrs))]
    NoFeeds,

    /// Couldn't work out where the home directory is, which is where the
    /// global `.npmrc` lives by default.
    #[error("Could not determine your home directory.")]
    #[diagnostic(
        code(feedauth::no_home_dir),
        url(docsrs),
        help("Pass --global-npmrc <path> to say where your global .npmrc is.")
    )]
    NoHomeDir,

    /// The current directory could not be detected.
    #[error("Current directory could not be detected.")]
    #[diagnostic(
        code(feedauth::no_cwd),
        url(docsrs),
        help("Pass --cwd <path> to say where your project is.")
    )]
    NoCwd(#[source] std::io::Error),

    /// Failed to read a token from the terminal or standard input.
    #[error("Failed to read token input.")]
    #[diagnostic(code(feedauth::token_input_error), url(docsrs))]
    TokenInputError(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FeedAuthError>;
