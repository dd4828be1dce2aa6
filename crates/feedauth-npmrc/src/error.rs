use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum NpmrcError {
    /// An existing `.npmrc` could not be read. A missing file is not an
    /// error; this is permissions, encoding, and the like.
    #[error("Failed to read {}.", .1.display())]
    #[diagnostic(code(feedauth_npmrc::read_error), url(docsrs))]
    ReadError(#[source] std::io::Error, PathBuf),

    /// Failed to write an updated `.npmrc`.
    #[error("Failed to write {}.", .1.display())]
    #[diagnostic(
        code(feedauth_npmrc::write_error),
        url(docsrs),
        help("Check that the file and its directory are writable.")
    )]
    WriteError(#[source] std::io::Error, PathBuf),
}

pub type Result<T> = std::result::Result<T, NpmrcError>;
