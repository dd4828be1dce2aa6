//! Read and surgically rewrite `.npmrc` files.
//!
//! Only two kinds of entries are ever touched: a feed's credential block
//! (see [`with_credentials`]) and a scope mapping line (see
//! [`with_scope_mapping`]). Everything else in the file is preserved.
//!
//! Files are rewritten in full, in place. There is no locking and no
//! temp-file-and-rename, so the previous contents are the only fallback if
//! a write is interrupted, and concurrent runs against the same file can
//! race.

use std::path::Path;

use feedauth_registry::Feed;

pub use credentials::{annotation, has_credentials, with_credentials};
pub use error::{NpmrcError, Result};
pub use scope::{has_scope_mapping, scope_line, with_scope_mapping};

mod credentials;
mod error;
mod scope;

/// Reads the `.npmrc` at `path`. A file that doesn't exist reads as empty.
pub fn read_npmrc(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("{} does not exist yet", path.display());
            Ok(String::new())
        }
        Err(e) => Err(NpmrcError::ReadError(e, path.to_path_buf())),
    }
}

/// Overwrites the `.npmrc` at `path`, creating its directory if needed.
pub fn write_npmrc(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| NpmrcError::WriteError(e, path.to_path_buf()))?;
    }
    std::fs::write(path, contents).map_err(|e| NpmrcError::WriteError(e, path.to_path_buf()))
}

/// Stores `token` as `feed`'s credentials in the `.npmrc` at `path`,
/// replacing whatever was stored for it before.
pub fn write_credentials(path: &Path, feed: &Feed, token: &str) -> Result<()> {
    let contents = read_npmrc(path)?;
    tracing::debug!("writing credentials for {} to {}", feed.short_name(), path.display());
    write_npmrc(path, &with_credentials(&contents, feed, token))
}

/// Makes sure the `.npmrc` at `path` maps `feed`'s scope to its registry.
/// Returns whether a mapping had to be added.
pub fn ensure_scope_mapping(path: &Path, feed: &Feed) -> Result<bool> {
    let contents = read_npmrc(path)?;
    match with_scope_mapping(&contents, feed) {
        Some(updated) => {
            tracing::debug!("adding scope mapping for {feed} to {}", path.display());
            write_npmrc(path, &updated)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use miette::{IntoDiagnostic, Result};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn feed(scope: Option<&str>) -> Feed {
        Feed {
            organization: "myorg".into(),
            project: None,
            feed: "myfeed".into(),
            registry_url: "https://pkgs.dev.azure.com/myorg/_packaging/myfeed/npm/registry/"
                .parse()
                .unwrap(),
            scope: scope.map(String::from),
            test_package: None,
        }
    }

    #[test]
    fn missing_file_reads_empty() -> Result<()> {
        let dir = tempdir().into_diagnostic()?;
        assert_eq!(read_npmrc(&dir.path().join(".npmrc"))?, "");
        Ok(())
    }

    #[test]
    fn writes_credentials_to_new_file() -> Result<()> {
        let dir = tempdir().into_diagnostic()?;
        let path = dir.path().join("home").join(".npmrc");
        write_credentials(&path, &feed(None), "abc123")?;
        let contents = read_npmrc(&path)?;
        assert!(has_credentials(&contents, &feed(None)));
        assert!(contents.contains("/npm/registry/:_password=YWJjMTIz"));
        assert!(contents.contains("/npm/:_password=YWJjMTIz"));
        Ok(())
    }

    #[test]
    fn ensure_scope_mapping_twice() -> Result<()> {
        let dir = tempdir().into_diagnostic()?;
        let path = dir.path().join(".npmrc");
        let scoped = feed(Some("@myscope"));
        assert!(ensure_scope_mapping(&path, &scoped)?);
        assert!(!ensure_scope_mapping(&path, &scoped)?);
        assert_eq!(
            read_npmrc(&path)?,
            "@myscope:registry=https://pkgs.dev.azure.com/myorg/_packaging/myfeed/npm/registry/\n"
        );
        Ok(())
    }

    #[test]
    fn unscoped_feed_leaves_file_untouched() -> Result<()> {
        let dir = tempdir().into_diagnostic()?;
        let path = dir.path().join(".npmrc");
        assert!(!ensure_scope_mapping(&path, &feed(None))?);
        assert!(!path.exists());
        Ok(())
    }
}
