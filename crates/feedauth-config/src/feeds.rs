use std::path::{Path, PathBuf};

use feedauth_registry::{identify, normalize_scope, Feed};
use serde::Deserialize;
use url::Url;

use crate::error::{FeedAuthConfigError, Result};

/// Default name of the feed configuration file.
pub const FEEDS_FILE_NAME: &str = "azure-feed.config.json";

/// A feed as written in the configuration file. Everything but
/// `registryUrl` is optional, and explicit values win over whatever the
/// registry URL implies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFeed {
    pub registry_url: Option<String>,
    pub organization: Option<String>,
    pub project: Option<String>,
    pub feed: Option<String>,
    pub scope: Option<String>,
    pub test_package: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedsFile {
    Many { feeds: Vec<RawFeed> },
    Single(RawFeed),
}

impl From<FeedsFile> for Vec<RawFeed> {
    fn from(file: FeedsFile) -> Self {
        match file {
            FeedsFile::Many { feeds } => feeds,
            FeedsFile::Single(feed) => vec![feed],
        }
    }
}

/// Finds the feed configuration file: an explicit path (relative to `cwd`
/// unless absolute), then `cwd/azure-feed.config.json`, then the same file
/// name in `fallback_dir`.
pub fn locate_feeds_file(
    cwd: &Path,
    explicit: Option<&Path>,
    fallback_dir: Option<&Path>,
) -> Option<PathBuf> {
    explicit
        .map(|path| cwd.join(path))
        .into_iter()
        .chain(std::iter::once(cwd.join(FEEDS_FILE_NAME)))
        .chain(fallback_dir.map(|dir| dir.join(FEEDS_FILE_NAME)))
        .find(|candidate| {
            tracing::trace!("looking for feed configuration at {}", candidate.display());
            candidate.is_file()
        })
}

/// Reads, parses and normalizes every feed in the configuration file at
/// `path`.
pub fn load_feeds(path: &Path) -> Result<Vec<Feed>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| FeedAuthConfigError::FeedsFileReadError(e, path.to_path_buf()))?;
    let raw: Vec<RawFeed> = serde_json::from_str::<FeedsFile>(&contents)
        .map_err(|e| FeedAuthConfigError::FeedsFileParseError(e, path.to_path_buf()))?
        .into();
    if raw.is_empty() {
        return Err(FeedAuthConfigError::NoFeeds(path.to_path_buf()));
    }
    let feeds = raw
        .into_iter()
        .enumerate()
        .map(|(index, feed)| normalize_feed(feed, index))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!("loaded {} feed(s) from {}", feeds.len(), path.display());
    Ok(feeds)
}

/// Turns a configured feed into a [`Feed`], deriving organization, project
/// and feed name from its registry URL. The URL must match a known registry
/// layout; explicit values only replace what was derived from it.
pub fn normalize_feed(raw: RawFeed, index: usize) -> Result<Feed> {
    let url = non_blank(raw.registry_url).ok_or(FeedAuthConfigError::MissingRegistryUrl(index))?;
    let invalid = || FeedAuthConfigError::InvalidRegistryUrl {
        index,
        url: url.clone(),
    };
    let registry_url = Url::parse(&url).map_err(|_| invalid())?;
    let derived = identify(&registry_url).ok_or_else(|| {
        tracing::debug!("{url} doesn't match a known registry layout");
        invalid()
    })?;

    let organization = non_blank(raw.organization).unwrap_or(derived.organization);
    let feed = non_blank(raw.feed).unwrap_or(derived.feed);
    let project = non_blank(raw.project).or(derived.project);

    Ok(Feed {
        organization,
        project,
        feed,
        registry_url,
        scope: raw.scope.as_deref().and_then(normalize_scope),
        test_package: non_blank(raw.test_package),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use miette::{IntoDiagnostic, Result};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const URL: &str = "https://pkgs.dev.azure.com/myorg/_packaging/myfeed/npm/registry/";

    fn raw(url: &str) -> RawFeed {
        RawFeed {
            registry_url: Some(url.into()),
            ..Default::default()
        }
    }

    #[test]
    fn derives_identity_from_url() -> Result<()> {
        let feed = normalize_feed(
            RawFeed {
                scope: Some("myscope".into()),
                ..raw(URL)
            },
            0,
        )?;
        assert_eq!(feed.organization, "myorg");
        assert_eq!(feed.project, None);
        assert_eq!(feed.feed, "myfeed");
        assert_eq!(feed.scope.as_deref(), Some("@myscope"));
        assert_eq!(feed.registry_url.as_str(), URL);
        Ok(())
    }

    #[test]
    fn explicit_values_win() -> Result<()> {
        let feed = normalize_feed(
            RawFeed {
                organization: Some("other".into()),
                project: Some("proj".into()),
                feed: Some("renamed".into()),
                ..raw(URL)
            },
            0,
        )?;
        assert_eq!(feed.organization, "other");
        assert_eq!(feed.project.as_deref(), Some("proj"));
        assert_eq!(feed.feed, "renamed");
        Ok(())
    }

    #[test]
    fn unknown_layout_is_rejected_even_with_overrides() {
        let url = "https://registry.npmjs.org/";
        assert!(matches!(
            normalize_feed(raw(url), 3),
            Err(FeedAuthConfigError::InvalidRegistryUrl { index: 3, .. })
        ));
        assert!(matches!(
            normalize_feed(
                RawFeed {
                    organization: Some("myorg".into()),
                    feed: Some("myfeed".into()),
                    ..raw(url)
                },
                3,
            ),
            Err(FeedAuthConfigError::InvalidRegistryUrl { index: 3, .. })
        ));
    }

    #[test]
    fn missing_or_unparseable_url() {
        assert!(matches!(
            normalize_feed(RawFeed::default(), 1),
            Err(FeedAuthConfigError::MissingRegistryUrl(1))
        ));
        assert!(matches!(
            normalize_feed(
                RawFeed {
                    organization: Some("myorg".into()),
                    feed: Some("myfeed".into()),
                    ..raw("not a url")
                },
                0
            ),
            Err(FeedAuthConfigError::InvalidRegistryUrl { index: 0, .. })
        ));
    }

    #[test]
    fn loads_single_feed_object() -> Result<()> {
        let dir = tempdir().into_diagnostic()?;
        let file = dir.path().join(FEEDS_FILE_NAME);
        fs::write(
            &file,
            format!(r#"{{ "registryUrl": "{URL}", "testPackage": " left-pad " }}"#),
        )
        .into_diagnostic()?;
        let feeds = load_feeds(&file)?;
        assert_eq!(feeds.len(), 1);
        assert_eq!(feeds[0].test_package.as_deref(), Some("left-pad"));
        Ok(())
    }

    #[test]
    fn loads_feed_list_in_order() -> Result<()> {
        let dir = tempdir().into_diagnostic()?;
        let file = dir.path().join(FEEDS_FILE_NAME);
        fs::write(
            &file,
            r#"{
                "feeds": [
                    { "registryUrl": "https://pkgs.dev.azure.com/a/_packaging/one/npm/registry/" },
                    { "registryUrl": "https://b.pkgs.visualstudio.com/p/_packaging/two/npm/registry/", "scope": "@b" }
                ]
            }"#,
        )
        .into_diagnostic()?;
        let feeds = load_feeds(&file)?;
        let names = feeds
            .iter()
            .map(|f| (f.organization.as_str(), f.feed.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(names, vec![("a", "one"), ("b", "two")]);
        assert_eq!(feeds[1].project.as_deref(), Some("p"));
        Ok(())
    }

    #[test]
    fn empty_feed_list_is_an_error() -> Result<()> {
        let dir = tempdir().into_diagnostic()?;
        let file = dir.path().join(FEEDS_FILE_NAME);
        fs::write(&file, r#"{ "feeds": [] }"#).into_diagnostic()?;
        assert!(matches!(
            load_feeds(&file),
            Err(FeedAuthConfigError::NoFeeds(_))
        ));
        Ok(())
    }

    #[test]
    fn invalid_json_is_an_error() -> Result<()> {
        let dir = tempdir().into_diagnostic()?;
        let file = dir.path().join(FEEDS_FILE_NAME);
        fs::write(&file, "{ nope").into_diagnostic()?;
        assert!(matches!(
            load_feeds(&file),
            Err(FeedAuthConfigError::FeedsFileParseError(..))
        ));
        Ok(())
    }

    #[test]
    fn locates_in_priority_order() -> Result<()> {
        let cwd = tempdir().into_diagnostic()?;
        let fallback = tempdir().into_diagnostic()?;
        assert_eq!(
            locate_feeds_file(cwd.path(), None, Some(fallback.path())),
            None
        );

        let fallback_file = fallback.path().join(FEEDS_FILE_NAME);
        fs::write(&fallback_file, "{}").into_diagnostic()?;
        assert_eq!(
            locate_feeds_file(cwd.path(), None, Some(fallback.path())),
            Some(fallback_file)
        );

        let local_file = cwd.path().join(FEEDS_FILE_NAME);
        fs::write(&local_file, "{}").into_diagnostic()?;
        assert_eq!(
            locate_feeds_file(cwd.path(), None, Some(fallback.path())),
            Some(local_file.clone())
        );

        let explicit = cwd.path().join("custom.json");
        fs::write(&explicit, "{}").into_diagnostic()?;
        assert_eq!(
            locate_feeds_file(cwd.path(), Some(Path::new("custom.json")), None),
            Some(explicit)
        );
        assert_eq!(
            locate_feeds_file(cwd.path(), Some(Path::new("missing.json")), None),
            Some(local_file)
        );
        Ok(())
    }
}
