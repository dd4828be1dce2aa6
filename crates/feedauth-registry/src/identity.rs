use url::Url;

use crate::PACKAGING_SEGMENT;

const VISUALSTUDIO_HOST_SUFFIX: &str = ".pkgs.visualstudio.com";
const DEV_AZURE_HOST: &str = "pkgs.dev.azure.com";

/// The `(organization, project, feed)` triple a registry URL points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedIdentity {
    pub organization: String,
    pub project: Option<String>,
    pub feed: String,
}

/// Hostname layouts that registry URLs come in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryTopology {
    /// `{organization}.pkgs.visualstudio.com`: the organization lives in the
    /// hostname and any segment before `_packaging` is the project.
    OrganizationHost,
    /// `pkgs.dev.azure.com`: the organization is the first path segment and
    /// the project, if any, is the second.
    SharedHost,
}

impl RegistryTopology {
    pub fn detect(host: &str) -> Option<Self> {
        if host == DEV_AZURE_HOST {
            Some(Self::SharedHost)
        } else if host.ends_with(VISUALSTUDIO_HOST_SUFFIX) {
            Some(Self::OrganizationHost)
        } else {
            None
        }
    }
}

/// Parses `registry_url` and identifies the feed it addresses. Returns `None`
/// for anything that isn't a well-formed registry URL.
pub fn parse_registry_url(registry_url: &str) -> Option<FeedIdentity> {
    match Url::parse(registry_url) {
        Ok(url) => identify(&url),
        Err(err) => {
            tracing::debug!("{registry_url} is not a valid URL: {err}");
            None
        }
    }
}

/// Identifies the feed addressed by an already-parsed registry URL.
pub fn identify(url: &Url) -> Option<FeedIdentity> {
    let host = url.host_str()?;
    let topology = RegistryTopology::detect(host)?;
    let segments = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    let marker = segments.iter().position(|s| *s == PACKAGING_SEGMENT)?;
    let feed = segments.get(marker + 1)?;

    let (organization, project) = match topology {
        RegistryTopology::OrganizationHost => {
            let organization = host.split('.').next()?;
            let project = if marker > 0 { Some(segments[0]) } else { None };
            (organization, project)
        }
        RegistryTopology::SharedHost => {
            let organization = *segments.first()?;
            let project = if marker > 1 { Some(segments[1]) } else { None };
            (organization, project)
        }
    };

    // `_packaging` as the very first segment on the shared host leaves us
    // with no organization at all.
    if organization.is_empty() || organization == PACKAGING_SEGMENT {
        return None;
    }

    let identity = FeedIdentity {
        organization: organization.to_string(),
        project: project.map(String::from),
        feed: feed.to_string(),
    };
    tracing::trace!("identified {url} as {identity:?}");
    Some(identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn id(organization: &str, project: Option<&str>, feed: &str) -> Option<FeedIdentity> {
        Some(FeedIdentity {
            organization: organization.into(),
            project: project.map(String::from),
            feed: feed.into(),
        })
    }

    #[test]
    fn shared_host_without_project() {
        assert_eq!(
            parse_registry_url("https://pkgs.dev.azure.com/myorg/_packaging/myfeed/npm/registry/"),
            id("myorg", None, "myfeed")
        );
    }

    #[test]
    fn shared_host_with_project() {
        assert_eq!(
            parse_registry_url(
                "https://pkgs.dev.azure.com/myorg/myproject/_packaging/myfeed/npm/registry/"
            ),
            id("myorg", Some("myproject"), "myfeed")
        );
    }

    #[test]
    fn organization_host_without_project() {
        assert_eq!(
            parse_registry_url("https://contoso.pkgs.visualstudio.com/_packaging/tools/npm/registry/"),
            id("contoso", None, "tools")
        );
    }

    #[test]
    fn organization_host_with_project() {
        assert_eq!(
            parse_registry_url(
                "https://contoso.pkgs.visualstudio.com/web/_packaging/tools/npm/registry/"
            ),
            id("contoso", Some("web"), "tools")
        );
    }

    #[test]
    fn feed_without_registry_suffix() {
        assert_eq!(
            parse_registry_url("https://pkgs.dev.azure.com/myorg/_packaging/myfeed"),
            id("myorg", None, "myfeed")
        );
    }

    #[test]
    fn rejects_missing_marker() {
        assert_eq!(
            parse_registry_url("https://pkgs.dev.azure.com/myorg/myfeed/npm/registry/"),
            None
        );
    }

    #[test]
    fn rejects_marker_as_last_segment() {
        assert_eq!(
            parse_registry_url("https://pkgs.dev.azure.com/myorg/_packaging/"),
            None
        );
        assert_eq!(
            parse_registry_url("https://contoso.pkgs.visualstudio.com/_packaging"),
            None
        );
    }

    #[test]
    fn rejects_unsupported_hosts() {
        assert_eq!(
            parse_registry_url("https://registry.npmjs.org/_packaging/myfeed/"),
            None
        );
        assert_eq!(
            parse_registry_url("https://npm.pkg.github.com/myorg/_packaging/myfeed/"),
            None
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_registry_url("not a url"), None);
        assert_eq!(parse_registry_url(""), None);
    }

    #[test]
    fn rejects_shared_host_without_organization() {
        assert_eq!(
            parse_registry_url("https://pkgs.dev.azure.com/_packaging/myfeed/npm/registry/"),
            None
        );
    }

    #[test]
    fn detects_topology() {
        assert_eq!(
            RegistryTopology::detect("pkgs.dev.azure.com"),
            Some(RegistryTopology::SharedHost)
        );
        assert_eq!(
            RegistryTopology::detect("fabrikam.pkgs.visualstudio.com"),
            Some(RegistryTopology::OrganizationHost)
        );
        assert_eq!(RegistryTopology::detect("example.com"), None);
    }
}
