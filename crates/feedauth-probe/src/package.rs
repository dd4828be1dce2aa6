use feedauth_registry::Feed;

/// Name queried for scoped feeds without a test package: `{scope}/__auth-check`.
pub const SCOPED_PROBE_NAME: &str = "__auth-check";

/// Name queried for unscoped feeds without a test package.
pub const FALLBACK_PROBE_NAME: &str = "azure-auth-check-probe";

/// The package a probe asks the registry about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbePackage {
    pub name: String,
    /// Synthetic probe names aren't supposed to exist, so "not found" is the
    /// expected answer for them.
    pub expected_missing: bool,
}

impl ProbePackage {
    pub fn for_feed(feed: &Feed) -> Self {
        if let Some(name) = feed
            .test_package
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
        {
            Self {
                name: name.to_string(),
                expected_missing: false,
            }
        } else if let Some(scope) = &feed.scope {
            Self {
                name: format!("{scope}/{SCOPED_PROBE_NAME}"),
                expected_missing: true,
            }
        } else {
            Self {
                name: FALLBACK_PROBE_NAME.into(),
                expected_missing: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn feed(scope: Option<&str>, test_package: Option<&str>) -> Feed {
        Feed {
            organization: "myorg".into(),
            project: None,
            feed: "myfeed".into(),
            registry_url: "https://pkgs.dev.azure.com/myorg/_packaging/myfeed/npm/registry/"
                .parse()
                .unwrap(),
            scope: scope.map(String::from),
            test_package: test_package.map(String::from),
        }
    }

    #[test]
    fn explicit_test_package_wins() {
        assert_eq!(
            ProbePackage::for_feed(&feed(Some("@s"), Some(" @s/real "))),
            ProbePackage {
                name: "@s/real".into(),
                expected_missing: false,
            }
        );
    }

    #[test]
    fn scoped_synthetic_name() {
        assert_eq!(
            ProbePackage::for_feed(&feed(Some("@s"), Some("   "))),
            ProbePackage {
                name: "@s/__auth-check".into(),
                expected_missing: true,
            }
        );
    }

    #[test]
    fn fallback_synthetic_name() {
        assert_eq!(
            ProbePackage::for_feed(&feed(None, None)),
            ProbePackage {
                name: "azure-auth-check-probe".into(),
                expected_missing: true,
            }
        );
    }
}
