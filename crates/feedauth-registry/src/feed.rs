use std::fmt;

use url::Url;

use crate::keys::RegistryKeys;
use crate::PACKAGING_SEGMENT;

/// A fully normalized feed, as checked and repaired by feedauth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub organization: String,
    pub project: Option<String>,
    pub feed: String,
    pub registry_url: Url,
    /// Package scope mapped to this feed, always `@`-prefixed.
    pub scope: Option<String>,
    /// A real package expected to exist in the feed, used for probing.
    pub test_package: Option<String>,
}

impl Feed {
    pub fn keys(&self) -> RegistryKeys {
        RegistryKeys::for_url(&self.registry_url)
    }

    /// `{project}/_packaging/{feed}` for project feeds, otherwise
    /// `{organization}/_packaging/{feed}`. Any line mentioning one of these
    /// belongs to this feed's credentials.
    pub fn packaging_paths(&self) -> Vec<String> {
        let owner = self.project.as_ref().unwrap_or(&self.organization);
        vec![format!("{owner}/{PACKAGING_SEGMENT}/{}", self.feed)]
    }

    /// `{organization}/{project}/{feed}`, or `{organization}/{feed}` for
    /// feeds without a project. Used in credential block annotations.
    pub fn short_name(&self) -> String {
        match &self.project {
            Some(project) => format!("{}/{project}/{}", self.organization, self.feed),
            None => format!("{}/{}", self.organization, self.feed),
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}/{})",
            self.feed,
            self.organization,
            self.project.as_deref().unwrap_or(&self.organization)
        )
    }
}

/// Prefixes a scope with `@` if it doesn't have one already. Blank scopes
/// mean "no scope".
pub fn normalize_scope(scope: &str) -> Option<String> {
    let scope = scope.trim();
    if scope.is_empty() {
        None
    } else if scope.starts_with('@') {
        Some(scope.to_string())
    } else {
        Some(format!("@{scope}"))
    }
}
