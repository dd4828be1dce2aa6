use url::Url;

const REGISTRY_SUFFIX: &str = "/registry/";

/// Scheme-less `//host[:port]/path` form npm uses as a per-registry config
/// key prefix.
pub fn nerf_dart(url: &Url) -> String {
    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
    format!("//{}{port}{}", url.host_str().unwrap_or(""), url.path())
}

/// The `.npmrc` key prefixes credentials for a feed are stored under.
///
/// npm looks credentials up by the full registry path, while some tooling
/// authenticates against the feed root (the registry path minus its trailing
/// `/registry/` segment), so both are written and both are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryKeys {
    /// `//host/.../npm/registry/`
    pub registry_key: String,
    /// `//host/.../npm/`
    pub feed_key: String,
    /// `https://host/.../npm/registry/`, always with a trailing slash.
    pub registry_url_normalized: String,
}

impl RegistryKeys {
    pub fn for_url(url: &Url) -> Self {
        let mut registry_url = url.clone();
        registry_url.set_query(None);
        registry_url.set_fragment(None);
        if !registry_url.path().ends_with('/') {
            let path = format!("{}/", registry_url.path());
            registry_url.set_path(&path);
        }
        let registry_path = registry_url.path();

        let feed_path = match registry_path.strip_suffix(REGISTRY_SUFFIX) {
            Some(root) if root.ends_with('/') => root.to_string(),
            Some(root) => format!("{root}/"),
            None => registry_path.to_string(),
        };

        let registry_key = nerf_dart(&registry_url);
        let feed_key = format!(
            "{}{feed_path}",
            registry_key
                .strip_suffix(registry_path)
                .unwrap_or(&registry_key)
        );
        let registry_url_normalized = format!(
            "{}{registry_path}",
            registry_url.origin().ascii_serialization()
        );

        Self {
            registry_key,
            feed_key,
            registry_url_normalized,
        }
    }

    /// Every key form a stored password might be filed under: both keys with
    /// a trailing slash, and the legacy forms without one.
    pub fn lookup_keys(&self) -> [&str; 4] {
        [
            &self.registry_key,
            &self.feed_key,
            strip_trailing_slash(&self.registry_key),
            strip_trailing_slash(&self.feed_key),
        ]
    }
}

fn strip_trailing_slash(key: &str) -> &str {
    key.strip_suffix('/').unwrap_or(key)
}
