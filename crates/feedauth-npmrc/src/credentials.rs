use base64::{engine::general_purpose, Engine as _};
use feedauth_registry::{Feed, RegistryKeys};

pub(crate) const ALWAYS_AUTH: &str = "always-auth=true";

/// Whether `npmrc` holds a password for `feed` under any of its registry or
/// feed keys, with or without a trailing slash.
pub fn has_credentials(npmrc: &str, feed: &Feed) -> bool {
    let keys = feed.keys();
    keys.lookup_keys()
        .iter()
        .any(|key| !key.is_empty() && npmrc.contains(&format!("{key}:_password=")))
}

/// Comment line written above a feed's credential block.
pub fn annotation(feed: &Feed) -> String {
    format!("; Azure DevOps authentication for {}", feed.short_name())
}

/// Returns `npmrc` with `feed`'s credential block replaced by a fresh one
/// for `token`.
///
/// Every line of the feed's previous block goes, along with its annotation
/// and the blank line that closed it. Lines belonging to anything else are
/// kept in order, with runs of blank lines collapsed. The new block goes at
/// the end, followed by the file's single `always-auth=true`.
pub fn with_credentials(npmrc: &str, feed: &Feed, token: &str) -> String {
    let keys = feed.keys();
    let matcher = BlockMatcher::new(feed, &keys);

    let mut kept: Vec<&str> = Vec::new();
    let mut in_block = false;
    for raw in npmrc.lines() {
        let line = raw.trim();
        if matcher.is_annotation(line) || matcher.is_entry(line) {
            in_block = true;
            continue;
        }
        if line == ALWAYS_AUTH {
            in_block = false;
            continue;
        }
        if in_block && line.is_empty() {
            in_block = false;
            continue;
        }
        in_block = false;
        let after_content = matches!(kept.last(), Some(prev) if !prev.trim().is_empty());
        if !line.is_empty() || after_content {
            kept.push(raw);
        }
    }
    while matches!(kept.last(), Some(prev) if prev.trim().is_empty()) {
        kept.pop();
    }

    let password = general_purpose::STANDARD.encode(token);
    let organization = &feed.organization;
    let mut lines = kept.into_iter().map(String::from).collect::<Vec<_>>();
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(annotation(feed));
    for key in [&keys.registry_key, &keys.feed_key] {
        lines.push(format!("{key}:username={organization}"));
        lines.push(format!("{key}:_password={password}"));
        lines.push(format!("{key}:email=npm@{organization}.com"));
    }
    lines.push(String::new());
    lines.push(ALWAYS_AUTH.into());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Recognizes lines that belong to one feed's credential block.
struct BlockMatcher<'a> {
    keys: [&'a str; 4],
    packaging_paths: Vec<String>,
    annotation: String,
}

impl<'a> BlockMatcher<'a> {
    fn new(feed: &Feed, keys: &'a RegistryKeys) -> Self {
        Self {
            keys: keys.lookup_keys(),
            packaging_paths: feed.packaging_paths(),
            annotation: annotation(feed),
        }
    }

    fn is_annotation(&self, line: &str) -> bool {
        (line.starts_with(';') || line.starts_with('#'))
            && (line == self.annotation || self.mentions_feed(line))
    }

    /// Per-registry settings (`//host/path:key=value`) stored under one of
    /// this feed's keys, or under any URL pointing into the feed. Scope
    /// mappings and other unkeyed settings never match.
    fn is_entry(&self, line: &str) -> bool {
        if !line.starts_with("//") {
            return false;
        }
        self.keys.iter().any(|key| {
            line.strip_prefix(key)
                .map_or(false, |rest| rest.starts_with(':'))
        }) || self.mentions_feed(line)
    }

    fn mentions_feed(&self, line: &str) -> bool {
        self.packaging_paths
            .iter()
            .any(|path| mentions_segment(line, path))
    }
}

/// Whether `path` occurs in `line` on whole path segments, so that
/// `org/_packaging/feed` doesn't match inside `org/_packaging/feed2` or
/// `myorg/_packaging/feed`.
fn mentions_segment(line: &str, path: &str) -> bool {
    line.match_indices(path).any(|(start, _)| {
        let before = line[..start].chars().next_back();
        let after = line[start + path.len()..].chars().next();
        let bounded = |c: Option<char>, extra: char| {
            c.map_or(true, |c| c == '/' || c == extra || c.is_whitespace())
        };
        bounded(before, '/') && bounded(after, ':')
    })
}
