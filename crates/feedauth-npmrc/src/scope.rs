use feedauth_registry::Feed;

/// The `{scope}:registry={url}` line mapping `feed`'s scope to its
/// registry, if it has a scope.
pub fn scope_line(feed: &Feed) -> Option<String> {
    let scope = feed.scope.as_ref()?;
    Some(format!(
        "{scope}:registry={}",
        feed.keys().registry_url_normalized
    ))
}

/// Whether `npmrc` already maps `feed`'s scope to its registry. Feeds without
/// a scope never need a mapping.
pub fn has_scope_mapping(npmrc: &str, feed: &Feed) -> bool {
    let Some(scope) = &feed.scope else {
        return true;
    };
    let prefix = format!("{scope}:registry=");
    let url = feed.keys().registry_url_normalized;
    npmrc.lines().any(|line| {
        let line = line.trim();
        line.starts_with(&prefix) && line.contains(&url)
    })
}

/// Returns `npmrc` with `feed`'s scope mapping appended, or `None` if
/// there's nothing to add. Existing lines are never touched, even mappings
/// of the same scope to some other registry.
pub fn with_scope_mapping(npmrc: &str, feed: &Feed) -> Option<String> {
    if has_scope_mapping(npmrc, feed) {
        return None;
    }
    let line = scope_line(feed)?;
    let mut out = npmrc.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&line);
    out.push('\n');
    Some(out)
}
