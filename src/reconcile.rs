//! Check every configured feed, then walk the operator through fixing the
//! ones that need it, one organization at a time.

use std::path::PathBuf;
use std::time::Duration;

use colored::*;
use feedauth_npmrc::{ensure_scope_mapping, has_credentials, read_npmrc, write_credentials};
use feedauth_probe::{AuthProbeResult, FeedProber, RegistryProbe, DEFAULT_TIMEOUT};
use feedauth_registry::Feed;

use crate::error::{FeedAuthError, Result};
use crate::report::{Icon, Reporter};
use crate::token::TokenSource;

/// The result of checking one feed before any remediation.
#[derive(Debug, Clone)]
pub struct FeedCheck {
    pub feed: Feed,
    /// Whether the global `.npmrc` held a password for the feed when the run
    /// started.
    pub had_credentials: bool,
    pub result: AuthProbeResult,
}

impl FeedCheck {
    /// Feeds that were rejected outright, and feeds with nothing stored for
    /// them (even if the probe got through some other way), need a token.
    ///
    /// A probe that failed for an unknown reason while credentials are stored
    /// doesn't count: that's more likely a network problem than a bad token,
    /// and re-prompting would overwrite credentials that may be fine.
    pub fn needs_remediation(&self) -> bool {
        self.result.is_unauthorized() || !self.had_credentials
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgOutcome {
    /// The operator didn't provide a token.
    Skipped,
    /// Every feed verified after writing the new token.
    Authenticated,
    /// Some feed still failed after writing the new token.
    StillFailing,
}

#[derive(Debug, Clone)]
pub struct OrgRemediation {
    pub organization: String,
    pub feeds: Vec<Feed>,
    pub outcome: OrgOutcome,
}

#[derive(Debug, Clone)]
pub struct ReconcileReport {
    pub checks: Vec<FeedCheck>,
    pub remediations: Vec<OrgRemediation>,
}

impl ReconcileReport {
    /// True if every organization that needed a new token got one that
    /// works.
    pub fn success(&self) -> bool {
        self.remediations
            .iter()
            .all(|r| r.outcome == OrgOutcome::Authenticated)
    }
}

/// Where the orchestrator reads and writes, and how it talks to the
/// operator.
#[derive(Debug, Clone)]
pub struct ReconcilerOptions {
    global_npmrc: PathBuf,
    local_npmrc: PathBuf,
    probe_timeout: Duration,
    reporter: Option<Reporter>,
}

impl ReconcilerOptions {
    pub fn new(global_npmrc: impl Into<PathBuf>, local_npmrc: impl Into<PathBuf>) -> Self {
        Self {
            global_npmrc: global_npmrc.into(),
            local_npmrc: local_npmrc.into(),
            probe_timeout: DEFAULT_TIMEOUT,
            reporter: None,
        }
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Use a specific reporter instead of the default, non-silent one.
    pub fn reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn build<P, T>(self, registry: P, tokens: T) -> Reconciler<P, T>
    where
        P: RegistryProbe,
        T: TokenSource,
    {
        Reconciler {
            global_npmrc: self.global_npmrc,
            local_npmrc: self.local_npmrc,
            prober: FeedProber::new(registry).timeout(self.probe_timeout),
            tokens,
            reporter: self
                .reporter
                .unwrap_or_else(|| Reporter::new(false)),
        }
    }
}

pub struct Reconciler<P, T> {
    global_npmrc: PathBuf,
    local_npmrc: PathBuf,
    prober: FeedProber<P>,
    tokens: T,
    reporter: Reporter,
}

impl<P: RegistryProbe, T: TokenSource> Reconciler<P, T> {
    /// Checks `feeds` in order, then remediates failing organizations in the
    /// order they were first seen.
    pub async fn reconcile(&mut self, feeds: &[Feed]) -> Result<ReconcileReport> {
        if feeds.is_empty() {
            return Err(FeedAuthError::NoFeeds);
        }

        let had_credentials = self.check_stored_credentials(feeds)?;
        self.add_missing_scope_mappings(feeds)?;

        let r = &self.reporter;
        r.status(format!(
            "{}Azure DevOps NPM Authentication Check\n",
            r.icon(Icon::Start)
        ));
        r.status(format!(
            "{}Found {} feed(s) to check:\n",
            r.icon(Icon::Feeds),
            feeds.len()
        ));

        let mut checks = Vec::with_capacity(feeds.len());
        for (feed, had_credentials) in feeds.iter().zip(had_credentials) {
            let check = self.check_feed(feed, had_credentials).await;
            checks.push(check);
        }

        let failing = checks
            .iter()
            .filter(|c| c.needs_remediation())
            .map(|c| &c.feed)
            .collect::<Vec<_>>();
        let r = &self.reporter;
        if failing.is_empty() {
            r.status(format!(
                "{}{}\n",
                r.icon(Icon::Success),
                "All feeds authenticated successfully! You're ready to go.".green()
            ));
            return Ok(ReconcileReport {
                checks,
                remediations: Vec::new(),
            });
        }

        if r.is_silent() {
            r.summary(failing.iter().copied());
        } else {
            r.status(format!(
                "\n{}{} feed(s) need authentication.\n",
                r.icon(Icon::Warning),
                failing.len()
            ));
        }

        let mut remediations = Vec::new();
        for (organization, org_feeds) in group_by_organization(&failing) {
            let outcome = self.remediate(&organization, &org_feeds).await?;
            remediations.push(OrgRemediation {
                organization,
                feeds: org_feeds,
                outcome,
            });
        }

        let report = ReconcileReport {
            checks,
            remediations,
        };
        let r = &self.reporter;
        if report.success() {
            r.status(format!(
                "\n{}{}\n",
                r.icon(Icon::Done),
                "All feeds are now authenticated!".green()
            ));
        } else {
            r.status(format!(
                "\n{}Some feeds still need attention. Please check the errors above.\n",
                r.icon(Icon::Warning)
            ));
        }
        Ok(report)
    }

    /// Which feeds had a password stored in the global `.npmrc` at the start
    /// of the run, in the same order as `feeds`.
    fn check_stored_credentials(&self, feeds: &[Feed]) -> Result<Vec<bool>> {
        let r = &self.reporter;
        let npmrc = read_npmrc(&self.global_npmrc)?;
        if npmrc.is_empty() {
            tracing::info!("{} is missing or empty", self.global_npmrc.display());
            r.warn(format!(
                "{}No {} file found. Global credentials will be written after successful authentication.\n",
                r.icon(Icon::Warning),
                self.global_npmrc.display()
            ));
            return Ok(vec![false; feeds.len()]);
        }

        let stored = feeds
            .iter()
            .map(|feed| has_credentials(&npmrc, feed))
            .collect::<Vec<_>>();
        if stored.contains(&false) {
            r.warn(format!(
                "{}Detected feeds without credentials in {}:",
                r.icon(Icon::Warning),
                self.global_npmrc.display()
            ));
            for (feed, _) in feeds.iter().zip(&stored).filter(|(_, stored)| !**stored) {
                r.warn(format!("   • {}", feed.registry_url));
            }
            r.warn("");
        }
        Ok(stored)
    }

    fn add_missing_scope_mappings(&self, feeds: &[Feed]) -> Result<()> {
        let r = &self.reporter;
        let mut announced = false;
        for feed in feeds {
            let Some(scope) = &feed.scope else {
                continue;
            };
            if !ensure_scope_mapping(&self.local_npmrc, feed)? {
                continue;
            }
            if !announced {
                r.warn(format!(
                    "{}Missing scope registry mappings detected in {}. Adding entries:",
                    r.icon(Icon::Warning),
                    self.local_npmrc.display()
                ));
                announced = true;
            }
            r.warn(format!("   • {scope} → {}", feed.registry_url));
        }
        if announced {
            r.warn("");
        }
        Ok(())
    }

    async fn check_feed(&self, feed: &Feed, had_credentials: bool) -> FeedCheck {
        let r = &self.reporter;
        r.status(format!("   • {feed}"));
        r.status(format!("     Registry: {}", feed.registry_url));

        let result = self.prober.probe(feed).await;
        if result.is_ok() {
            let notes = result
                .note()
                .map(String::from)
                .into_iter()
                .chain((!had_credentials).then(|| "Credentials not stored in ~/.npmrc yet".to_string()))
                .collect::<Vec<_>>();
            let suffix = if notes.is_empty() {
                String::new()
            } else {
                format!(" ({})", notes.join("; "))
            };
            let icon = if had_credentials {
                r.icon(Icon::Success)
            } else {
                r.icon(Icon::Warning)
            };
            r.status(format!("     {icon}Authenticated{suffix}\n"));
        } else if result.is_unauthorized() {
            r.status(format!(
                "     {}{}\n",
                r.icon(Icon::Failure),
                "Authentication failed".red()
            ));
        } else {
            r.status(format!(
                "     {}{} (probe: {})",
                r.icon(Icon::Failure),
                "Request failed".red(),
                result.probe
            ));
            r.detail(result.detail());
            r.status("");
        }

        FeedCheck {
            feed: feed.clone(),
            had_credentials,
            result,
        }
    }

    async fn remediate(&mut self, organization: &str, feeds: &[Feed]) -> Result<OrgOutcome> {
        let r = &self.reporter;
        r.status(format!("\n━━━ {} ━━━", organization.bold()));
        r.status(format!(
            "Feeds needing authentication: {}\n",
            feeds
                .iter()
                .map(|f| f.feed.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        let token = self
            .tokens
            .request_token(organization)
            .await?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let r = &self.reporter;
        let Some(token) = token else {
            tracing::info!("no token provided for {organization}");
            r.error(format!("{}No token provided. Skipping...", r.icon(Icon::Failure)));
            r.status(format!("{}Skipped {organization}\n", r.icon(Icon::Skipped)));
            return Ok(OrgOutcome::Skipped);
        };

        r.status(format!(
            "\n{}Updating credentials for {} feed(s)...",
            r.icon(Icon::Memo),
            feeds.len()
        ));
        for feed in feeds {
            write_credentials(&self.global_npmrc, feed, &token)?;
            r.status(format!("   {}{}", r.icon(Icon::Written), feed.feed));
        }

        r.status(format!("\n{}Verifying credentials...", r.icon(Icon::Search)));
        let mut all_ok = true;
        for feed in feeds {
            if !self.verify(feed).await? {
                all_ok = false;
            }
        }

        let r = &self.reporter;
        if all_ok {
            r.status(format!(
                "\n{}{}\n",
                r.icon(Icon::Success),
                format!("All {organization} feeds authenticated successfully!").green()
            ));
            Ok(OrgOutcome::Authenticated)
        } else {
            r.error(format!(
                "\n{}{}",
                r.icon(Icon::Failure),
                format!("Some feeds in {organization} are still failing.").red()
            ));
            r.error("   Please verify your PAT has the correct permissions.");
            r.error("   Required scope: Packaging (Read)\n");
            Ok(OrgOutcome::StillFailing)
        }
    }

    /// Re-probes `feed` after writing its credentials. It only counts as
    /// fixed if the probe passes and the credentials actually landed in the
    /// global `.npmrc`.
    async fn verify(&self, feed: &Feed) -> Result<bool> {
        let result = self.prober.probe(feed).await;
        let stored = has_credentials(&read_npmrc(&self.global_npmrc)?, feed);
        let r = &self.reporter;
        let name = &feed.feed;

        if result.is_ok() && stored {
            let suffix = result
                .note()
                .map(|note| format!(" ({note})"))
                .unwrap_or_default();
            r.status(format!(
                "   {}{name} - authenticated{suffix}",
                r.icon(Icon::Success)
            ));
            return Ok(true);
        }

        let failure = r.icon(Icon::Failure);
        if !stored {
            r.status(format!(
                "   {failure}{name} - credentials not written to {}",
                self.global_npmrc.display()
            ));
        } else if result.is_unauthorized() {
            r.status(format!("   {failure}{name} - authentication failed"));
        } else {
            r.status(format!(
                "   {failure}{name} - request failed (probe: {})",
                result.probe
            ));
            r.detail(result.detail());
        }
        Ok(false)
    }
}

/// Groups feeds by organization, keeping organizations in the order they
/// first appear and feeds in their original order.
fn group_by_organization(feeds: &[&Feed]) -> Vec<(String, Vec<Feed>)> {
    let mut groups: Vec<(String, Vec<Feed>)> = Vec::new();
    for feed in feeds {
        match groups
            .iter_mut()
            .find(|(organization, _)| *organization == feed.organization)
        {
            Some((_, group)) => group.push((*feed).clone()),
            None => groups.push((feed.organization.clone(), vec![(*feed).clone()])),
        }
    }
    groups
}
