//! Checks that npm can authenticate against every private Azure Artifacts
//! feed a project uses, and walks the operator through fixing the ones it
//! can't.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{ArgMatches, CommandFactory, FromArgMatches as _, Parser};
use directories::{BaseDirs, ProjectDirs};
use feedauth_config::{
    from_command_line, load_feeds, locate_feeds_file, FeedAuthConfig, FeedAuthConfigError,
    FeedAuthConfigLayer, FeedAuthConfigOptions, FEEDS_FILE_NAME,
};
use feedauth_probe::NpmProbe;
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

pub use error::FeedAuthError;
pub use reconcile::{
    FeedCheck, OrgOutcome, OrgRemediation, ReconcileReport, Reconciler, ReconcilerOptions,
};
pub use report::{Icon, Reporter};
pub use token::{PromptTokenSource, TokenSource};

mod error;
mod reconcile;
mod report;
mod token;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct FeedAuth {
    /// Feed configuration file. Relative paths are resolved against --cwd.
    /// Defaults to `azure-feed.config.json` in the working directory.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Project directory to operate on.
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// The user-level .npmrc where credentials are stored.
    /// Defaults to `~/.npmrc`.
    #[arg(long)]
    global_npmrc: Option<PathBuf>,

    /// The project .npmrc where scope mappings are stored.
    /// Defaults to `.npmrc` in the project directory.
    #[arg(long)]
    local_npmrc: Option<PathBuf>,

    /// Only print a short summary of the feeds that need attention.
    #[arg(long, short)]
    silent: bool,

    /// Log output level/directive. Supports plain loglevels (off, error,
    /// warn, info, debug, trace) as well as more advanced directives in the
    /// format `target[span{field=value}]=level`.
    #[arg(long, default_value = "warn")]
    loglevel: String,

    /// Seconds to wait for each registry probe before giving up on it.
    #[arg(long, default_value_t = 10)]
    probe_timeout: u64,

    /// npm executable to probe feeds with. Defaults to `npm` on your PATH.
    #[arg(long)]
    npm: Option<PathBuf>,
}

impl FeedAuth {
    fn setup_logging(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(
                EnvFilter::builder()
                    .with_default_directive(if self.silent {
                        LevelFilter::OFF.into()
                    } else {
                        self.loglevel.parse().into_diagnostic()?
                    })
                    .from_env_lossy(),
            )
            .init();
        Ok(())
    }

    /// Parses arguments, layers in settings, and runs. Returns whether the
    /// process should exit successfully.
    pub async fn load() -> Result<bool> {
        let start = std::time::Instant::now();
        let matches = match FeedAuth::command().try_get_matches() {
            Ok(matches) => matches,
            Err(e) => {
                // --help and --version land here too, and go to stdout.
                e.print().into_diagnostic()?;
                return Ok(!e.use_stderr());
            }
        };
        let mut feedauth = FeedAuth::from_arg_matches(&matches).into_diagnostic()?;
        let cwd = feedauth.cwd()?;
        let cfg = FeedAuthConfigOptions::new()
            .global_config_file(
                ProjectDirs::from("", "", "feedauth")
                    .map(|d| d.config_dir().to_owned().join("feedauthrc.toml")),
            )
            .pkg_root(Some(cwd))
            .load()?;
        feedauth.layer_config(&matches, &cfg)?;
        feedauth.setup_logging()?;
        let report = feedauth.execute().await?;
        tracing::info!("Ran in {}s", start.elapsed().as_millis() as f32 / 1000.0);
        Ok(report.success())
    }

    pub async fn execute(&self) -> Result<ReconcileReport> {
        let cwd = self.cwd()?;
        let fallback = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent()?.parent().map(Path::to_path_buf));
        let feeds_file = locate_feeds_file(&cwd, self.config.as_deref(), fallback.as_deref())
            .ok_or_else(|| {
                FeedAuthConfigError::FeedsFileNotFound(
                    cwd.join(self.config.as_deref().unwrap_or(Path::new(FEEDS_FILE_NAME)))
                        .display()
                        .to_string(),
                )
            })?;
        tracing::info!("Reading feeds from {}", feeds_file.display());
        let feeds = load_feeds(&feeds_file)?;

        let global_npmrc = match &self.global_npmrc {
            Some(path) => cwd.join(path),
            None => BaseDirs::new()
                .ok_or(FeedAuthError::NoHomeDir)?
                .home_dir()
                .join(".npmrc"),
        };
        let local_npmrc = self
            .local_npmrc
            .as_ref()
            .map(|path| cwd.join(path))
            .unwrap_or_else(|| cwd.join(".npmrc"));
        tracing::debug!(
            "global npmrc: {}, local npmrc: {}",
            global_npmrc.display(),
            local_npmrc.display()
        );

        let npm = match &self.npm {
            Some(npm) => NpmProbe::with_program(npm),
            None => NpmProbe::new(),
        };
        let reporter = Reporter::new(self.silent);
        let mut reconciler = ReconcilerOptions::new(global_npmrc, local_npmrc)
            .probe_timeout(Duration::from_secs(self.probe_timeout))
            .reporter(reporter.clone())
            .build(npm, PromptTokenSource::new(reporter));
        Ok(reconciler.reconcile(&feeds).await?)
    }

    fn cwd(&self) -> std::result::Result<PathBuf, FeedAuthError> {
        let current = std::env::current_dir().map_err(FeedAuthError::NoCwd)?;
        Ok(match &self.cwd {
            Some(cwd) => current.join(cwd),
            None => current,
        })
    }
}

impl FeedAuthConfigLayer for FeedAuth {
    fn layer_config(&mut self, args: &ArgMatches, conf: &FeedAuthConfig) -> Result<()> {
        let path = |key: &str| {
            (!from_command_line(args, key))
                .then(|| conf.get_string(key).ok().map(PathBuf::from))
                .flatten()
        };
        if let Some(config) = path("config") {
            self.config = Some(config);
        }
        if let Some(global_npmrc) = path("global_npmrc") {
            self.global_npmrc = Some(global_npmrc);
        }
        if let Some(local_npmrc) = path("local_npmrc") {
            self.local_npmrc = Some(local_npmrc);
        }
        if let Some(npm) = path("npm") {
            self.npm = Some(npm);
        }
        if !from_command_line(args, "silent") {
            if let Ok(silent) = conf.get_bool("silent") {
                self.silent = silent;
            }
        }
        if !from_command_line(args, "loglevel") {
            if let Ok(loglevel) = conf.get_string("loglevel") {
                self.loglevel = loglevel;
            }
        }
        if !from_command_line(args, "probe_timeout") {
            if let Ok(timeout) = conf.get_int("probe_timeout") {
                self.probe_timeout = u64::try_from(timeout).into_diagnostic()?;
            }
        }
        Ok(())
    }
}
