use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use async_process::{Command, Stdio};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use url::Url;

use crate::query::{ProbeOutput, RegistryProbe};

/// Probes registries by running `npm view <package> version
/// --registry=<url>`, so the query goes through npm's own credential lookup.
#[derive(Debug, Default)]
pub struct NpmProbe {
    npm: OnceCell<PathBuf>,
    leading_args: Vec<OsString>,
}

impl NpmProbe {
    /// Uses whatever `npm` is first on `$PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a specific npm executable, or any program that takes npm's
    /// arguments.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            npm: OnceCell::with_value(program.into()),
            leading_args: Vec::new(),
        }
    }

    /// Adds an argument passed before npm's own, such as the path to
    /// `npm-cli.js` when the program is `node`.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.leading_args.push(arg.into());
        self
    }

    fn program(&self) -> Result<&PathBuf, ProbeOutput> {
        self.npm
            .get_or_try_init(|| which::which("npm"))
            .map_err(|e| ProbeOutput {
                message: Some(format!("Failed to find npm executable: {e}")),
                ..Default::default()
            })
    }
}

#[async_trait]
impl RegistryProbe for NpmProbe {
    async fn query(
        &self,
        package: &str,
        registry: &Url,
        timeout: Duration,
    ) -> Result<ProbeOutput, ProbeOutput> {
        let npm = self.program()?;
        let registry_arg = format!("--registry={registry}");
        let command_line = format!("npm view {package} version {registry_arg}");
        tracing::debug!("running {command_line} ({})", npm.display());

        let child = Command::new(npm)
            .args(&self.leading_args)
            .arg("view")
            .arg(package)
            .arg("version")
            .arg(&registry_arg)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match async_std::future::timeout(timeout, child).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ProbeOutput {
                    message: Some(format!("Failed to run {command_line}: {e}")),
                    ..Default::default()
                })
            }
            Err(_) => {
                tracing::debug!("{command_line} timed out after {timeout:?}");
                return Err(ProbeOutput {
                    message: Some(format!(
                        "Command timed out after {}s: {command_line}",
                        timeout.as_secs_f32()
                    )),
                    ..Default::default()
                });
            }
        };

        let mut result = ProbeOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            message: None,
        };
        if output.status.success() {
            Ok(result)
        } else {
            result.message = Some(format!("Command failed ({}): {command_line}", output.status));
            Err(result)
        }
    }
}
