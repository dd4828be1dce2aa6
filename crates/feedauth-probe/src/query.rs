use std::time::Duration;

use async_trait::async_trait;
use url::Url;

/// Everything a registry query printed, plus a description of how it
/// failed, if it did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeOutput {
    pub stdout: String,
    pub stderr: String,
    pub message: Option<String>,
}

impl ProbeOutput {
    /// stdout, stderr and the failure message, skipping empty ones, one per
    /// line.
    pub fn combined(&self) -> String {
        [
            self.stdout.as_str(),
            self.stderr.as_str(),
            self.message.as_deref().unwrap_or(""),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
    }
}

/// Read-only "fetch package version" query against a registry.
///
/// Implementations must never error out in any other way than returning
/// `Err(output)`: a query that couldn't even be started is a failed query
/// like any other, and gets classified from its output.
#[async_trait]
pub trait RegistryProbe: Send + Sync {
    async fn query(
        &self,
        package: &str,
        registry: &Url,
        timeout: Duration,
    ) -> Result<ProbeOutput, ProbeOutput>;
}

#[async_trait]
impl<P: RegistryProbe + ?Sized> RegistryProbe for &P {
    async fn query(
        &self,
        package: &str,
        registry: &Url,
        timeout: Duration,
    ) -> Result<ProbeOutput, ProbeOutput> {
        (**self).query(package, registry, timeout).await
    }
}
