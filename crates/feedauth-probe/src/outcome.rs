use crate::package::ProbePackage;
use crate::query::ProbeOutput;

// npm reports registry errors only as text, so these codes are all there is
// to go on. Update them here if npm's output format changes.
const NOT_FOUND_SIGNAL: &str = "E404";
const UNAUTHORIZED_SIGNALS: [&str; 2] = ["E401", "E403"];

/// Why a probe failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The registry rejected our credentials (or lack of them).
    Unauthorized,
    /// Anything else: network trouble, timeouts, npm missing, and so on.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    Authenticated {
        note: Option<String>,
    },
    Failed {
        reason: FailureReason,
        detail: Option<String>,
    },
}

/// What a live probe against a feed found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthProbeResult {
    /// Name of the package that was queried.
    pub probe: String,
    pub status: ProbeStatus,
}

impl AuthProbeResult {
    pub fn is_ok(&self) -> bool {
        matches!(self.status, ProbeStatus::Authenticated { .. })
    }

    pub fn reason(&self) -> Option<FailureReason> {
        match self.status {
            ProbeStatus::Failed { reason, .. } => Some(reason),
            ProbeStatus::Authenticated { .. } => None,
        }
    }

    pub fn note(&self) -> Option<&str> {
        match &self.status {
            ProbeStatus::Authenticated { note } => note.as_deref(),
            ProbeStatus::Failed { .. } => None,
        }
    }

    /// Full diagnostic output of a probe that failed for an unknown reason.
    pub fn detail(&self) -> Option<&str> {
        match &self.status {
            ProbeStatus::Failed { detail, .. } => detail.as_deref(),
            ProbeStatus::Authenticated { .. } => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.reason() == Some(FailureReason::Unauthorized)
    }
}

/// Classifies the outcome of querying `package`.
///
/// A successful query and a "not found" both mean the registry accepted our
/// credentials. Note that a configured test package that turns out not to
/// exist is still reported as authenticated, with a note saying so.
pub fn classify(
    package: &ProbePackage,
    outcome: Result<ProbeOutput, ProbeOutput>,
) -> AuthProbeResult {
    let probe = package.name.clone();
    let status = match outcome {
        Ok(_) => ProbeStatus::Authenticated {
            note: package
                .expected_missing
                .then(|| "Probe package responded successfully (unexpected).".to_string()),
        },
        Err(failure) => {
            let output = failure.combined();
            if output.contains(NOT_FOUND_SIGNAL) {
                ProbeStatus::Authenticated {
                    note: Some(if package.expected_missing {
                        "Probe package not found (expected).".to_string()
                    } else {
                        format!("Package {} was not found in the feed.", package.name)
                    }),
                }
            } else if UNAUTHORIZED_SIGNALS.iter().any(|code| output.contains(code)) {
                ProbeStatus::Failed {
                    reason: FailureReason::Unauthorized,
                    detail: None,
                }
            } else {
                ProbeStatus::Failed {
                    reason: FailureReason::Unknown,
                    detail: Some(output.trim().to_string()).filter(|d| !d.is_empty()),
                }
            }
        }
    };
    tracing::debug!("probe for {probe}: {status:?}");
    AuthProbeResult { probe, status }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn synthetic() -> ProbePackage {
        ProbePackage {
            name: "@s/__auth-check".into(),
            expected_missing: true,
        }
    }

    fn real() -> ProbePackage {
        ProbePackage {
            name: "@s/real".into(),
            expected_missing: false,
        }
    }

    fn stderr(text: &str) -> ProbeOutput {
        ProbeOutput {
            stderr: text.into(),
            ..Default::default()
        }
    }

    #[test]
    fn success_on_synthetic_probe_is_flagged() {
        let result = classify(&synthetic(), Ok(ProbeOutput::default()));
        assert!(result.is_ok());
        assert_eq!(
            result.note(),
            Some("Probe package responded successfully (unexpected).")
        );
    }

    #[test]
    fn success_on_real_package() {
        let result = classify(&real(), Ok(ProbeOutput::default()));
        assert_eq!(
            result,
            AuthProbeResult {
                probe: "@s/real".into(),
                status: ProbeStatus::Authenticated { note: None },
            }
        );
    }

    #[test]
    fn not_found_means_authenticated() {
        let result = classify(&synthetic(), Err(stderr("npm ERR! code E404\nnpm ERR! 404 Not Found")));
        assert!(result.is_ok());
        assert_eq!(result.note(), Some("Probe package not found (expected)."));

        let result = classify(&real(), Err(stderr("npm ERR! code E404")));
        assert!(result.is_ok());
        assert_eq!(result.note(), Some("Package @s/real was not found in the feed."));
    }

    #[test]
    fn unauthorized_and_forbidden() {
        for code in ["E401", "E403"] {
            let result = classify(&synthetic(), Err(stderr(&format!("npm ERR! code {code}"))));
            assert!(!result.is_ok());
            assert!(result.is_unauthorized());
            assert_eq!(result.detail(), None);
        }
    }

    #[test]
    fn not_found_takes_priority() {
        let result = classify(&synthetic(), Err(stderr("E401 then E404")));
        assert!(result.is_ok());
    }

    #[test]
    fn anything_else_is_unknown_with_detail() {
        let result = classify(
            &synthetic(),
            Err(ProbeOutput {
                stdout: "".into(),
                stderr: "npm ERR! code ECONNRESET\n".into(),
                message: Some("Command failed".into()),
            }),
        );
        assert_eq!(result.reason(), Some(FailureReason::Unknown));
        assert_eq!(
            result.detail(),
            Some("npm ERR! code ECONNRESET\n\nCommand failed")
        );
    }
}
