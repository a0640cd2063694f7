use std::io::ErrorKind;

use thiserror::Error;

/// Failure raised while probing the environment. Checks fold these into
/// findings; nothing escapes a check.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("module `{module}` could not be imported: {message}")]
    ImportMissing { module: String, message: String },
    #[error("driver `{0}` is not registered")]
    DriverAbsent(String),
    #[error("could not open {target}: {message}")]
    OpenFailure { target: String, message: String },
    #[error("request to {url} failed: {message}")]
    NetworkFailure { url: String, message: String },
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("unexpected probe output: {0}")]
    Malformed(String),
}

impl ProbeError {
    pub fn is_import_missing(&self) -> bool {
        matches!(self, ProbeError::ImportMissing { .. })
    }

    /// A tool that is not installed means `module` cannot be loaded.
    pub fn missing_tool_as_import(self, module: &str) -> Self {
        match self {
            ProbeError::Launch { program, source } if source.kind() == ErrorKind::NotFound => {
                ProbeError::ImportMissing {
                    module: module.to_string(),
                    message: format!("{program} not found on PATH"),
                }
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_not_found_launches_become_import_missing() {
        let missing = ProbeError::Launch {
            program: "python3".into(),
            source: std::io::Error::from(ErrorKind::NotFound),
        };
        assert!(missing.missing_tool_as_import("osgeo").is_import_missing());

        let denied = ProbeError::Launch {
            program: "python3".into(),
            source: std::io::Error::from(ErrorKind::PermissionDenied),
        };
        assert!(matches!(
            denied.missing_tool_as_import("osgeo"),
            ProbeError::Launch { .. }
        ));
    }
}
