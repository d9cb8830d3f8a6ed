use clap::ValueEnum;
use std::fmt;

pub mod commands;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        *self == OutputFormat::Json
    }
}

/// A failure the user can act on, carrying its own remediation hint
#[derive(Debug)]
pub struct Failure {
    message: String,
    hint: Option<String>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Failure {}

/// Remediation hint for an error raised anywhere in the command chain
pub fn hint_for(err: &anyhow::Error) -> Option<String> {
    use extpack_core::{Error as CoreError, ValidationError};

    for cause in err.chain() {
        if let Some(failure) = cause.downcast_ref::<Failure>() {
            return failure.hint.clone();
        }

        if let Some(err) = cause.downcast_ref::<ValidationError>() {
            return Some(validation_hint(err).to_string());
        }

        if let Some(err) = cause.downcast_ref::<CoreError>() {
            return match err {
                CoreError::InvalidExtension(err) => Some(validation_hint(err).to_string()),
                CoreError::InvalidPackFile { .. } => {
                    Some("run `extpack validate <FILE>` to list every problem".to_string())
                }
                CoreError::UnknownSchemaVersion(_) => {
                    Some("upgrade extpack to read this pack".to_string())
                }
                CoreError::CorruptBundle { .. } => {
                    Some("the pack file is damaged; recreate it".to_string())
                }
                CoreError::Pattern(_) => Some("check the --exclude glob syntax".to_string()),
                _ => None,
            };
        }

        if let Some(err) = cause.downcast_ref::<extpack_browser::Error>() {
            return match err {
                extpack_browser::Error::Browser(_) => {
                    Some("install Chrome, Chromium, Brave or Edge, or pass --browser-path".to_string())
                }
                _ => None,
            };
        }
    }

    None
}

fn validation_hint(err: &extpack_core::ValidationError) -> &'static str {
    match err {
        extpack_core::ValidationError::ManifestMissing(_) => {
            "point at the folder that contains manifest.json"
        }
        _ => "fix the extension's manifest.json and retry",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_hint_is_found_through_context() {
        let err = anyhow::Error::new(Failure::new("browser is running").with_hint("close the browser and retry"))
            .context("install failed");
        assert_eq!(hint_for(&err).as_deref(), Some("close the browser and retry"));
    }

    #[test]
    fn test_core_error_hint() {
        let err = anyhow::Error::new(extpack_core::Error::UnknownSchemaVersion(9));
        assert!(hint_for(&err).unwrap().contains("upgrade"));
    }

    #[test]
    fn test_plain_error_has_no_hint() {
        assert!(hint_for(&anyhow::anyhow!("boom")).is_none());
    }
}
