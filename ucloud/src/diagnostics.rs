//! User-facing diagnostics returned by the lifecycle adapters

use serde::Serialize;
use std::fmt;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub summary: String,
    pub detail: String,
    /// Name of the attribute the diagnostic refers to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }

    /// Error diagnostic whose detail is `err` followed by its source chain.
    pub fn from_error(summary: impl Into<String>, err: &(dyn std::error::Error + 'static)) -> Self {
        Self::error(summary, error_chain(err))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// `err` and each of its sources, joined with ": ".
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        if !message.contains(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = cause.source();
    }
    message
}

/// One diagnostic per missing setting.
pub fn config_diagnostics(err: &ConfigError) -> Vec<Diagnostic> {
    match err {
        ConfigError::Missing(missing) => missing
            .iter()
            .map(|setting| {
                Diagnostic::error(
                    format!("Missing {}", setting.attribute),
                    format!(
                        "The provider cannot create the UCloud API client because {} is not set. \
                         Set it in the provider configuration or with the {} environment variable.",
                        setting.attribute, setting.env_var
                    ),
                )
                .with_attribute(setting.attribute)
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::config::MissingSetting;

    #[test]
    fn chain_includes_wrapped_cause_once() {
        let err = ApiError::RetriesExhausted {
            action: "AddCertificate".to_string(),
            attempts: 3,
            source: Box::new(ApiError::from_ret_code(
                "AddCertificate",
                153,
                "rate limit".to_string(),
            )),
        };

        let diagnostic = Diagnostic::from_error("Failed to Add Certificate", &err);
        assert!(diagnostic.is_error());
        assert_eq!(diagnostic.detail.matches("RetCode 153").count(), 1);
    }

    #[test]
    fn missing_settings_become_attribute_diagnostics() {
        let err = ConfigError::Missing(vec![
            MissingSetting {
                attribute: "region",
                env_var: "UCLOUD_REGION",
            },
            MissingSetting {
                attribute: "private_key",
                env_var: "UCLOUD_PRIVATE_KEY",
            },
        ]);

        let diagnostics = config_diagnostics(&err);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].summary, "Missing region");
        assert_eq!(diagnostics[1].attribute.as_deref(), Some("private_key"));
        assert!(diagnostics[1].detail.contains("UCLOUD_PRIVATE_KEY"));
        assert!(has_errors(&diagnostics));
        assert!(!has_errors(&[Diagnostic::warning("note", "")]));
    }
}
