use serde::{Deserialize, Serialize};
use stagecraft_model::NodeId;

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

/// A diagnostic message from the linter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level
    pub level: DiagnosticLevel,

    /// The rule that generated this diagnostic
    pub rule: String,

    /// Human-readable message
    pub message: String,

    /// Node the finding is about
    pub node: NodeId,

    /// Optional suggestion for fixing the issue
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn error(rule: impl Into<String>, message: impl Into<String>, node: NodeId) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            rule: rule.into(),
            message: message.into(),
            node,
            suggestion: None,
        }
    }

    pub fn warning(rule: impl Into<String>, message: impl Into<String>, node: NodeId) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            rule: rule.into(),
            message: message.into(),
            node,
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagnosticLevel::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_json_round_trip() {
        let diagnostic = Diagnostic::error("unresolved-reference", "No object named target", NodeId::ROOT)
            .with_suggestion("Restore the target or remove the reference");

        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["level"], "Error");
        assert_eq!(json["rule"], "unresolved-reference");

        let parsed: Diagnostic = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, diagnostic);
        assert!(parsed.is_error());
    }

    #[test]
    fn test_warning_without_suggestion_serializes_null() {
        let diagnostic = Diagnostic::warning("empty-container", "Container has no children", NodeId::ROOT);

        let json = serde_json::to_string(&diagnostic).unwrap();
        assert!(json.contains("\"suggestion\":null"));
        assert!(!serde_json::from_str::<Diagnostic>(&json).unwrap().is_error());
    }
}
