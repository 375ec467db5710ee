//! # Stagecraft Linter
//!
//! Document-health checks over the attached node graph. Findings are plain
//! [`Diagnostic`] values; nothing here fails or mutates the document.

mod diagnostic;
mod linter;
mod rules;

pub use diagnostic::{Diagnostic, DiagnosticLevel};
pub use linter::{lint_document, LintOptions};
pub use rules::{
    DuplicateIdentifierRule, LintRule, ReadOnlyPropertyRule, RuleRegistry, UnresolvedReferenceRule,
};
