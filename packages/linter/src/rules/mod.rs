mod duplicate_identifier;
mod read_only_property;
mod unresolved_reference;

pub use duplicate_identifier::DuplicateIdentifierRule;
pub use read_only_property::ReadOnlyPropertyRule;
pub use unresolved_reference::UnresolvedReferenceRule;

use crate::diagnostic::Diagnostic;
use stagecraft_model::{DocumentModel, Node};

/// Trait for implementing lint rules
pub trait LintRule: Send + Sync {
    /// Unique identifier for this rule
    fn name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Check one attached node
    fn check_node(&self, _node: &Node, _model: &DocumentModel) -> Vec<Diagnostic> {
        Vec::new()
    }

    /// Check document-wide state once per pass
    fn check_document(&self, _model: &DocumentModel) -> Vec<Diagnostic> {
        Vec::new()
    }
}

/// Registry of all available lint rules
pub struct RuleRegistry {
    rules: Vec<Box<dyn LintRule>>,
}

impl RuleRegistry {
    /// Create a new registry with all built-in rules
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(UnresolvedReferenceRule),
                Box::new(DuplicateIdentifierRule),
                Box::new(ReadOnlyPropertyRule),
            ],
        }
    }

    /// Get all registered rules
    pub fn rules(&self) -> &[Box<dyn LintRule>] {
        &self.rules
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a custom rule to the registry
    pub fn add_rule(&mut self, rule: Box<dyn LintRule>) {
        self.rules.push(rule);
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .finish()
    }
}
