use crate::diagnostic::Diagnostic;
use crate::rules::LintRule;
use stagecraft_model::{DocumentModel, Node};

/// Reference nodes must name exactly one attached instance
pub struct UnresolvedReferenceRule;

impl LintRule for UnresolvedReferenceRule {
    fn name(&self) -> &'static str {
        "unresolved-reference"
    }

    fn description(&self) -> &'static str {
        "Report references whose identifier matches no instance or several"
    }

    fn check_node(&self, node: &Node, model: &DocumentModel) -> Vec<Diagnostic> {
        let Some(reference) = node.as_reference() else {
            return Vec::new();
        };
        let target = reference.target();

        match model.graph().identified(target).len() {
            1 => Vec::new(),
            0 => vec![Diagnostic::error(
                self.name(),
                format!("Reference to '{}' does not resolve to any instance", target),
                node.id(),
            )
            .with_suggestion(format!(
                "Restore an instance with identifier '{}' or remove the reference",
                target
            ))],
            n => vec![Diagnostic::error(
                self.name(),
                format!("Reference to '{}' is ambiguous: {} instances declare it", target, n),
                node.id(),
            )],
        }
    }
}
