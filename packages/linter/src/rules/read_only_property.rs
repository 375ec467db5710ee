use crate::diagnostic::Diagnostic;
use crate::rules::LintRule;
use stagecraft_model::{DocumentModel, Node};

/// Instances should not assign properties the catalog marks read-only
pub struct ReadOnlyPropertyRule;

impl LintRule for ReadOnlyPropertyRule {
    fn name(&self) -> &'static str {
        "read-only-property"
    }

    fn description(&self) -> &'static str {
        "Warn when a scalar property is assigned but not writable"
    }

    fn check_node(&self, node: &Node, model: &DocumentModel) -> Vec<Diagnostic> {
        let Some(slot) = node.as_slot() else {
            return Vec::new();
        };
        if slot.is_collection() {
            return Vec::new();
        }
        let Some(owner) = node.parent().and_then(|id| model.graph().instance(id)) else {
            return Vec::new();
        };

        if model.catalog().is_read_write(owner.class(), slot.name()) {
            return Vec::new();
        }

        vec![Diagnostic::warning(
            self.name(),
            format!("Property '{}' of {} is not writable", slot.name(), owner.class()),
            node.id(),
        )
        .with_suggestion(format!("Remove '{}' from the instance", slot.name()))]
    }
}
