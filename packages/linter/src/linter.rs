use crate::diagnostic::Diagnostic;
use crate::rules::RuleRegistry;
use stagecraft_model::DocumentModel;
use tracing::debug;

/// Options for configuring the linter
#[derive(Debug, Default)]
pub struct LintOptions {
    /// Custom rule registry (uses default if None)
    pub registry: Option<RuleRegistry>,
}

/// Lint the attached part of a document and return diagnostics
///
/// Detached nodes (undo history, orphaned subtrees) are never inspected.
pub fn lint_document(model: &DocumentModel, options: LintOptions) -> Vec<Diagnostic> {
    let registry = options.registry.unwrap_or_default();
    let mut diagnostics = Vec::new();

    for node in model.graph().iter() {
        for rule in registry.rules() {
            diagnostics.extend(rule.check_node(node, model));
        }
    }

    for rule in registry.rules() {
        diagnostics.extend(rule.check_document(model));
    }

    debug!(
        rules = registry.rules().len(),
        diagnostics = diagnostics.len(),
        "Lint pass complete"
    );
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::UnresolvedReferenceRule;
    use stagecraft_model::testing::sample_model;
    use stagecraft_model::{Fragment, Mutation, NodeId};

    fn sample() -> DocumentModel {
        let mut model = sample_model();
        let root = model
            .materialize(
                &Fragment::instance("VBox")
                    .children(
                        "children",
                        vec![
                            Fragment::instance("Label")
                                .identifier("dup")
                                .property("baseline", 1.0)
                                .build(),
                            Fragment::instance("Label").identifier("dup").build(),
                            Fragment::reference("nowhere"),
                        ],
                    )
                    .build(),
            )
            .unwrap();
        model
            .apply(&Mutation::Attach {
                parent: NodeId::ROOT,
                index: 0,
                node: root,
            })
            .unwrap();
        model
    }

    #[test]
    fn test_default_rules_report_every_problem() {
        let diagnostics = lint_document(&sample(), LintOptions::default());

        let mut rules: Vec<&str> = diagnostics.iter().map(|d| d.rule.as_str()).collect();
        rules.sort();
        assert_eq!(
            rules,
            vec!["duplicate-identifier", "read-only-property", "unresolved-reference"]
        );
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = RuleRegistry::empty();
        registry.add_rule(Box::new(UnresolvedReferenceRule));

        let diagnostics = lint_document(
            &sample(),
            LintOptions {
                registry: Some(registry),
            },
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_error());
    }

    #[test]
    fn test_empty_document_is_clean() {
        assert!(lint_document(&sample_model(), LintOptions::default()).is_empty());
    }
}
