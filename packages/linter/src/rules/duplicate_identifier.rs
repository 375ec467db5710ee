use crate::diagnostic::Diagnostic;
use crate::rules::LintRule;
use stagecraft_model::DocumentModel;

/// Identifiers must be unique across the attached document
pub struct DuplicateIdentifierRule;

impl LintRule for DuplicateIdentifierRule {
    fn name(&self) -> &'static str {
        "duplicate-identifier"
    }

    fn description(&self) -> &'static str {
        "Disallow two instances declaring the same identifier"
    }

    fn check_document(&self, model: &DocumentModel) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (identifier, nodes) in model.graph().identifiers() {
            // The first declaration wins; every later one is reported
            for node in nodes.iter().skip(1) {
                diagnostics.push(
                    Diagnostic::error(
                        self.name(),
                        format!(
                            "Identifier '{}' is already declared by {}",
                            identifier, nodes[0]
                        ),
                        *node,
                    )
                    .with_suggestion("Rename or clear one of the identifiers"),
                );
            }
        }

        diagnostics.sort_by_key(|d| d.node);
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagecraft_model::testing::sample_model;
    use stagecraft_model::{Fragment, Mutation, NodeId};

    #[test]
    fn test_reports_each_extra_declaration() {
        let mut model = sample_model();
        let root = model
            .materialize(
                &Fragment::instance("VBox")
                    .children(
                        "children",
                        vec![
                            Fragment::instance("Label").identifier("x").build(),
                            Fragment::instance("Label").identifier("x").build(),
                            Fragment::instance("Label").identifier("x").build(),
                            Fragment::instance("Label").identifier("y").build(),
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

        let diagnostics = DuplicateIdentifierRule.check_document(&model);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().all(|d| d.rule == "duplicate-identifier"));
    }

    #[test]
    fn test_detached_nodes_are_ignored() {
        let mut model = sample_model();
        model
            .materialize(&Fragment::instance("Label").identifier("x").build())
            .unwrap();
        model
            .materialize(&Fragment::instance("Label").identifier("x").build())
            .unwrap();

        assert!(DuplicateIdentifierRule.check_document(&model).is_empty());
    }
}
