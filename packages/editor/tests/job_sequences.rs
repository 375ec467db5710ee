//! Tests for job sequences pushed through a document
//!
//! This tests:
//! - Move + rename + delete chains
//! - Undo/redo restoring structure, runtime state and selection
//! - Batch atomicity
//! - Validation of references across edits

mod common;

use common::{child, open, open_with, root};
use stagecraft_editor::{
    BatchJob, DeleteJob, Document, DuplicateJob, EditorConfig, EditorError, Fragment, InsertJob,
    Job, JobError, ModifyPropertyJob, NodeId, Placement, ReIndexJob, RenameIdentifierJob,
    ReparentJob, SelectionGroup, Value,
};
use stagecraft_model::testing::{recorded, runtime_snapshot};
use std::sync::{Arc, Mutex};

/// VBox "root" holding an HBox "row" and Labels "title" and "body"
fn layout() -> Fragment {
    Fragment::instance("VBox")
        .identifier("root")
        .children(
            "children",
            vec![
                Fragment::instance("HBox").identifier("row").build(),
                Fragment::instance("Label")
                    .identifier("title")
                    .property("text", "Title")
                    .build(),
                Fragment::instance("Label").identifier("body").build(),
            ],
        )
        .build()
}

fn find(document: &Document, identifier: &str) -> NodeId {
    document
        .model()
        .graph()
        .find_by_identifier(identifier)
        .unwrap()
}

#[test]
fn test_reparent_preserves_identity_and_undo_restores_position() {
    let (mut document, _) = open(layout());
    let root = root(&document);
    let row = find(&document, "row");
    let title = find(&document, "title");
    let serial = recorded(document.model().graph(), title).unwrap().serial;

    let job = ReparentJob::new(document.model(), title, row, "children", 0);
    document.push(job).unwrap();

    let graph = document.model().graph();
    assert_eq!(graph.parent_instance(title), Some(row));
    assert_eq!(graph.find_by_identifier("title"), Some(title));
    assert_eq!(recorded(graph, title).unwrap().serial, serial);
    assert_eq!(
        recorded(graph, row).unwrap().children["children"],
        vec![serial]
    );

    document.undo().unwrap();
    let graph = document.model().graph();
    assert_eq!(graph.parent_instance(title), Some(root));
    assert_eq!(child(&document, root, 1), title);
    assert!(!recorded(graph, row).unwrap().children.contains_key("children"));
}

#[test]
fn test_dangling_reference_reported_until_undo() {
    let fragment = Fragment::instance("VBox")
        .children(
            "children",
            vec![
                Fragment::instance("Label").identifier("target").build(),
                Fragment::reference("target"),
            ],
        )
        .build();
    let (mut document, _) = open(fragment);
    assert!(document.validate().is_empty());

    let target = find(&document, "target");
    let job = DeleteJob::new(document.model(), target);
    document.push(job).unwrap();

    let diagnostics = document.validate().to_vec();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].rule, "unresolved-reference");
    assert!(diagnostics[0].is_error());

    document.undo().unwrap();
    assert!(document.validate().is_empty());
}

#[test]
fn test_batch_failure_leaves_document_untouched() {
    let (mut document, factory) = open(layout());
    let root = root(&document);
    let title = find(&document, "title");
    let body = find(&document, "body");
    let before = document.model().graph().extract(root);
    let snapshot = runtime_snapshot(document.model().graph());

    let mut builder = BatchJob::builder("Restyle");
    builder
        .push(ModifyPropertyJob::new(document.model(), title, "text", "A").unwrap())
        .push(ModifyPropertyJob::new(document.model(), body, "text", "B").unwrap())
        .push(ModifyPropertyJob::new(document.model(), root, "spacing", 8.0).unwrap());
    let batch = builder.build().unwrap();

    factory.fail_on_value("spacing", Value::Number(8.0));
    let result = document.push(batch);

    assert!(matches!(result, Err(EditorError::Job(JobError::Mutation(_)))));
    assert_eq!(document.model().graph().extract(root), before);
    assert_eq!(runtime_snapshot(document.model().graph()), snapshot);
    assert!(!document.jobs().can_undo());
    assert_eq!(document.version, 0);
}

#[test]
fn test_failed_materialization_leaves_no_trace() {
    let (mut document, factory) = open(layout());
    let root = root(&document);
    let before = document.model().graph().extract(root);
    let nodes = document.model().graph().node_count();

    factory.fail_on_class("Button");
    let job = InsertJob::new(
        Placement::collection(root, "children", 0),
        Fragment::instance("HBox")
            .children("children", vec![Fragment::instance("Button").build()])
            .build(),
    );
    let result = document.push(job);

    assert!(result.is_err());
    assert_eq!(document.model().graph().extract(root), before);
    assert_eq!(document.model().graph().node_count(), nodes);
}

#[test]
fn test_selection_restored_through_undo_chain() {
    let (mut document, _) = open(layout());
    let title = find(&document, "title");
    let body = find(&document, "body");

    document.select(SelectionGroup::single(body)).unwrap();

    let job = ModifyPropertyJob::new(document.model(), title, "text", "Renamed").unwrap();
    document.push(job).unwrap();
    assert_eq!(document.selection(), &SelectionGroup::single(title));

    let job = DeleteJob::new(document.model(), title);
    document.push(job).unwrap();
    assert!(document.selection().is_empty());

    document.undo().unwrap();
    assert_eq!(document.selection(), &SelectionGroup::single(title));

    document.undo().unwrap();
    assert_eq!(document.selection(), &SelectionGroup::single(body));
}

#[test]
fn test_selection_observers_follow_history() {
    let (mut document, _) = open(layout());
    let title = find(&document, "title");
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = seen.clone();
    document
        .jobs_mut()
        .tracker_mut()
        .subscribe(move |group| sink.lock().unwrap().push(group.clone()));

    let job = RenameIdentifierJob::new(title, Some("heading".to_string()));
    document.push(job).unwrap();
    document.undo().unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![SelectionGroup::single(title), SelectionGroup::Empty]
    );
}

#[test]
fn test_duplicate_redo_reuses_the_same_copy() {
    let (mut document, _) = open(layout());
    let root = root(&document);
    let title = find(&document, "title");

    let job = DuplicateJob::new(document.model(), title);
    document.push(job).unwrap();
    let copy = child(&document, root, 2);
    let selection = document.selection().clone();
    let after = document.model().graph().extract(root);

    assert_eq!(selection, SelectionGroup::single(copy));
    assert_eq!(document.model().graph().instance(copy).unwrap().identifier(), None);
    assert_eq!(
        document.model().graph().property_value(copy, "text"),
        Some(&Value::from("Title"))
    );

    document.undo().unwrap();
    assert_eq!(document.model().graph().property_children(root, "children").len(), 3);

    document.redo().unwrap();
    assert_eq!(child(&document, root, 2), copy);
    assert_eq!(document.selection(), &selection);
    assert_eq!(document.model().graph().extract(root), after);
}

#[test]
fn test_move_rename_delete_chain() {
    let (mut document, _) = open(layout());
    let root = root(&document);
    let original = document.model().graph().extract(root);
    let snapshot = runtime_snapshot(document.model().graph());
    let row = find(&document, "row");
    let title = find(&document, "title");
    let body = find(&document, "body");

    let job = ReIndexJob::new(document.model(), body, 0);
    document.push(job).unwrap();
    let job = ReparentJob::new(document.model(), title, row, "children", 0);
    document.push(job).unwrap();
    let job = RenameIdentifierJob::new(title, Some("caption".to_string()));
    document.push(job).unwrap();
    let job = DeleteJob::new(document.model(), row);
    document.push(job).unwrap();

    // Row went with its subtree
    assert!(document.model().graph().find_by_identifier("caption").is_none());
    assert_eq!(
        document.model().graph().property_children(root, "children"),
        &[body]
    );

    while document.undo().unwrap() {}
    assert_eq!(document.model().graph().extract(root), original);
    assert_eq!(runtime_snapshot(document.model().graph()), snapshot);

    while document.redo().unwrap() {}
    assert_eq!(
        document.model().graph().property_children(root, "children"),
        &[body]
    );
    assert_eq!(document.version, 12);
}

#[test]
fn test_stale_job_is_refused() {
    let (mut document, _) = open(layout());
    let title = find(&document, "title");
    let body = find(&document, "body");

    // Built before an earlier sibling moves, so its captured position is stale
    let stale = DeleteJob::new(document.model(), title);
    let job = ReIndexJob::new(document.model(), body, 0);
    document.push(job).unwrap();

    assert!(!stale.is_executable(document.model()));
    let result = document.push(stale);
    assert!(matches!(result, Err(EditorError::Job(JobError::NotExecutable(_)))));
    assert_eq!(document.jobs().undo_levels(), 1);
}

#[test]
fn test_configured_undo_levels_bound_history() {
    let config = EditorConfig {
        max_undo_levels: 3,
        ..EditorConfig::default()
    };
    let (mut document, _) = open_with(layout(), config);
    let title = find(&document, "title");

    for i in 0..5 {
        let job = ModifyPropertyJob::new(document.model(), title, "opacity", i as f64 / 10.0).unwrap();
        document.push(job).unwrap();
    }
    assert_eq!(document.jobs().undo_levels(), 3);

    while document.undo().unwrap() {}
    // The two oldest edits are out of reach
    assert_eq!(
        document.model().graph().property_value(title, "opacity"),
        Some(&Value::Number(0.1))
    );
}

#[test]
#[should_panic(expected = "contract violation")]
fn test_undo_of_never_executed_job_panics() {
    let (document, _) = open(layout());
    let title = find(&document, "title");
    let mut job = ModifyPropertyJob::new(document.model(), title, "text", "x").unwrap();

    // Built but never pushed, so there is nothing to undo
    let mut model = stagecraft_model::testing::sample_model();
    let _ = job.undo(&mut model);
}
