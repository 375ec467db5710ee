//! Property tests: random job sequences survive full undo and redo

mod common;

use common::{open, root};
use proptest::prelude::*;
use stagecraft_editor::{
    Document, DeleteJob, DuplicateJob, EditorError, Fragment, InsertJob, Job, JobError,
    ModifyPropertyJob, NodeId, Placement, ReIndexJob, ReparentJob, SelectionGroup,
};
use stagecraft_model::testing::{runtime_snapshot, RecordedObject};

#[derive(Debug, Clone)]
enum Op {
    Insert(usize),
    Delete(usize),
    ReIndex(usize, usize),
    SetText(usize, String),
    Duplicate(usize),
    Nest(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..8).prop_map(Op::Insert),
        (0usize..8).prop_map(Op::Delete),
        (0usize..8, 0usize..8).prop_map(|(a, b)| Op::ReIndex(a, b)),
        (0usize..8, "[a-z]{1,4}").prop_map(|(a, t)| Op::SetText(a, t)),
        (0usize..8).prop_map(Op::Duplicate),
        (0usize..8, 0usize..8).prop_map(|(a, b)| Op::Nest(a, b)),
    ]
}

type State = (Option<Fragment>, Vec<RecordedObject>, SelectionGroup);

fn state(document: &Document) -> State {
    let graph = document.model().graph();
    (
        graph.root().and_then(|root| graph.extract(root)),
        runtime_snapshot(graph),
        document.selection().clone(),
    )
}

fn pick(children: &[NodeId], seed: usize) -> Option<NodeId> {
    (!children.is_empty()).then(|| children[seed % children.len()])
}

/// Build a job for `op` against the live document
fn job_for(document: &Document, op: &Op) -> Option<Box<dyn Job>> {
    let model = document.model();
    let root = root(document);
    let children = model.graph().property_children(root, "children").to_vec();

    let job: Box<dyn Job> = match op {
        Op::Insert(at) => Box::new(InsertJob::new(
            Placement::collection(root, "children", at % (children.len() + 1)),
            Fragment::instance("Label").build(),
        )),
        Op::Delete(seed) => Box::new(DeleteJob::new(model, pick(&children, *seed)?)),
        Op::ReIndex(seed, to) => {
            Box::new(ReIndexJob::new(model, pick(&children, *seed)?, to % children.len()))
        }
        Op::SetText(seed, text) => {
            let node = pick(&children, *seed)?;
            Box::new(ModifyPropertyJob::new(model, node, "text", text.as_str()).ok()?)
        }
        Op::Duplicate(seed) => Box::new(DuplicateJob::new(model, pick(&children, *seed)?)),
        Op::Nest(seed, into) => {
            let node = pick(&children, *seed)?;
            let owner = pick(&children, *into)?;
            Box::new(ReparentJob::new(model, node, owner, "children", 0))
        }
    };
    Some(job)
}

proptest! {
    #[test]
    fn undo_redo_roundtrip(ops in prop::collection::vec(op(), 1..24)) {
        let (mut document, _) = open(
            Fragment::instance("VBox")
                .children(
                    "children",
                    vec![
                        Fragment::instance("HBox").build(),
                        Fragment::instance("Label").identifier("a").build(),
                        Fragment::instance("Label").identifier("b").build(),
                    ],
                )
                .build(),
        );

        let mut states = vec![state(&document)];
        for op in &ops {
            let Some(job) = job_for(&document, op) else {
                continue;
            };
            match document.push_boxed(job) {
                Ok(()) => states.push(state(&document)),
                Err(EditorError::Job(JobError::NotExecutable(_))) => {}
                Err(other) => prop_assert!(false, "unexpected failure: {}", other),
            }
        }

        // Walking back visits every recorded state in reverse
        for expected in states.iter().rev().skip(1) {
            prop_assert!(document.undo().unwrap());
            prop_assert_eq!(&state(&document), expected);
        }
        prop_assert!(!document.undo().unwrap());

        for expected in states.iter().skip(1) {
            prop_assert!(document.redo().unwrap());
            prop_assert_eq!(&state(&document), expected);
        }
        prop_assert!(!document.redo().unwrap());
    }
}
