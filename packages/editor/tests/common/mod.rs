//! Shared fixtures for editor integration tests

#![allow(dead_code)]

use stagecraft_editor::{Document, EditorConfig, Fragment, NodeId};
use stagecraft_model::testing::{sample_catalog, RecordingFactory};
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Route `tracing` output to the test harness; filter with `RUST_LOG`
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Open `fragment` as a document, handing back the factory for failure injection
pub fn open(fragment: Fragment) -> (Document, Arc<RecordingFactory>) {
    open_with(fragment, EditorConfig::default())
}

pub fn open_with(fragment: Fragment, config: EditorConfig) -> (Document, Arc<RecordingFactory>) {
    init_tracing();
    let factory = Arc::new(RecordingFactory::new());
    let document = Document::open(Arc::new(sample_catalog()), factory.clone(), config, &fragment)
        .expect("fixture document should open");
    (document, factory)
}

pub fn root(document: &Document) -> NodeId {
    document.model().graph().root().expect("document has a root")
}

/// Child `index` of the `children` collection of `owner`
pub fn child(document: &Document, owner: NodeId, index: usize) -> NodeId {
    document.model().graph().property_children(owner, "children")[index]
}

/// Grid with `rows` row constraints and one identified label per `(id, row)`
pub fn grid(rows: usize, cells: &[(&str, i64)]) -> Fragment {
    let constraints = (0..rows)
        .map(|_| Fragment::instance("RowConstraints").build())
        .collect();
    let children = cells
        .iter()
        .map(|(id, row)| {
            Fragment::instance("Label")
                .identifier(*id)
                .property("GridPane.rowIndex", *row)
                .build()
        })
        .collect();
    Fragment::instance("GridPane")
        .children("rowConstraints", constraints)
        .children("children", children)
        .build()
}
