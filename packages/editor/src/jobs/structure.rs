//! Structural jobs: insert, delete, reparent, reindex, duplicate

use crate::errors::JobError;
use crate::job::{Edit, PrimitiveJob};
use crate::selection::SelectionGroup;
use stagecraft_model::{DocumentModel, Fragment, Mutation, NodeId};

/// Where an inserted or moved node lands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Top-level instance of an empty document
    Root,
    /// Position in a component property of an instance
    Collection {
        owner: NodeId,
        property: String,
        index: usize,
    },
}

impl Placement {
    pub fn collection(owner: NodeId, property: impl Into<String>, index: usize) -> Self {
        Placement::Collection {
            owner,
            property: property.into(),
            index,
        }
    }

    /// Whether a node can be placed here; `moving` is excluded from the
    /// destination's current children when it already sits there
    fn accepts(&self, model: &DocumentModel, moving: Option<NodeId>) -> bool {
        let graph = model.graph();
        match self {
            Placement::Root => graph.is_empty(),
            Placement::Collection {
                owner,
                property,
                index,
            } => {
                let Some(instance) = graph.instance(*owner) else {
                    return false;
                };
                if !graph.is_attached(*owner) || !model.catalog().is_component_property(instance.class(), property) {
                    return false;
                }
                let len = graph
                    .property_children(*owner, property)
                    .iter()
                    .filter(|child| Some(**child) != moving)
                    .count();
                *index <= len
            }
        }
    }

    /// Mutations attaching `node` here, creating the slot when absent
    fn attach(&self, model: &mut DocumentModel, node: NodeId) -> Vec<Mutation> {
        match self {
            Placement::Root => vec![Mutation::Attach {
                parent: NodeId::ROOT,
                index: 0,
                node,
            }],
            Placement::Collection {
                owner,
                property,
                index,
            } => match model.graph().slot_of(*owner, property) {
                Some(slot) => vec![Mutation::Attach {
                    parent: slot,
                    index: *index,
                    node,
                }],
                None => {
                    let slot_index = model.graph().children(*owner).len();
                    let slot = model.allocate_collection_slot(property.as_str());
                    vec![
                        Mutation::Attach {
                            parent: *owner,
                            index: slot_index,
                            node: slot,
                        },
                        Mutation::Attach {
                            parent: slot,
                            index: 0,
                            node,
                        },
                    ]
                }
            },
        }
    }
}

#[derive(Debug)]
pub struct Insert {
    placement: Placement,
    fragment: Fragment,
    node: Option<NodeId>,
}

pub type InsertJob = PrimitiveJob<Insert>;

impl InsertJob {
    pub fn new(placement: Placement, fragment: Fragment) -> Self {
        PrimitiveJob::from_edit(Insert {
            placement,
            fragment,
            node: None,
        })
    }
}

impl Insert {
    /// Node created by the first execute
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

impl Edit for Insert {
    fn is_applicable(&self, model: &DocumentModel) -> bool {
        match (&self.placement, &self.fragment) {
            (Placement::Root, Fragment::Reference { .. }) => false,
            (placement, _) => placement.accepts(model, None),
        }
    }

    fn plan(&mut self, model: &mut DocumentModel) -> Result<Vec<Mutation>, JobError> {
        let node = model.materialize(&self.fragment)?;
        self.node = Some(node);
        Ok(self.placement.attach(model, node))
    }

    fn describe(&self) -> String {
        match &self.fragment {
            Fragment::Instance(instance) => format!("Insert {}", instance.class),
            Fragment::Reference { target } => format!("Insert reference to {}", target),
        }
    }

    fn selection(&self, _model: &DocumentModel) -> SelectionGroup {
        SelectionGroup::objects(self.node)
    }
}

#[derive(Debug)]
pub struct Delete {
    node: NodeId,
    position: Option<(NodeId, usize)>,
}

pub type DeleteJob = PrimitiveJob<Delete>;

impl DeleteJob {
    /// Delete `node` from where it sits now
    pub fn new(model: &DocumentModel, node: NodeId) -> Self {
        PrimitiveJob::from_edit(Delete {
            node,
            position: model.graph().position_of(node),
        })
    }
}

impl Edit for Delete {
    fn is_applicable(&self, model: &DocumentModel) -> bool {
        self.node != NodeId::ROOT
            && self.position.is_some()
            && model.graph().position_of(self.node) == self.position
            && model.graph().is_attached(self.node)
    }

    fn plan(&mut self, _model: &mut DocumentModel) -> Result<Vec<Mutation>, JobError> {
        let (parent, index) = self
            .position
            .ok_or_else(|| JobError::NotExecutable(self.describe()))?;
        Ok(vec![Mutation::Detach { parent, index }])
    }

    fn describe(&self) -> String {
        format!("Delete {}", self.node)
    }

    fn selection(&self, _model: &DocumentModel) -> SelectionGroup {
        SelectionGroup::Empty
    }
}

#[derive(Debug)]
pub struct Reparent {
    node: NodeId,
    from: Option<(NodeId, usize)>,
    to: Placement,
}

pub type ReparentJob = PrimitiveJob<Reparent>;

impl ReparentJob {
    /// Move `node` into `owner.property` at `index`
    ///
    /// `index` addresses the destination list as it reads once `node` has
    /// left its current place.
    pub fn new(model: &DocumentModel, node: NodeId, owner: NodeId, property: impl Into<String>, index: usize) -> Self {
        PrimitiveJob::from_edit(Reparent {
            node,
            from: model.graph().position_of(node),
            to: Placement::collection(owner, property, index),
        })
    }
}

impl Edit for Reparent {
    fn is_applicable(&self, model: &DocumentModel) -> bool {
        let graph = model.graph();
        let Placement::Collection { owner, .. } = &self.to else {
            return false;
        };
        self.from.is_some()
            && graph.position_of(self.node) == self.from
            && graph.is_attached(self.node)
            && graph.parent_instance(self.node).is_some()
            && !graph.is_within(*owner, self.node)
            && self.to.accepts(model, Some(self.node))
    }

    fn plan(&mut self, model: &mut DocumentModel) -> Result<Vec<Mutation>, JobError> {
        let (parent, index) = self
            .from
            .ok_or_else(|| JobError::NotExecutable(self.describe()))?;
        let mut mutations = vec![Mutation::Detach { parent, index }];
        mutations.extend(self.to.attach(model, self.node));
        Ok(mutations)
    }

    fn describe(&self) -> String {
        match &self.to {
            Placement::Collection { owner, property, .. } => {
                format!("Move {} into {}.{}", self.node, owner, property)
            }
            Placement::Root => format!("Move {}", self.node),
        }
    }

    fn selection(&self, _model: &DocumentModel) -> SelectionGroup {
        SelectionGroup::single(self.node)
    }
}

#[derive(Debug)]
pub struct ReIndex {
    node: NodeId,
    from: Option<(NodeId, usize)>,
    index: usize,
}

pub type ReIndexJob = PrimitiveJob<ReIndex>;

impl ReIndexJob {
    /// Move `node` to `index` inside the collection holding it
    pub fn new(model: &DocumentModel, node: NodeId, index: usize) -> Self {
        PrimitiveJob::from_edit(ReIndex {
            node,
            from: model.graph().position_of(node),
            index,
        })
    }
}

impl Edit for ReIndex {
    fn is_applicable(&self, model: &DocumentModel) -> bool {
        let graph = model.graph();
        match self.from {
            Some((slot, current)) => {
                graph.position_of(self.node) == self.from
                    && graph.slot(slot).map(|s| s.is_collection()).unwrap_or(false)
                    && graph.is_attached(self.node)
                    && self.index != current
                    && self.index < graph.children(slot).len()
            }
            None => false,
        }
    }

    fn plan(&mut self, _model: &mut DocumentModel) -> Result<Vec<Mutation>, JobError> {
        let (slot, current) = self
            .from
            .ok_or_else(|| JobError::NotExecutable(self.describe()))?;
        Ok(vec![
            Mutation::Detach {
                parent: slot,
                index: current,
            },
            Mutation::Attach {
                parent: slot,
                index: self.index,
                node: self.node,
            },
        ])
    }

    fn describe(&self) -> String {
        format!("Reorder {} to position {}", self.node, self.index)
    }

    fn selection(&self, _model: &DocumentModel) -> SelectionGroup {
        SelectionGroup::single(self.node)
    }
}

#[derive(Debug)]
pub struct Duplicate {
    node: NodeId,
    position: Option<(NodeId, usize)>,
    copy: Option<NodeId>,
}

pub type DuplicateJob = PrimitiveJob<Duplicate>;

impl DuplicateJob {
    /// Insert a copy of `node`, identifiers cleared, right after it
    pub fn new(model: &DocumentModel, node: NodeId) -> Self {
        PrimitiveJob::from_edit(Duplicate {
            node,
            position: model.graph().position_of(node),
            copy: None,
        })
    }
}

impl Duplicate {
    pub fn copy(&self) -> Option<NodeId> {
        self.copy
    }
}

impl Edit for Duplicate {
    fn is_applicable(&self, model: &DocumentModel) -> bool {
        let graph = model.graph();
        self.position.is_some()
            && graph.position_of(self.node) == self.position
            && graph.instance(self.node).is_some()
            && graph.parent_instance(self.node).is_some()
            && graph.is_attached(self.node)
    }

    fn plan(&mut self, model: &mut DocumentModel) -> Result<Vec<Mutation>, JobError> {
        let (slot, index) = self
            .position
            .ok_or_else(|| JobError::NotExecutable(self.describe()))?;
        let fragment = model
            .graph()
            .extract(self.node)
            .ok_or_else(|| JobError::NotExecutable(self.describe()))?
            .without_identifiers();
        let copy = model.materialize(&fragment)?;
        self.copy = Some(copy);
        Ok(vec![Mutation::Attach {
            parent: slot,
            index: index + 1,
            node: copy,
        }])
    }

    fn describe(&self) -> String {
        format!("Duplicate {}", self.node)
    }

    fn selection(&self, _model: &DocumentModel) -> SelectionGroup {
        SelectionGroup::objects(self.copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{Job, JobState};
    use stagecraft_model::testing::{recorded, sample_model};

    fn document() -> (DocumentModel, NodeId) {
        let mut model = sample_model();
        let mut job = InsertJob::new(
            Placement::Root,
            Fragment::instance("VBox")
                .identifier("root")
                .children(
                    "children",
                    vec![
                        Fragment::instance("Label").identifier("a").build(),
                        Fragment::instance("Label").identifier("b").build(),
                    ],
                )
                .build(),
        );
        job.execute(&mut model).unwrap();
        let root = model.graph().root().unwrap();
        (model, root)
    }

    fn child(model: &DocumentModel, owner: NodeId, index: usize) -> NodeId {
        model.graph().property_children(owner, "children")[index]
    }

    #[test]
    fn test_insert_creates_missing_slot() {
        let mut model = sample_model();
        let mut root = InsertJob::new(Placement::Root, Fragment::instance("HBox").build());
        root.execute(&mut model).unwrap();
        let owner = model.graph().root().unwrap();

        let mut job = InsertJob::new(
            Placement::collection(owner, "children", 0),
            Fragment::instance("Button").build(),
        );
        assert!(job.is_executable(&model));
        job.execute(&mut model).unwrap();

        let inserted = job.edit().node().unwrap();
        assert_eq!(model.graph().property_children(owner, "children"), &[inserted]);
        assert_eq!(job.new_selection_group(), SelectionGroup::single(inserted));

        job.undo(&mut model).unwrap();
        assert!(model.graph().slot_of(owner, "children").is_none());
        assert_eq!(model.graph().parent(inserted), None);

        job.redo(&mut model).unwrap();
        assert_eq!(model.graph().property_children(owner, "children"), &[inserted]);
    }

    #[test]
    fn test_insert_refuses_scalar_property_and_bad_index() {
        let (model, root) = document();
        let scalar = InsertJob::new(
            Placement::collection(root, "spacing", 0),
            Fragment::instance("Label").build(),
        );
        let out_of_range = InsertJob::new(
            Placement::collection(root, "children", 3),
            Fragment::instance("Label").build(),
        );
        let second_root = InsertJob::new(Placement::Root, Fragment::instance("Label").build());

        assert!(!scalar.is_executable(&model));
        assert!(!out_of_range.is_executable(&model));
        assert!(!second_root.is_executable(&model));
    }

    #[test]
    fn test_delete_and_undo_restore_position() {
        let (mut model, root) = document();
        let a = child(&model, root, 0);

        let mut job = DeleteJob::new(&model, a);
        job.execute(&mut model).unwrap();
        assert_eq!(model.graph().find_by_identifier("a"), None);
        assert_eq!(recorded(model.graph(), root).unwrap().children["children"].len(), 1);

        job.undo(&mut model).unwrap();
        assert_eq!(child(&model, root, 0), a);
        assert_eq!(job.state(), JobState::Unapplied);
    }

    #[test]
    fn test_delete_is_stale_after_move() {
        let (mut model, root) = document();
        let a = child(&model, root, 0);
        let stale = DeleteJob::new(&model, a);

        let mut move_job = ReIndexJob::new(&model, a, 1);
        move_job.execute(&mut model).unwrap();

        assert!(!stale.is_executable(&model));
    }

    #[test]
    fn test_reparent_preserves_identity() {
        let (mut model, root) = document();
        let a = child(&model, root, 0);
        let b = child(&model, root, 1);
        let serial = recorded(model.graph(), a).unwrap().serial;

        let mut job = ReparentJob::new(&model, a, b, "children", 0);
        assert!(!job.is_executable(&model), "Label has no component property");

        let mut insert = InsertJob::new(
            Placement::collection(root, "children", 2),
            Fragment::instance("VBox").build(),
        );
        insert.execute(&mut model).unwrap();
        let container = insert.edit().node().unwrap();

        job = ReparentJob::new(&model, a, container, "children", 0);
        job.execute(&mut model).unwrap();
        assert_eq!(model.graph().property_children(container, "children"), &[a]);
        assert_eq!(recorded(model.graph(), a).unwrap().serial, serial);
        assert_eq!(model.graph().find_by_identifier("a"), Some(a));

        job.undo(&mut model).unwrap();
        assert_eq!(child(&model, root, 0), a);
        assert_eq!(recorded(model.graph(), a).unwrap().serial, serial);
    }

    #[test]
    fn test_reparent_refuses_cycles() {
        let (mut model, root) = document();
        let mut insert = InsertJob::new(
            Placement::collection(root, "children", 0),
            Fragment::instance("VBox")
                .children("children", vec![Fragment::instance("VBox").build()])
                .build(),
        );
        insert.execute(&mut model).unwrap();
        let outer = insert.edit().node().unwrap();
        let inner = model.graph().property_children(outer, "children")[0];

        let job = ReparentJob::new(&model, outer, inner, "children", 0);
        assert!(!job.is_executable(&model));
    }

    #[test]
    fn test_reindex_within_collection() {
        let (mut model, root) = document();
        let a = child(&model, root, 0);
        let b = child(&model, root, 1);

        let mut job = ReIndexJob::new(&model, a, 1);
        job.execute(&mut model).unwrap();
        assert_eq!(model.graph().property_children(root, "children"), &[b, a]);

        job.undo(&mut model).unwrap();
        assert_eq!(model.graph().property_children(root, "children"), &[a, b]);

        assert!(!ReIndexJob::new(&model, a, 0).is_executable(&model));
        assert!(!ReIndexJob::new(&model, a, 2).is_executable(&model));
    }

    #[test]
    fn test_duplicate_clears_identifiers() {
        let (mut model, root) = document();
        let a = child(&model, root, 0);

        let mut job = DuplicateJob::new(&model, a);
        job.execute(&mut model).unwrap();
        let copy = job.edit().copy().unwrap();

        assert_eq!(child(&model, root, 1), copy);
        assert_eq!(model.graph().instance(copy).unwrap().identifier(), None);
        assert_eq!(
            model.graph().extract(copy),
            model.graph().extract(a).map(|f| f.without_identifiers())
        );
        assert_eq!(job.new_selection_group(), SelectionGroup::single(copy));
    }
}
