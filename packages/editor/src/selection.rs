//! # Selection
//!
//! [`SelectionGroup`] is the immutable description of what is selected.
//! The [`SelectionTracker`] holds the current group and notifies observers.
//! Only the job manager moves the selection; observers can read and
//! subscribe but never write.

use serde::{Deserialize, Serialize};
use stagecraft_model::{GridAxis, NodeId};
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SelectionGroup {
    #[default]
    Empty,

    /// Set of nodes, in selection order
    Objects { nodes: Vec<NodeId> },

    /// Row or column lines within a grid container
    Grid {
        grid: NodeId,
        axis: GridAxis,
        lines: Vec<usize>,
    },
}

impl SelectionGroup {
    pub fn single(node: NodeId) -> Self {
        SelectionGroup::Objects { nodes: vec![node] }
    }

    pub fn objects(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let nodes: Vec<NodeId> = nodes.into_iter().collect();
        if nodes.is_empty() {
            SelectionGroup::Empty
        } else {
            SelectionGroup::Objects { nodes }
        }
    }

    /// Contiguous `count` lines starting at `first`
    pub fn grid_lines(grid: NodeId, axis: GridAxis, first: usize, count: usize) -> Self {
        SelectionGroup::Grid {
            grid,
            axis,
            lines: (first..first.saturating_add(count)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SelectionGroup::Empty)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        match self {
            SelectionGroup::Empty => false,
            SelectionGroup::Objects { nodes } => nodes.contains(&node),
            SelectionGroup::Grid { grid, .. } => *grid == node,
        }
    }
}

/// Handle returned by [`SelectionTracker::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&SelectionGroup) + Send>;

#[derive(Default)]
pub struct SelectionTracker {
    current: SelectionGroup,
    observers: Vec<(SubscriptionId, Observer)>,
    next_id: u64,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &SelectionGroup {
        &self.current
    }

    /// Register `observer`; it runs after every change of the current group
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&SelectionGroup) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Returns false when `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Replace the current group, notifying observers if it changed
    pub(crate) fn set(&mut self, group: SelectionGroup) {
        if group == self.current {
            return;
        }
        trace!(?group, observers = self.observers.len(), "selection changed");
        self.current = group;
        for (_, observer) in self.observers.iter_mut() {
            observer(&self.current);
        }
    }
}

impl fmt::Debug for SelectionTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionTracker")
            .field("current", &self.current)
            .field("observers", &self.observers.len())
            .finish()
    }
}
