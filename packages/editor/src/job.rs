//! # Jobs
//!
//! A job wraps one semantic edit and moves through a small state machine:
//!
//! ```text
//! Unapplied --execute--> Applied --undo--> Unapplied --redo--> Applied ...
//! ```
//!
//! `execute` runs once per job. It derives the edit from live state and
//! caches everything it computed, so `undo` and `redo` only replay cached
//! mutations and never plan again.
//!
//! Misusing the state machine (executing twice, undoing an unapplied job,
//! redoing a job that never ran) is a contract violation and panics.

use crate::errors::JobError;
use crate::selection::SelectionGroup;
use stagecraft_model::{DocumentModel, Mutation};
use std::fmt;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Unapplied,
    Applied,
}

/// Undoable edit
pub trait Job: fmt::Debug + Send {
    /// Whether preconditions hold on the live document; no side effects
    fn is_executable(&self, model: &DocumentModel) -> bool;

    fn execute(&mut self, model: &mut DocumentModel) -> Result<(), JobError>;

    fn undo(&mut self, model: &mut DocumentModel) -> Result<(), JobError>;

    fn redo(&mut self, model: &mut DocumentModel) -> Result<(), JobError>;

    /// Label for the undo menu
    fn describe(&self) -> String;

    /// Selection produced by the last execute or redo
    fn new_selection_group(&self) -> SelectionGroup;

    fn state(&self) -> JobState;
}

/// Execute/undo/redo bookkeeping shared by every job
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    state: JobState,
    executed: bool,
}

impl Lifecycle {
    pub fn state(&self) -> JobState {
        self.state
    }

    /// True until the first successful execute
    pub fn is_fresh(&self) -> bool {
        !self.executed
    }

    pub fn begin_execute(&self, job: &str) {
        assert!(
            self.state == JobState::Unapplied,
            "contract violation: '{}' executed twice without undo",
            job
        );
        assert!(
            !self.executed,
            "contract violation: '{}' was already executed; use redo",
            job
        );
    }

    pub fn begin_undo(&self, job: &str) {
        assert!(
            self.state == JobState::Applied,
            "contract violation: undo of '{}' which is not applied",
            job
        );
    }

    pub fn begin_redo(&self, job: &str) {
        assert!(
            self.state == JobState::Unapplied && self.executed,
            "contract violation: redo of '{}' which is applied or never executed",
            job
        );
    }

    pub fn mark_applied(&mut self) {
        self.state = JobState::Applied;
        self.executed = true;
    }

    pub fn mark_unapplied(&mut self) {
        self.state = JobState::Unapplied;
    }
}

/// Planning half of a primitive job
///
/// An edit inspects live state and turns into primitive mutations. It may
/// allocate detached nodes while planning; those become orphans if the
/// mutations are never applied.
pub trait Edit: fmt::Debug + Send {
    /// Whether the edit still makes sense on the live document
    fn is_applicable(&self, model: &DocumentModel) -> bool;

    fn plan(&mut self, model: &mut DocumentModel) -> Result<Vec<Mutation>, JobError>;

    fn describe(&self) -> String;

    /// Selection once the planned mutations are applied
    fn selection(&self, model: &DocumentModel) -> SelectionGroup;
}

/// Job applying the mutations planned by one [`Edit`]
#[derive(Debug)]
pub struct PrimitiveJob<E> {
    edit: E,
    lifecycle: Lifecycle,
    forward: Vec<Mutation>,
    inverses: Vec<Mutation>,
    selection: SelectionGroup,
}

impl<E: Edit> PrimitiveJob<E> {
    pub fn from_edit(edit: E) -> Self {
        Self {
            edit,
            lifecycle: Lifecycle::default(),
            forward: Vec::new(),
            inverses: Vec::new(),
            selection: SelectionGroup::Empty,
        }
    }

    pub fn edit(&self) -> &E {
        &self.edit
    }

    /// Mutations applied by the last execute or redo
    pub fn mutations(&self) -> &[Mutation] {
        &self.forward
    }
}

impl<E: Edit> Job for PrimitiveJob<E> {
    fn is_executable(&self, model: &DocumentModel) -> bool {
        self.lifecycle.is_fresh() && self.edit.is_applicable(model)
    }

    fn execute(&mut self, model: &mut DocumentModel) -> Result<(), JobError> {
        self.lifecycle.begin_execute(&self.edit.describe());
        let forward = self.edit.plan(model)?;
        let inverses = model.apply_all(&forward)?;
        trace!(job = %self.edit.describe(), mutations = forward.len(), "executed");

        self.forward = forward;
        self.inverses = inverses;
        self.selection = self.edit.selection(model);
        self.lifecycle.mark_applied();
        Ok(())
    }

    fn undo(&mut self, model: &mut DocumentModel) -> Result<(), JobError> {
        self.lifecycle.begin_undo(&self.edit.describe());
        model.revert(&self.inverses)?;
        self.lifecycle.mark_unapplied();
        Ok(())
    }

    fn redo(&mut self, model: &mut DocumentModel) -> Result<(), JobError> {
        self.lifecycle.begin_redo(&self.edit.describe());
        self.inverses = model.apply_all(&self.forward)?;
        self.lifecycle.mark_applied();
        Ok(())
    }

    fn describe(&self) -> String {
        self.edit.describe()
    }

    fn new_selection_group(&self) -> SelectionGroup {
        self.selection.clone()
    }

    fn state(&self) -> JobState {
        self.lifecycle.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let mut lifecycle = Lifecycle::default();
        assert!(lifecycle.is_fresh());

        lifecycle.begin_execute("edit");
        lifecycle.mark_applied();
        assert_eq!(lifecycle.state(), JobState::Applied);

        lifecycle.begin_undo("edit");
        lifecycle.mark_unapplied();
        lifecycle.begin_redo("edit");
        lifecycle.mark_applied();
        assert!(!lifecycle.is_fresh());
    }

    #[test]
    #[should_panic(expected = "executed twice")]
    fn test_double_execute_panics() {
        let mut lifecycle = Lifecycle::default();
        lifecycle.mark_applied();
        lifecycle.begin_execute("edit");
    }

    #[test]
    #[should_panic(expected = "not applied")]
    fn test_undo_of_unapplied_panics() {
        Lifecycle::default().begin_undo("edit");
    }

    #[test]
    #[should_panic(expected = "never executed")]
    fn test_redo_before_execute_panics() {
        Lifecycle::default().begin_redo("edit");
    }
}
