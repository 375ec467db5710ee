//! # Document Handle
//!
//! Core document abstraction for Stagecraft editing.
//!
//! A Document bundles one [`DocumentModel`] with its job history and
//! selection. Every edit a user makes goes through [`Document::push`];
//! undo and redo go through the job manager, never around it.
//!
//! ## Lifecycle
//!
//! ```text
//! Open → Push / Undo / Redo → Validate → Close
//!   ↓           ↓                ↓         ↓
//! Fragment   Mutations      Diagnostics  Empty
//! ```

use crate::config::EditorConfig;
use crate::errors::{EditorError, JobError};
use crate::job::Job;
use crate::job_manager::JobManager;
use crate::jobs::SelectJob;
use crate::selection::SelectionGroup;
use stagecraft_linter::{lint_document, Diagnostic, LintOptions};
use stagecraft_model::{DocumentModel, Fragment, Mutation, NodeId, ObjectFactory, PropertyCatalog};
use std::sync::Arc;
use tracing::{debug, info};

/// Editable document
#[derive(Debug)]
pub struct Document {
    /// Current version number (increments on each successful edit)
    pub version: u64,

    model: DocumentModel,
    jobs: JobManager,
    config: EditorConfig,

    /// Findings of the last validation pass
    diagnostics: Vec<Diagnostic>,
}

impl Document {
    /// Create an empty document
    pub fn new(
        catalog: Arc<dyn PropertyCatalog>,
        factory: Arc<dyn ObjectFactory>,
        config: EditorConfig,
    ) -> Self {
        Self::from_model(DocumentModel::new(catalog, factory), config)
    }

    /// Wrap an existing model; its current content is not undoable
    pub fn from_model(model: DocumentModel, config: EditorConfig) -> Self {
        Self {
            version: 0,
            jobs: JobManager::with_max_levels(config.max_undo_levels),
            model,
            config,
            diagnostics: Vec::new(),
        }
    }

    /// Create a document whose root is built from `fragment`
    ///
    /// Loading is not an edit, so nothing lands on the undo stack.
    pub fn open(
        catalog: Arc<dyn PropertyCatalog>,
        factory: Arc<dyn ObjectFactory>,
        config: EditorConfig,
        fragment: &Fragment,
    ) -> Result<Self, EditorError> {
        if let Fragment::Reference { target } = fragment {
            return Err(JobError::NotExecutable(format!("Open reference to {} as root", target)).into());
        }
        let mut document = Self::new(catalog, factory, config);
        let root = document.model.materialize(fragment)?;
        document.model.apply(&Mutation::Attach {
            parent: NodeId::ROOT,
            index: 0,
            node: root,
        })?;

        info!(nodes = document.model.graph().node_count(), "opened document");
        Ok(document)
    }

    pub fn model(&self) -> &DocumentModel {
        &self.model
    }

    pub fn jobs(&self) -> &JobManager {
        &self.jobs
    }

    /// Subscription access to the selection tracker
    pub fn jobs_mut(&mut self) -> &mut JobManager {
        &mut self.jobs
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn selection(&self) -> &SelectionGroup {
        self.jobs.selection()
    }

    /// Findings of the last validation pass
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Execute a job and record it for undo
    pub fn push(&mut self, job: impl Job + 'static) -> Result<(), EditorError> {
        self.push_boxed(Box::new(job))
    }

    pub fn push_boxed(&mut self, job: Box<dyn Job>) -> Result<(), EditorError> {
        self.jobs.push(job, &mut self.model)?;
        self.edited();
        Ok(())
    }

    /// Undo the most recent job; `Ok(false)` when there is nothing to undo
    pub fn undo(&mut self) -> Result<bool, EditorError> {
        let undone = self.jobs.undo(&mut self.model)?;
        if undone {
            self.edited();
        }
        Ok(undone)
    }

    /// Redo the most recently undone job; `Ok(false)` when there is none
    pub fn redo(&mut self) -> Result<bool, EditorError> {
        let redone = self.jobs.redo(&mut self.model)?;
        if redone {
            self.edited();
        }
        Ok(redone)
    }

    /// Change the selection
    ///
    /// Selection changes skip the undo stack unless the config asks for
    /// them to be recorded.
    pub fn select(&mut self, group: SelectionGroup) -> Result<(), EditorError> {
        if self.config.record_selection_jobs {
            return self.push(SelectJob::new(group));
        }
        self.jobs.set_selection(group);
        Ok(())
    }

    /// Run the linter over the attached document
    pub fn validate(&mut self) -> &[Diagnostic] {
        self.diagnostics = lint_document(&self.model, LintOptions::default());
        info!(
            version = self.version,
            diagnostics = self.diagnostics.len(),
            "validated document"
        );
        &self.diagnostics
    }

    /// Drop history, selection and content
    pub fn close(&mut self) {
        self.jobs.clear();
        self.model.clear();
        self.diagnostics.clear();
        self.version += 1;
        info!("closed document");
    }

    fn edited(&mut self) {
        self.version += 1;
        debug!(version = self.version, "document edited");
        if self.config.validate_after_edit {
            self.validate();
        }
    }
}
