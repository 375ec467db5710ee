//! # Batch Jobs
//!
//! A [`BatchJob`] is an ordered, frozen list of sub-jobs that the undo
//! stack sees as one entry.
//!
//! ## Design
//!
//! - The list is fixed by [`BatchBuilder`] when the batch is planned. Sub-job
//!   factories that yield nothing are pruned at that point.
//! - `execute` runs sub-jobs in order and checks each one right before it
//!   runs. Any failure undoes the already-applied prefix in reverse order,
//!   so the batch is all or nothing.
//! - `undo` walks the list backwards; `redo` walks it forwards.

use crate::errors::JobError;
use crate::job::{Job, JobState, Lifecycle};
use crate::selection::SelectionGroup;
use stagecraft_model::DocumentModel;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct BatchJob {
    description: String,
    jobs: Vec<Box<dyn Job>>,
    /// Overrides the last sub-job's selection when set
    selection: Option<SelectionGroup>,
    produced: SelectionGroup,
    lifecycle: Lifecycle,
}

/// Plans the sub-job list of a [`BatchJob`]
#[derive(Debug)]
pub struct BatchBuilder {
    description: String,
    jobs: Vec<Box<dyn Job>>,
    selection: Option<SelectionGroup>,
}

impl BatchBuilder {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            jobs: Vec::new(),
            selection: None,
        }
    }

    pub fn push(&mut self, job: impl Job + 'static) -> &mut Self {
        self.jobs.push(Box::new(job));
        self
    }

    /// Add the outcome of a sub-job factory; `None` is pruned
    pub fn push_planned(&mut self, job: Option<Box<dyn Job>>) -> &mut Self {
        if let Some(job) = job {
            self.jobs.push(job);
        }
        self
    }

    /// Add `job` only when it is executable against `model` right now
    pub fn push_if_executable(&mut self, job: impl Job + 'static, model: &DocumentModel) -> &mut Self {
        if job.is_executable(model) {
            self.jobs.push(Box::new(job));
        } else {
            debug!(job = %job.describe(), batch = %self.description, "pruned inapplicable sub-job");
        }
        self
    }

    /// Fix the selection the batch produces
    pub fn selection(&mut self, group: SelectionGroup) -> &mut Self {
        self.selection = Some(group);
        self
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Freeze the plan; `None` when every sub-job was pruned
    pub fn build(self) -> Option<BatchJob> {
        if self.jobs.is_empty() {
            return None;
        }
        Some(BatchJob {
            description: self.description,
            jobs: self.jobs,
            selection: self.selection,
            produced: SelectionGroup::Empty,
            lifecycle: Lifecycle::default(),
        })
    }
}

impl BatchJob {
    pub fn builder(description: impl Into<String>) -> BatchBuilder {
        BatchBuilder::new(description)
    }

    pub fn sub_jobs(&self) -> &[Box<dyn Job>] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn resolve_selection(&self) -> SelectionGroup {
        match &self.selection {
            Some(group) => group.clone(),
            None => self
                .jobs
                .last()
                .map(|job| job.new_selection_group())
                .unwrap_or_default(),
        }
    }

    /// Undo `jobs[..applied]` in reverse after a failed forward pass
    fn roll_back(&mut self, model: &mut DocumentModel, applied: usize) {
        for job in self.jobs[..applied].iter_mut().rev() {
            if let Err(err) = job.undo(model) {
                warn!(batch = %self.description, job = %job.describe(), %err, "rollback of sub-job failed");
            }
        }
    }

    /// Redo `jobs[from..]` after a failed backward pass
    fn roll_forward(&mut self, model: &mut DocumentModel, from: usize) {
        for job in self.jobs[from..].iter_mut() {
            if let Err(err) = job.redo(model) {
                warn!(batch = %self.description, job = %job.describe(), %err, "re-apply of sub-job failed");
            }
        }
    }
}

impl Job for BatchJob {
    fn is_executable(&self, model: &DocumentModel) -> bool {
        self.lifecycle.is_fresh()
            && self
                .jobs
                .first()
                .map(|job| job.is_executable(model))
                .unwrap_or(false)
    }

    fn execute(&mut self, model: &mut DocumentModel) -> Result<(), JobError> {
        self.lifecycle.begin_execute(&self.description);

        for index in 0..self.jobs.len() {
            let outcome = if self.jobs[index].is_executable(model) {
                self.jobs[index].execute(model)
            } else {
                Err(JobError::SubJobNotExecutable {
                    batch: self.description.clone(),
                    job: self.jobs[index].describe(),
                })
            };

            if let Err(err) = outcome {
                warn!(batch = %self.description, failed = index, %err, "batch failed, rolling back");
                self.roll_back(model, index);
                return Err(err);
            }
        }

        self.produced = self.resolve_selection();
        self.lifecycle.mark_applied();
        debug!(batch = %self.description, jobs = self.jobs.len(), "batch executed");
        Ok(())
    }

    fn undo(&mut self, model: &mut DocumentModel) -> Result<(), JobError> {
        self.lifecycle.begin_undo(&self.description);

        for index in (0..self.jobs.len()).rev() {
            if let Err(err) = self.jobs[index].undo(model) {
                self.roll_forward(model, index + 1);
                return Err(err);
            }
        }

        self.lifecycle.mark_unapplied();
        Ok(())
    }

    fn redo(&mut self, model: &mut DocumentModel) -> Result<(), JobError> {
        self.lifecycle.begin_redo(&self.description);

        for index in 0..self.jobs.len() {
            if let Err(err) = self.jobs[index].redo(model) {
                self.roll_back(model, index);
                return Err(err);
            }
        }

        self.lifecycle.mark_applied();
        Ok(())
    }

    fn describe(&self) -> String {
        self.description.clone()
    }

    fn new_selection_group(&self) -> SelectionGroup {
        self.produced.clone()
    }

    fn state(&self) -> JobState {
        self.lifecycle.state()
    }
}
