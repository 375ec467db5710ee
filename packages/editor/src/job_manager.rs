//! # Job Manager
//!
//! Owns the undo and redo stacks and the selection tracker.
//!
//! ## Design
//!
//! - `push` is the only way a fresh job gets executed
//! - A job that is not executable at push time is refused and neither stack
//!   changes
//! - Each undo entry remembers the selection from right before its push;
//!   undo restores that instead of recomputing anything
//! - New jobs clear the redo stack
//! - The undo stack is bounded; the oldest entries are dropped silently
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut jobs = JobManager::new();
//!
//! jobs.push(Box::new(ModifyPropertyJob::new(&model, node, "text", "Hi")?), &mut model)?;
//! jobs.undo(&mut model)?;
//! jobs.redo(&mut model)?;
//! ```

use crate::errors::JobError;
use crate::job::Job;
use crate::selection::{SelectionGroup, SelectionTracker};
use stagecraft_model::DocumentModel;
use tracing::{debug, warn};

/// Default bound of the undo stack
pub const DEFAULT_MAX_UNDO_LEVELS: usize = 100;

/// A job on one of the stacks
#[derive(Debug)]
struct Entry {
    job: Box<dyn Job>,
    /// Selection current immediately before the original push
    selection_before: SelectionGroup,
}

#[derive(Debug)]
pub struct JobManager {
    /// Applied jobs (most recent last)
    undo_stack: Vec<Entry>,

    /// Undone jobs (most recent last)
    redo_stack: Vec<Entry>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    tracker: SelectionTracker,

    /// Bumped on every successful push, undo and redo
    revision: u64,
}

impl JobManager {
    /// Create a job manager with default max levels (100)
    pub fn new() -> Self {
        Self::with_max_levels(DEFAULT_MAX_UNDO_LEVELS)
    }

    /// Create a job manager keeping at most `max_levels` undo entries
    ///
    /// Evicting an entry drops the job but not the arena nodes it allocated;
    /// those stay in the graph until the document is cleared.
    pub fn with_max_levels(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
            tracker: SelectionTracker::new(),
            revision: 0,
        }
    }

    /// Execute `job` and record it for undo
    ///
    /// Refused without touching either stack when the job is not executable.
    /// When execution fails the job has already rolled itself back and is
    /// dropped.
    pub fn push(&mut self, mut job: Box<dyn Job>, model: &mut DocumentModel) -> Result<(), JobError> {
        if !job.is_executable(model) {
            debug!(job = %job.describe(), "refused job that is not executable");
            return Err(JobError::NotExecutable(job.describe()));
        }

        job.execute(model)?;

        let selection_before = self.tracker.current().clone();
        self.tracker.set(job.new_selection_group());
        debug!(job = %job.describe(), undo_levels = self.undo_stack.len() + 1, "pushed job");

        self.undo_stack.push(Entry { job, selection_before });
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            let evicted = self.undo_stack.remove(0);
            warn!(job = %evicted.job.describe(), max_levels = self.max_levels, "evicted oldest undo entry");
        }

        // New action invalidates the future
        self.redo_stack.clear();
        self.revision += 1;
        Ok(())
    }

    /// Undo the most recent job; `Ok(false)` when there is nothing to undo
    pub fn undo(&mut self, model: &mut DocumentModel) -> Result<bool, JobError> {
        let Some(mut entry) = self.undo_stack.pop() else {
            return Ok(false);
        };

        if let Err(err) = entry.job.undo(model) {
            self.undo_stack.push(entry);
            return Err(err);
        }

        self.tracker.set(entry.selection_before.clone());
        debug!(job = %entry.job.describe(), "undid job");
        self.redo_stack.push(entry);
        self.revision += 1;
        Ok(true)
    }

    /// Redo the most recently undone job; `Ok(false)` when there is none
    pub fn redo(&mut self, model: &mut DocumentModel) -> Result<bool, JobError> {
        let Some(mut entry) = self.redo_stack.pop() else {
            return Ok(false);
        };

        if let Err(err) = entry.job.redo(model) {
            self.redo_stack.push(entry);
            return Err(err);
        }

        self.tracker.set(entry.job.new_selection_group());
        debug!(job = %entry.job.describe(), "redid job");
        self.undo_stack.push(entry);
        self.revision += 1;
        Ok(true)
    }

    /// Drop both stacks without undoing anything
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.tracker.set(SelectionGroup::Empty);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    /// Description of the next undo operation
    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(|entry| entry.job.describe())
    }

    /// Description of the next redo operation
    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|entry| entry.job.describe())
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn selection(&self) -> &SelectionGroup {
        self.tracker.current()
    }

    pub fn tracker(&self) -> &SelectionTracker {
        &self.tracker
    }

    /// Subscription access; the current group stays read-only
    pub fn tracker_mut(&mut self) -> &mut SelectionTracker {
        &mut self.tracker
    }

    /// Move the selection without recording an undo entry
    pub(crate) fn set_selection(&mut self, group: SelectionGroup) {
        self.tracker.set(group);
    }
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}
