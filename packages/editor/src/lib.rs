//! # Stagecraft Editor
//!
//! Undoable editing of a Stagecraft document.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Document: model + job history + config      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ JobManager                                  │
//! │  - Bounded undo / redo stacks               │
//! │  - Selection restore on undo                │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ Jobs: primitive edits and frozen batches    │
//! │  plan once, then replay cached mutations    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ stagecraft-model: Mutation → DocumentModel  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Plan once**: a job derives its mutations from live state on
//!    `execute` only; `undo` and `redo` replay what was cached
//! 2. **All or nothing**: a failing job or batch leaves the document as it
//!    found it
//! 3. **History is the only path**: every edit a user can undo was pushed
//!    through the [`JobManager`]
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stagecraft_editor::{Document, EditorConfig, ModifyPropertyJob};
//!
//! let mut doc = Document::open(catalog, factory, EditorConfig::default(), &fragment)?;
//! let root = doc.model().graph().root().unwrap();
//!
//! let job = ModifyPropertyJob::new(doc.model(), root, "text", "Click me!")?;
//! doc.push(job)?;
//!
//! doc.undo()?;
//! doc.redo()?;
//! ```

mod config;
mod document;
mod errors;
mod job;
mod job_manager;
pub mod jobs;
mod selection;

pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use document::Document;
pub use errors::{EditorError, JobError};
pub use job::{Edit, Job, JobState, Lifecycle, PrimitiveJob};
pub use job_manager::{JobManager, DEFAULT_MAX_UNDO_LEVELS};
pub use jobs::{
    BatchBuilder, BatchJob, DeleteGridLines, DeleteJob, DuplicateJob, InsertGridLines, InsertJob,
    ModifyPropertyJob, MoveCellContent, Placement, ReIndexJob, RenameIdentifierJob, ReparentJob,
    SelectJob, ToggleCustomRootJob,
};
pub use selection::{SelectionGroup, SelectionTracker, SubscriptionId};

// Re-export common types for convenience
pub use stagecraft_linter::Diagnostic;
pub use stagecraft_model::{DocumentModel, Fragment, GridAxis, NodeId, Value};
