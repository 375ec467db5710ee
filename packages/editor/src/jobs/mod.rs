//! Concrete jobs
//!
//! Primitive jobs are [`PrimitiveJob`](crate::PrimitiveJob) instantiations
//! named after the edit they perform. Composite edits are planned into a
//! [`BatchJob`].

mod batch;
mod grid;
mod property;
mod structure;

pub use batch::{BatchBuilder, BatchJob};
pub use grid::{DeleteGridLines, InsertGridLines, MoveCellContent};
pub use property::{
    ModifyProperty, ModifyPropertyJob, RenameIdentifier, RenameIdentifierJob, Select, SelectJob,
    ToggleCustomRoot, ToggleCustomRootJob,
};
pub use structure::{
    Delete, DeleteJob, Duplicate, DuplicateJob, Insert, InsertJob, Placement, ReIndex, ReIndexJob,
    Reparent, ReparentJob,
};
