//! # Grid Jobs
//!
//! Row and column edits on containers the catalog describes with a
//! [`GridLayout`]. A grid has a constraint list per axis and content
//! children placed by an attached index property (`GridPane.rowIndex`).
//!
//! The number of lines along an axis is the larger of the constraint count
//! and the highest content index plus one, so content may sit on lines that
//! have no constraint yet.
//!
//! Every edit here is planned into a [`BatchJob`] up front:
//!
//! - Inserting N lines at K first extends the constraint list to the line
//!   count and inserts N constraints at K, then relocates the content of
//!   every line from the last one down to K by N. Scanning high to low keeps
//!   a moved line from landing on one that has not moved yet.
//! - Deleting N lines at K removes their content and constraints, then
//!   relocates every later line down by N, scanning low to high.
//! - Lines without content produce no relocation.

use crate::job::Job;
use crate::jobs::batch::BatchJob;
use crate::jobs::property::ModifyPropertyJob;
use crate::jobs::structure::{DeleteJob, InsertJob, Placement};
use crate::selection::SelectionGroup;
use stagecraft_model::{DocumentModel, Fragment, GridAxis, GridLayout, NodeId};
use tracing::debug;

/// Live line geometry of one grid axis
#[derive(Debug)]
struct GridLines {
    layout: GridLayout,
    constraints: Vec<NodeId>,
    /// Content children with the line they sit on, in child order
    cells: Vec<(NodeId, usize)>,
}

impl GridLines {
    fn read(model: &DocumentModel, grid: NodeId, axis: GridAxis) -> Option<Self> {
        let graph = model.graph();
        let instance = graph.instance(grid)?;
        let layout = model.catalog().grid_layout(instance.class())?;
        if !graph.is_attached(grid) {
            return None;
        }

        let constraints = graph
            .property_children(grid, layout.constraints_property(axis))
            .to_vec();
        let index_property = layout.index_property(axis);
        let cells = graph
            .property_children(grid, &layout.children)
            .iter()
            .filter_map(|child| {
                let class = graph.instance(*child)?.class();
                let line = graph
                    .property_value(*child, index_property)
                    .cloned()
                    .or_else(|| model.catalog().default_value(class, index_property))
                    .and_then(|value| value.as_integer())
                    .unwrap_or(0)
                    .max(0) as usize;
                Some((*child, line))
            })
            .collect();

        Some(Self {
            layout,
            constraints,
            cells,
        })
    }

    fn line_count(&self) -> usize {
        let content = self.cells.iter().map(|(_, line)| line + 1).max().unwrap_or(0);
        content.max(self.constraints.len())
    }

    fn content_at(&self, line: usize) -> impl Iterator<Item = NodeId> + '_ {
        self.cells
            .iter()
            .filter(move |(_, l)| *l == line)
            .map(|(child, _)| *child)
    }
}

fn lines_label(axis: GridAxis, count: usize) -> String {
    if count == 1 {
        format!("1 {}", axis)
    } else {
        format!("{} {}s", count, axis)
    }
}

/// Relocate the content of one grid line to another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCellContent {
    pub grid: NodeId,
    pub axis: GridAxis,
    pub from: usize,
    pub to: usize,
}

impl MoveCellContent {
    /// `None` when the line is empty, the move goes nowhere or `to` does not
    /// fit the index property
    pub fn plan(&self, model: &DocumentModel) -> Option<BatchJob> {
        if self.from == self.to {
            return None;
        }
        let lines = GridLines::read(model, self.grid, self.axis)?;
        let index_property = lines.layout.index_property(self.axis);
        let to = i64::try_from(self.to).ok()?;
        let content: Vec<NodeId> = lines.content_at(self.from).collect();

        let mut builder = BatchJob::builder(format!("Move {} {} to {}", self.axis, self.from, self.to));
        for child in &content {
            if let Ok(job) = ModifyPropertyJob::new(model, *child, index_property, to) {
                builder.push_if_executable(job, model);
            }
        }
        builder.selection(SelectionGroup::objects(content));
        builder.build()
    }
}

/// Insert `count` rows or columns at `at`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertGridLines {
    pub grid: NodeId,
    pub axis: GridAxis,
    pub at: usize,
    pub count: usize,
}

impl InsertGridLines {
    /// `None` when nothing would change, `at` lies past the last line or the
    /// shifted lines would overflow
    pub fn plan(&self, model: &DocumentModel) -> Option<BatchJob> {
        if self.count == 0 {
            return None;
        }
        let lines = GridLines::read(model, self.grid, self.axis)?;
        let line_count = lines.line_count();
        if self.at > line_count {
            return None;
        }
        // Every shifted line must stay addressable
        let total = line_count.checked_add(self.count)?;
        if i64::try_from(total).is_err() {
            return None;
        }

        let property = lines.layout.constraints_property(self.axis);
        let class = lines.layout.constraint_class(self.axis);
        let constraint = || Fragment::instance(class.clone()).build();

        let mut constraints = BatchJob::builder(format!("Insert {} constraints", self.axis));
        for index in lines.constraints.len()..line_count {
            constraints.push(InsertJob::new(
                Placement::collection(self.grid, property, index),
                constraint(),
            ));
        }
        for _ in 0..self.count {
            constraints.push(InsertJob::new(
                Placement::collection(self.grid, property, self.at),
                constraint(),
            ));
        }

        let mut builder = BatchJob::builder(format!(
            "Insert {} at {}",
            lines_label(self.axis, self.count),
            self.at
        ));
        builder.push_planned(constraints.build().map(|job| Box::new(job) as Box<dyn Job>));

        for line in (self.at..line_count).rev() {
            let relocation = MoveCellContent {
                grid: self.grid,
                axis: self.axis,
                from: line,
                to: line + self.count,
            };
            builder.push_planned(relocation.plan(model).map(|job| Box::new(job) as Box<dyn Job>));
        }

        builder.selection(SelectionGroup::grid_lines(self.grid, self.axis, self.at, self.count));
        debug!(grid = %self.grid, axis = %self.axis, jobs = builder.len(), "planned line insertion");
        builder.build()
    }
}

/// Delete `count` rows or columns starting at `at`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteGridLines {
    pub grid: NodeId,
    pub axis: GridAxis,
    pub at: usize,
    pub count: usize,
}

impl DeleteGridLines {
    /// `None` when nothing would change or the range runs past the last line
    pub fn plan(&self, model: &DocumentModel) -> Option<BatchJob> {
        if self.count == 0 {
            return None;
        }
        let lines = GridLines::read(model, self.grid, self.axis)?;
        let line_count = lines.line_count();
        let end = self.at.checked_add(self.count)?;
        if end > line_count {
            return None;
        }

        // Highest position first so earlier deletes never shift later ones
        let mut doomed: Vec<(usize, NodeId)> = lines
            .cells
            .iter()
            .enumerate()
            .filter(|(_, (_, line))| (self.at..end).contains(line))
            .map(|(position, (child, _))| (position, *child))
            .collect();
        doomed.sort_by(|a, b| b.0.cmp(&a.0));

        let mut content = BatchJob::builder(format!("Delete {} content", self.axis));
        for (_, child) in doomed {
            content.push_if_executable(DeleteJob::new(model, child), model);
        }

        let mut constraints = BatchJob::builder(format!("Delete {} constraints", self.axis));
        for index in (self.at..end.min(lines.constraints.len())).rev() {
            constraints.push_if_executable(DeleteJob::new(model, lines.constraints[index]), model);
        }

        let mut builder = BatchJob::builder(format!(
            "Delete {} at {}",
            lines_label(self.axis, self.count),
            self.at
        ));
        builder
            .push_planned(content.build().map(|job| Box::new(job) as Box<dyn Job>))
            .push_planned(constraints.build().map(|job| Box::new(job) as Box<dyn Job>));

        for line in end..line_count {
            let relocation = MoveCellContent {
                grid: self.grid,
                axis: self.axis,
                from: line,
                to: line - self.count,
            };
            builder.push_planned(relocation.plan(model).map(|job| Box::new(job) as Box<dyn Job>));
        }

        builder.selection(SelectionGroup::Empty);
        debug!(grid = %self.grid, axis = %self.axis, jobs = builder.len(), "planned line deletion");
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagecraft_model::testing::sample_model;

    fn grid(model: &mut DocumentModel, rows: usize, cells: &[(&str, i64)]) -> NodeId {
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
        let mut job = InsertJob::new(
            Placement::Root,
            Fragment::instance("GridPane")
                .children("rowConstraints", constraints)
                .children("children", children)
                .build(),
        );
        job.execute(model).unwrap();
        model.graph().root().unwrap()
    }

    #[test]
    fn test_line_count_covers_unconstrained_content() {
        let mut model = sample_model();
        let root = grid(&mut model, 1, &[("a", 3)]);
        let lines = GridLines::read(&model, root, GridAxis::Row).unwrap();

        assert_eq!(lines.line_count(), 4);
        assert_eq!(lines.content_at(3).count(), 1);
        assert_eq!(lines.content_at(0).count(), 0);
    }

    #[test]
    fn test_move_of_empty_line_is_pruned() {
        let mut model = sample_model();
        let root = grid(&mut model, 3, &[("a", 2)]);

        let empty = MoveCellContent {
            grid: root,
            axis: GridAxis::Row,
            from: 1,
            to: 3,
        };
        assert!(empty.plan(&model).is_none());

        let same = MoveCellContent {
            grid: root,
            axis: GridAxis::Row,
            from: 2,
            to: 2,
        };
        assert!(same.plan(&model).is_none());
    }

    #[test]
    fn test_insert_extends_short_constraint_list() {
        let mut model = sample_model();
        let root = grid(&mut model, 1, &[("a", 2)]);

        let plan = InsertGridLines {
            grid: root,
            axis: GridAxis::Row,
            at: 3,
            count: 1,
        }
        .plan(&model)
        .unwrap();

        // Only the constraint sub-batch: nothing sits at or after line 3
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.sub_jobs()[0].describe(), "Insert row constraints");
    }

    #[test]
    fn test_columns_without_layout_property_are_refused() {
        let mut model = sample_model();
        let mut job = InsertJob::new(Placement::Root, Fragment::instance("VBox").build());
        job.execute(&mut model).unwrap();
        let root = model.graph().root().unwrap();

        let plan = InsertGridLines {
            grid: root,
            axis: GridAxis::Column,
            at: 0,
            count: 1,
        }
        .plan(&model);
        assert!(plan.is_none());
    }

    #[test]
    fn test_delete_past_last_line_is_refused() {
        let mut model = sample_model();
        let root = grid(&mut model, 2, &[]);

        let plan = DeleteGridLines {
            grid: root,
            axis: GridAxis::Row,
            at: 1,
            count: 2,
        }
        .plan(&model);
        assert!(plan.is_none());
    }

    #[test]
    fn test_overflowing_line_ranges_are_refused() {
        let mut model = sample_model();
        let root = grid(&mut model, 3, &[("a", 2)]);

        let delete = DeleteGridLines {
            grid: root,
            axis: GridAxis::Row,
            at: 1,
            count: usize::MAX,
        };
        assert!(delete.plan(&model).is_none());

        let insert = InsertGridLines {
            grid: root,
            axis: GridAxis::Row,
            at: 1,
            count: usize::MAX,
        };
        assert!(insert.plan(&model).is_none());

        let relocation = MoveCellContent {
            grid: root,
            axis: GridAxis::Row,
            from: 2,
            to: usize::MAX,
        };
        assert!(relocation.plan(&model).is_none());
    }
}
