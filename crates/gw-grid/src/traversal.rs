//! Cell-by-cell traversal of a world-space segment.
//!
//! Implements the Amanatides & Woo grid walk for a bounded 2D segment.
//! The traversal tracks the parametric distance to the next cell boundary
//! on each axis and always crosses the nearer one, so every cell the
//! segment passes through is visited exactly once, in order.

use nalgebra::Point2;

use crate::{CellLayout, GridCoord};

/// Axis of a 2D grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridAxis {
    /// The X axis.
    X,
    /// The Y axis.
    Y,
}

impl GridAxis {
    /// Index of the axis: 0 for X, 1 for Y.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
        }
    }
}

/// One step of a [`GridTraversal`]: the cell entered, the boundary axis
/// crossed to enter it, and the segment parameter at the crossing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraversalStep {
    /// The cell the segment entered.
    pub coord: GridCoord,
    /// The axis whose cell boundary was crossed.
    pub axis: GridAxis,
    /// Segment parameter of the crossing, in `[0, 1]` (0 at the segment
    /// start, 1 at its end).
    pub entry_t: f64,
}

/// An iterator over the cells a 2D segment passes through.
///
/// The start cell is *not* yielded; iteration begins with the first cell
/// entered after the start and ends with the cell containing the segment
/// end. Callers that care about the start cell check it themselves.
///
/// # Example
///
/// ```
/// use gw_grid::{CellLayout, GridCoord, GridTraversal};
/// use nalgebra::Point2;
///
/// let layout = CellLayout::new(1.0);
/// let steps: Vec<_> = GridTraversal::new(
///     Point2::new(0.5, 0.5),
///     Point2::new(2.5, 0.5),
///     layout,
/// )
/// .map(|step| step.coord)
/// .collect();
/// assert_eq!(steps, vec![GridCoord::new(1, 0), GridCoord::new(2, 0)]);
/// ```
#[derive(Debug, Clone)]
pub struct GridTraversal {
    current: GridCoord,
    end: GridCoord,
    step: [i32; 2],
    side_dist: [f64; 2],
    delta_dist: [f64; 2],
}

impl GridTraversal {
    /// Creates a traversal of the segment from `start` to `end`.
    #[must_use]
    pub fn new(start: Point2<f32>, end: Point2<f32>, layout: CellLayout) -> Self {
        let start_cell = layout.coord_of(start);
        let end_cell = layout.coord_of(end);
        let cell_size = f64::from(layout.cell_size());

        let direction = [
            f64::from(end.x) - f64::from(start.x),
            f64::from(end.y) - f64::from(start.y),
        ];
        let position = [f64::from(start.x), f64::from(start.y)];
        let cell = [start_cell.x, start_cell.y];

        let mut step = [0i32; 2];
        let mut side_dist = [f64::INFINITY; 2];
        let mut delta_dist = [f64::INFINITY; 2];

        for axis in 0..2 {
            if direction[axis].abs() <= f64::EPSILON {
                continue;
            }
            let inv = 1.0 / direction[axis].abs();
            delta_dist[axis] = cell_size * inv;
            if direction[axis] < 0.0 {
                step[axis] = -1;
                side_dist[axis] = (position[axis] - f64::from(cell[axis]) * cell_size) * inv;
            } else {
                step[axis] = 1;
                side_dist[axis] = ((f64::from(cell[axis]) + 1.0) * cell_size - position[axis]) * inv;
            }
        }

        Self {
            current: start_cell,
            end: end_cell,
            step,
            side_dist,
            delta_dist,
        }
    }

    /// The cell containing the segment end.
    #[must_use]
    pub const fn end_cell(&self) -> GridCoord {
        self.end
    }
}

impl Iterator for GridTraversal {
    type Item = TraversalStep;

    fn next(&mut self) -> Option<TraversalStep> {
        if self.current == self.end {
            return None;
        }

        let axis = if self.side_dist[0] < self.side_dist[1] {
            GridAxis::X
        } else {
            GridAxis::Y
        };
        let index = axis.index();
        let entry_t = self.side_dist[index];

        // A crossing past the segment end without reaching the end cell
        // only happens when the end sits exactly on a cell boundary;
        // the remaining cells are behind the segment.
        if entry_t > 1.0 {
            self.current = self.end;
            return None;
        }

        match axis {
            GridAxis::X => self.current.x += self.step[0],
            GridAxis::Y => self.current.y += self.step[1],
        }
        self.side_dist[index] += self.delta_dist[index];

        Some(TraversalStep {
            coord: self.current,
            axis,
            entry_t,
        })
    }
}
