//! Search parameters supplied per pathfinding call.

use nalgebra::Vector2;

use crate::error::{PathError, Result};

/// Tuning knobs for one grid search.
///
/// The defaults nudge both the global and the Y-axis heuristic scale
/// just above one. Scales above one are inadmissible and trade path
/// optimality for fewer node expansions; the tiny bias also breaks ties
/// between equal-cost corridors so paths hug one side instead of
/// staircasing.
///
/// # Example
///
/// ```
/// use nav_path::SearchFilter;
///
/// let filter = SearchFilter::default()
///     .with_node_budget(512)
///     .with_partial_solutions(true);
/// assert!(filter.validate().is_ok());
/// assert_eq!(filter.node_budget(), 512);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchFilter {
    /// Multiplier applied to the whole heuristic.
    heuristic_scale: f64,
    /// Per-axis weights of the Manhattan heuristic.
    axiswise_scale: Vector2<f64>,
    /// Searches stop once the best candidate estimate exceeds this.
    cost_limit: f64,
    /// Largest number of nodes a search may allocate.
    node_budget: usize,
    /// Whether a failed search may return the path to its best node.
    allow_partial: bool,
}

impl SearchFilter {
    /// Creates a filter with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heuristic_scale: 1.00001,
            axiswise_scale: Vector2::new(1.0, 1.00001),
            cost_limit: f64::INFINITY,
            node_budget: 2048,
            allow_partial: false,
        }
    }

    /// Sets the global heuristic scale.
    #[must_use]
    pub const fn with_heuristic_scale(mut self, scale: f64) -> Self {
        self.heuristic_scale = scale;
        self
    }

    /// Sets the per-axis heuristic weights.
    #[must_use]
    pub const fn with_axiswise_scale(mut self, scale: Vector2<f64>) -> Self {
        self.axiswise_scale = scale;
        self
    }

    /// Sets the cost limit.
    ///
    /// A search terminates once the cheapest open node's total estimate
    /// exceeds the limit.
    #[must_use]
    pub const fn with_cost_limit(mut self, limit: f64) -> Self {
        self.cost_limit = limit;
        self
    }

    /// Sets the node budget.
    ///
    /// A search terminates once it has allocated this many nodes.
    #[must_use]
    pub const fn with_node_budget(mut self, budget: usize) -> Self {
        self.node_budget = budget;
        self
    }

    /// Enables or disables partial solutions.
    ///
    /// When enabled, a search that cannot reach the goal returns the
    /// path to the expanded node closest to it instead of no path.
    #[must_use]
    pub const fn with_partial_solutions(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    /// Returns the global heuristic scale.
    #[must_use]
    pub const fn heuristic_scale(&self) -> f64 {
        self.heuristic_scale
    }

    /// Returns the per-axis heuristic weights.
    #[must_use]
    pub const fn axiswise_scale(&self) -> Vector2<f64> {
        self.axiswise_scale
    }

    /// Returns the cost limit.
    #[must_use]
    pub const fn cost_limit(&self) -> f64 {
        self.cost_limit
    }

    /// Returns the node budget.
    #[must_use]
    pub const fn node_budget(&self) -> usize {
        self.node_budget
    }

    /// Returns whether partial solutions are allowed.
    #[must_use]
    pub const fn allow_partial(&self) -> bool {
        self.allow_partial
    }

    /// Validates the filter.
    ///
    /// # Errors
    ///
    /// Returns the [`PathError`] describing the first invalid parameter
    /// found.
    pub fn validate(&self) -> Result<()> {
        if !self.heuristic_scale.is_finite() || self.heuristic_scale < 0.0 {
            return Err(PathError::InvalidHeuristicScale(self.heuristic_scale));
        }
        let (x, y) = (self.axiswise_scale.x, self.axiswise_scale.y);
        if !x.is_finite() || x < 0.0 || !y.is_finite() || y < 0.0 {
            return Err(PathError::InvalidAxisScale { x, y });
        }
        if self.cost_limit.is_nan() || self.cost_limit <= 0.0 {
            return Err(PathError::InvalidCostLimit(self.cost_limit));
        }
        if self.node_budget == 0 {
            return Err(PathError::InvalidNodeBudget(self.node_budget));
        }
        Ok(())
    }
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self::new()
    }
}
