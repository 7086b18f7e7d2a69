/// Tunables for [`crate::flow::portal_flow`] (spec.md §4.7).
#[derive(Debug, Clone, Copy)]
pub struct VisConfig {
    /// How many of the four `ClipToSeperators` passes to run. 0 disables
    /// separator refinement entirely (BasePortalVis-only accuracy); 4
    /// runs the full source/pass/target ordering set.
    pub test_level: usize,
    /// Per-stack-frame cap on generated separator planes before
    /// [`crate::error::VisError::TooManySeparators`] is raised.
    pub max_separators: usize,
    pub on_epsilon: f32,
}

impl Default for VisConfig {
    fn default() -> Self {
        Self { test_level: 4, max_separators: 64, on_epsilon: geom::ON_EPSILON }
    }
}
