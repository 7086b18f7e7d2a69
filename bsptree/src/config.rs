/// Tunables for [`crate::builder::partition`], matching the `-maxnodesize`
/// and implicit `midsplit_fraction` knobs spec.md §4.4 describes.
#[derive(Debug, Clone, Copy)]
pub struct TreeConfig {
    /// Fraction of the total map side count above which a partition
    /// switches to the "fast midsplit" heuristic. Spec.md §4.4 default
    /// is 0 (disabled; only the legacy `max_node_size` bound applies).
    pub midsplit_fraction: f32,
    /// Legacy bound: any bounds axis larger than this forces midsplit
    /// regardless of `midsplit_fraction`.
    pub max_node_size: f32,
    pub on_epsilon: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            midsplit_fraction: 0.0,
            max_node_size: 1024.0,
            on_epsilon: geom::ON_EPSILON,
        }
    }
}
