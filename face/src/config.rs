/// Tunables for [`crate::builder::build_faces`].
#[derive(Debug, Clone, Copy)]
pub struct FaceConfig {
    /// Target maximum vertices per output face. 0 means unbounded.
    /// Spec.md §9's open question picks 64 as the default to match the
    /// two downstream systems (vis portals, lightmap UV bounds) that
    /// assume it.
    pub max_edges: usize,
    pub on_epsilon: f32,
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self { max_edges: 64, on_epsilon: geom::ON_EPSILON }
    }
}
