/// Errors from [`crate::builder::build_faces`] (spec.md §4.6, §7).
#[derive(Debug, thiserror::Error)]
pub enum FaceError {
    /// A polygon's edge count exceeded `max_edges` after T-junction
    /// repair and no valid fan/ear-clip split could be produced for it.
    #[error("face on plane {plane_id} exceeds the edge cap and could not be fragmented")]
    GeometryOverflow { plane_id: u32 },
}
