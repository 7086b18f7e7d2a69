use glam::Vec3;
use thiserror::Error;

/// Fatal result of [`crate::outside_fill::run`]: the BFS flood from
/// every occupied leaf reached the map's padded exterior, meaning the
/// world isn't sealed. `trail` is the polyline from the offending
/// entity's origin out through the hole, ready for [`crate::prt::write_pts`]
/// (spec.md §4.5, §7's exit code 3).
#[derive(Debug, Error)]
pub enum PortalError {
    #[error("leak detected: player space is not sealed ({} trail points)", trail.len())]
    Leak { trail: Vec<Vec3> },
}
