use thiserror::Error;

/// Lightmap-phase fatal errors (spec.md §7).
#[derive(Debug, Error)]
pub enum LightError {
    #[error("face {face} luxel rectangle {w}x{h} exceeds the {max} implementation maximum")]
    GeometryOverflow { face: u32, w: usize, h: usize, max: usize },
    #[error("occlusion oracle failed to initialize: {0}")]
    OracleError(String),
    #[error(
        "user-authored light style {style} collides with the compiler's switchable-shadow range ({start}..254)"
    )]
    StyleCollision { style: u8, start: u8 },
    #[error("more than 4 distinct light styles touch face {face}")]
    TooManyStyles { face: u32 },
}
