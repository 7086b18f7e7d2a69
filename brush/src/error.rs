#[derive(Debug, thiserror::Error)]
pub enum BrushError {
    #[error("brush plane {index} is degenerate (collinear points)")]
    DegeneratePlane { index: usize },
    #[error("brush has {found} valid sides after clipping, fewer than the minimum of 4")]
    TooFewSides { found: usize },
}
