//! Aggregates every phase crate's own `thiserror` enum into one type
//! (spec.md §7) so the three `compile-*` binaries can map a single
//! match to the exit-code contract (§6: 0 success, 1 usage, 2 parse
//! error, 3 leak, 4 overflow, 5 I/O error) without each binary
//! re-deriving the mapping.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(".map parse error in {path}")]
    MapParse { path: PathBuf },
    #[error(transparent)]
    Brush(#[from] brush::BrushError),
    #[error(transparent)]
    Bsptree(#[from] bsptree::BsptreeError),
    #[error(transparent)]
    Portal(#[from] portal::PortalError),
    #[error(transparent)]
    Face(#[from] face::FaceError),
    #[error(transparent)]
    Vis(#[from] vis::VisError),
    #[error(transparent)]
    Light(#[from] light::error::LightError),
    #[error(transparent)]
    Format(#[from] format::FormatError),
    #[error("I/O error reading/writing {path}: {source}")]
    Io { source: std::io::Error, path: PathBuf },
    #[error("cancelled")]
    Cancelled,
}

impl CompileError {
    /// Maps to spec.md §6/§7's process exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::MapParse { .. } => 2,
            CompileError::Portal(portal::PortalError::Leak { .. }) => 3,
            CompileError::Format(format::FormatError::DialectOverflow { .. }) => 4,
            CompileError::Face(face::FaceError::GeometryOverflow { .. }) => 4,
            CompileError::Vis(vis::VisError::TooManySeparators { .. }) => 4,
            CompileError::Io { .. } => 5,
            _ => 1,
        }
    }
}
