//! FaceBuilder: reconstructs the output polygon mesh on every BSP
//! splitter plane from the brush-side fragments that ended up lying on
//! it, merges coplanar same-texinfo fragments, and repairs
//! T-junctions across the whole mesh (spec.md §4.6).

pub mod builder;
pub mod config;
pub mod error;
pub mod fragments;
pub mod merge;
pub mod pool;
pub mod tjunction;

pub use builder::{build_faces, Face, FaceSet};
pub use config::FaceConfig;
pub use error::FaceError;
pub use pool::{EdgePool, VertexId, VertexPool};
