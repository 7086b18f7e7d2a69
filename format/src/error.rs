use std::path::PathBuf;

use thiserror::Error;

/// Parse failure for a single sub-parser, named by lump (mirrors the
/// teacher `bsp` crate's one-variant-per-lump `BspError`, generalized
/// to any dialect instead of hard-coding BSP30).
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("cannot parse entity lump")]
    ParseEntities,
    #[error("cannot parse planes")]
    ParsePlanes,
    #[error("cannot parse textures")]
    ParseTextures,
    #[error("cannot parse vertices")]
    ParseVertices,
    #[error("cannot parse visibility")]
    ParseVisibility,
    #[error("cannot parse nodes")]
    ParseNodes,
    #[error("cannot parse texinfo")]
    ParseTexInfo,
    #[error("cannot parse faces")]
    ParseFaces,
    #[error("cannot parse lightmap")]
    ParseLightmap,
    #[error("cannot parse clipnodes")]
    ParseClipNodes,
    #[error("cannot parse leaves")]
    ParseLeaves,
    #[error("cannot parse mark surfaces")]
    ParseMarkSurfaces,
    #[error("cannot parse edges")]
    ParseEdges,
    #[error("cannot parse surface edges")]
    ParseSurfEdges,
    #[error("cannot parse models")]
    ParseModels,
    #[error("failed to parse a lump section")]
    LumpParseError,
    #[error("generic nom parse failure")]
    NomParsingError,
    #[error("bsp version {version} does not match dialect `{dialect}` (expected {expected})")]
    BspVersion { version: i32, expected: i32, dialect: &'static str },
    #[error("unknown target dialect `{name}`")]
    UnknownDialect { name: String },
    #[error("cannot read `{path}`: {source}")]
    IOError {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    /// An in-memory value exceeds what the target dialect's on-disk
    /// element width can represent (spec.md §4.9's "downcast fails
    /// with a typed overflow error").
    #[error("{field} value {value} overflows dialect `{dialect}`'s {limit}-bit range")]
    DialectOverflow { dialect: &'static str, field: &'static str, value: i64, limit: u32 },
    #[error("cannot read sidecar `{path}`: {source}")]
    SidecarIOError {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("cannot parse sidecar `{path}`: {source}")]
    SidecarJson {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },
}
