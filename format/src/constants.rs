//! Lump table layout shared by every dialect (spec.md §4.9). Dialects
//! differ in version number, element widths and the legal content
//! range, not in lump ordering, so these indices are dialect-agnostic —
//! lifted straight from the teacher `bsp` crate's `constants.rs`.

use std::mem;

pub const LUMP_ENTITIES: usize = 0;
pub const LUMP_PLANES: usize = 1;
pub const LUMP_TEXTURES: usize = 2;
pub const LUMP_VERTICES: usize = 3;
pub const LUMP_VISIBILITY: usize = 4;
pub const LUMP_NODES: usize = 5;
pub const LUMP_TEXINFO: usize = 6;
pub const LUMP_FACES: usize = 7;
pub const LUMP_LIGHTING: usize = 8;
pub const LUMP_CLIPNODES: usize = 9;
pub const LUMP_LEAVES: usize = 10;
pub const LUMP_MARKSURFACES: usize = 11;
pub const LUMP_EDGES: usize = 12;
pub const LUMP_SURFEDGES: usize = 13;
pub const LUMP_MODELS: usize = 14;
pub const HEADER_LUMPS: usize = 15;

pub const MAX_MAP_HULLS: usize = 4;

/// `(i32, i32)` offset/length pair, one per lump.
pub const HEADER_LUMP_SIZE: usize = mem::size_of::<i32>() * 2;
