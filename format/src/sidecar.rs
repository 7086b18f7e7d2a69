//! Sidecar JSON files (spec.md §4.9, §6): every dialect's on-disk
//! width is a lossy narrowing of this workspace's in-memory model — a
//! `TexInfo`'s light-emission `value` has no on-disk texinfo slot, and
//! a leaf's full [`ContentFlags`] bitset collapses to one legacy
//! `CONTENTS_*` enum value. These files carry the dropped fidelity
//! alongside the compiled `.bsp`, written/read with `serde_json` the
//! way the teacher's own sidecar-adjacent tooling (`src/config.rs`)
//! already leans on `serde`.

use std::fs;
use std::path::Path;

use brush::ContentFlags;
use serde::{Deserialize, Serialize};

use crate::error::FormatError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TexInfoSidecarEntry {
    pub index: u32,
    pub value: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TexInfoSidecar {
    pub entries: Vec<TexInfoSidecarEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentSidecarEntry {
    pub leaf: u32,
    pub bits: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentSidecar {
    pub entries: Vec<ContentSidecarEntry>,
}

impl ContentSidecar {
    /// Builds a sidecar only for leaves whose full bitset carries
    /// anything the legacy per-leaf enum can't represent (cosmetic or
    /// detail bits), keeping the common case's sidecar empty.
    pub fn from_full_contents(full: &[ContentFlags]) -> Self {
        const REPRESENTABLE: ContentFlags = ContentFlags::SOLID
            .union(ContentFlags::WATER)
            .union(ContentFlags::SLIME)
            .union(ContentFlags::LAVA)
            .union(ContentFlags::SKY)
            .union(ContentFlags::ORIGIN)
            .union(ContentFlags::PLAYERCLIP)
            .union(ContentFlags::TRANSLUCENT);
        let entries = full
            .iter()
            .enumerate()
            .filter(|(_, c)| !(**c & !REPRESENTABLE).is_empty())
            .map(|(i, c)| ContentSidecarEntry { leaf: i as u32, bits: c.bits() })
            .collect();
        Self { entries }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), FormatError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| FormatError::SidecarJson { source, path: path.to_path_buf() })?;
    fs::write(path, bytes).map_err(|source| FormatError::SidecarIOError { source, path: path.to_path_buf() })
}

fn read_json<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> Result<T, FormatError> {
    if !path.exists() {
        return Ok(T::default());
    }
    let bytes = fs::read(path).map_err(|source| FormatError::SidecarIOError { source, path: path.to_path_buf() })?;
    serde_json::from_slice(&bytes).map_err(|source| FormatError::SidecarJson { source, path: path.to_path_buf() })
}

pub fn write_texinfo_sidecar(path: &Path, sidecar: &TexInfoSidecar) -> Result<(), FormatError> {
    write_json(path, sidecar)
}

pub fn read_texinfo_sidecar(path: &Path) -> Result<TexInfoSidecar, FormatError> {
    read_json(path)
}

pub fn write_content_sidecar(path: &Path, sidecar: &ContentSidecar) -> Result<(), FormatError> {
    write_json(path, sidecar)
}

pub fn read_content_sidecar(path: &Path) -> Result<ContentSidecar, FormatError> {
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_bit_forces_a_sidecar_entry() {
        let full = vec![ContentFlags::SOLID, ContentFlags::SOLID | ContentFlags::DETAIL_WALL];
        let sidecar = ContentSidecar::from_full_contents(&full);
        assert_eq!(sidecar.entries.len(), 1);
        assert_eq!(sidecar.entries[0].leaf, 1);
    }

    #[test]
    fn plain_solid_leaf_needs_no_sidecar_entry() {
        let full = vec![ContentFlags::SOLID, ContentFlags::WATER];
        let sidecar = ContentSidecar::from_full_contents(&full);
        assert!(sidecar.entries.is_empty());
    }
}
