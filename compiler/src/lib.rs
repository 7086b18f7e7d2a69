//! Orchestrates the three compile phases (spec.md §2's control flow)
//! over the per-phase crates in this workspace, the way the teacher's
//! own `modules` tree wires its GUI/CLI entry points onto individual
//! tool crates. Each `compile_*` function here backs one of
//! `src/bin`'s binaries.

pub mod cancel;
pub mod config;
pub mod dialect_probe;
pub mod error;
pub mod rebuild;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;

use brush::{Brush as BuiltBrush, ContentFlags, TexInfoTable};
use bsptree::{NodeContent, TreeConfig};
use face::FaceConfig;
use format::generic::Bsp;
use geom::{Aabb, PlaneTable};
use light::config::LightConfig;
use light::oracle::BspOracle;
use portal::{PortalError, PortalSet};
use vis::VisConfig;

use crate::cancel::CancelToken;
use crate::config::GameProfile;
use crate::error::CompileError;

fn io_err(source: std::io::Error, path: &Path) -> CompileError {
    CompileError::Io { source, path: path.to_path_buf() }
}

/// Assigns a stable, order-of-first-use id per distinct texture name,
/// standing in for the real WAD-backed miptex lookup `map`/`wad`
/// perform during a full asset-aware build (spec.md §4.2's texinfo
/// only needs a stable integer, not the actual pixel data, until the
/// encode step writes a texture lump).
#[derive(Default)]
struct NameInterner {
    ids: HashMap<String, u32>,
}

impl NameInterner {
    fn id_of(&mut self, name: &str) -> u32 {
        let next = self.ids.len() as u32;
        *self.ids.entry(name.to_ascii_lowercase()).or_insert(next)
    }
}

fn parse_origin(attributes: &HashMap<String, String>) -> Option<Vec3> {
    let raw = attributes.get("origin")?;
    let mut parts = raw.split_whitespace();
    let x: f32 = parts.next()?.parse().ok()?;
    let y: f32 = parts.next()?.parse().ok()?;
    let z: f32 = parts.next()?.parse().ok()?;
    Some(Vec3::new(x, y, z))
}

/// Classifies a whole brush's contents by folding [`GameProfile::classify_texture`]
/// over every plane's texture name (spec.md §4.2's "cluster merge"),
/// so a brush with one liquid-textured side and five ordinary ones
/// still ends up SOLID rather than silently dropping SOLID because one
/// side's texture alone doesn't carry it.
fn classify_brush(raw: &map::Brush, profile: &GameProfile) -> ContentFlags {
    let mut merged = ContentFlags::empty();
    let mut all_solid = true;
    for plane in &raw.planes {
        let side_flags = profile.classify_texture(&plane.texture_name);
        all_solid &= side_flags.contains(ContentFlags::SOLID);
        merged = side_flags.merge_into_cluster(merged);
    }
    ContentFlags::finish_cluster_merge(merged, all_solid)
}

/// Result of [`compile_geometry`]: the assembled `.bsp` (no vis, no
/// light yet) plus everything a same-process `compile_vis`/
/// `compile_light` call would need to skip re-decoding it. The CLI
/// binaries don't use these extra fields — they write the encoded
/// `.bsp` and let a later process reconstruct them via
/// [`rebuild::tree_from_bsp`] — but library callers that run the whole
/// pipeline in one invocation can use them directly.
pub struct GeometryOutput {
    pub bsp: Bsp,
    pub tree: bsptree::Tree,
    pub portals: PortalSet,
    pub planes: PlaneTable,
    pub leaf_visleafnums: Vec<Option<u32>>,
    pub face_remap: Vec<u32>,
}

/// Runs BrushModel -> CSG -> TreeBuilder -> PortalExtractor -> FaceBuilder
/// -> `FormatShim.write` (spec.md §2). `map_path`'s leak trail, if any,
/// is written alongside it as a `.pts` file before the error propagates,
/// matching the original toolchain's leak-visualization convention.
pub fn compile_geometry(
    map_path: &Path,
    profile: &GameProfile,
    tree_config: &TreeConfig,
    face_config: &FaceConfig,
    cancel: &CancelToken,
) -> Result<GeometryOutput, CompileError> {
    let text = fs::read_to_string(map_path).map_err(|e| io_err(e, map_path))?;
    let parsed = map::Map::parse_str(&text).map_err(|_| CompileError::MapParse { path: map_path.to_path_buf() })?;

    let mut planes = PlaneTable::new();
    let mut texinfos = TexInfoTable::new();
    let mut miptex_names = NameInterner::default();

    let mut brushes: Vec<BuiltBrush> = Vec::new();
    for entity in &parsed.entities {
        let Some(raw_brushes) = &entity.brushes else { continue };
        for raw in raw_brushes {
            cancel.check()?;
            let content_flags = classify_brush(raw, profile);
            let built = BuiltBrush::build(raw, content_flags, profile.world_extent, &mut planes, &mut texinfos, |name| miptex_names.id_of(name), |_| 0)?;
            brushes.push(built);
        }
    }

    let csg_result = csg::csg(&brushes, &planes);
    let csg_brushes = csg_result.brushes;
    let face_brushes = csg_brushes.clone();

    let world_bounds = Aabb::from_points([Vec3::splat(-profile.world_extent), Vec3::splat(profile.world_extent)]);
    cancel.check()?;
    let mut tree = bsptree::build_tree(csg_brushes, world_bounds, &planes, tree_config);

    cancel.check()?;
    let portals = portal::extract_portals(&mut tree, world_bounds, &mut planes, profile.epsilon);

    let entity_origins: Vec<Vec3> = parsed.entities.iter().filter_map(|e| parse_origin(&e.attributes)).collect();
    if let Err(PortalError::Leak { trail }) = portal::fill_outside(&mut tree, &portals, &entity_origins, &planes) {
        let pts_path = map_path.with_extension("pts");
        if let Ok(file) = fs::File::create(&pts_path) {
            let _ = portal::write_pts(file, &trail, 4.0);
        }
        return Err(CompileError::Portal(PortalError::Leak { trail }));
    }
    portal::number_leafs(&mut tree);

    cancel.check()?;
    let (face_set, by_node) = face::build_faces(&tree, &face_brushes, &planes, face_config)?;
    for (node_id, faces) in by_node {
        if let Some(interior) = tree.get_mut(node_id).as_interior_mut() {
            interior.faces = faces;
        }
    }

    let entities: Vec<format::generic::Entity> = parsed.entities.iter().map(|e| e.attributes.clone()).collect();
    let build_output = format::build::from_tree(&tree, &face_set, &planes, &texinfos, entities);

    Ok(GeometryOutput {
        bsp: build_output.bsp,
        tree,
        portals,
        planes,
        leaf_visleafnums: build_output.leaf_visleafnums,
        face_remap: build_output.face_remap,
    })
}

/// Runs PVSSolver over a previously compiled `.bsp`'s reconstructed
/// tree and patches its visdata lump in place (spec.md §2's
/// `.patch(pvs)` step).
pub fn compile_vis(bsp: &mut Bsp, vis_config: &VisConfig, on_epsilon: f32, cancel: &CancelToken) -> Result<(), CompileError> {
    cancel.check()?;
    let mut planes = rebuild::planes_from_bsp(bsp);
    let (mut tree, leaf_order) = rebuild::tree_from_bsp(bsp);
    let world_bounds = tree.get(tree.root).aabb;

    let portals = portal::extract_portals(&mut tree, world_bounds, &mut planes, on_epsilon);
    portal::number_leafs(&mut tree);

    let leaf_visleafnums: Vec<Option<u32>> = leaf_order
        .iter()
        .map(|&id| match &tree.get(id).content {
            NodeContent::Leaf(leaf) => leaf.visleafnum,
            NodeContent::Interior(_) => None,
        })
        .collect();

    cancel.check()?;
    let vis_data = vis::compute_pvs(&tree, &portals, &planes, vis_config)?;
    format::build::patch_visibility(bsp, &leaf_visleafnums, &vis_data);
    Ok(())
}

/// Runs LightmapCore over a previously compiled (and, typically,
/// vis'd) `.bsp` and patches its lightdata lump (plus the optional
/// light grid) in place (spec.md §2's `.patch(lightdata)` step).
pub fn compile_light(bsp: &mut Bsp, light_config: &LightConfig, cancel: &CancelToken) -> Result<(), CompileError> {
    cancel.check()?;
    let oracle = BspOracle::new(bsp);
    let output = light::bake(bsp, light_config, &oracle)?;
    let face_remap: Vec<u32> = (0..bsp.faces.len() as u32).collect();
    format::build::patch_lighting(bsp, &face_remap, &output.face_results, output.lightmap);
    if let Some(grid) = output.light_grid {
        format::build::patch_lightgrid(bsp, grid);
    }
    Ok(())
}

/// Resolves `-target`/a game profile's `target_dialect` to a concrete
/// [`format::Dialect`], for `compile-geometry`'s final encode step.
pub fn resolve_dialect(name: &str) -> Result<Box<dyn format::Dialect>, CompileError> {
    format::dialect::by_name(name).ok_or_else(|| CompileError::Format(format::FormatError::UnknownDialect { name: name.to_string() }))
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>, CompileError> {
    fs::read(path).map_err(|e| io_err(e, path))
}

pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<(), CompileError> {
    fs::write(path, bytes).map_err(|e| io_err(e, path))
}

pub fn default_profile_path_for(binary_dir: Option<PathBuf>) -> Option<PathBuf> {
    binary_dir.map(|d| d.join("gameconfig.toml"))
}
