//! Lightmap baking (spec.md §2's LightmapCore, §4.8): orchestrates
//! entity parsing, phong smoothing, per-face luxel sampling, direct +
//! dirt + single-bounce gathering, style packing, and the optional
//! light grid into one `bake` entry point, the way the teacher's own
//! phase crates (`csg`, `vis`) expose a single top-level function for
//! their stage of `bsp`'s pipeline.

pub mod bounce;
pub mod config;
pub mod direct;
pub mod dirt;
pub mod entities;
pub mod error;
pub mod grid;
pub mod oracle;
pub mod pack;
pub mod phong;
pub mod sample;
pub mod texorg;
pub mod util;

use std::collections::HashMap;

use glam::Vec3;
use rayon::prelude::*;

use format::build::FaceLightResult;
use format::generic::{Bsp, LightGridOctree};

use crate::config::LightConfig;
use crate::direct::{gather_point, StyledColor};
use crate::entities::{parse_lights, parse_suns, parse_worldspawn_keys};
use crate::error::LightError;
use crate::oracle::OcclusionOracle;
use crate::texorg::TexOrg;
use crate::util::{clamp_rgb, face_points};

/// Everything `format::build::patch_lighting`/`patch_lightgrid` need
/// to finish assembling the compiled `.bsp`. `face_results`' `face_id`
/// is already an on-disk face index (bake runs on the fully assembled
/// `Bsp`, not a pre-linearization `face::FaceSet`), so callers pass an
/// identity remap to `patch_lighting`.
pub struct BakeOutput {
    pub face_results: Vec<FaceLightResult>,
    pub lightmap: Vec<[u8; 3]>,
    pub light_grid: Option<LightGridOctree>,
}

/// Worldspawn keys override CLI/default tunables the same way the
/// original toolchain lets a map author tune lighting without
/// recompiling the binary (spec.md §4.8).
fn apply_worldspawn(mut config: LightConfig, bsp: &Bsp) -> LightConfig {
    let keys = parse_worldspawn_keys(&bsp.entities);
    config.scaledist = keys.scaledist;
    config.rangescale = keys.rangescale;
    config.global_anglescale = keys.global_anglescale;
    config.lightmapgamma = keys.lightmapgamma;
    config.addminlight = keys.addminlight;
    config.minlight = keys.minlight;
    config.minlight_color = keys.minlight_color;
    config.compilerstyle_start = keys.compilerstyle_start;
    config.dirt.enabled = keys.global_dirt;
    config.dirt.depth = keys.dirt_depth;
    config.dirt.scale = keys.dirt_scale;
    config.dirt.gain = keys.dirt_gain;
    config.dirt.angle_deg = keys.dirt_angle;
    config.dirt.minlight_dirt = keys.minlight_dirt;
    config.phong_default_angle = if keys.phong_allowed { keys.phong_angle.max(config.phong_default_angle) } else { 0.0 };
    config.bounce.enabled = keys.bounce;
    config.bounce.styled = keys.bouncestyled;
    config.bounce.scale = keys.bouncescale;
    config.bounce.color_scale = keys.bouncecolorscale;
    config
}

fn face_flat_normal(bsp: &Bsp, face_id: usize) -> Vec3 {
    let face = &bsp.faces[face_id];
    let plane = bsp.planes[face.plane as usize];
    if face.side == 1 {
        -plane.normal
    } else {
        plane.normal
    }
}

/// Applies `minlight`/`_minlight_color`/`addminlight` to one luxel's
/// gathered styles (spec.md §4.8): floors style 0 up to minlight, or
/// adds it on top when `addminlight` is set, synthesizing style 0 if
/// nothing else reached this luxel.
fn apply_minlight(colors: &mut Vec<StyledColor>, config: &LightConfig) {
    if config.minlight <= 0.0 {
        return;
    }
    let floor = config.minlight_color * (config.minlight / 255.0);
    match colors.iter_mut().find(|c| c.style == 0) {
        Some(c) if config.addminlight => c.rgb += floor,
        Some(c) => c.rgb = c.rgb.max(floor),
        None => colors.push(StyledColor { style: 0, rgb: floor }),
    }
}

/// Bakes direct, dirt and single-bounce lighting for every face of
/// `bsp` plus, if `config.light_grid` is set, the whole-map light
/// grid, returning everything needed to patch the compiled `.bsp`.
pub fn bake(bsp: &Bsp, config: &LightConfig, oracle: &dyn OcclusionOracle) -> Result<BakeOutput, LightError> {
    let config = apply_worldspawn(config.clone(), bsp);
    let lights = parse_lights(&bsp.entities);
    let suns = parse_suns(&bsp.entities);

    let dirt_dirs = if config.dirt.enabled { dirt::hemisphere_directions(config.dirt.rays) } else { Vec::new() };
    let sun_dome_dirs = dirt::hemisphere_directions(config.sunsamples as usize);
    let smoothed = phong::smooth_normals(bsp, config.phong_default_angle);

    struct FaceGeometry {
        face_id: u32,
        org: TexOrg,
        normal: Vec3,
    }

    let geometries: Vec<FaceGeometry> = bsp
        .faces
        .iter()
        .enumerate()
        .filter_map(|(face_id, face)| {
            let texinfo = bsp.texinfo.get(face.texinfo as usize)?;
            let org = TexOrg::build(bsp, face, texinfo, config.lightmapscale, config.max_dimension)?;
            let flat = face_flat_normal(bsp, face_id);
            let normal = smoothed
                .get(&(face_id as u32))
                .map(|vns| vns.iter().copied().sum::<Vec3>().normalize_or_zero())
                .filter(|v| v.length_squared() > 1e-6)
                .unwrap_or(flat);
            Some(FaceGeometry { face_id: face_id as u32, org, normal })
        })
        .collect();

    // First pass: direct+dirt light only, used to seed bounce patches
    // (spec.md §4.8's "colored by... the direct light already gathered
    // on it").
    let face_direct_light: HashMap<u32, Vec3> = if config.bounce.enabled {
        geometries
            .iter()
            .map(|g| {
                let points = face_points(bsp, &bsp.faces[g.face_id as usize]);
                let centroid = points.iter().copied().sum::<Vec3>() / points.len().max(1) as f32;
                let dirt_mult = if config.dirt.enabled {
                    dirt::apply(dirt::occlusion_at(centroid, g.normal, &dirt_dirs, &config.dirt, oracle), &config.dirt)
                } else {
                    1.0
                };
                let total: Vec3 = gather_point(centroid, g.normal, &lights, &suns, &sun_dome_dirs, &config, oracle, dirt_mult).iter().map(|c| c.rgb).sum();
                (g.face_id, total)
            })
            .collect()
    } else {
        HashMap::new()
    };
    let bounce_patches = bounce::build_patches(bsp, &face_direct_light, &config.bounce);

    struct FaceBake {
        face_id: u32,
        style_buffers: Vec<(u8, Vec<[u8; 3]>)>,
    }

    let baked: Vec<FaceBake> = geometries
        .par_iter()
        .map(|g| {
            let samples = sample::generate(&g.org, g.normal, oracle);
            let mut per_style: HashMap<u8, Vec<[u8; 3]>> = HashMap::new();

            for (idx, (&point, &occluded)) in samples.points.iter().zip(&samples.occluded).enumerate() {
                let dirt_mult = if config.dirt.enabled {
                    dirt::apply(dirt::occlusion_at(point, g.normal, &dirt_dirs, &config.dirt, oracle), &config.dirt)
                } else {
                    1.0
                };
                let mut colors = if occluded { Vec::new() } else { gather_point(point, g.normal, &lights, &suns, &sun_dome_dirs, &config, oracle, dirt_mult) };

                if config.bounce.enabled && !occluded {
                    for patch in &bounce_patches {
                        let contribution = bounce::patch_contribution(patch, point, g.normal);
                        if contribution.length_squared() <= 0.0 {
                            continue;
                        }
                        let style = if config.bounce.styled { patch.style } else { 0 };
                        match colors.iter_mut().find(|c| c.style == style) {
                            Some(c) => c.rgb += contribution,
                            None => colors.push(StyledColor { style, rgb: contribution }),
                        }
                    }
                }

                apply_minlight(&mut colors, &config);

                for c in &colors {
                    let buf = per_style.entry(c.style).or_insert_with(|| vec![[0u8; 3]; g.org.num_luxels()]);
                    buf[idx] = clamp_rgb(c.rgb);
                }
            }

            FaceBake { face_id: g.face_id, style_buffers: per_style.into_iter().collect() }
        })
        .collect();

    let mut lightmap = Vec::new();
    let mut face_results = Vec::with_capacity(baked.len());
    for fb in baked {
        let packed = pack::pack_face(fb.face_id, fb.style_buffers, &mut lightmap)?;
        face_results.push(FaceLightResult { face_id: packed.face_id, offset: packed.offset, styles: packed.styles });
    }

    let light_grid = config.light_grid.map(|grid_config| {
        let model = bsp.models.first();
        let world_mins = model.map(|m| m.mins).unwrap_or(Vec3::splat(-1024.0));
        let world_maxs = model.map(|m| m.maxs).unwrap_or(Vec3::splat(1024.0));
        grid::build(world_mins, world_maxs, &grid_config, &config, &lights, &suns, &sun_dome_dirs, oracle)
    });

    Ok(BakeOutput { face_results, lightmap, light_grid })
}
