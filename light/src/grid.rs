//! Light-grid octree construction (spec.md §3, §4.8): a sparse spatial
//! index of ambient light samples engines use to light dynamic models
//! that aren't resting on a lightmapped surface. Subdivides the
//! worldspawn bounds the same way `bsptree::build_tree` splits brush
//! geometry (longest-axis binary split), but on a uniform empty-space
//! grid rather than brush planes, stopping once a leaf reaches
//! [`LightGridConfig::grid_dist`], [`LightGridConfig::min_leaf_span`]
//! or [`LightGridConfig::max_depth`].

use glam::Vec3;

use format::generic::{LightGridNode, LightGridOctree, LightGridSample};

use crate::config::{LightConfig, LightGridConfig};
use crate::direct::{gather_point, StyledColor};
use crate::entities::{LightEntity, SunLight};
use crate::oracle::OcclusionOracle;
use crate::util::clamp_rgb;

/// Packs up to 4 styled colors into a [`LightGridSample`], keeping the
/// brightest styles if more arrive (a grid sample is an engine aid,
/// not authoritative geometry, so it degrades gracefully instead of
/// erroring the way [`crate::pack::pack_face`] does for a face).
fn pack_sample(mut colors: Vec<StyledColor>) -> LightGridSample {
    colors.sort_by(|a, b| b.rgb.length_squared().partial_cmp(&a.rgb.length_squared()).unwrap());
    colors.truncate(4);
    let mut sample = LightGridSample::default();
    for (slot, c) in colors.into_iter().enumerate() {
        sample.styles[slot] = c.style;
        sample.colors[slot] = clamp_rgb(c.rgb);
    }
    sample
}

/// Samples ambient light at `point` by gathering once per up/down
/// hemisphere normal and averaging; a grid sample has no single
/// surface normal, so this approximates an omnidirectional probe
/// without needing a full spherical-harmonics basis.
#[allow(clippy::too_many_arguments)]
fn sample_point(
    point: Vec3,
    lights: &[LightEntity],
    suns: &[SunLight],
    sun_dirs: &[Vec3],
    config: &LightConfig,
    oracle: &dyn OcclusionOracle,
) -> LightGridSample {
    let up = gather_point(point, Vec3::Z, lights, suns, sun_dirs, config, oracle, 1.0);
    let down = gather_point(point, -Vec3::Z, lights, suns, sun_dirs, config, oracle, 1.0);

    let mut merged: Vec<StyledColor> = Vec::new();
    for c in up.into_iter().chain(down) {
        if let Some(existing) = merged.iter_mut().find(|e| e.style == c.style) {
            existing.rgb = (existing.rgb + c.rgb) * 0.5;
        } else {
            merged.push(c);
        }
    }
    pack_sample(merged)
}

fn longest_axis(mins: Vec3, maxs: Vec3) -> (usize, f32) {
    let extent = maxs - mins;
    let arr = extent.to_array();
    let mut axis = 0;
    for i in 1..3 {
        if arr[i] > arr[axis] {
            axis = i;
        }
    }
    (axis, arr[axis])
}

fn should_split(mins: Vec3, maxs: Vec3, depth: u32, config: &LightGridConfig) -> bool {
    if depth >= config.max_depth {
        return false;
    }
    let extent = maxs - mins;
    if extent.x <= config.grid_dist.x && extent.y <= config.grid_dist.y && extent.z <= config.grid_dist.z {
        return false;
    }
    longest_axis(mins, maxs).1 > config.min_leaf_span as f32
}

#[allow(clippy::too_many_arguments)]
fn subdivide(
    mins: Vec3,
    maxs: Vec3,
    depth: u32,
    grid_config: &LightGridConfig,
    light_config: &LightConfig,
    lights: &[LightEntity],
    suns: &[SunLight],
    sun_dirs: &[Vec3],
    oracle: &dyn OcclusionOracle,
) -> LightGridNode {
    let center = (mins + maxs) * 0.5;

    if !should_split(mins, maxs, depth, grid_config) {
        if oracle.point_in_solid(center) {
            return LightGridNode::Leaf {
                mins: mins.to_array(),
                maxs: maxs.to_array(),
                sample: LightGridSample::default(),
                fully_occluded: true,
            };
        }
        let sample = sample_point(center, lights, suns, sun_dirs, light_config, oracle);
        return LightGridNode::Leaf { mins: mins.to_array(), maxs: maxs.to_array(), sample, fully_occluded: false };
    }

    let (axis, _) = longest_axis(mins, maxs);
    let mid = (mins.to_array()[axis] + maxs.to_array()[axis]) * 0.5;
    let mut lo_maxs = maxs.to_array();
    lo_maxs[axis] = mid;
    let mut hi_mins = mins.to_array();
    hi_mins[axis] = mid;

    let front = subdivide(mins, Vec3::from_array(lo_maxs), depth + 1, grid_config, light_config, lights, suns, sun_dirs, oracle);
    let back = subdivide(Vec3::from_array(hi_mins), maxs, depth + 1, grid_config, light_config, lights, suns, sun_dirs, oracle);

    LightGridNode::Interior { split_axis: axis as u8, children: [Box::new(front), Box::new(back)] }
}

/// Builds the whole-map light grid (spec.md §3) over `world_mins..world_maxs`
/// (the compiled model 0's bounds).
#[allow(clippy::too_many_arguments)]
pub fn build(
    world_mins: Vec3,
    world_maxs: Vec3,
    grid_config: &LightGridConfig,
    light_config: &LightConfig,
    lights: &[LightEntity],
    suns: &[SunLight],
    sun_dirs: &[Vec3],
    oracle: &dyn OcclusionOracle,
) -> LightGridOctree {
    let root = subdivide(world_mins, world_maxs, 0, grid_config, light_config, lights, suns, sun_dirs, oracle);
    LightGridOctree { root, world_mins: world_mins.to_array(), world_maxs: world_maxs.to_array() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::LightShapeData;

    struct OpenOracle;
    impl OcclusionOracle for OpenOracle {
        fn trace(&self, _from: Vec3, _to: Vec3) -> crate::oracle::Transmittance {
            crate::oracle::Transmittance::CLEAR
        }
        fn point_in_solid(&self, _p: Vec3) -> bool {
            false
        }
    }

    fn count_leaves(node: &LightGridNode) -> usize {
        match node {
            LightGridNode::Leaf { .. } => 1,
            LightGridNode::Interior { children, .. } => count_leaves(&children[0]) + count_leaves(&children[1]),
        }
    }

    #[test]
    fn subdivides_until_depth_or_span_limit() {
        let grid_config = LightGridConfig { grid_dist: Vec3::splat(1.0), max_depth: 3, min_leaf_span: 1 };
        let light_config = LightConfig::default();
        let grid = build(Vec3::splat(-64.0), Vec3::splat(64.0), &grid_config, &light_config, &[], &[], &[], &OpenOracle);
        assert!(count_leaves(&grid.root) > 1);
    }

    #[test]
    fn a_single_point_light_is_visible_in_the_nearest_leaf_sample() {
        let grid_config = LightGridConfig { grid_dist: Vec3::splat(256.0), max_depth: 0, min_leaf_span: 4 };
        let light_config = LightConfig::default();
        let light = LightEntity {
            origin: Vec3::new(32.0, 0.0, 0.0),
            color: Vec3::splat(255.0),
            intensity: 300.0,
            range: 0.0,
            style: 0,
            atten: crate::entities::Attenuation::InverseSquare,
            shape: LightShapeData::Point,
            dirt_override: None,
        };
        let grid = build(Vec3::splat(-64.0), Vec3::splat(64.0), &grid_config, &light_config, std::slice::from_ref(&light), &[], &[], &OpenOracle);
        match grid.root {
            LightGridNode::Leaf { sample, .. } => {
                assert!(sample.colors[0] != [0, 0, 0] || sample.styles[0] != 255);
            }
            _ => panic!("expected a single leaf at max_depth 0"),
        }
    }
}
