//! Direct light gathering (spec.md §4.8): accumulates point/spot/sun
//! contributions into per-style colors for one sample point.

use std::collections::HashMap;

use glam::Vec3;

use crate::config::LightConfig;
use crate::entities::{LightEntity, LightShapeData, SunLight};
use crate::oracle::OcclusionOracle;

/// Trace distance used for sun/sky rays, past which nothing blocks the
/// sky (spec.md §4.8, `light.hh`'s `MAX_SKY_DIST`).
pub const MAX_SKY_DIST: f32 = 8192.0;

/// A single style's accumulated color at one sample point, in 0..255
/// scale (not yet gamma-corrected or byte-clamped).
#[derive(Debug, Clone, Copy)]
pub struct StyledColor {
    pub style: u8,
    pub rgb: Vec3,
}

fn spot_attenuation(light_to_point: Vec3, spot: &LightShapeData) -> f32 {
    match *spot {
        LightShapeData::Point => 1.0,
        LightShapeData::Spot { direction, cos_inner, cos_outer } => {
            let cos_angle = light_to_point.dot(direction.normalize_or_zero());
            if cos_angle <= cos_outer {
                0.0
            } else if cos_angle >= cos_inner {
                1.0
            } else {
                (cos_angle - cos_outer) / (cos_inner - cos_outer).max(1e-4)
            }
        }
    }
}

/// Gathers every point/spot/sun contribution reaching `point` (with
/// surface normal `normal`, already ambient-occlusion-scaled by
/// `dirt_mult`), per active light style.
#[allow(clippy::too_many_arguments)]
pub fn gather_point(
    point: Vec3,
    normal: Vec3,
    lights: &[LightEntity],
    suns: &[SunLight],
    sun_dirs: &[Vec3],
    config: &LightConfig,
    oracle: &dyn OcclusionOracle,
    dirt_mult: f32,
) -> Vec<StyledColor> {
    let mut styles: HashMap<u8, Vec3> = HashMap::new();
    let origin = point + normal * 0.25;

    for light in lights {
        let to_light = light.origin - point;
        let dist = to_light.length().max(1.0);
        let dir = to_light / dist;
        let ndotl = normal.dot(dir);
        if ndotl <= 0.0 {
            continue;
        }
        let spot = spot_attenuation(-dir, &light.shape);
        if spot <= 0.0 {
            continue;
        }
        let angle_term = (1.0 - config.global_anglescale) + config.global_anglescale * ndotl;
        let falloff = light.atten.falloff(dist * config.scaledist, light.range * config.rangescale.max(0.01));
        let strength = light.intensity * falloff * angle_term * spot;
        if strength.abs() < config.gate {
            continue;
        }
        let trans = oracle.trace(origin, light.origin);
        if trans.visible_fraction < 1.0 {
            continue;
        }
        let contribution = light.color * (strength / 255.0) * trans.tint * dirt_mult;
        *styles.entry(light.style).or_insert(Vec3::ZERO) += contribution;
    }

    for sun in suns {
        let contribution = if sun.dome {
            sun_dome_contribution(point, normal, sun, sun_dirs, config, oracle)
        } else {
            let ndotl = normal.dot(sun.sunvec);
            if ndotl <= 0.0 {
                Vec3::ZERO
            } else {
                let angle_term = (1.0 - sun.anglescale) + sun.anglescale * ndotl;
                let end = point + sun.sunvec * MAX_SKY_DIST;
                let trans = oracle.trace(origin, end);
                if trans.visible_fraction < 1.0 {
                    Vec3::ZERO
                } else {
                    sun.color * (sun.sunlight * angle_term / 255.0) * trans.tint
                }
            }
        } * dirt_mult;
        if contribution.length_squared() > 0.0 {
            *styles.entry(sun.style).or_insert(Vec3::ZERO) += contribution;
        }
    }

    styles.into_iter().map(|(style, rgb)| StyledColor { style, rgb }).collect()
}

fn sun_dome_contribution(point: Vec3, normal: Vec3, sun: &SunLight, sun_dirs: &[Vec3], config: &LightConfig, oracle: &dyn OcclusionOracle) -> Vec3 {
    if sun_dirs.is_empty() {
        return Vec3::ZERO;
    }
    let up = if sun.sunvec.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let tangent = (up - sun.sunvec * up.dot(sun.sunvec)).normalize();
    let bitangent = sun.sunvec.cross(tangent);
    let mut total = Vec3::ZERO;
    let origin = point + normal * 0.25;
    for &dir in sun_dirs {
        let world_dir = tangent * dir.x + bitangent * dir.y + sun.sunvec * dir.z;
        let ndotl = normal.dot(world_dir);
        if ndotl <= 0.0 {
            continue;
        }
        let end = point + world_dir * MAX_SKY_DIST;
        let trans = oracle.trace(origin, end, u32::MAX);
        if trans.visible_fraction < 1.0 {
            continue;
        }
        total += sun.color * (sun.sunlight * ndotl / (255.0 * sun_dirs.len() as f32));
    }
    total
}
