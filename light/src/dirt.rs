//! Ambient occlusion ("dirt") (spec.md §4.8): per-luxel hemisphere
//! rays measuring how enclosed a point is by nearby solid geometry.
//!
//! Directions are generated with a deterministic Fibonacci-sphere
//! lattice rather than Monte-Carlo sampling from an RNG, so a rebuild
//! with the same input is bit-for-bit identical at thread count 1
//! without threading a seed through every call site (spec.md §8
//! property 10); this also supplies [`crate::direct::sun_dome_samples`]
//! for the `sunlight2`/`sunlight3` sky dome (spec.md §4.8).

use glam::Vec3;

use crate::config::DirtConfig;
use crate::oracle::OcclusionOracle;

/// Generates `count` roughly-evenly-spaced directions over the
/// hemisphere around `+Z`, via the golden-angle spiral.
pub fn hemisphere_directions(count: usize) -> Vec<Vec3> {
    if count == 0 {
        return Vec::new();
    }
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0f32.sqrt());
    (0..count)
        .map(|i| {
            let t = (i as f32 + 0.5) / count as f32;
            let z = t; // cosine-weighted-ish: z in (0, 1], hemisphere only
            let r = (1.0 - z * z).max(0.0).sqrt();
            let theta = golden_angle * i as f32;
            Vec3::new(r * theta.cos(), r * theta.sin(), z)
        })
        .collect()
}

fn rotate_to_normal(dir: Vec3, normal: Vec3) -> Vec3 {
    let up = if normal.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let tangent = (up - normal * up.dot(normal)).normalize();
    let bitangent = normal.cross(tangent);
    tangent * dir.x + bitangent * dir.y + normal * dir.z
}

/// Raw occlusion amount in `0..=1` for one sample point (spec.md
/// §4.8's `lightsurf_t::occlusion`, before `dirtgain`/`dirtscale` are
/// applied).
pub fn occlusion_at(point: Vec3, normal: Vec3, directions: &[Vec3], config: &DirtConfig, oracle: &dyn OcclusionOracle) -> f32 {
    if directions.is_empty() {
        return 0.0;
    }
    let grazing_cos = (90.0 - config.angle_deg).to_radians().cos();
    let mut hits = 0usize;
    let mut cast = 0usize;
    for &dir in directions {
        if dir.z < grazing_cos {
            continue;
        }
        let world_dir = rotate_to_normal(dir, normal);
        cast += 1;
        let end = point + world_dir * config.depth;
        if oracle.trace(point + normal * 0.25, end).visible_fraction < 1.0 {
            hits += 1;
        }
    }
    if cast == 0 {
        return 0.0;
    }
    hits as f32 / cast as f32
}

/// Applies `dirtgain`/`dirtscale` to a raw occlusion fraction, folding
/// it into a light multiplier (spec.md §4.8).
pub fn apply(occlusion: f32, config: &DirtConfig) -> f32 {
    let gained = occlusion.clamp(0.0, 1.0).powf(config.gain.max(0.01));
    (1.0 - gained * config.scale).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hemisphere_directions_stay_in_upper_half() {
        let dirs = hemisphere_directions(162);
        assert_eq!(dirs.len(), 162);
        assert!(dirs.iter().all(|d| d.z >= 0.0));
    }

    #[test]
    fn fully_open_occlusion_is_zero() {
        struct Clear;
        impl OcclusionOracle for Clear {
            fn trace(&self, _f: Vec3, _t: Vec3) -> crate::oracle::Transmittance {
                crate::oracle::Transmittance::CLEAR
            }
            fn point_in_solid(&self, _p: Vec3) -> bool {
                false
            }
        }
        let dirs = hemisphere_directions(64);
        let occ = occlusion_at(Vec3::ZERO, Vec3::Z, &dirs, &DirtConfig::default(), &Clear);
        assert_eq!(occ, 0.0);
        assert_eq!(apply(occ, &DirtConfig::default()), 1.0);
    }
}
