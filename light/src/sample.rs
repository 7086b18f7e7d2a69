//! Luxel sample-point generation and occlusion repair (spec.md §4.8).

use glam::Vec3;

use crate::oracle::OcclusionOracle;
use crate::texorg::TexOrg;

/// Offsets tried in order when a luxel's projected point lands inside
/// solid geometry, in units of a fraction of `lmscale`. Ordered nearest
/// first so the repaired point stays as close as possible to the true
/// luxel center (spec.md §4.8: "search within a fixed radius and small
/// discrete offsets").
const REPAIR_OFFSETS: &[(f32, f32)] =
    &[(0.25, 0.0), (-0.25, 0.0), (0.0, 0.25), (0.0, -0.25), (0.25, 0.25), (-0.25, -0.25), (0.25, -0.25), (-0.25, 0.25), (0.5, 0.0), (-0.5, 0.0), (0.0, 0.5), (0.0, -0.5)];

#[derive(Debug, Clone)]
pub struct FaceSamples {
    pub points: Vec<Vec3>,
    pub occluded: Vec<bool>,
}

fn in_plane_basis(normal: Vec3) -> (Vec3, Vec3) {
    let up = if normal.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let tangent = (up - normal * up.dot(normal)).normalize();
    (tangent, normal.cross(tangent))
}

/// Generates one sample per luxel and repairs any that land inside
/// solid geometry, marking the rest `occluded` when no nearby offset
/// works (spec.md §4.8).
pub fn generate(org: &TexOrg, normal: Vec3, oracle: &dyn OcclusionOracle) -> FaceSamples {
    let (tangent, bitangent) = in_plane_basis(normal);
    let mut points = Vec::with_capacity(org.num_luxels());
    let mut occluded = Vec::with_capacity(org.num_luxels());

    for j in 0..org.height {
        for i in 0..org.width {
            let center = org.luxel_world(i, j);
            if !oracle.point_in_solid(center) {
                points.push(center);
                occluded.push(false);
                continue;
            }
            let mut repaired = None;
            for &(du, dv) in REPAIR_OFFSETS {
                let candidate = center + tangent * du * org.lmscale + bitangent * dv * org.lmscale;
                if !oracle.point_in_solid(candidate) {
                    repaired = Some(candidate);
                    break;
                }
            }
            match repaired {
                Some(p) => {
                    points.push(p);
                    occluded.push(false);
                }
                None => {
                    points.push(center);
                    occluded.push(true);
                }
            }
        }
    }

    FaceSamples { points, occluded }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverSolid;
    impl OcclusionOracle for NeverSolid {
        fn trace(&self, _from: Vec3, _to: Vec3) -> crate::oracle::Transmittance {
            crate::oracle::Transmittance::CLEAR
        }
        fn point_in_solid(&self, _p: Vec3) -> bool {
            false
        }
    }

    #[test]
    fn unoccluded_face_marks_nothing_occluded() {
        let org = TexOrg {
            width: 2,
            height: 2,
            texmins: [0, 0],
            lmscale: 16.0,
            clamped: false,
            tex_to_world: glam::Mat3::IDENTITY,
            plane_dist: 0.0,
            u_offset: 0.0,
            v_offset: 0.0,
        };
        let samples = generate(&org, Vec3::Z, &NeverSolid);
        assert!(samples.occluded.iter().all(|&o| !o));
        assert_eq!(samples.points.len(), 4);
    }
}
