//! The three texture-projection encodings a `.map` brush plane line can
//! use: Quake-ED (shift/rotate/scale relative to a baseaxis table),
//! Valve-220 (explicit 4-vecs per axis), and Brush-Primitives (an
//! explicit 2x3 matrix). All three convert to the same canonical
//! `(u, v): (DVec4, DVec4)` pair used everywhere downstream of parsing.

use glam::{DVec3, DVec4};

/// Raw texture-projection payload as it appeared in (or should be
/// serialized back out to) the `.map` text, kept only so `Map::write`
/// can round-trip the original grammar; every other consumer uses the
/// canonical `u`/`v` vecs on [`crate::BrushPlane`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// `texture_name u_offset v_offset rotation u_scale v_scale`, no
    /// brackets; axes come from [`base_axis_for_normal`].
    QuakeEd { u_offset: f64, v_offset: f64 },
    /// `texture_name [ Ux Uy Uz Uoffset ] [ Vx Vy Vz Voffset ] rotation
    /// u_scale v_scale`; what the teacher's original grammar already
    /// parsed.
    Valve220,
    /// `( ( m00 m01 m02 ) ( m10 m11 m12 ) ) texture_name`; rows are
    /// texture-space basis vectors with no separate offset/rotate/scale
    /// triple.
    BrushPrimitives { matrix: [[f64; 3]; 2] },
}

/// The six classic "baseaxis" texture-alignment triples (floor/ceiling,
/// then the four cardinal walls); `[0]` is the reference normal used to
/// pick the best-fit group, `[1]`/`[2]` are the tangent/bitangent axes
/// assigned to a plane whose normal is closest to `[0]`.
const BASE_AXIS: [[DVec3; 3]; 6] = [
    [DVec3::new(0.0, 0.0, 1.0), DVec3::new(1.0, 0.0, 0.0), DVec3::new(0.0, -1.0, 0.0)],
    [DVec3::new(0.0, 0.0, -1.0), DVec3::new(1.0, 0.0, 0.0), DVec3::new(0.0, -1.0, 0.0)],
    [DVec3::new(1.0, 0.0, 0.0), DVec3::new(0.0, 1.0, 0.0), DVec3::new(0.0, 0.0, -1.0)],
    [DVec3::new(-1.0, 0.0, 0.0), DVec3::new(0.0, 1.0, 0.0), DVec3::new(0.0, 0.0, -1.0)],
    [DVec3::new(0.0, 1.0, 0.0), DVec3::new(1.0, 0.0, 0.0), DVec3::new(0.0, 0.0, -1.0)],
    [DVec3::new(0.0, -1.0, 0.0), DVec3::new(1.0, 0.0, 0.0), DVec3::new(0.0, 0.0, -1.0)],
];

/// Picks the tangent/bitangent pair whose reference normal is most
/// aligned with `normal` (classic `TextureAxisFromPlane`).
pub fn base_axis_for_normal(normal: DVec3) -> (DVec3, DVec3) {
    let mut best = 0;
    let mut best_dot = f64::NEG_INFINITY;
    for (i, group) in BASE_AXIS.iter().enumerate() {
        let d = normal.dot(group[0]);
        if d > best_dot {
            best_dot = d;
            best = i;
        }
    }
    (BASE_AXIS[best][1], BASE_AXIS[best][2])
}

impl Projection {
    /// Converts this raw projection into the canonical `(u, v)` vecs
    /// used by [`crate::BrushPlane::u`]/[`crate::BrushPlane::v`].
    pub fn to_vecs(
        &self,
        normal: DVec3,
        rotation_deg: f64,
        u_scale: f64,
        v_scale: f64,
    ) -> (DVec4, DVec4) {
        match *self {
            Projection::Valve220 => {
                // Caller already has canonical vecs from the bracket
                // syntax; this variant is never asked to derive them.
                unreachable!("Valve220 planes carry their own u/v directly")
            }
            Projection::QuakeEd { u_offset, v_offset } => {
                let (mut u_axis, mut v_axis) = base_axis_for_normal(normal);
                rotate_axes(&mut u_axis, &mut v_axis, normal, rotation_deg);

                let u_scale = if u_scale.abs() < 1e-9 { 1.0 } else { u_scale };
                let v_scale = if v_scale.abs() < 1e-9 { 1.0 } else { v_scale };

                let u = (u_axis / u_scale).extend(u_offset);
                let v = (v_axis / v_scale).extend(v_offset);
                (u, v)
            }
            Projection::BrushPrimitives { matrix } => {
                let u = DVec3::new(matrix[0][0], matrix[0][1], matrix[0][2]).extend(0.0);
                let v = DVec3::new(matrix[1][0], matrix[1][1], matrix[1][2]).extend(0.0);
                (u, v)
            }
        }
    }
}

/// Rotates the texture axes about the plane normal by `rotation_deg`
/// degrees (classic editors only ever rotate within the texture plane).
fn rotate_axes(u_axis: &mut DVec3, v_axis: &mut DVec3, normal: DVec3, rotation_deg: f64) {
    if rotation_deg.abs() < 1e-9 {
        return;
    }
    let normal = normal.normalize();
    let theta = rotation_deg.to_radians();
    let (sin_t, cos_t) = theta.sin_cos();

    let rotate = |v: DVec3| -> DVec3 {
        v * cos_t + normal.cross(v) * sin_t + normal * normal.dot(v) * (1.0 - cos_t)
    };

    *u_axis = rotate(*u_axis);
    *v_axis = rotate(*v_axis);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quake_ed_unrotated_matches_base_axis() {
        let normal = DVec3::new(0.0, 0.0, 1.0);
        let proj = Projection::QuakeEd { u_offset: 4.0, v_offset: -8.0 };
        let (u, v) = proj.to_vecs(normal, 0.0, 1.0, 1.0);
        assert_eq!(u.truncate(), DVec3::new(1.0, 0.0, 0.0));
        assert_eq!(v.truncate(), DVec3::new(0.0, -1.0, 0.0));
        assert_eq!(u.w, 4.0);
        assert_eq!(v.w, -8.0);
    }

    #[test]
    fn brush_primitives_matrix_passthrough() {
        let proj = Projection::BrushPrimitives {
            matrix: [[0.5, 0.0, 0.0], [0.0, 0.5, 0.0]],
        };
        let (u, v) = proj.to_vecs(DVec3::Z, 0.0, 1.0, 1.0);
        assert_eq!(u, DVec4::new(0.5, 0.0, 0.0, 0.0));
        assert_eq!(v, DVec4::new(0.0, 0.5, 0.0, 0.0));
    }
}
