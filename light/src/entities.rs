//! Reads light entities and worldspawn lighting keys out of the
//! parsed entity dictionaries the geometry compiler already wrote into
//! `format::generic::Bsp::entities` (spec.md §1 treats `.map`
//! key/value parsing as an external collaborator; by the time `light`
//! runs, entities are already a `Vec<HashMap<String, String>>`).

use format::generic::Entity;
use glam::Vec3;

/// Attenuation formula selected by a light's `delay` key (spec.md
/// §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attenuation {
    Linear,
    InverseDistance,
    InverseSquare,
    NoAttenuation,
    LocalMinlight,
}

impl Attenuation {
    fn from_delay(delay: i32) -> Self {
        match delay {
            1 => Attenuation::InverseDistance,
            2 => Attenuation::InverseSquare,
            3 => Attenuation::NoAttenuation,
            4 => Attenuation::LocalMinlight,
            _ => Attenuation::Linear,
        }
    }

    /// Fraction of `intensity` reaching `dist`, before the `/256`
    /// engine-side scale and shadow/channel tests (spec.md §4.8).
    pub fn falloff(self, dist: f32, range: f32) -> f32 {
        match self {
            Attenuation::Linear => (1.0 - dist / range.max(1.0)).max(0.0),
            Attenuation::InverseDistance => 1.0 / dist.max(1.0),
            Attenuation::InverseSquare => 1.0 / (dist * dist).max(1.0),
            Attenuation::NoAttenuation => 1.0,
            Attenuation::LocalMinlight => {
                if dist <= range {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LightEntity {
    pub origin: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    pub atten: Attenuation,
    pub range: f32,
    pub style: u8,
    pub shape: LightShapeData,
    pub dirt_override: Option<bool>,
}

/// `LightShape` without the const-generic baggage of storing direction
/// as a plain field (kept separate so `LightEntity` stays `Copy`).
#[derive(Debug, Clone, Copy)]
pub enum LightShapeData {
    Point,
    Spot { direction: Vec3, cos_inner: f32, cos_outer: f32 },
}

fn get_str<'a>(e: &'a Entity, key: &str) -> Option<&'a str> {
    e.get(key).map(String::as_str)
}

fn get_f32(e: &Entity, key: &str) -> Option<f32> {
    get_str(e, key).and_then(|s| s.trim().parse::<f32>().ok())
}

fn get_i32(e: &Entity, key: &str) -> Option<i32> {
    get_str(e, key).and_then(|s| s.trim().parse::<i32>().ok())
}

fn get_bool(e: &Entity, key: &str) -> Option<bool> {
    get_f32(e, key).map(|v| v != 0.0)
}

/// Parses a `"r g b"` or `"r g b intensity"` color/light key. A bare
/// scalar (`"300"`) is treated as white at that intensity, matching
/// the original toolchain's `_color`/`light` key overload.
fn get_color(e: &Entity, key: &str) -> Option<Vec3> {
    let s = get_str(e, key)?;
    let parts: Vec<f32> = s.split_whitespace().filter_map(|t| t.parse::<f32>().ok()).collect();
    match parts.len() {
        1 => Some(Vec3::splat(255.0)),
        3 => Some(Vec3::new(parts[0], parts[1], parts[2])),
        4 => Some(Vec3::new(parts[0], parts[1], parts[2]) * (parts[3] / 255.0).max(0.0)),
        _ => None,
    }
}

fn get_vec3(e: &Entity, key: &str) -> Option<Vec3> {
    let s = get_str(e, key)?;
    let parts: Vec<f32> = s.split_whitespace().filter_map(|t| t.parse::<f32>().ok()).collect();
    if parts.len() == 3 {
        Some(Vec3::new(parts[0], parts[1], parts[2]))
    } else {
        None
    }
}

/// Converts a `"pitch yaw roll"` mangle key into a direction vector
/// (pitch positive = up, matching the `sun_mangle`/`_mangle` convention
/// spec.md §4.8 references).
fn mangle_to_vec(mangle: Vec3) -> Vec3 {
    let (pitch, yaw) = (mangle.x.to_radians(), mangle.y.to_radians());
    Vec3::new(yaw.cos() * pitch.cos(), yaw.sin() * pitch.cos(), pitch.sin())
}

pub fn parse_lights(entities: &[Entity]) -> Vec<LightEntity> {
    entities
        .iter()
        .filter(|e| matches!(get_str(e, "classname"), Some("light") | Some("light_spot")))
        .filter_map(|e| {
            let origin = get_vec3(e, "origin").unwrap_or(Vec3::ZERO);
            let color = get_color(e, "_color").or_else(|| get_color(e, "color")).unwrap_or(Vec3::splat(255.0));
            let intensity = get_f32(e, "light").or_else(|| get_f32(e, "_light")).unwrap_or(300.0);
            if intensity.abs() < f32::EPSILON {
                return None;
            }
            let atten = Attenuation::from_delay(get_i32(e, "delay").unwrap_or(0));
            let range = get_f32(e, "wait").map(|w| intensity * w).unwrap_or(intensity);
            let style = get_i32(e, "style").unwrap_or(0).clamp(0, 254) as u8;
            let dirt_override = get_bool(e, "_dirt");

            let shape = if get_str(e, "classname") == Some("light_spot") {
                let target_angle = get_f32(e, "angle").unwrap_or(40.0).to_radians();
                let direction = get_vec3(e, "mangle")
                    .map(mangle_to_vec)
                    .or_else(|| get_f32(e, "_sky").map(|_| Vec3::NEG_Z))
                    .unwrap_or(Vec3::NEG_Z);
                let cone_inner = (get_f32(e, "_cone") .unwrap_or(target_angle.to_degrees() * 0.5)).to_radians();
                LightShapeData::Spot { direction, cos_inner: cone_inner.cos(), cos_outer: target_angle.cos() }
            } else {
                LightShapeData::Point
            };

            Some(LightEntity {
                origin,
                color,
                intensity,
                atten,
                range,
                style,
                shape,
                dirt_override,
            })
        })
        .collect()
}

/// A directional sun, one of up to four the worldspawn keys can
/// describe (`sunlight`/`sun2`/`sunlight2`/`sunlight3`; spec.md §4.8).
#[derive(Debug, Clone, Copy)]
pub struct SunLight {
    pub sunvec: Vec3,
    pub sunlight: f32,
    pub color: Vec3,
    pub dirt: bool,
    pub anglescale: f32,
    pub style: u8,
    /// `true` for the `sunlight2`/`sunlight3` sky-dome terms, which are
    /// sampled over a hemisphere rather than traced as one ray
    /// (spec.md §4.8).
    pub dome: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct WorldspawnKeys {
    pub scaledist: f32,
    pub rangescale: f32,
    pub global_anglescale: f32,
    pub lightmapgamma: f32,
    pub addminlight: bool,
    pub minlight: f32,
    pub minlight_color: Vec3,
    pub compilerstyle_start: u8,
    pub global_dirt: bool,
    pub dirt_depth: f32,
    pub dirt_scale: f32,
    pub dirt_gain: f32,
    pub dirt_angle: f32,
    pub minlight_dirt: bool,
    pub phong_allowed: bool,
    pub phong_angle: f32,
    pub bounce: bool,
    pub bouncestyled: bool,
    pub bouncescale: f32,
    pub bouncecolorscale: f32,
}

impl Default for WorldspawnKeys {
    fn default() -> Self {
        Self {
            scaledist: 1.0,
            rangescale: 0.5,
            global_anglescale: 0.5,
            lightmapgamma: 1.0,
            addminlight: false,
            minlight: 0.0,
            minlight_color: Vec3::splat(255.0),
            compilerstyle_start: 32,
            global_dirt: false,
            dirt_depth: 128.0,
            dirt_scale: 1.0,
            dirt_gain: 1.0,
            dirt_angle: 88.0,
            minlight_dirt: false,
            phong_allowed: true,
            phong_angle: 0.0,
            bounce: false,
            bouncestyled: false,
            bouncescale: 1.0,
            bouncecolorscale: 0.0,
        }
    }
}

fn worldspawn(entities: &[Entity]) -> Option<&Entity> {
    entities.iter().find(|e| get_str(e, "classname") == Some("worldspawn"))
}

pub fn parse_worldspawn_keys(entities: &[Entity]) -> WorldspawnKeys {
    let mut keys = WorldspawnKeys::default();
    let Some(e) = worldspawn(entities) else { return keys };

    if let Some(v) = get_f32(e, "_dist") {
        keys.scaledist = v;
    }
    if let Some(v) = get_f32(e, "_range") {
        keys.rangescale = v;
    }
    if let Some(v) = get_f32(e, "_anglescale").or_else(|| get_f32(e, "_anglesense")) {
        keys.global_anglescale = v;
    }
    if let Some(v) = get_f32(e, "_gamma") {
        keys.lightmapgamma = v;
    }
    keys.addminlight = get_bool(e, "_addmin").unwrap_or(false);
    if let Some(v) = get_f32(e, "light").or_else(|| get_f32(e, "_minlight")) {
        keys.minlight = v;
    }
    if let Some(v) = get_color(e, "_minlight_color").or_else(|| get_color(e, "_mincolor")) {
        keys.minlight_color = v;
    }
    if let Some(v) = get_i32(e, "_compilerstyle_start") {
        keys.compilerstyle_start = v.clamp(0, 254) as u8;
    }
    keys.global_dirt = get_bool(e, "_dirt").or_else(|| get_bool(e, "_dirty")).unwrap_or(false);
    if let Some(v) = get_f32(e, "_dirtdepth") {
        keys.dirt_depth = v;
    }
    if let Some(v) = get_f32(e, "_dirtscale") {
        keys.dirt_scale = v;
    }
    if let Some(v) = get_f32(e, "_dirtgain") {
        keys.dirt_gain = v;
    }
    if let Some(v) = get_f32(e, "_dirtangle") {
        keys.dirt_angle = v;
    }
    keys.minlight_dirt = get_bool(e, "_minlight_dirt").unwrap_or(false);
    keys.phong_allowed = get_bool(e, "_phong").unwrap_or(true);
    if let Some(v) = get_f32(e, "_phong_angle") {
        keys.phong_angle = v;
    }
    keys.bounce = get_bool(e, "_bounce").unwrap_or(false);
    keys.bouncestyled = get_bool(e, "_bouncestyled").unwrap_or(false);
    if let Some(v) = get_f32(e, "_bouncescale") {
        keys.bouncescale = v;
    }
    if let Some(v) = get_f32(e, "_bouncecolorscale") {
        keys.bouncecolorscale = v;
    }
    keys
}

/// Parses the up-to-four directional/sky-dome suns out of worldspawn
/// (spec.md §4.8's "one or more directional suns + sky-dome").
pub fn parse_suns(entities: &[Entity]) -> Vec<SunLight> {
    let Some(e) = worldspawn(entities) else { return Vec::new() };
    let mut suns = Vec::new();

    if let Some(sunlight) = get_f32(e, "_sunlight").or_else(|| get_f32(e, "_sun_light")) {
        if sunlight.abs() > f32::EPSILON {
            let mangle = get_vec3(e, "_sunlight_mangle")
                .or_else(|| get_vec3(e, "_sun_mangle"))
                .or_else(|| get_vec3(e, "_sun_angle"))
                .unwrap_or(Vec3::new(-90.0, 0.0, 0.0));
            suns.push(SunLight {
                sunvec: mangle_to_vec(mangle).normalize_or_zero(),
                sunlight,
                color: get_color(e, "_sunlight_color").or_else(|| get_color(e, "_sun_color")).unwrap_or(Vec3::splat(255.0)),
                dirt: get_bool(e, "_sunlight_dirt").unwrap_or(false),
                anglescale: get_f32(e, "_anglescale").unwrap_or(0.5),
                style: 0,
                dome: false,
            });
        }
    }
    if let Some(sun2) = get_f32(e, "_sun2") {
        if sun2.abs() > f32::EPSILON {
            let mangle = get_vec3(e, "_sun2_mangle").unwrap_or(Vec3::new(-90.0, 0.0, 0.0));
            suns.push(SunLight {
                sunvec: mangle_to_vec(mangle).normalize_or_zero(),
                sunlight: sun2,
                color: get_color(e, "_sun2_color").unwrap_or(Vec3::splat(255.0)),
                dirt: false,
                anglescale: 0.5,
                style: 0,
                dome: false,
            });
        }
    }
    if let Some(top) = get_f32(e, "_sunlight2") {
        if top.abs() > f32::EPSILON {
            suns.push(SunLight {
                sunvec: Vec3::Z,
                sunlight: top,
                color: get_color(e, "_sunlight2_color").or_else(|| get_color(e, "_sunlight_color2")).unwrap_or(Vec3::splat(255.0)),
                dirt: get_bool(e, "_sunlight2_dirt").unwrap_or(false),
                anglescale: 0.5,
                style: 0,
                dome: true,
            });
        }
    }
    if let Some(bottom) = get_f32(e, "_sunlight3") {
        if bottom.abs() > f32::EPSILON {
            suns.push(SunLight {
                sunvec: Vec3::NEG_Z,
                sunlight: bottom,
                color: get_color(e, "_sunlight3_color").or_else(|| get_color(e, "_sunlight_color3")).unwrap_or(Vec3::splat(255.0)),
                dirt: false,
                anglescale: 0.5,
                style: 0,
                dome: true,
            });
        }
    }
    suns
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn entity(pairs: &[(&str, &str)]) -> Entity {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>()
    }

    #[test]
    fn parses_point_light_intensity_and_color() {
        let entities = vec![entity(&[("classname", "light"), ("origin", "0 0 64"), ("light", "200"), ("_color", "1 0.5 0")])];
        let lights = parse_lights(&entities);
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].intensity, 200.0);
        assert_eq!(lights[0].origin, Vec3::new(0.0, 0.0, 64.0));
    }

    #[test]
    fn zero_intensity_light_is_dropped() {
        let entities = vec![entity(&[("classname", "light"), ("light", "0")])];
        assert!(parse_lights(&entities).is_empty());
    }

    #[test]
    fn worldspawn_minlight_defaults_to_white() {
        let entities = vec![entity(&[("classname", "worldspawn"), ("_minlight", "32")])];
        let keys = parse_worldspawn_keys(&entities);
        assert_eq!(keys.minlight, 32.0);
        assert_eq!(keys.minlight_color, Vec3::splat(255.0));
    }

    #[test]
    fn sunlight_mangle_straight_down_points_negative_z() {
        let entities = vec![entity(&[("classname", "worldspawn"), ("_sunlight", "100")])];
        let suns = parse_suns(&entities);
        assert_eq!(suns.len(), 1);
        assert!(suns[0].sunvec.z < -0.99);
    }
}
