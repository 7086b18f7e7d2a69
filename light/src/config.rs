use glam::Vec3;

/// Ambient-occlusion ("dirt") tunables (spec.md §4.8).
#[derive(Debug, Clone, Copy)]
pub struct DirtConfig {
    pub enabled: bool,
    /// Apply dirt to minlight too (`_minlight_dirt`).
    pub minlight_dirt: bool,
    pub depth: f32,
    pub scale: f32,
    pub gain: f32,
    /// Rays within this many degrees of grazing the surface are
    /// skipped (avoids self-shadowing noise at the horizon).
    pub angle_deg: f32,
    /// Hemisphere ray count; ericw-tools' default is ~162.
    pub rays: usize,
}

impl Default for DirtConfig {
    fn default() -> Self {
        Self { enabled: false, minlight_dirt: false, depth: 128.0, scale: 1.0, gain: 1.0, angle_deg: 88.0, rays: 162 }
    }
}

/// Single-bounce radiosity tunables (spec.md §4.8).
#[derive(Debug, Clone, Copy)]
pub struct BounceConfig {
    pub enabled: bool,
    /// Preserve the source style on bounced light rather than folding
    /// it into style 0 (`_bouncestyled`).
    pub styled: bool,
    pub scale: f32,
    /// Blends emitted color toward the worldspawn sunlight/minlight
    /// color as this approaches 1 (`_bouncecolorscale`).
    pub color_scale: f32,
    /// Sample patches per emitting face.
    pub patches_per_face: usize,
}

impl Default for BounceConfig {
    fn default() -> Self {
        Self { enabled: false, styled: false, scale: 1.0, color_scale: 0.0, patches_per_face: 1 }
    }
}

/// Light grid ("volumetric lightmap") tunables (spec.md §3, §4.8).
#[derive(Debug, Clone, Copy)]
pub struct LightGridConfig {
    pub grid_dist: Vec3,
    pub max_depth: u32,
    pub min_leaf_span: i32,
}

impl Default for LightGridConfig {
    fn default() -> Self {
        Self { grid_dist: Vec3::new(64.0, 64.0, 128.0), max_depth: 5, min_leaf_span: 4 }
    }
}

/// Every worldspawn-key/CLI tunable `light` needs (spec.md §4.8,
/// §6's CLI surface). One struct instead of threading a dozen scalars
/// through every function, matching how the teacher's `bsp::Bsp`
/// groups its own per-phase config (e.g. `TreeConfig`/`FaceConfig`
/// elsewhere in this workspace).
#[derive(Debug, Clone, Copy)]
pub struct LightConfig {
    pub on_epsilon: f32,
    /// World units per luxel; overridable per-texinfo by `_lmscale`,
    /// not modeled here (spec.md §4.8 "default 16").
    pub lightmapscale: f32,
    /// Implementation cap on one face's luxel rectangle (spec.md §4.8:
    /// "at least 256").
    pub max_dimension: usize,
    /// Supersampling factor: 1 (no `-extra`), 2 (`-extra`), 4 (`-extra4`).
    pub extra: u8,
    /// Cutoff brightness below which a light's contribution is ignored.
    pub gate: f32,
    pub scaledist: f32,
    pub rangescale: f32,
    pub global_anglescale: f32,
    pub lightmapgamma: f32,
    pub addminlight: bool,
    pub minlight: f32,
    pub minlight_color: Vec3,
    pub sunsamples: u32,
    pub dirt: DirtConfig,
    pub bounce: BounceConfig,
    pub light_grid: Option<LightGridConfig>,
    /// Start index for switchable-shadow light styles (spec.md §4.8,
    /// §9 "reserves indices 32..254").
    pub compilerstyle_start: u8,
    pub phong_default_angle: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            on_epsilon: geom::ON_EPSILON,
            lightmapscale: 16.0,
            max_dimension: 256,
            extra: 1,
            gate: geom::EQUAL_EPSILON,
            scaledist: 1.0,
            rangescale: 0.5,
            global_anglescale: 0.5,
            lightmapgamma: 1.0,
            addminlight: false,
            minlight: 0.0,
            minlight_color: Vec3::splat(255.0),
            sunsamples: 64,
            dirt: DirtConfig::default(),
            bounce: BounceConfig::default(),
            light_grid: None,
            compilerstyle_start: 32,
            phong_default_angle: 89.0,
        }
    }
}
