//! Game profile: texture-name → content-class rules (spec.md §4.2) and
//! the default dialect/epsilon knobs, loaded from a `toml` file the
//! same way the teacher's own `src/config.rs` loads `config.toml` next
//! to the binary.

use std::fs;
use std::path::{Path, PathBuf};

use brush::ContentFlags;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GameProfile {
    pub sky_texture: String,
    pub origin_texture: String,
    pub hint_texture: String,
    pub skip_texture: String,
    pub clip_texture: String,
    pub clip_hull1_texture: String,
    /// Prefix marking a water/slime/lava texture (GoldSrc's `!` liquid
    /// convention); the first matching suffix below picks which of
    /// the three it is.
    pub liquid_prefix: String,
    pub lava_infix: String,
    pub slime_infix: String,
    /// Dialect name resolved through [`format::dialect::by_name`].
    pub target_dialect: String,
    pub world_extent: f32,
    pub epsilon: f32,
}

impl Default for GameProfile {
    fn default() -> Self {
        Self {
            sky_texture: "sky".to_string(),
            origin_texture: "origin".to_string(),
            hint_texture: "hint".to_string(),
            skip_texture: "skip".to_string(),
            clip_texture: "clip".to_string(),
            clip_hull1_texture: "clipmonster".to_string(),
            liquid_prefix: "!".to_string(),
            lava_infix: "lava".to_string(),
            slime_infix: "slime".to_string(),
            target_dialect: "goldsrc".to_string(),
            world_extent: 131072.0,
            epsilon: geom::ON_EPSILON,
        }
    }
}

impl GameProfile {
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn load_or_default(path: Option<&Path>) -> eyre::Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            _ => Ok(Self::default()),
        }
    }

    /// Classifies a brush side's texture name into content bits
    /// (spec.md §4.2). Callers OR this across a brush's sides and add
    /// `SOLID` for anything that isn't purely cosmetic/clip.
    pub fn classify_texture(&self, name: &str) -> ContentFlags {
        let lower = name.to_ascii_lowercase();
        if lower == self.sky_texture {
            return ContentFlags::SKY;
        }
        if lower == self.origin_texture {
            return ContentFlags::ORIGIN;
        }
        if lower == self.hint_texture {
            return ContentFlags::HINT;
        }
        if lower == self.skip_texture {
            return ContentFlags::SKIP;
        }
        if lower == self.clip_texture {
            return ContentFlags::PLAYERCLIP;
        }
        if lower == self.clip_hull1_texture {
            return ContentFlags::MONSTERCLIP;
        }
        if let Some(rest) = lower.strip_prefix(&self.liquid_prefix) {
            if rest.contains(&self.lava_infix) {
                return ContentFlags::LAVA;
            }
            if rest.contains(&self.slime_infix) {
                return ContentFlags::SLIME;
            }
            return ContentFlags::WATER;
        }
        if lower.starts_with('{') {
            return ContentFlags::TRANSLUCENT | ContentFlags::SOLID;
        }
        ContentFlags::SOLID
    }
}

/// Resolves a game-profile file given on the CLI, falling back to
/// `gameconfig.toml` next to the binary, then built-in defaults.
pub fn resolve_profile_path(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| std::env::current_exe().ok().and_then(|p| p.parent().map(|d| d.join("gameconfig.toml"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sky_texture_classifies_as_sky() {
        let profile = GameProfile::default();
        assert_eq!(profile.classify_texture("SKY"), ContentFlags::SKY);
    }

    #[test]
    fn liquid_prefix_picks_lava_by_infix() {
        let profile = GameProfile::default();
        assert_eq!(profile.classify_texture("!lava1"), ContentFlags::LAVA);
        assert_eq!(profile.classify_texture("!water4"), ContentFlags::WATER);
    }

    #[test]
    fn ordinary_texture_is_solid() {
        let profile = GameProfile::default();
        assert_eq!(profile.classify_texture("wall01"), ContentFlags::SOLID);
    }
}
