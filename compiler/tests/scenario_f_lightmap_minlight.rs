//! Scenario F ("lightmap minlight"): an otherwise-unlit sealed room
//! with worldspawn `_minlight=32 _minlight_color=255 0 0`. Every luxel
//! must come out (32,0,0) within ±1, and no face should pick up a
//! switchable style beyond slot 0 (there are no light entities to emit
//! one).

use std::collections::HashMap;

use compiler::cancel::CancelToken;
use compiler::config::GameProfile;
use face::FaceConfig;
use glam::DVec3;
use light::config::LightConfig;
use map::{Brush, BrushPlane, Entity, Map, Projection};
use vis::VisConfig;

const HALF: f64 = 256.0;
const WALL: f64 = 16.0;

fn axial_box(mins: DVec3, maxs: DVec3) -> Brush {
    let faces: [(DVec3, DVec3, DVec3); 6] = [
        (DVec3::new(maxs.x, mins.y, mins.z), DVec3::new(maxs.x, maxs.y, mins.z), DVec3::new(maxs.x, maxs.y, maxs.z)),
        (DVec3::new(mins.x, maxs.y, mins.z), DVec3::new(mins.x, mins.y, mins.z), DVec3::new(mins.x, mins.y, maxs.z)),
        (DVec3::new(mins.x, maxs.y, mins.z), DVec3::new(maxs.x, maxs.y, mins.z), DVec3::new(maxs.x, maxs.y, maxs.z)),
        (DVec3::new(maxs.x, mins.y, mins.z), DVec3::new(mins.x, mins.y, mins.z), DVec3::new(mins.x, mins.y, maxs.z)),
        (DVec3::new(mins.x, mins.y, maxs.z), DVec3::new(maxs.x, mins.y, maxs.z), DVec3::new(maxs.x, maxs.y, maxs.z)),
        (DVec3::new(maxs.x, mins.y, mins.z), DVec3::new(mins.x, mins.y, mins.z), DVec3::new(mins.x, maxs.y, mins.z)),
    ];

    let planes = faces
        .into_iter()
        .map(|(p1, p2, p3)| BrushPlane {
            p1,
            p2,
            p3,
            texture_name: "wall01".to_string(),
            u: glam::DVec4::new(1.0, 0.0, 0.0, 0.0),
            v: glam::DVec4::new(0.0, 1.0, 0.0, 0.0),
            rotation: 0.0,
            u_scale: 1.0,
            v_scale: 1.0,
            projection: Projection::Valve220,
        })
        .collect();

    Brush { planes }
}

fn sealed_room() -> Vec<Brush> {
    let h = HALF;
    let w = WALL;
    let specs = [
        (DVec3::new(h - w, -h, -h), DVec3::new(h, h, h)),
        (DVec3::new(-h, -h, -h), DVec3::new(-h + w, h, h)),
        (DVec3::new(-h, h - w, -h), DVec3::new(h, h, h)),
        (DVec3::new(-h, -h, -h), DVec3::new(h, -h + w, h)),
        (DVec3::new(-h, -h, h - w), DVec3::new(h, h, h)),
        (DVec3::new(-h, -h, -h), DVec3::new(h, h, -h + w)),
    ];
    specs.into_iter().map(|(mins, maxs)| axial_box(mins, maxs)).collect()
}

fn worldspawn_attrs() -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    attrs.insert("classname".to_string(), "worldspawn".to_string());
    attrs.insert("_minlight".to_string(), "32".to_string());
    attrs.insert("_minlight_color".to_string(), "255 0 0".to_string());
    attrs
}

fn player_start_attrs() -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    attrs.insert("classname".to_string(), "info_player_start".to_string());
    attrs.insert("origin".to_string(), "0 0 0".to_string());
    attrs
}

#[test]
fn unlit_room_with_minlight_bakes_flat_red_everywhere() {
    let map = Map {
        tb_header: None,
        entities: vec![
            Entity { attributes: worldspawn_attrs(), brushes: Some(sealed_room()) },
            Entity { attributes: player_start_attrs(), brushes: None },
        ],
    };

    let path = std::env::temp_dir().join(format!("gchimp-compiler-test-minlight-{}.map", std::process::id()));
    map.write(path.to_str().unwrap()).expect("write temp .map");

    let profile = GameProfile::default();
    let tree_config = bsptree::TreeConfig::default();
    let face_config = FaceConfig::default();
    let cancel = CancelToken::new();

    let geometry = compiler::compile_geometry(&path, &profile, &tree_config, &face_config, &cancel);
    let _ = std::fs::remove_file(&path);
    let mut bsp = geometry.expect("sealed room must compile without a leak").bsp;

    let vis_config = VisConfig::default();
    compiler::compile_vis(&mut bsp, &vis_config, vis_config.on_epsilon, &cancel).expect("vis must succeed on a sealed room");

    let light_config = LightConfig::default();
    compiler::compile_light(&mut bsp, &light_config, &cancel).expect("light must succeed with only a worldspawn minlight key");

    let mut checked_any_luxel = false;
    for face in &bsp.faces {
        if face.lightmap_offset < 0 {
            continue;
        }
        assert_eq!(face.styles[0], 0, "the only light present is ambient minlight, which always lands in style slot 0");
        for &style in &face.styles[1..] {
            assert_eq!(style, 255, "no light entity exists to emit a second switchable style");
        }

        let remaining = bsp.lightmap.len() - face.lightmap_offset as usize;
        let luxel_count = remaining.min(16);
        for i in 0..luxel_count {
            let [r, g, b] = bsp.lightmap[face.lightmap_offset as usize + i];
            assert!(r.abs_diff(32) <= 1, "red channel must be minlight's 32, got {r}");
            assert!(g.abs_diff(0) <= 1, "green channel must be 0, got {g}");
            assert!(b.abs_diff(0) <= 1, "blue channel must be 0, got {b}");
            checked_any_luxel = true;
        }
    }
    assert!(checked_any_luxel, "at least one face must carry lightmap data to check");
}
