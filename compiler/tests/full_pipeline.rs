//! Runs all three compile phases in one process against the sealed-room
//! fixture: `compile_geometry` followed by `compile_vis` and
//! `compile_light` on the `Bsp` it produced, the way a single `gchimp`
//! invocation chaining all three tools would (spec.md §2's full
//! pipeline, as opposed to `scenario_a_sealed_room.rs`'s geometry-only
//! coverage).

use std::collections::HashMap;

use bsptree::TreeConfig;
use compiler::cancel::CancelToken;
use compiler::config::GameProfile;
use face::FaceConfig;
use glam::{DVec3, DVec4};
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
            u: DVec4::new(1.0, 0.0, 0.0, 0.0),
            v: DVec4::new(0.0, 1.0, 0.0, 0.0),
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
    attrs.insert("light".to_string(), "300".to_string());
    attrs
}

fn light_attrs() -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    attrs.insert("classname".to_string(), "light".to_string());
    attrs.insert("origin".to_string(), "0 0 100".to_string());
    attrs.insert("light".to_string(), "300".to_string());
    attrs
}

#[test]
fn geometry_vis_and_light_chain_end_to_end() {
    let map = Map {
        tb_header: None,
        entities: vec![
            Entity { attributes: worldspawn_attrs(), brushes: Some(sealed_room()) },
            Entity { attributes: light_attrs(), brushes: None },
        ],
    };

    let path = std::env::temp_dir().join(format!("gchimp-compiler-test-pipeline-{}.map", std::process::id()));
    map.write(path.to_str().unwrap()).expect("write temp .map");

    let profile = GameProfile::default();
    let tree_config = TreeConfig::default();
    let face_config = FaceConfig::default();
    let cancel = CancelToken::new();

    let geometry = compiler::compile_geometry(&path, &profile, &tree_config, &face_config, &cancel);
    let _ = std::fs::remove_file(&path);
    let mut bsp = geometry.expect("sealed room must compile without a leak").bsp;

    let vis_config = VisConfig::default();
    compiler::compile_vis(&mut bsp, &vis_config, vis_config.on_epsilon, &cancel).expect("vis must succeed on a sealed room");
    assert!(!bsp.visibility.is_empty(), "a multi-leaf sealed room must produce non-empty visdata");

    let light_config = LightConfig::default();
    compiler::compile_light(&mut bsp, &light_config, &cancel).expect("light must succeed");
    assert!(!bsp.lightmap.is_empty(), "a lit, faced bsp must produce non-empty lightmap data");
    assert!(bsp.faces.iter().any(|f| f.lightmap_offset >= 0), "at least one face should have received a lightmap offset");
}
