//! Scenario C ("water sub-brush"): a sealed room with a water brush
//! filling the bottom half. The room must still compile without a
//! leak (a liquid volume seals the flood same as solid does), and the
//! output tree must end up with leaves on both sides of the water
//! plane: one classified WATER, one ordinary open air.

use std::collections::HashMap;

use bsptree::NodeContent;
use compiler::cancel::CancelToken;
use compiler::config::GameProfile;
use face::FaceConfig;
use glam::DVec3;
use map::{Brush, BrushPlane, Entity, Map, Projection};

const HALF: f64 = 256.0;
const WALL: f64 = 16.0;

fn axial_box(mins: DVec3, maxs: DVec3, texture_name: &str) -> Brush {
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
            texture_name: texture_name.to_string(),
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

/// Six thin wall brushes bounding a hollow cube, same shape as
/// `scenario_a_sealed_room`'s fixture, plus a water brush filling the
/// lower half of the interior.
fn sealed_room_with_water() -> Vec<Brush> {
    let h = HALF;
    let w = WALL;
    let wall_specs = [
        (DVec3::new(h - w, -h, -h), DVec3::new(h, h, h)),
        (DVec3::new(-h, -h, -h), DVec3::new(-h + w, h, h)),
        (DVec3::new(-h, h - w, -h), DVec3::new(h, h, h)),
        (DVec3::new(-h, -h, -h), DVec3::new(h, -h + w, h)),
        (DVec3::new(-h, -h, h - w), DVec3::new(h, h, h)),
        (DVec3::new(-h, -h, -h), DVec3::new(h, h, -h + w)),
    ];
    let mut brushes: Vec<Brush> =
        wall_specs.into_iter().map(|(mins, maxs)| axial_box(mins, maxs, "wall01")).collect();

    brushes.push(axial_box(
        DVec3::new(-h + w, -h + w, -h + w),
        DVec3::new(h - w, h - w, 0.0),
        "!water1",
    ));

    brushes
}

fn worldspawn_attrs() -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    attrs.insert("classname".to_string(), "worldspawn".to_string());
    attrs
}

fn player_start_attrs() -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    attrs.insert("classname".to_string(), "info_player_start".to_string());
    attrs.insert("origin".to_string(), "0 0 100".to_string());
    attrs
}

#[test]
fn water_sub_brush_compiles_without_a_leak_and_keeps_both_sides_distinct() {
    let map = Map {
        tb_header: None,
        entities: vec![
            Entity { attributes: worldspawn_attrs(), brushes: Some(sealed_room_with_water()) },
            Entity { attributes: player_start_attrs(), brushes: None },
        ],
    };

    let path = std::env::temp_dir().join(format!("gchimp-compiler-test-water-{}.map", std::process::id()));
    map.write(path.to_str().unwrap()).expect("write temp .map");

    let profile = GameProfile::default();
    let tree_config = bsptree::TreeConfig::default();
    let face_config = FaceConfig::default();
    let cancel = CancelToken::new();

    let result = compiler::compile_geometry(&path, &profile, &tree_config, &face_config, &cancel);
    let _ = std::fs::remove_file(&path);

    let output = result.expect("a water volume must seal the flood the same as solid geometry");

    let has_water_leaf = output.tree.nodes.iter().any(|n| {
        matches!(&n.content, NodeContent::Leaf(leaf) if leaf.content_flags.contains(brush::ContentFlags::WATER))
    });
    assert!(has_water_leaf, "the lower-half sub-brush must produce a leaf classified WATER");

    let has_open_air_leaf = output.tree.nodes.iter().any(|n| {
        matches!(&n.content, NodeContent::Leaf(leaf) if leaf.content_flags.is_empty())
    });
    assert!(has_open_air_leaf, "the upper half above the water surface must stay ordinary open air");
}
