//! Scenario A ("box-in-a-box"): a sealed hollow room built from six
//! wall brushes with one point entity inside. The whole geometry
//! phase must succeed with no leak and produce an interior, non-solid
//! leaf containing the entity.

use std::collections::HashMap;

use bsptree::{NodeContent, TreeConfig};
use compiler::cancel::CancelToken;
use compiler::config::GameProfile;
use face::FaceConfig;
use glam::DVec3;
use map::{Brush, BrushPlane, Entity, Map, Projection};

const HALF: f64 = 256.0;
const WALL: f64 = 16.0;

fn axial_box(mins: DVec3, maxs: DVec3) -> Brush {
    // Six outward-facing planes, CCW as seen from outside (Valve-220
    // projection), the same shape as the teacher's own `brush` crate
    // test fixture (`brush::brush::tests::cube_raw`), generalized to
    // take independent mins/maxs instead of a cube half-extent.
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

/// Six thin wall brushes bounding a hollow cube, matching
/// `portal::extractor`'s own `room_walls` test fixture shape.
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
    attrs
}

fn player_start_attrs() -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    attrs.insert("classname".to_string(), "info_player_start".to_string());
    attrs.insert("origin".to_string(), "0 0 0".to_string());
    attrs
}

#[test]
fn sealed_room_compiles_with_one_interior_leaf_and_no_leak() {
    let map = Map {
        tb_header: None,
        entities: vec![
            Entity { attributes: worldspawn_attrs(), brushes: Some(sealed_room()) },
            Entity { attributes: player_start_attrs(), brushes: None },
        ],
    };

    let path = std::env::temp_dir().join(format!("gchimp-compiler-test-{}.map", std::process::id()));
    map.write(path.to_str().unwrap()).expect("write temp .map");

    let profile = GameProfile::default();
    let tree_config = TreeConfig::default();
    let face_config = FaceConfig::default();
    let cancel = CancelToken::new();

    let result = compiler::compile_geometry(&path, &profile, &tree_config, &face_config, &cancel);
    let _ = std::fs::remove_file(&path);

    let output = result.expect("sealed room must compile without a leak");
    assert!(!output.bsp.leaves.is_empty());
    assert!(!output.bsp.faces.is_empty());

    let has_occupied_interior_leaf = output
        .tree
        .nodes
        .iter()
        .any(|n| matches!(&n.content, NodeContent::Leaf(leaf) if leaf.occupant.is_some() && !leaf.content_flags.contains(brush::ContentFlags::SOLID)));
    assert!(has_occupied_interior_leaf, "the entity's leaf must be a non-solid, occupied leaf");
}

#[test]
fn open_room_reports_a_leak() {
    let mut walls = sealed_room();
    walls.pop(); // drop the floor brush, punching a hole to the exterior

    let map = Map {
        tb_header: None,
        entities: vec![
            Entity { attributes: worldspawn_attrs(), brushes: Some(walls) },
            Entity { attributes: player_start_attrs(), brushes: None },
        ],
    };

    let path = std::env::temp_dir().join(format!("gchimp-compiler-test-leak-{}.map", std::process::id()));
    map.write(path.to_str().unwrap()).expect("write temp .map");

    let profile = GameProfile::default();
    let tree_config = TreeConfig::default();
    let face_config = FaceConfig::default();
    let cancel = CancelToken::new();

    let result = compiler::compile_geometry(&path, &profile, &tree_config, &face_config, &cancel);
    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(path.with_extension("pts"));

    match result {
        Err(compiler::error::CompileError::Portal(portal::PortalError::Leak { trail })) => {
            assert!(!trail.is_empty());
        }
        Ok(_) => panic!("an open room must be reported as a leak"),
        Err(other) => panic!("unexpected error: {other}"),
    }
}
