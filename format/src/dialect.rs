//! On-disk binary dialects (spec.md §4.9): each [`Dialect`] encodes and
//! decodes the neutral [`generic::Bsp`] to a specific byte layout.
//! [`GoldSrc`] ports the teacher `bsp` crate's own `parser.rs`/
//! `writer.rs` lump-by-lump, generalized to read/write `generic::Bsp`
//! instead of its own hard-coded `types::Bsp`. [`Quake`] narrows the
//! same lump layout to BSP29 (version 29); it keeps the teacher's
//! embedded-per-texture-palette miptex convention rather than Quake's
//! original external `gfx/palette.lmp`, since `wad` only implements
//! the embedded form (recorded as an Open Question decision).

use brush::ContentFlags;
use byte_writer::ByteWriter;
use glam::Vec3;
use nom::{
    combinator::all_consuming,
    multi::{count, many0},
    number::complete::{le_f32, le_i16, le_i32, le_u16, le_u32, le_u8},
    sequence::tuple,
    IResult as NomIResult,
};
use wad::parse_miptex;

use crate::constants::*;
use crate::error::FormatError;
use crate::generic::{self, Bsp};
use crate::utils::between_braces;

type BResult<'a, T> = NomIResult<&'a [u8], T>;

/// Encodes/decodes a [`generic::Bsp`] to one specific on-disk byte
/// layout, narrowing/widening index widths as needed.
pub trait Dialect {
    fn name(&self) -> &'static str;
    fn version(&self) -> i32;
    fn encode(&self, bsp: &Bsp) -> Result<Vec<u8>, FormatError>;
    fn decode(&self, bytes: &[u8]) -> Result<Bsp, FormatError>;
}

pub struct GoldSrc;
pub struct Quake;

fn overflow_i16(dialect: &'static str, field: &'static str, v: i32) -> Result<i16, FormatError> {
    i16::try_from(v).map_err(|_| FormatError::DialectOverflow { dialect, field, value: v as i64, limit: 16 })
}

fn overflow_u16(dialect: &'static str, field: &'static str, v: u32) -> Result<u16, FormatError> {
    u16::try_from(v).map_err(|_| FormatError::DialectOverflow { dialect, field, value: v as i64, limit: 16 })
}

/// GoldSrc/Quake legacy `CONTENTS_*` enum, narrowed from the
/// workspace's OR-able [`ContentFlags`] bitset (spec.md §4.9). A
/// cluster carrying bits with no single legacy equivalent (more than
/// one of SOLID/WATER/SLIME/LAVA/SKY) picks the first match in
/// priority order, the same "dominant content wins" rule the teacher's
/// compiled output always satisfies post-CSG.
fn contents_to_legacy(c: ContentFlags) -> i32 {
    if c.contains(ContentFlags::SOLID) {
        -2
    } else if c.contains(ContentFlags::SKY) {
        -6
    } else if c.contains(ContentFlags::LAVA) {
        -5
    } else if c.contains(ContentFlags::SLIME) {
        -4
    } else if c.contains(ContentFlags::WATER) {
        -3
    } else if c.contains(ContentFlags::ORIGIN) {
        -7
    } else if c.contains(ContentFlags::PLAYERCLIP) || c.contains(ContentFlags::MONSTERCLIP) {
        -8
    } else if c.contains(ContentFlags::TRANSLUCENT) {
        -15
    } else {
        -1
    }
}

fn legacy_to_contents(v: i32) -> ContentFlags {
    match v {
        -2 => ContentFlags::SOLID,
        -3 => ContentFlags::WATER,
        -4 => ContentFlags::SLIME,
        -5 => ContentFlags::LAVA,
        -6 => ContentFlags::SKY,
        -7 => ContentFlags::ORIGIN,
        -8 => ContentFlags::PLAYERCLIP,
        -15 => ContentFlags::TRANSLUCENT,
        _ => ContentFlags::empty(),
    }
}

fn parse_entities_lump(i: &[u8]) -> Result<Vec<generic::Entity>, FormatError> {
    let s = String::from_utf8_lossy(i).replace(std::char::REPLACEMENT_CHARACTER, "");
    let (_, list) = all_consuming(many0(between_braces(parse_entity_block)))(s.as_str()).map_err(|_| FormatError::ParseEntities)?;
    Ok(list)
}

fn parse_entity_block(i: &str) -> crate::utils::SResult<generic::Entity> {
    use nom::{character::complete::multispace0, multi::many0 as nmany0, sequence::delimited};
    let parser = |i| delimited(multispace0, crate::utils::quoted_text, multispace0)(i);
    let (i, list) = all_consuming(nmany0(tuple((parser, parser))))(i)?;
    Ok((i, list.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()))
}

fn write_entities_lump(entities: &[generic::Entity]) -> Vec<u8> {
    let mut s = String::new();
    for e in entities {
        s += "{\n";
        for (k, v) in e {
            s += &format!("\"{k}\" \"{v}\"\n");
        }
        s += "}\n";
    }
    let mut bytes = s.into_bytes();
    bytes.push(0);
    bytes
}

fn parse_lump_header(i: &[u8]) -> BResult<(i32, i32)> {
    tuple((le_i32, le_i32))(i)
}

/// Shared lump-table walk: decodes the 15-entry header and hands each
/// lump's byte slice to `f`.
fn decode_common(dialect_name: &'static str, expected_version: i32, bytes: &[u8]) -> Result<Bsp, FormatError> {
    let (beginning, version) = le_i32::<_, nom::error::Error<&[u8]>>(bytes).map_err(|_| FormatError::NomParsingError)?;
    if version != expected_version {
        return Err(FormatError::BspVersion { version, expected: expected_version, dialect: dialect_name });
    }
    let (_, lumps) = count(parse_lump_header, HEADER_LUMPS)(beginning).map_err(|_| FormatError::NomParsingError)?;
    let lump = |idx: usize| -> &[u8] {
        let (offset, length) = lumps[idx];
        &bytes[(offset as usize)..((offset + length) as usize)]
    };

    let entities = parse_entities_lump(lump(LUMP_ENTITIES))?;

    let (_, planes) = all_consuming(many0(nom::combinator::map(tuple((le_f32, le_f32, le_f32, le_f32, le_i32)), |(x, y, z, dist, _kind)| {
        generic::Plane { normal: Vec3::new(x, y, z), dist }
    })))(lump(LUMP_PLANES))
    .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| FormatError::ParsePlanes)?;

    let textures = {
        let tex_lump = lump(LUMP_TEXTURES);
        let (header, tex_count) = le_u32::<_, nom::error::Error<&[u8]>>(tex_lump).map_err(|_| FormatError::ParseTextures)?;
        let (_, offsets) = count(le_i32::<_, nom::error::Error<&[u8]>>, tex_count as usize)(header).map_err(|_| FormatError::ParseTextures)?;
        let mut textures = Vec::with_capacity(offsets.len());
        for offset in offsets {
            if offset == -1 {
                textures.push(wad::utils::create_blue_miptex(16, 16, "{BLUE"));
                continue;
            }
            let (_, tex) = parse_miptex(&tex_lump[(offset as usize)..]).map_err(|_| FormatError::ParseTextures)?;
            textures.push(tex);
        }
        textures
    };

    let (_, vertices) = all_consuming(many0(nom::combinator::map(tuple((le_f32, le_f32, le_f32)), |(x, y, z)| Vec3::new(x, y, z))))(lump(LUMP_VERTICES))
        .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| FormatError::ParseVertices)?;

    let visibility = lump(LUMP_VISIBILITY).to_vec();

    let (_, nodes) = all_consuming(many0(nom::combinator::map(
        tuple((le_u32, le_i16, le_i16, count(le_i16, 3), count(le_i16, 3), le_u16, le_u16)),
        |(plane, c0, c1, mins, maxs, first_face, face_count)| generic::Node {
            plane,
            children: [c0 as i32, c1 as i32],
            mins: [mins[0] as f32, mins[1] as f32, mins[2] as f32],
            maxs: [maxs[0] as f32, maxs[1] as f32, maxs[2] as f32],
            first_face: first_face as u32,
            face_count: face_count as u32,
        },
    )))(lump(LUMP_NODES))
    .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| FormatError::ParseNodes)?;

    let (_, texinfo) = all_consuming(many0(nom::combinator::map(
        tuple((count(le_f32, 3), le_f32, count(le_f32, 3), le_f32, le_u32, le_u32)),
        |(u, uo, v, vo, texture_index, flags)| generic::TexInfo {
            u: glam::Vec4::new(u[0], u[1], u[2], uo),
            v: glam::Vec4::new(v[0], v[1], v[2], vo),
            texture_index,
            flags,
        },
    )))(lump(LUMP_TEXINFO))
    .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| FormatError::ParseTexInfo)?;

    let (_, faces) = all_consuming(many0(nom::combinator::map(
        tuple((le_u16, le_u16, le_i32, le_u16, le_u16, count(le_u8, 4), le_i32)),
        |(plane, side, first_edge, edge_count, texinfo, styles, lightmap_offset)| generic::Face {
            plane: plane as u32,
            side: side as u8,
            first_edge,
            edge_count: edge_count as u32,
            texinfo: texinfo as u32,
            styles: [styles[0], styles[1], styles[2], styles[3]],
            lightmap_offset,
        },
    )))(lump(LUMP_FACES))
    .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| FormatError::ParseFaces)?;

    let light_lump = lump(LUMP_LIGHTING);
    let lightmap = if light_lump.len() < 3 {
        Vec::new()
    } else {
        all_consuming(many0(nom::combinator::map(count(le_u8, 3), |c| [c[0], c[1], c[2]])))(light_lump)
            .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| FormatError::ParseLightmap)?
            .1
    };

    let (_, clipnodes) = all_consuming(many0(nom::combinator::map(tuple((le_i32, le_i16, le_i16)), |(plane, c0, c1)| generic::ClipNode {
        plane: plane as u32,
        children: [c0 as i32, c1 as i32],
    })))(lump(LUMP_CLIPNODES))
    .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| FormatError::ParseClipNodes)?;

    let (_, leaves) = all_consuming(many0(nom::combinator::map(
        tuple((le_i32, le_i32, count(le_i16, 3), count(le_i16, 3), le_u16, le_u16, count(le_u8, 4))),
        |(contents, vis_offset, mins, maxs, first, count_, ambient)| generic::Leaf {
            contents: legacy_to_contents(contents),
            vis_offset,
            mins: [mins[0] as f32, mins[1] as f32, mins[2] as f32],
            maxs: [maxs[0] as f32, maxs[1] as f32, maxs[2] as f32],
            first_mark_surface: first as u32,
            mark_surface_count: count_ as u32,
            ambient_levels: [ambient[0], ambient[1], ambient[2], ambient[3]],
        },
    )))(lump(LUMP_LEAVES))
    .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| FormatError::ParseLeaves)?;

    let (_, mark_surfaces) = all_consuming(many0(nom::combinator::map(le_u16, |v| v as u32)))(lump(LUMP_MARKSURFACES))
        .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| FormatError::ParseMarkSurfaces)?;

    let (_, edges) = all_consuming(many0(nom::combinator::map(tuple((le_u16, le_u16)), |(a, b)| [a as u32, b as u32])))(lump(LUMP_EDGES))
        .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| FormatError::ParseEdges)?;

    let (_, surf_edges) = all_consuming(many0(le_i32::<_, nom::error::Error<&[u8]>>))(lump(LUMP_SURFEDGES)).map_err(|_| FormatError::ParseSurfEdges)?;

    let (_, models) = all_consuming(many0(nom::combinator::map(
        tuple((count(le_f32, 3), count(le_f32, 3), count(le_f32, 3), count(le_i32, MAX_MAP_HULLS), le_i32, le_i32, le_i32)),
        |(mins, maxs, origin, head_nodes, vis_leaves_count, first_face, face_count)| generic::Model {
            mins: Vec3::new(mins[0], mins[1], mins[2]),
            maxs: Vec3::new(maxs[0], maxs[1], maxs[2]),
            origin: Vec3::new(origin[0], origin[1], origin[2]),
            head_nodes: [head_nodes[0], head_nodes[1], head_nodes[2], head_nodes[3]],
            vis_leaves_count,
            first_face,
            face_count,
        },
    )))(lump(LUMP_MODELS))
    .map_err(|_: nom::Err<nom::error::Error<&[u8]>>| FormatError::ParseModels)?;

    Ok(Bsp { entities, planes, textures, vertices, visibility, nodes, texinfo, faces, lightmap, clipnodes, leaves, mark_surfaces, edges, surf_edges, models, light_grid: None })
}

/// Shared lump-table write, identical between GoldSrc and Quake since
/// their lump ordering and element widths coincide (spec.md §4.9); the
/// only difference between the two dialects is the version number.
fn encode_common(dialect_name: &'static str, version: i32, bsp: &Bsp) -> Result<Vec<u8>, FormatError> {
    let mut w = ByteWriter::new();
    w.append_i32(version);

    let headers_offset = w.get_offset();
    w.append_u8_slice(&vec![0u8; HEADER_LUMP_SIZE * HEADER_LUMPS]);

    let mut patch = |w: &mut ByteWriter, idx: usize, start: usize| {
        let length = w.get_offset() - start;
        let header = headers_offset + idx * HEADER_LUMP_SIZE;
        w.replace_with_i32(header, start as i32);
        w.replace_with_i32(header + 4, length as i32);
    };

    // entities
    {
        let start = w.get_offset();
        w.append_u8_slice(&write_entities_lump(&bsp.entities));
        patch(&mut w, LUMP_ENTITIES, start);
    }

    // planes
    {
        let start = w.get_offset();
        for p in &bsp.planes {
            w.append_f32(p.normal.x);
            w.append_f32(p.normal.y);
            w.append_f32(p.normal.z);
            w.append_f32(p.dist);
            w.append_i32(geom::PlaneType::classify(p.normal) as i32);
        }
        patch(&mut w, LUMP_PLANES, start);
    }

    // textures
    {
        let start = w.get_offset();
        w.append_u32(bsp.textures.len() as u32);
        let offsets_start = w.get_offset();
        for _ in &bsp.textures {
            w.append_i32(0);
        }
        for (idx, tex) in bsp.textures.iter().enumerate() {
            let tex_offset = w.get_offset();
            w.replace_with_u32(offsets_start + idx * 4, (tex_offset - start) as u32);
            tex.write(&mut w);
        }
        patch(&mut w, LUMP_TEXTURES, start);
    }

    // vertices
    {
        let start = w.get_offset();
        for v in &bsp.vertices {
            w.append_f32(v.x);
            w.append_f32(v.y);
            w.append_f32(v.z);
        }
        patch(&mut w, LUMP_VERTICES, start);
    }

    // visibility
    {
        let start = w.get_offset();
        w.append_u8_slice(&bsp.visibility);
        patch(&mut w, LUMP_VISIBILITY, start);
    }

    // nodes
    {
        let start = w.get_offset();
        for n in &bsp.nodes {
            w.append_u32(n.plane);
            w.append_i16(overflow_i16(dialect_name, "node.children", n.children[0])?);
            w.append_i16(overflow_i16(dialect_name, "node.children", n.children[1])?);
            for &x in &n.mins {
                w.append_i16(overflow_i16(dialect_name, "node.mins", x as i32)?);
            }
            for &x in &n.maxs {
                w.append_i16(overflow_i16(dialect_name, "node.maxs", x as i32)?);
            }
            w.append_u16(overflow_u16(dialect_name, "node.first_face", n.first_face)?);
            w.append_u16(overflow_u16(dialect_name, "node.face_count", n.face_count)?);
        }
        patch(&mut w, LUMP_NODES, start);
    }

    // texinfo
    {
        let start = w.get_offset();
        for t in &bsp.texinfo {
            w.append_f32(t.u.x);
            w.append_f32(t.u.y);
            w.append_f32(t.u.z);
            w.append_f32(t.u.w);
            w.append_f32(t.v.x);
            w.append_f32(t.v.y);
            w.append_f32(t.v.z);
            w.append_f32(t.v.w);
            w.append_u32(t.texture_index);
            w.append_u32(t.flags);
        }
        patch(&mut w, LUMP_TEXINFO, start);
    }

    // faces
    {
        let start = w.get_offset();
        for f in &bsp.faces {
            w.append_u16(overflow_u16(dialect_name, "face.plane", f.plane)?);
            w.append_u16(f.side as u16);
            w.append_i32(f.first_edge);
            w.append_u16(overflow_u16(dialect_name, "face.edge_count", f.edge_count)?);
            w.append_u16(overflow_u16(dialect_name, "face.texinfo", f.texinfo)?);
            for s in f.styles {
                w.append_u8(s);
            }
            w.append_i32(f.lightmap_offset);
        }
        patch(&mut w, LUMP_FACES, start);
    }

    // lighting
    {
        let start = w.get_offset();
        for &[r, g, b] in &bsp.lightmap {
            w.append_u8(r);
            w.append_u8(g);
            w.append_u8(b);
        }
        patch(&mut w, LUMP_LIGHTING, start);
    }

    // clipnodes
    {
        let start = w.get_offset();
        for c in &bsp.clipnodes {
            w.append_i32(c.plane as i32);
            w.append_i16(overflow_i16(dialect_name, "clipnode.children", c.children[0])?);
            w.append_i16(overflow_i16(dialect_name, "clipnode.children", c.children[1])?);
        }
        patch(&mut w, LUMP_CLIPNODES, start);
    }

    // leaves
    {
        let start = w.get_offset();
        for l in &bsp.leaves {
            w.append_i32(contents_to_legacy(l.contents));
            w.append_i32(l.vis_offset);
            for &x in &l.mins {
                w.append_i16(overflow_i16(dialect_name, "leaf.mins", x as i32)?);
            }
            for &x in &l.maxs {
                w.append_i16(overflow_i16(dialect_name, "leaf.maxs", x as i32)?);
            }
            w.append_u16(overflow_u16(dialect_name, "leaf.first_mark_surface", l.first_mark_surface)?);
            w.append_u16(overflow_u16(dialect_name, "leaf.mark_surface_count", l.mark_surface_count)?);
            for a in l.ambient_levels {
                w.append_u8(a);
            }
        }
        patch(&mut w, LUMP_LEAVES, start);
    }

    // marksurfaces
    {
        let start = w.get_offset();
        for &m in &bsp.mark_surfaces {
            w.append_u16(overflow_u16(dialect_name, "mark_surface", m)?);
        }
        patch(&mut w, LUMP_MARKSURFACES, start);
    }

    // edges
    {
        let start = w.get_offset();
        for &[a, b] in &bsp.edges {
            w.append_u16(overflow_u16(dialect_name, "edge", a)?);
            w.append_u16(overflow_u16(dialect_name, "edge", b)?);
        }
        patch(&mut w, LUMP_EDGES, start);
    }

    // surfedges
    {
        let start = w.get_offset();
        for &s in &bsp.surf_edges {
            w.append_i32(s);
        }
        patch(&mut w, LUMP_SURFEDGES, start);
    }

    // models
    {
        let start = w.get_offset();
        for m in &bsp.models {
            w.append_f32(m.mins.x);
            w.append_f32(m.mins.y);
            w.append_f32(m.mins.z);
            w.append_f32(m.maxs.x);
            w.append_f32(m.maxs.y);
            w.append_f32(m.maxs.z);
            w.append_f32(m.origin.x);
            w.append_f32(m.origin.y);
            w.append_f32(m.origin.z);
            for &h in &m.head_nodes {
                w.append_i32(h);
            }
            w.append_i32(m.vis_leaves_count);
            w.append_i32(m.first_face);
            w.append_i32(m.face_count);
        }
        patch(&mut w, LUMP_MODELS, start);
    }

    Ok(w.data)
}

const GOLDSRC_VERSION: i32 = 30;
const QUAKE_VERSION: i32 = 29;

impl Dialect for GoldSrc {
    fn name(&self) -> &'static str {
        "goldsrc"
    }
    fn version(&self) -> i32 {
        GOLDSRC_VERSION
    }
    fn encode(&self, bsp: &Bsp) -> Result<Vec<u8>, FormatError> {
        encode_common(self.name(), self.version(), bsp)
    }
    fn decode(&self, bytes: &[u8]) -> Result<Bsp, FormatError> {
        decode_common(self.name(), self.version(), bytes)
    }
}

impl Dialect for Quake {
    fn name(&self) -> &'static str {
        "quake"
    }
    fn version(&self) -> i32 {
        QUAKE_VERSION
    }
    fn encode(&self, bsp: &Bsp) -> Result<Vec<u8>, FormatError> {
        encode_common(self.name(), self.version(), bsp)
    }
    fn decode(&self, bytes: &[u8]) -> Result<Bsp, FormatError> {
        decode_common(self.name(), self.version(), bytes)
    }
}

/// Resolves a `-target` CLI string (spec.md §6) to a concrete dialect.
pub fn by_name(name: &str) -> Option<Box<dyn Dialect>> {
    match name {
        "goldsrc" | "bsp30" | "halflife" => Some(Box::new(GoldSrc)),
        "quake" | "bsp29" => Some(Box::new(Quake)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_bsp() -> Bsp {
        let mut bsp = Bsp::default();
        bsp.planes.push(generic::Plane { normal: Vec3::Z, dist: 0.0 });
        bsp.vertices = vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0)];
        bsp.edges = vec![[0, 1], [1, 2], [2, 0]];
        bsp.surf_edges = vec![1, 2, 3];
        bsp.texinfo.push(generic::TexInfo { u: glam::Vec4::X, v: glam::Vec4::Y, texture_index: 0, flags: 0 });
        bsp.faces.push(generic::Face { plane: 0, side: 0, first_edge: 0, edge_count: 3, texinfo: 0, styles: [255; 4], lightmap_offset: -1 });
        bsp.leaves.push(generic::Leaf {
            contents: ContentFlags::empty(),
            vis_offset: -1,
            mins: [0.0; 3],
            maxs: [1.0; 3],
            first_mark_surface: 0,
            mark_surface_count: 0,
            ambient_levels: [0; 4],
        });
        bsp.models.push(generic::Model { head_nodes: [-1; 4], ..generic::Model::default() });
        bsp.entities.push([("classname".to_string(), "worldspawn".to_string())].into_iter().collect());
        bsp
    }

    #[test]
    fn goldsrc_round_trips_a_minimal_bsp() {
        let bsp = minimal_bsp();
        let bytes = GoldSrc.encode(&bsp).unwrap();
        let back = GoldSrc.decode(&bytes).unwrap();
        assert_eq!(back.planes.len(), 1);
        assert_eq!(back.vertices.len(), 3);
        assert_eq!(back.faces.len(), 1);
        assert_eq!(back.entities[0].get("classname").map(String::as_str), Some("worldspawn"));
    }

    #[test]
    fn quake_dialect_rejects_a_goldsrc_stream() {
        let bsp = minimal_bsp();
        let bytes = GoldSrc.encode(&bsp).unwrap();
        let err = Quake.decode(&bytes).unwrap_err();
        assert!(matches!(err, FormatError::BspVersion { version: 30, expected: 29, .. }));
    }

    #[test]
    fn by_name_resolves_known_aliases() {
        assert_eq!(by_name("goldsrc").unwrap().version(), 30);
        assert_eq!(by_name("bsp29").unwrap().version(), 29);
        assert!(by_name("nonsense").is_none());
    }

    #[test]
    fn node_child_overflowing_i16_is_a_dialect_overflow() {
        let mut bsp = minimal_bsp();
        bsp.nodes.push(generic::Node { plane: 0, children: [100_000, -1], mins: [0.0; 3], maxs: [0.0; 3], first_face: 0, face_count: 0 });
        let err = GoldSrc.encode(&bsp).unwrap_err();
        assert!(matches!(err, FormatError::DialectOverflow { field: "node.children", .. }));
    }
}
