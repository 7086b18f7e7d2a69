use std::{
    collections::HashMap,
    fs::OpenOptions,
    io::{self, BufWriter, Write},
    path::Path,
};

use glam::{DVec3, DVec4};
use nom::{
    bytes::complete::{tag, take_till},
    character::complete::{multispace0, space0},
    combinator::{all_consuming, map, opt, recognize},
    multi::{fold_many1, many0, many1, many_m_n},
    number::complete::double as _double,
    sequence::{delimited, preceded, terminated, tuple},
    IResult as _IResult,
};

pub mod projection;
pub use projection::Projection;

#[derive(Debug, Clone, PartialEq)]
pub struct BrushPlane {
    pub p1: DVec3,
    pub p2: DVec3,
    pub p3: DVec3,
    pub texture_name: String,
    /// Canonicalized texture axes, always populated regardless of which
    /// of the three raw encodings the `.map` text used: `Ux Uy Uz
    /// Uoffset`.
    pub u: DVec4,
    /// `Vx Vy Vz Voffset`, canonical form of [`Self::u`]'s counterpart.
    pub v: DVec4,
    pub rotation: f64,
    pub u_scale: f64,
    pub v_scale: f64,
    /// Which raw grammar this plane line was read from (or should be
    /// written back out as). Kept separately from the canonical
    /// `u`/`v` pair so CSG/BrushModel only ever have to deal with one
    /// shape of texinfo.
    pub projection: Projection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Brush {
    pub planes: Vec<BrushPlane>,
}

// #[derive(Debug, Clone, PartialEq)]
type Attributes = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    // All entities have attributes.
    pub attributes: Attributes,
    pub brushes: Option<Vec<Brush>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Map {
    pub tb_header: Option<Vec<String>>,
    pub entities: Vec<Entity>,
}

impl Map {
    pub fn new(map_file: &str) -> Self {
        let path = Path::new(map_file);

        if let Ok(file) = std::fs::read_to_string(path) {
            match parse_map(&file) {
                Ok((_, res)) => res,
                Err(err) => panic!("Cannot read file. {}", err),
            }
        } else {
            panic!("Cannot open file.")
        }
    }

    /// Non-panicking counterpart to [`Self::new`], for callers (the
    /// `compiler` crate) that need to turn a malformed `.map` into an
    /// ordinary error result instead of aborting the process.
    pub fn parse_str(text: &str) -> Result<Self, String> {
        parse_map(text).map(|(_, res)| res).map_err(|err| err.to_string())
    }

    pub fn write(self, file_name: &str) -> io::Result<()> {
        let path = Path::new(file_name);

        let file = OpenOptions::new().create(true).write(true).open(path)?;

        let mut file = BufWriter::new(file);

        if let Some(tb_header) = self.tb_header {
            for s in tb_header {
                file.write_all("//".as_bytes())?;
                file.write_all(s.as_bytes())?;
                file.write_all("\n".as_bytes())?;
            }
        }

        for (entity_index, entities) in self.entities.iter().enumerate() {
            file.write_all(format!("// entity {}\n", entity_index).as_bytes())?;

            file.write_all("{\n".as_bytes())?;

            for (key, value) in &entities.attributes {
                file.write_all(format!("\"{}\" \"{}\"\n", key, value).as_bytes())?;
            }

            if let Some(brushes) = &entities.brushes {
                for (brush_entity, brush) in brushes.iter().enumerate() {
                    file.write_all(format!("// brush {}\n", brush_entity).as_bytes())?;
                    file.write_all("{\n".as_bytes())?;

                    for plane in &brush.planes {
                        let points = format!(
                            "( {} {} {} ) ( {} {} {} ) ( {} {} {} )",
                            plane.p1.x,
                            plane.p1.y,
                            plane.p1.z,
                            plane.p2.x,
                            plane.p2.y,
                            plane.p2.z,
                            plane.p3.x,
                            plane.p3.y,
                            plane.p3.z,
                        );

                        let line = match plane.projection {
                            Projection::Valve220 => format!(
                                "{} {} [ {} {} {} {} ] [ {} {} {} {} ] {} {} {}\n",
                                points,
                                plane.texture_name,
                                plane.u.x,
                                plane.u.y,
                                plane.u.z,
                                plane.u.w,
                                plane.v.x,
                                plane.v.y,
                                plane.v.z,
                                plane.v.w,
                                plane.rotation,
                                plane.u_scale,
                                plane.v_scale,
                            ),
                            Projection::QuakeEd { u_offset, v_offset } => format!(
                                "{} {} {} {} {} {} {}\n",
                                points,
                                plane.texture_name,
                                u_offset,
                                v_offset,
                                plane.rotation,
                                plane.u_scale,
                                plane.v_scale,
                            ),
                            Projection::BrushPrimitives { matrix } => format!(
                                "{} ( ( {} {} {} ) ( {} {} {} ) ) {}\n",
                                points,
                                matrix[0][0],
                                matrix[0][1],
                                matrix[0][2],
                                matrix[1][0],
                                matrix[1][1],
                                matrix[1][2],
                                plane.texture_name,
                            ),
                        };

                        file.write_all(line.as_bytes())?;
                    }
                    file.write_all("}\n".as_bytes())?;
                }
            }

            file.write_all("}\n".as_bytes())?;
        }

        file.flush()?;

        Ok(())
    }
}

type IResult<'a, T> = _IResult<&'a str, T>;

fn take_comment_line(i: &str) -> IResult<&str> {
    terminated(
        preceded(tuple((space0, tag("//"))), take_till(|c| c == '\n')),
        multispace0,
    )(i)
}

fn take_tb_header(i: &str) -> IResult<Vec<String>> {
    many_m_n(0, 2, map(take_comment_line, |i| i.to_string()))(i)
}

// TODO: make it not discard
// Many 0 because it doesn't necessary have it every time.
fn discard_comment_lines(i: &str) -> IResult<&str> {
    map(many0(take_comment_line), |_| "")(i)
}

fn signed_double(i: &str) -> IResult<f64> {
    map(recognize(preceded(opt(tag("-")), _double)), |what: &str| {
        what.parse().unwrap()
    })(i)
}

pub fn double(i: &str) -> IResult<f64> {
    preceded(space0, signed_double)(i)
}

fn between_line_bracket<'a, T>(
    f: impl FnMut(&'a str) -> IResult<T>,
) -> impl FnMut(&'a str) -> IResult<'a, T> {
    terminated(
        preceded(tuple((space0, tag("{"), multispace0)), f),
        tuple((space0, tag("}"), multispace0)),
    )
}

fn quoted_text(i: &str) -> IResult<&str> {
    terminated(preceded(tag("\""), take_till(|c| c == '"')), tag("\""))(i)
}

// For brushes
// These ones take in space0 at the end
// just to make sure that the next thing we read is a value.
fn parse_plane_coordinate(i: &str) -> IResult<DVec3> {
    terminated(
        preceded(
            tuple((space0, tag("("), space0)),
            map(tuple((double, double, double)), |(x, y, z)| {
                DVec3::new(x, y, z)
            }),
        ),
        tuple((space0, tag(")"), space0)),
    )(i)
}

fn parse_plane_uv(i: &str) -> IResult<DVec4> {
    terminated(
        preceded(
            tuple((space0, tag("["), space0)),
            map(
                tuple((double, double, double, double)),
                |(x, y, z, offset)| DVec4::new(x, y, z, offset),
            ),
        ),
        tuple((space0, tag("]"), space0)),
    )(i)
}

fn parse_texture_token(i: &str) -> IResult<&str> {
    terminated(take_till(|c| c == ' ' || c == '\n' || c == '\r'), space0)(i)
}

/// `( ( m00 m01 m02 ) ( m10 m11 m12 ) )`, the Brush-Primitives
/// projection matrix, which (unlike Valve-220) precedes the texture
/// name rather than following it.
fn parse_bp_matrix(i: &str) -> IResult<[[f64; 3]; 2]> {
    let row = |i| {
        terminated(
            preceded(
                tuple((space0, tag("("), space0)),
                tuple((double, double, double)),
            ),
            tuple((space0, tag(")"), space0)),
        )(i)
    };
    map(
        terminated(
            preceded(tuple((space0, tag("("), space0)), tuple((row, row))),
            tuple((space0, tag(")"), space0)),
        ),
        |((a, b, c), (d, e, f))| [[a, b, c], [d, e, f]],
    )(i)
}

/// `( p1 ) ( p2 ) ( p3 )` followed by one of the three texture
/// projection encodings, normalized to canonical `u`/`v` vecs.
fn parse_brush_plane(i: &str) -> IResult<BrushPlane> {
    let (i, p1) = parse_plane_coordinate(i)?;
    let (i, p2) = parse_plane_coordinate(i)?;
    let (i, p3) = parse_plane_coordinate(i)?;

    let normal = (p1 - p2).cross(p3 - p2);
    let normal = if normal.length_squared() > 1e-12 {
        normal.normalize()
    } else {
        DVec3::Z
    };

    // Brush-Primitives puts the matrix before the texture name.
    if let Ok((i, matrix)) = parse_bp_matrix(i) {
        let (i, texture_name) = parse_texture_token(i)?;
        // Optional trailing "surface_flags content_flags value" triple.
        let (i, _) = opt(tuple((double, double, double)))(i)?;
        let projection = Projection::BrushPrimitives { matrix };
        let (u, v) = projection.to_vecs(normal, 0.0, 1.0, 1.0);
        return Ok((
            i,
            BrushPlane {
                p1,
                p2,
                p3,
                texture_name: texture_name.to_string(),
                u,
                v,
                rotation: 0.0,
                u_scale: 1.0,
                v_scale: 1.0,
                projection,
            },
        ));
    }

    let (i, texture_name) = parse_texture_token(i)?;

    // Valve-220: two bracketed 4-vecs follow the texture name.
    if let Ok((i, (u, v))) = tuple((parse_plane_uv, parse_plane_uv))(i) {
        let (i, (rotation, u_scale, v_scale)) = tuple((double, double, double))(i)?;
        return Ok((
            i,
            BrushPlane {
                p1,
                p2,
                p3,
                texture_name: texture_name.to_string(),
                u,
                v,
                rotation,
                u_scale,
                v_scale,
                projection: Projection::Valve220,
            },
        ));
    }

    // Quake-ED: plain `u_offset v_offset rotation u_scale v_scale`.
    let (i, (u_offset, v_offset, rotation, u_scale, v_scale)) =
        tuple((double, double, double, double, double))(i)?;
    let projection = Projection::QuakeEd { u_offset, v_offset };
    let (u, v) = projection.to_vecs(normal, rotation, u_scale, v_scale);
    Ok((
        i,
        BrushPlane {
            p1,
            p2,
            p3,
            texture_name: texture_name.to_string(),
            u,
            v,
            rotation,
            u_scale,
            v_scale,
            projection,
        },
    ))
}

fn parse_brush(i: &str) -> IResult<Brush> {
    map(
        many1(terminated(parse_brush_plane, multispace0)),
        |planes| Brush { planes },
    )(i)
}

fn parse_brushes(i: &str) -> IResult<Vec<Brush>> {
    many1(delimited(
        discard_comment_lines,
        between_line_bracket(parse_brush),
        discard_comment_lines,
    ))(i)
}

// For attributes
fn parse_attribute(i: &str) -> IResult<(&str, &str)> {
    tuple((quoted_text, preceded(space0, quoted_text)))(i)
}

fn parse_attributes(i: &str) -> IResult<Attributes> {
    fold_many1(
        terminated(parse_attribute, multispace0),
        Attributes::new,
        |mut acc: Attributes, (key, value)| {
            acc.insert(key.to_owned(), value.to_owned());
            acc
        },
    )(i)
}

// For map
fn parse_entity(i: &str) -> IResult<Entity> {
    map(
        tuple((parse_attributes, opt(parse_brushes))),
        |(attributes, brushes)| Entity {
            attributes,
            brushes,
        },
    )(i)
}

fn parse_entities(i: &str) -> IResult<Vec<Entity>> {
    many1(delimited(
        discard_comment_lines,
        between_line_bracket(parse_entity),
        discard_comment_lines,
    ))(i)
}

fn parse_map(i: &str) -> IResult<Map> {
    map(
        all_consuming(tuple((opt(take_tb_header), parse_entities))),
        |(tb_header, entities)| Map {
            tb_header,
            entities,
        },
    )(i)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn inside_quote() {
        let i = "\"heyhey\"";

        let (rest, a) = quoted_text(i).unwrap();
        assert_eq!(a, "heyhey");
        assert_eq!(rest, "");
    }

    #[test]
    fn inside_bracket() {
        let i = "{
a
}
";

        let (rest, a) = between_line_bracket(terminated(tag("a"), multispace0))(i).unwrap();
        assert_eq!(a, "a");
        assert_eq!(rest, "");
    }

    #[test]
    fn brushes_parse() {
        let i = "\
// brush 4
{
( -120 -136 144 ) ( -120 -136 136 ) ( -120 56 144 ) NULL [ 2.220446049250313e-16 0 -1 24 ] [ 0 -1 0 0 ] 0 1 1
( 56 -136 144 ) ( 56 -136 136 ) ( -120 -136 144 ) NULL [ 1 0 0 0 ] [ 0 -2.220446049250313e-16 1 -8 ] 0 1 1
( 56 56 136 ) ( -120 56 136 ) ( 56 -136 136 ) sky [ 0 -1 0 0 ] [ -1 0 -2.220446049250313e-16 -256 ] 0 1 1
( 56 56 144 ) ( 56 -136 144 ) ( -120 56 144 ) NULL [ 1 0 0 0 ] [ 0 -1 0 0 ] 0 1 1
( -120 56 144 ) ( -120 56 136 ) ( 56 56 144 ) NULL [ 1 0 0 0 ] [ 0 -2.220446049250313e-16 -1 24 ] 0 1 1
( 56 56 144 ) ( 56 56 136 ) ( 56 -136 144 ) NULL [ 2.220446049250313e-16 0 1 -24 ] [ 0 -1 0 0 ] 0 1 1
}
// brush 5
{
( -120 56 -16 ) ( -120 56 -8 ) ( -120 -136 -16 ) NULL [ 2.220446049250313e-16 0 -1 24 ] [ 0 -1 0 0 ] 0 1 1
( -120 -136 -16 ) ( -120 -136 -8 ) ( 56 -136 -16 ) NULL [ 1 0 0 0 ] [ 0 -2.220446049250313e-16 1 -8 ] 0 1 1
( -120 56 -16 ) ( -120 -136 -16 ) ( 56 56 -16 ) NULL [ 1 0 0 0 ] [ 0 -1 0 0 ] 0 1 1
( -120 -136 -8 ) ( -120 56 -8 ) ( 56 -136 -8 ) tf [ -1 0 0 0 ] [ 0 -1 0 0 ] 0 1 1
( 56 56 -16 ) ( 56 56 -8 ) ( -120 56 -16 ) NULL [ 1 0 0 0 ] [ 0 -2.220446049250313e-16 -1 24 ] 0 1 1
( 56 -136 -16 ) ( 56 -136 -8 ) ( 56 56 -16 ) NULL [ 2.220446049250313e-16 0 1 -24 ] [ 0 -1 0 0 ] 0 1 1
}
";

        let (_, a) = parse_brushes(i).unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a[0].planes[0].p1, DVec3::new(-120., -136., 144.));
        assert_eq!(a[0].planes[0].texture_name, "NULL");
        assert_eq!(a[0].planes[0].u.x, 2.220446049250313e-16);
    }

    #[test]
    fn entities_parse() {
        let i = "\
{
\"classname\" \"info_player_start\"
\"spawnflags\" \"0\"
\"angles\" \"0 0 0\"
\"origin\" \"-80 -88 60\"
}";

        let (rest, a) = parse_entities(i).unwrap();
        assert_eq!(rest, "");
        assert_eq!(a.len(), 1);

        let ent = &a[0];

        assert!(ent.brushes.is_none());
        assert_eq!(ent.attributes.len(), 4);
        assert_eq!(ent.attributes.get("origin").unwrap(), "-80 -88 60");
    }

    #[test]
    fn comment_line_parse() {
        let i = "\
// A song for the broken heart
// Eh
// {} 
// \"\"";

        let (rest, _) = discard_comment_lines(i).unwrap();
        assert!(rest.is_empty());
    }

    #[test]
    fn file_parse() {
        let i = "\
// Game: Half-Life
// Format: Valve
// entity 0
{
\"mapversion\" \"220\"
\"wad\" \"/home/khang/map_compiler/sdhlt.wad;/home/khang/map_compiler/devtextures.wad\"
\"classname\" \"worldspawn\"
\"_tb_mod\" \"cstrike;cstrike_downloads\"
// brush 0
{
( -64 -64 -16 ) ( -64 -63 -16 ) ( -64 -64 -15 ) __TB_empty [ 0 -1 0 0 ] [ 0 0 -1 0 ] 0 1 1
( -64 -64 -16 ) ( -64 -64 -15 ) ( -63 -64 -16 ) __TB_empty [ 1 0 0 0 ] [ 0 0 -1 0 ] 0 1 1
( -64 -64 -16 ) ( -63 -64 -16 ) ( -64 -63 -16 ) __TB_empty [ -1 0 0 0 ] [ 0 -1 0 0 ] 0 1 1
( 64 64 192 ) ( 64 65 192 ) ( 65 64 192 ) __TB_empty [ 1 0 0 0 ] [ 0 -1 0 0 ] 0 1 1
( 64 64 16 ) ( 65 64 16 ) ( 64 64 17 ) __TB_empty [ -1 0 0 0 ] [ 0 0 -1 0 ] 0 1 1
( 64 64 16 ) ( 64 64 17 ) ( 64 65 16 ) __TB_empty [ 0 1 0 0 ] [ 0 0 -1 0 ] 0 1 1
}
}

";

        let (rest, a) = parse_map(i).unwrap();

        assert!(rest.is_empty());
        assert_eq!(a.entities.len(), 1);

        let ent = &a.entities[0];

        assert_eq!(ent.attributes.len(), 4);
        assert_eq!(
            ent.attributes.get("_tb_mod").unwrap(),
            "cstrike;cstrike_downloads"
        );

        assert!(ent.brushes.is_some());

        let brushes = ent.brushes.as_ref().unwrap();

        assert_eq!(brushes.len(), 1);

        let brush = &brushes[0];

        assert_eq!(brush.planes[3].p2, DVec3::new(64., 65., 192.));
        assert_eq!(brush.planes[3].texture_name, "__TB_empty");
        assert_eq!(brush.planes[3].u.x, 1.);
    }

    #[test]
    fn quake_ed_plane_parses_without_brackets() {
        let i = "\
( -64 -64 -16 ) ( -64 -63 -16 ) ( -64 -64 -15 ) wbrick1_5 16 0 0 1 1
";
        let (rest, plane) = parse_brush_plane(i).unwrap();
        assert!(rest.trim().is_empty());
        assert_eq!(plane.texture_name, "wbrick1_5");
        assert!(matches!(
            plane.projection,
            Projection::QuakeEd { u_offset: 16.0, v_offset: 0.0 }
        ));
    }

    #[test]
    fn brush_primitives_plane_parses_matrix_before_texture() {
        let i = "\
( -64 -64 -16 ) ( -64 -63 -16 ) ( -64 -64 -15 ) ( ( 0.03125 0 0 ) ( 0 0.03125 0 ) ) wbrick1_5
";
        let (rest, plane) = parse_brush_plane(i).unwrap();
        assert!(rest.trim().is_empty());
        assert_eq!(plane.texture_name, "wbrick1_5");
        match plane.projection {
            Projection::BrushPrimitives { matrix } => {
                assert_eq!(matrix[0][0], 0.03125);
                assert_eq!(matrix[1][1], 0.03125);
            }
            _ => panic!("expected BrushPrimitives projection"),
        }
    }

    #[test]
    fn write_then_reparse_round_trips() {
        let i = "\
{
\"classname\" \"worldspawn\"
{
( -64 -64 -16 ) ( -64 -63 -16 ) ( -64 -64 -15 ) __TB_empty [ 0 -1 0 0 ] [ 0 0 -1 0 ] 0 1 1
( -64 -64 -16 ) ( -64 -64 -15 ) ( -63 -64 -16 ) __TB_empty [ 1 0 0 0 ] [ 0 0 -1 0 ] 0 1 1
( -64 -64 -16 ) ( -63 -64 -16 ) ( -64 -63 -16 ) __TB_empty [ -1 0 0 0 ] [ 0 -1 0 0 ] 0 1 1
( 64 64 192 ) ( 64 65 192 ) ( 65 64 192 ) __TB_empty [ 1 0 0 0 ] [ 0 -1 0 0 ] 0 1 1
}
}
";
        let (_, parsed) = parse_map(i).unwrap();

        let tmp = std::env::temp_dir().join("map_roundtrip_test.map");
        parsed.clone().write(tmp.to_str().unwrap()).unwrap();

        let written = std::fs::read_to_string(&tmp).unwrap();
        let (_, reparsed) = parse_map(&written).unwrap();

        assert_eq!(parsed.entities.len(), reparsed.entities.len());
        assert_eq!(
            parsed.entities[0].brushes.as_ref().unwrap()[0].planes[0].p1,
            reparsed.entities[0].brushes.as_ref().unwrap()[0].planes[0].p1
        );

        let _ = std::fs::remove_file(&tmp);
    }
}
