use std::io::{self, Write};

use bsptree::Tree;
use glam::Vec3;

use crate::types::{is_outside, PortalSet};

/// Assigns a dense, zero-based vis-leaf number to every non-solid leaf,
/// in tree order, and clears it on solid leaves (qbsp's `NumberLeafs_r`).
/// `vis` and later PVS consumption both index by this number, not by
/// [`bsptree::NodeId`]. Returns the leaf count, i.e. the PRT header's
/// `numleafs`.
pub fn number_leafs(tree: &mut Tree) -> u32 {
    let mut next = 0u32;
    for node in tree.nodes.iter_mut() {
        let Some(leaf) = node.as_leaf_mut() else { continue };
        if leaf.content_flags.is_opaque() {
            leaf.visleafnum = None;
            leaf.viscluster = None;
            continue;
        }
        leaf.visleafnum = Some(next);
        leaf.viscluster = Some(next);
        next += 1;
    }
    next
}

/// Writes the portal file `vis` reads to drive PortalFlow (spec.md §4.5,
/// §4.7). PRT1 only — every leaf is its own vis cluster, matching
/// `number_leafs`; detail-merged PRT2 clusters aren't produced here
/// (tracked in DESIGN.md).
pub fn write_prt1<W: Write>(mut w: W, tree: &Tree, portals: &PortalSet) -> io::Result<()> {
    let numleafs = tree.nodes.iter().filter_map(|n| n.as_leaf()).filter(|l| l.visleafnum.is_some()).count();

    let mut body = Vec::new();
    let mut numportals = 0u32;
    for portal in &portals.portals {
        if is_outside(portal.nodes[0]) || is_outside(portal.nodes[1]) {
            continue;
        }
        let leaf_a = tree.get(portal.nodes[0]).as_leaf().expect("portal endpoint is a leaf");
        let leaf_b = tree.get(portal.nodes[1]).as_leaf().expect("portal endpoint is a leaf");
        let (Some(a), Some(b)) = (leaf_a.visleafnum, leaf_b.visleafnum) else {
            continue;
        };

        write!(body, "{} {} {} ", portal.winding.points.len(), a, b)?;
        for p in &portal.winding.points {
            write!(body, "({} {} {}) ", p.x, p.y, p.z)?;
        }
        writeln!(body)?;
        numportals += 1;
    }

    writeln!(w, "PRT1")?;
    writeln!(w, "{numleafs}")?;
    writeln!(w, "{numportals}")?;
    w.write_all(&body)?;
    Ok(())
}

/// Writes a `.pts` leak trail as a dotted polyline, sampling every `step`
/// units along each segment so the points render as a visible dashed line
/// in a level editor (qbsp's `WriteLeakTrail`/`WriteLeakLine`).
pub fn write_pts<W: Write>(mut w: W, trail: &[Vec3], step: f32) -> io::Result<()> {
    for pair in trail.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let seg = b - a;
        let dist = seg.length();
        if dist < f32::EPSILON {
            continue;
        }
        let dir = seg / dist;
        let mut travelled = 0.0f32;
        while travelled < dist {
            let p = a + dir * travelled;
            writeln!(w, "{} {} {}", p.x, p.y, p.z)?;
            travelled += step;
        }
    }
    if let Some(last) = trail.last() {
        writeln!(w, "{} {} {}", last.x, last.y, last.z)?;
    }
    Ok(())
}
