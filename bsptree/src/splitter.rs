use brush::ContentFlags;
use csg::CsgBrush;
use geom::{Aabb, Plane, PlaneId, PlaneTable, Side as PlaneSide};

use crate::config::TreeConfig;

#[derive(Debug, Clone, Copy)]
struct Score {
    splits: u32,
    non_axial: bool,
    distribution_bits: u32,
    plane_id: PlaneId,
}

impl Score {
    fn key(self) -> (u32, bool, u32, u32) {
        (self.splits, self.non_axial, self.distribution_bits, self.plane_id.0)
    }
}

fn classify_aabb(plane: &Plane, aabb: &Aabb, epsilon: f32) -> PlaneSide {
    let mut front = false;
    let mut back = false;
    for x in [aabb.mins.x, aabb.maxs.x] {
        for y in [aabb.mins.y, aabb.maxs.y] {
            for z in [aabb.mins.z, aabb.maxs.z] {
                let d = plane.distance_to(glam::Vec3::new(x, y, z));
                if d > epsilon {
                    front = true;
                } else if d < -epsilon {
                    back = true;
                }
            }
        }
    }
    match (front, back) {
        (true, false) => PlaneSide::Front,
        (false, true) => PlaneSide::Back,
        _ => PlaneSide::On,
    }
}

/// Sum of squared half-extents of the two boxes the candidate plane
/// would split `brushes` into, spec.md §4.4's "spatial distribution"
/// metric (smaller is better: a balanced split).
fn distribution_score(plane: &Plane, brushes: &[CsgBrush], epsilon: f32) -> f32 {
    let mut front_aabb = Aabb::EMPTY;
    let mut back_aabb = Aabb::EMPTY;
    for brush in brushes {
        match classify_aabb(plane, &brush.aabb, epsilon) {
            PlaneSide::Front => front_aabb = front_aabb.union(&brush.aabb),
            PlaneSide::Back => back_aabb = back_aabb.union(&brush.aabb),
            PlaneSide::On => {
                front_aabb = front_aabb.union(&brush.aabb);
                back_aabb = back_aabb.union(&brush.aabb);
            }
        }
    }
    front_aabb.squared_half_extent_sum() + back_aabb.squared_half_extent_sum()
}

/// Number of other candidate sides the plane would split, per spec.md
/// §4.4: SKIP-flagged sides never count, and splitting a HINT side with
/// a non-HINT plane is heavily penalized so a HINT face is (in
/// practice) only ever split by another HINT.
fn count_splits(plane: &Plane, candidate_is_hint: bool, brushes: &[CsgBrush], planes: &PlaneTable, epsilon: f32) -> u32 {
    let mut splits = 0u32;
    let mut hint_violation = false;

    for brush in brushes {
        for side in &brush.sides {
            if side.content_flags.contains(ContentFlags::SKIP) {
                continue;
            }
            let side_plane = planes.get(side.plane_id);
            if side_plane.normal.abs_diff_eq(plane.normal, 1e-6) && (side_plane.dist - plane.dist).abs() < 1e-4 {
                continue; // same plane, never counts as a split of itself
            }
            let mut front = false;
            let mut back = false;
            for p in &side.winding.points {
                let d = plane.distance_to(*p);
                if d > epsilon {
                    front = true;
                } else if d < -epsilon {
                    back = true;
                }
            }
            if front && back {
                if side.content_flags.contains(ContentFlags::HINT) && !candidate_is_hint {
                    hint_violation = true;
                }
                splits += 1;
            }
        }
    }

    if hint_violation {
        u32::MAX
    } else {
        splits
    }
}

/// One candidate splitter plane drawn from a brush side still eligible
/// (`!onnode`) in the current partition.
struct Candidate {
    plane_id: PlaneId,
    is_hint: bool,
}

fn collect_candidates(brushes: &[CsgBrush], structural_pass: bool, visible_pass: bool) -> Vec<Candidate> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for brush in brushes {
        for side in &brush.sides {
            if side.onnode {
                continue;
            }
            if side.content_flags.contains(ContentFlags::SKIP) {
                continue;
            }
            let is_detail = side.content_flags.intersects(ContentFlags::DETAIL_ANY);
            if structural_pass == is_detail {
                continue;
            }
            if visible_pass != side.visible {
                continue;
            }
            if seen.insert(side.plane_id) {
                out.push(Candidate {
                    plane_id: side.plane_id,
                    is_hint: side.content_flags.contains(ContentFlags::HINT),
                });
            }
        }
    }
    out
}

/// Picks the best splitter plane for the current partition, or `None`
/// if no eligible candidate remains (caller should emit a leaf).
/// Implements spec.md §4.4's four scored passes plus the midsplit fast
/// path.
pub fn choose_splitter(
    brushes: &[CsgBrush],
    bounds: &Aabb,
    planes: &PlaneTable,
    config: &TreeConfig,
    total_map_sides: usize,
) -> Option<PlaneId> {
    let current_sides: usize = brushes.iter().map(|b| b.sides.len()).sum();
    let fraction_triggered = config.midsplit_fraction > 0.0
        && total_map_sides > 0
        && (current_sides as f32) > config.midsplit_fraction * total_map_sides as f32;
    let oversized = bounds.longest_axis_extent() > config.max_node_size;

    if fraction_triggered || oversized {
        return choose_midsplit(brushes, planes, config.on_epsilon);
    }

    for &(structural_pass, visible_pass) in &[(true, true), (true, false), (false, true), (false, false)] {
        let candidates = collect_candidates(brushes, structural_pass, visible_pass);
        if candidates.is_empty() {
            continue;
        }

        let mut best: Option<(Score, PlaneId)> = None;
        for candidate in &candidates {
            let plane = planes.get(candidate.plane_id);
            let splits = count_splits(plane, candidate.is_hint, brushes, planes, config.on_epsilon);
            let distribution = distribution_score(plane, brushes, config.on_epsilon);
            let score = Score {
                splits,
                non_axial: !plane.kind.is_axial(),
                distribution_bits: distribution.to_bits(),
                plane_id: candidate.plane_id,
            };
            if best.is_none() || score.key() < best.unwrap().0.key() {
                best = Some((score, candidate.plane_id));
            }
        }

        if let Some((_, plane_id)) = best {
            return Some(plane_id);
        }
    }

    None
}

/// The "fast midsplit" path: no split counting, just the plane that
/// minimizes spatial-distribution imbalance, preferring axial planes
/// among near-ties.
fn choose_midsplit(brushes: &[CsgBrush], planes: &PlaneTable, epsilon: f32) -> Option<PlaneId> {
    let mut seen = std::collections::HashSet::new();
    let mut best: Option<(bool, u32, PlaneId)> = None;

    for brush in brushes {
        for side in &brush.sides {
            if side.onnode || side.content_flags.contains(ContentFlags::SKIP) {
                continue;
            }
            if !seen.insert(side.plane_id) {
                continue;
            }
            let plane = planes.get(side.plane_id);
            let distribution = distribution_score(plane, brushes, epsilon);
            let key = (!plane.kind.is_axial(), distribution.to_bits(), side.plane_id);
            if best.is_none() || key < best.unwrap() {
                best = Some(key);
            }
        }
    }

    best.map(|(_, _, id)| id)
}
