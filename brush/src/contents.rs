use bitflags::bitflags;

bitflags! {
    /// Per-volume semantic bits, an OR-able set so a cluster can merge
    /// several brushes' classes instead of picking one dominant value.
    /// `format::dialect` encoders narrow this back down to whatever a
    /// given on-disk dialect can represent.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContentFlags: u32 {
        const SOLID                       = 1 << 0;
        const WINDOW                      = 1 << 1;
        const AUX                         = 1 << 2;
        const LAVA                        = 1 << 3;
        const SLIME                       = 1 << 4;
        const WATER                       = 1 << 5;
        const MIST                        = 1 << 6;
        const PLAYERCLIP                  = 1 << 7;
        const MONSTERCLIP                 = 1 << 8;
        const ORIGIN                      = 1 << 9;
        const AREAPORTAL                  = 1 << 10;
        const DETAIL                      = 1 << 11;
        const DETAIL_WALL                 = 1 << 12;
        const DETAIL_FENCE                = 1 << 13;
        const DETAIL_ILLUSIONARY          = 1 << 14;
        const TRANSLUCENT                 = 1 << 15;
        const HINT                        = 1 << 16;
        const SKIP                        = 1 << 17;
        const SKY                         = 1 << 18;
        const MIRROR_INSIDE               = 1 << 19;
        const MIRROR_INSIDE_SET           = 1 << 20;
        const SUPPRESS_CLIPPING_SAME_TYPE = 1 << 21;
        /// Detail for PVS clustering, but structural for leak detection
        /// (spec.md §4.2). A thin detail brush that should still seal
        /// the map against the void (e.g. a detail wall flush with the
        /// hull) sets this alongside `DETAIL`.
        const DETAIL_SOLID                = 1 << 22;
    }
}

impl ContentFlags {
    pub const LIQUIDS: ContentFlags =
        ContentFlags::WATER.union(ContentFlags::SLIME).union(ContentFlags::LAVA);

    pub const DETAIL_ANY: ContentFlags = ContentFlags::DETAIL
        .union(ContentFlags::DETAIL_WALL)
        .union(ContentFlags::DETAIL_FENCE)
        .union(ContentFlags::DETAIL_ILLUSIONARY)
        .union(ContentFlags::DETAIL_SOLID);

    /// `true` when a volume with these contents blocks the portal flood
    /// outright (spec.md §4.5's "opaque" leaves), i.e. solid geometry
    /// that is not detail and does not let sky through. Used by vis-leaf
    /// numbering and PVS clustering, where every detail variant
    /// (including `DETAIL_SOLID`) behaves as non-opaque.
    pub fn is_opaque(self) -> bool {
        self.contains(ContentFlags::SOLID) && !self.intersects(ContentFlags::DETAIL_ANY)
    }

    /// Like [`Self::is_opaque`], but treats `DETAIL_SOLID` as structural
    /// rather than detail (spec.md §4.2: "DETAIL variants do not
    /// participate in portal flood except DETAIL_SOLID, which is treated
    /// as structural for leak but detail for PVS clustering"). Outside-fill
    /// leak detection uses this instead of `is_opaque`.
    pub fn blocks_leak_flood(self) -> bool {
        self.is_opaque() || (self.contains(ContentFlags::SOLID) && self.contains(ContentFlags::DETAIL_SOLID))
    }

    /// Whether this is one of the three mutually-exclusive-per-brush
    /// liquid classes (spec.md §4.2).
    pub fn is_liquid(self) -> bool {
        self.intersects(ContentFlags::LIQUIDS)
    }

    /// Two content sets are in the same CSG class ("`types_equal`" in
    /// spec.md §4.2) if they clip each other: identical solid/liquid/
    /// detail classification, ignoring cosmetic bits like HINT/SKIP.
    pub fn types_equal(self, other: ContentFlags) -> bool {
        const COSMETIC: ContentFlags = ContentFlags::HINT
            .union(ContentFlags::SKIP)
            .union(ContentFlags::TRANSLUCENT)
            .union(ContentFlags::MIRROR_INSIDE)
            .union(ContentFlags::MIRROR_INSIDE_SET);
        (self & !COSMETIC) == (other & !COSMETIC)
    }

    /// OR-merges a descendant's contents into a cluster's running
    /// total. The SOLID bit is provisionally carried along; callers
    /// fold left-to-right over all descendants and finalize with
    /// [`Self::finish_cluster_merge`], which clears SOLID unless every
    /// descendant was solid (spec.md §4.2).
    pub fn merge_into_cluster(self, acc: ContentFlags) -> ContentFlags {
        acc | self
    }

    /// Call after folding every descendant's contents with
    /// [`Self::merge_into_cluster`]; clears SOLID unless `all_solid` is
    /// true, matching spec.md §4.2's "partially open cluster remains
    /// seeable-into" rule.
    pub fn finish_cluster_merge(merged: ContentFlags, all_solid: bool) -> ContentFlags {
        if all_solid {
            merged
        } else {
            merged & !ContentFlags::SOLID
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_dominates_merge() {
        let a = ContentFlags::SOLID;
        let b = ContentFlags::DETAIL;
        assert!((a | b).contains(ContentFlags::SOLID));
    }

    #[test]
    fn cluster_merge_clears_solid_when_partially_open() {
        let acc = ContentFlags::SOLID;
        let merged = acc.merge_into_cluster(ContentFlags::DETAIL);
        let finished = ContentFlags::finish_cluster_merge(merged, false);
        assert!(!finished.contains(ContentFlags::SOLID));
        assert!(finished.contains(ContentFlags::DETAIL));
    }

    #[test]
    fn cluster_merge_keeps_solid_when_fully_solid() {
        let merged = ContentFlags::SOLID.merge_into_cluster(ContentFlags::SOLID);
        let finished = ContentFlags::finish_cluster_merge(merged, true);
        assert!(finished.contains(ContentFlags::SOLID));
    }

    #[test]
    fn types_equal_ignores_cosmetic_bits() {
        let a = ContentFlags::SOLID | ContentFlags::HINT;
        let b = ContentFlags::SOLID | ContentFlags::SKIP;
        assert!(a.types_equal(b));
    }
}
