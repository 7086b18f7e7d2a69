use glam::{Vec3, Vec4};

/// A texture-projection record: `vecs[0]` is the tangent axis plus its
/// U offset, `vecs[1]` the bitangent axis plus its V offset. UVs are
/// `dot(vecs[i].xyz, p) + vecs[i].w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexInfo {
    pub vecs: [Vec4; 2],
    pub flags: u32,
    pub miptex_id: u32,
    pub value: i32,
}

impl TexInfo {
    pub fn new(u: Vec4, v: Vec4, flags: u32, miptex_id: u32, value: i32) -> Self {
        Self {
            vecs: [u, v],
            flags,
            miptex_id,
            value,
        }
    }

    pub fn project(&self, p: Vec3) -> (f32, f32) {
        let u = self.vecs[0].truncate().dot(p) + self.vecs[0].w;
        let v = self.vecs[1].truncate().dot(p) + self.vecs[1].w;
        (u, v)
    }

    /// Value equality within a loose tolerance, used when interning
    /// texinfos at parse time; the table is immutable thereafter.
    pub fn approx_eq(&self, other: &TexInfo) -> bool {
        const EPS: f32 = 1e-4;
        self.flags == other.flags
            && self.miptex_id == other.miptex_id
            && self.value == other.value
            && self.vecs[0].abs_diff_eq(other.vecs[0], EPS)
            && self.vecs[1].abs_diff_eq(other.vecs[1], EPS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TexInfoId(pub u32);

/// Append-only, parse-time-only interning table for [`TexInfo`]
/// records, mirroring [`geom::PlaneTable`]'s shape: interned at parse
/// time, immutable thereafter.
#[derive(Debug, Default)]
pub struct TexInfoTable {
    entries: Vec<TexInfo>,
}

impl TexInfoTable {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn intern(&mut self, texinfo: TexInfo) -> TexInfoId {
        if let Some(pos) = self.entries.iter().position(|t| t.approx_eq(&texinfo)) {
            return TexInfoId(pos as u32);
        }
        let id = TexInfoId(self.entries.len() as u32);
        self.entries.push(texinfo);
        id
    }

    pub fn get(&self, id: TexInfoId) -> &TexInfo {
        &self.entries[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TexInfoId, &TexInfo)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, t)| (TexInfoId(i as u32), t))
    }
}
