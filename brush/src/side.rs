use geom::{PlaneId, Winding};

use crate::contents::ContentFlags;
use crate::texinfo::TexInfoId;

/// One face of a [`crate::Brush`]: the half-space plane plus the
/// boundary winding derived from clipping the brush's other sides
/// against it. `onnode` is set once the tree builder has consumed
/// this side's plane as a splitter; `visible` tracks whether the side
/// still has any surviving area after CSG.
#[derive(Debug, Clone)]
pub struct Side {
    pub plane_id: PlaneId,
    pub winding: Winding,
    pub texinfo_id: TexInfoId,
    pub surface_flags: u32,
    pub content_flags: ContentFlags,
    pub onnode: bool,
    pub visible: bool,
}

impl Side {
    pub fn new(plane_id: PlaneId, winding: Winding, texinfo_id: TexInfoId, surface_flags: u32, content_flags: ContentFlags) -> Self {
        let visible = !winding.is_empty();
        Self {
            plane_id,
            winding,
            texinfo_id,
            surface_flags,
            content_flags,
            onnode: false,
            visible,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.winding.is_empty()
    }
}
