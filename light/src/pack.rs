//! Multi-style lightmap packing (spec.md §4.8, §9): folds up to four
//! per-style luxel buffers for one face into the flat lightdata lump
//! `format::build::patch_lighting` expects, and allocates/validates the
//! switchable-shadow style range reserved by `_compilerstyle_start`.

use crate::error::LightError;

/// One face's resolved lightmap placement, ready to hand to
/// `format::build::patch_lighting`.
pub struct PackedFace {
    pub face_id: u32,
    pub offset: i32,
    pub styles: [u8; 4],
}

/// Appends `style_buffers` (already sorted by ascending style by the
/// caller's gather order doesn't matter, this sorts) into `lightmap`,
/// returning the face's on-disk offset/style slots. A face touched by
/// no light at all gets offset `-1` and an all-`255` style slot, the
/// on-disk "fullbright/no lightmap" convention.
pub fn pack_face(face_id: u32, mut style_buffers: Vec<(u8, Vec<[u8; 3]>)>, lightmap: &mut Vec<[u8; 3]>) -> Result<PackedFace, LightError> {
    if style_buffers.is_empty() {
        return Ok(PackedFace { face_id, offset: -1, styles: [255; 4] });
    }
    if style_buffers.len() > 4 {
        return Err(LightError::TooManyStyles { face: face_id });
    }
    style_buffers.sort_by_key(|(style, _)| *style);

    let offset = lightmap.len() as i32;
    let mut styles = [255u8; 4];
    for (slot, (style, buf)) in style_buffers.iter().enumerate() {
        styles[slot] = *style;
        lightmap.extend_from_slice(buf);
    }
    Ok(PackedFace { face_id, offset, styles })
}

/// Validates that a user-authored (entity `style` key) light style
/// doesn't fall in the compiler-reserved switchable-shadow range
/// (spec.md §9's Open Question: user styles overlapping the compiler's
/// range are a hard error rather than silently colliding at runtime).
pub fn validate_user_style(style: u8, compilerstyle_start: u8) -> Result<(), LightError> {
    if style != 0 && style >= compilerstyle_start {
        Err(LightError::StyleCollision { style, start: compilerstyle_start })
    } else {
        Ok(())
    }
}

/// Hands out sequential switchable-shadow style indices starting at
/// `_compilerstyle_start` (default 32), matching the same `(
/// compilerstyle_start..254)` range [`validate_user_style`] guards
/// against user collisions for.
pub struct StyleAllocator {
    next: u8,
}

impl StyleAllocator {
    pub fn new(compilerstyle_start: u8) -> Self {
        Self { next: compilerstyle_start }
    }

    pub fn allocate(&mut self) -> Result<u8, LightError> {
        if self.next >= 255 {
            return Err(LightError::StyleCollision { style: self.next, start: self.next });
        }
        let style = self.next;
        self.next += 1;
        Ok(style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlit_face_gets_no_lightmap_offset() {
        let mut lightmap = Vec::new();
        let packed = pack_face(3, Vec::new(), &mut lightmap).unwrap();
        assert_eq!(packed.offset, -1);
        assert_eq!(packed.styles, [255; 4]);
        assert!(lightmap.is_empty());
    }

    #[test]
    fn two_styles_are_packed_back_to_back_sorted() {
        let mut lightmap = Vec::new();
        let buffers = vec![(4u8, vec![[10, 10, 10]; 2]), (0u8, vec![[20, 20, 20]; 2])];
        let packed = pack_face(1, buffers, &mut lightmap).unwrap();
        assert_eq!(packed.styles[0], 0);
        assert_eq!(packed.styles[1], 4);
        assert_eq!(lightmap.len(), 4);
        assert_eq!(lightmap[0], [20, 20, 20]);
        assert_eq!(lightmap[2], [10, 10, 10]);
    }

    #[test]
    fn fifth_style_on_one_face_is_an_error() {
        let mut lightmap = Vec::new();
        let buffers = (0..5).map(|s| (s as u8, vec![[1, 1, 1]])).collect();
        assert!(matches!(pack_face(0, buffers, &mut lightmap), Err(LightError::TooManyStyles { face: 0 })));
    }

    #[test]
    fn user_style_inside_compiler_range_is_rejected() {
        assert!(validate_user_style(40, 32).is_err());
        assert!(validate_user_style(10, 32).is_ok());
        assert!(validate_user_style(0, 32).is_ok());
    }

    #[test]
    fn allocator_hands_out_increasing_styles() {
        let mut alloc = StyleAllocator::new(32);
        assert_eq!(alloc.allocate().unwrap(), 32);
        assert_eq!(alloc.allocate().unwrap(), 33);
    }
}
