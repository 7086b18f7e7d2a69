//! BrushModel: convex solids built from intersections of half-spaces
//! (spec.md §4.2). A [`Brush`]'s sides are derived by clipping a huge
//! base winding against every other plane of the brush; CSG (the `csg`
//! crate) consumes these brushes and produces new ones whose sides may
//! be non-closed fragments.

pub mod brush;
pub mod contents;
pub mod error;
pub mod side;
pub mod texinfo;

pub use brush::{Brush, MIN_BRUSH_SIDES};
pub use contents::ContentFlags;
pub use error::BrushError;
pub use side::Side;
pub use texinfo::{TexInfo, TexInfoId, TexInfoTable};
