//! The format shim (spec.md §4.9): a dialect-neutral in-memory BSP
//! ([`generic::Bsp`]) plus the binary encoders/decoders
//! ([`dialect::Dialect`]) and lossless JSON companions ([`sidecar`])
//! that narrow/widen it to a specific on-disk layout. `build` wires
//! the upstream phases' output into a fresh [`generic::Bsp`] and
//! patches in visibility/lighting once those phases finish.

pub mod build;
pub mod constants;
pub mod dialect;
pub mod error;
pub mod generic;
pub mod sidecar;
pub mod utils;

pub use build::{from_tree, patch_lightgrid, patch_lighting, patch_visibility, BuildOutput, FaceLightResult};
pub use dialect::{by_name, Dialect, GoldSrc, Quake};
pub use error::FormatError;
pub use generic::Bsp;
