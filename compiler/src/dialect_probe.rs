//! Picks a [`format::Dialect`] for an already-written `.bsp` without
//! the caller having to remember which target `compile-geometry` used.
//! `compile-vis`/`compile-light` only ever see the file, not the
//! command line that produced it, so they probe the small fixed set of
//! dialects `format::dialect::by_name` knows about.

use format::{dialect, FormatError};

const CANDIDATES: &[&str] = &["goldsrc", "quake"];

/// Decodes `bytes` with the first candidate dialect that accepts its
/// version field, returning the dialect name alongside the decoded
/// `Bsp` so the caller can re-encode with the same one.
pub fn decode(bytes: &[u8]) -> Result<(&'static str, format::generic::Bsp), FormatError> {
    let mut last_err = None;
    for &name in CANDIDATES {
        let d = dialect::by_name(name).expect("CANDIDATES names a known dialect");
        match d.decode(bytes) {
            Ok(bsp) => return Ok((name, bsp)),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.expect("CANDIDATES is non-empty"))
}
