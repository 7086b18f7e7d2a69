//! WAD file parsing
//!
//! Based of specification from this webpage: https://twhl.info/wiki/page/Specification%3A_WAD3
mod constants;
mod parser;
pub mod types;
pub mod utils;

pub use parser::{parse_miptex, parse_wad};
