//! Small text-parsing helpers for the entity lump (spec.md §4.9's
//! NUL-terminated text lump), lifted from the teacher `bsp` crate's
//! `utils.rs` (itself shared with its `map`-parsing sibling).

use common::take_until_unbalanced;
use nom::{
    bytes::complete::{tag, take_till},
    character::complete::multispace0,
    combinator::map_parser,
    sequence::{preceded, terminated, tuple},
};

pub type SResult<'a, T> = nom::IResult<&'a str, T>;

pub fn between_braces<'a, T>(f: impl FnMut(&'a str) -> SResult<'a, T>) -> impl FnMut(&'a str) -> SResult<'a, T> {
    map_parser(
        preceded(
            tuple((multispace0, tag("{"), multispace0)),
            terminated(take_until_unbalanced('{', '}'), tuple((tag("}"), multispace0))),
        ),
        f,
    )
}

pub fn quoted_text(i: &str) -> SResult<&str> {
    terminated(preceded(tag("\""), take_till(|c| c == '\"')), tag("\""))(i)
}
