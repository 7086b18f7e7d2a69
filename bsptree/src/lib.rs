//! TreeBuilder: recursive convex partitioning of CSG'd brush fragments
//! into a BSP tree (spec.md §4.4). Leaves carry merged content flags
//! and markfaces; interior nodes carry the chosen splitter plane and
//! child node ids into the tree's own arena.

pub mod builder;
pub mod config;
pub mod error;
pub mod splitter;
pub mod tree;

pub use builder::build_tree;
pub use config::TreeConfig;
pub use error::BsptreeError;
pub use splitter::choose_splitter;
pub use tree::{Interior, Leaf, Node, NodeContent, NodeId, Tree};
