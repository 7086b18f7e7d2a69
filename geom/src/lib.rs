//! Plane and winding primitives shared by every later compile phase
//! (brush derivation, CSG, tree partitioning, portals, faces, PVS and
//! lighting all bottom out in clipping a [`Winding`] against a
//! [`Plane`]).

pub mod aabb;
pub mod epsilon;
pub mod plane;
pub mod winding;

pub use aabb::Aabb;
pub use epsilon::{EQUAL_EPSILON, ON_EPSILON, POINT_EQUAL_EPSILON, ZERO_AREA_EPSILON};
pub use plane::{Plane, PlaneId, PlaneTable, PlaneType, Side};
pub use winding::Winding;
