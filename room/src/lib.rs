//! Shared room model and the collision predicate that gates every move.
//!
//! This crate is pure: no I/O, no clocks, no locks. The server links it to
//! validate commits and the client engine links it to veto drag previews, so
//! both sides always run the same legality test against the same data shape.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`geom`] | Points, rectangles, axis-aligned segments, distance tests |
//! | [`layout`] | Static room geometry: areas, walls, doors, windows, furniture |
//! | [`model`] | [`model::Room`] snapshot, occupants, and the store operations |
//! | [`collision`] | The "is this point occupiable" predicate |
//! | [`sense`] | Area lookup, nearby occupants, distance tiers |
//! | [`consts`] | Default bounds and radii |

pub mod collision;
pub mod consts;
pub mod geom;
pub mod layout;
pub mod model;
pub mod sense;

pub use collision::{Blocker, find_blocker, is_blocked};
pub use geom::Point;
pub use model::{Occupant, OccupantKind, OccupantUpdate, Room, Upsert};
