//! Spatial sensing: which area a point is in, who is nearby, and how well a
//! voice carries between two occupants.

#[cfg(test)]
#[path = "sense_test.rs"]
mod sense_test;

use serde::Serialize;

use crate::consts::{CLOSE_DISTANCE, FAR_DISTANCE, VERY_CLOSE_DISTANCE};
use crate::geom::{Point, point_in_rect};
use crate::layout::{Area, Layout};
use crate::model::{OccupantKind, Room};

/// How well something said at one point is heard at another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DistanceTier {
    VeryClose,
    Close,
    Far,
}

impl DistanceTier {
    /// `None` when `distance` is out of hearing range.
    #[must_use]
    pub fn for_distance(distance: f64) -> Option<Self> {
        if distance < VERY_CLOSE_DISTANCE {
            Some(Self::VeryClose)
        } else if distance < CLOSE_DISTANCE {
            Some(Self::Close)
        } else if distance < FAR_DISTANCE {
            Some(Self::Far)
        } else {
            None
        }
    }
}

/// An occupant seen from some reference point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Nearby {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub kind: OccupantKind,
    pub distance: f64,
    /// `None` when the occupant is in range but beyond hearing.
    pub tier: Option<DistanceTier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<String>,
}

/// What an occupant can perceive from where it stands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Surroundings {
    pub name: String,
    /// Name of the area the occupant is in, if any.
    pub area: Option<String>,
    /// Furniture standing in the same area.
    pub furniture: Vec<String>,
    /// Doors opening into the same area.
    pub doors: Vec<String>,
    /// Everyone else in the room, nearest first.
    pub others: Vec<Neighbour>,
}

/// Another occupant as listed in [`Surroundings`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbour {
    pub name: String,
    pub area: Option<String>,
    pub distance: f64,
}

/// First area whose rectangle (inclusive) contains `p`.
#[must_use]
pub fn area_at(layout: &Layout, p: Point) -> Option<&Area> {
    layout.areas.iter().find(|a| point_in_rect(p, &a.rect()))
}

/// Occupants within `max_distance` of `origin`, nearest first.
#[must_use]
pub fn nearby(room: &Room, origin: Point, max_distance: f64, excluding: Option<&str>) -> Vec<Nearby> {
    let mut out: Vec<Nearby> = room
        .roles
        .iter()
        .filter(|o| excluding != Some(o.name.as_str()))
        .filter_map(|o| {
            let distance = origin.distance_to(o.position());
            (distance <= max_distance).then(|| Nearby {
                name: o.name.clone(),
                x: o.x,
                y: o.y,
                kind: o.kind,
                distance,
                tier: DistanceTier::for_distance(distance),
                activity: o.activity.clone(),
            })
        })
        .collect();
    out.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    out
}

/// Describe what the occupant `name` can perceive. `None` if it isn't present.
#[must_use]
pub fn surroundings(room: &Room, name: &str) -> Option<Surroundings> {
    let me = room.occupant(name)?;
    let here = area_at(&room.layout, me.position());

    let (furniture, doors) = match here {
        Some(area) => {
            let rect = area.rect();
            let furniture = room
                .layout
                .furniture
                .iter()
                .filter(|f| point_in_rect(f.anchor(), &rect))
                .map(|f| f.name.clone())
                .collect();
            let doors = room
                .layout
                .doors
                .iter()
                .filter(|d| d.area == area.id)
                .map(|d| d.name.clone())
                .collect();
            (furniture, doors)
        }
        None => (Vec::new(), Vec::new()),
    };

    let mut others: Vec<Neighbour> = room
        .roles
        .iter()
        .filter(|o| o.name != name)
        .map(|o| Neighbour {
            name: o.name.clone(),
            area: area_at(&room.layout, o.position()).map(|a| a.name.clone()),
            distance: me.position().distance_to(o.position()),
        })
        .collect();
    others.sort_by(|a, b| a.distance.total_cmp(&b.distance));

    Some(Surroundings { name: name.to_owned(), area: here.map(|a| a.name.clone()), furniture, doors, others })
}
