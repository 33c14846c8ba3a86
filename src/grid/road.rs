use crate::simulation::LightState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Edge of a tile. North is towards row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    North,
    East,
    South,
    West,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::North, Side::East, Side::South, Side::West];

    pub fn opposite(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::East => Side::West,
            Side::South => Side::North,
            Side::West => Side::East,
        }
    }

    /// Column and row step towards this side.
    pub fn offset(self) -> (i64, i64) {
        match self {
            Side::North => (0, -1),
            Side::East => (1, 0),
            Side::South => (0, 1),
            Side::West => (-1, 0),
        }
    }

    fn bit(self) -> u8 {
        match self {
            Side::North => 1,
            Side::East => 2,
            Side::South => 4,
            Side::West => 8,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::North => "north",
            Side::East => "east",
            Side::South => "south",
            Side::West => "west",
        };
        f.write_str(name)
    }
}

/// Set of tile sides a road piece opens onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Connections(u8);

impl Connections {
    pub fn of(sides: &[Side]) -> Self {
        Self(sides.iter().fold(0, |bits, side| bits | side.bit()))
    }

    pub fn contains(self, side: Side) -> bool {
        self.0 & side.bit() != 0
    }

    pub fn sides(self) -> impl Iterator<Item = Side> {
        Side::ALL.into_iter().filter(move |side| self.contains(*side))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum RoadKind {
    #[serde(rename = "straight_h")]
    StraightHorizontal,
    #[serde(rename = "straight_v")]
    StraightVertical,
    #[serde(rename = "curve_ne")]
    CurveNorthEast,
    #[serde(rename = "curve_se")]
    CurveSouthEast,
    #[serde(rename = "curve_sw")]
    CurveSouthWest,
    #[serde(rename = "curve_nw")]
    CurveNorthWest,
    #[serde(rename = "intersection")]
    Intersection,
}

impl RoadKind {
    pub const ALL: [RoadKind; 7] = [
        RoadKind::StraightHorizontal,
        RoadKind::StraightVertical,
        RoadKind::CurveNorthEast,
        RoadKind::CurveSouthEast,
        RoadKind::CurveSouthWest,
        RoadKind::CurveNorthWest,
        RoadKind::Intersection,
    ];

    pub fn connections(self) -> Connections {
        use Side::*;
        match self {
            RoadKind::StraightHorizontal => Connections::of(&[West, East]),
            RoadKind::StraightVertical => Connections::of(&[North, South]),
            RoadKind::CurveNorthEast => Connections::of(&[North, East]),
            RoadKind::CurveSouthEast => Connections::of(&[South, East]),
            RoadKind::CurveSouthWest => Connections::of(&[South, West]),
            RoadKind::CurveNorthWest => Connections::of(&[North, West]),
            RoadKind::Intersection => Connections::of(&[North, East, South, West]),
        }
    }

    /// Next kind in placement order, wrapping around.
    pub fn cycled(self) -> RoadKind {
        let index = RoadKind::ALL.iter().position(|k| *k == self).unwrap_or(0);
        RoadKind::ALL[(index + 1) % RoadKind::ALL.len()]
    }

    pub fn display_name(self) -> &'static str {
        match self {
            RoadKind::StraightHorizontal => "Straight Horizontal",
            RoadKind::StraightVertical => "Straight Vertical",
            RoadKind::CurveNorthEast => "Curve North-East",
            RoadKind::CurveSouthEast => "Curve South-East",
            RoadKind::CurveSouthWest => "Curve South-West",
            RoadKind::CurveNorthWest => "Curve North-West",
            RoadKind::Intersection => "Intersection",
        }
    }
}

/// A placed road piece. Intersections carry a two-state light, red on placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Road {
    pub kind: RoadKind,
    light: Option<LightState>,
}

impl Road {
    pub fn new(kind: RoadKind) -> Self {
        let light = (kind == RoadKind::Intersection).then_some(LightState::Red);
        Self { kind, light }
    }

    pub fn connections(&self) -> Connections {
        self.kind.connections()
    }

    pub fn connects(&self, side: Side) -> bool {
        self.connections().contains(side)
    }

    pub fn has_light(&self) -> bool {
        self.light.is_some()
    }

    pub fn light(&self) -> Option<LightState> {
        self.light
    }

    /// Flips red and green. Roads without a light are left alone.
    pub fn toggle_light(&mut self) -> Option<LightState> {
        let light = self.light.as_mut()?;
        *light = match *light {
            LightState::Green => LightState::Red,
            _ => LightState::Green,
        };
        Some(*light)
    }
}
