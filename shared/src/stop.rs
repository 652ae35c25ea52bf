use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::route::Route;

/// Routes currently known to an overlay, keyed by route id.
pub type RouteMap = HashMap<String, Route>;

/// Geographic location in WGS-84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// The token set is closed: eight compass points plus the undirected sentinel.
/// Anything else is rejected at the parse boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "NW")]
    NorthWest,
    #[serde(rename = "W")]
    West,
    #[serde(rename = "SW")]
    SouthWest,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "SE")]
    SouthEast,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "NE")]
    NorthEast,
    #[default]
    #[serde(rename = "null")]
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown direction token: {0:?}")]
pub struct UnknownDirection(pub String);

impl Direction {
    /// All nine tokens in atlas slot order.
    pub const ALL: [Direction; 9] = [
        Direction::North,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
        Direction::East,
        Direction::NorthEast,
        Direction::Unspecified,
    ];

    /// Stable 0..9 slot used to index per-direction icon arrays.
    pub const fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::NorthWest => 1,
            Direction::West => 2,
            Direction::SouthWest => 3,
            Direction::South => 4,
            Direction::SouthEast => 5,
            Direction::East => 6,
            Direction::NorthEast => 7,
            Direction::Unspecified => 8,
        }
    }

    pub const fn token(self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::NorthWest => "NW",
            Direction::West => "W",
            Direction::SouthWest => "SW",
            Direction::South => "S",
            Direction::SouthEast => "SE",
            Direction::East => "E",
            Direction::NorthEast => "NE",
            Direction::Unspecified => "null",
        }
    }
}

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" => Ok(Direction::North),
            "NW" => Ok(Direction::NorthWest),
            "W" => Ok(Direction::West),
            "SW" => Ok(Direction::SouthWest),
            "S" => Ok(Direction::South),
            "SE" => Ok(Direction::SouthEast),
            "E" => Ok(Direction::East),
            "NE" => Ok(Direction::NorthEast),
            "null" | "" => Ok(Direction::Unspecified),
            other => Err(UnknownDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A transit stop as supplied by the data layer. Owned by the caller; the
/// overlay only clones what it needs to keep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub position: Point,
    #[serde(default)]
    pub direction: Direction,
    /// Stations (parent-less stops) stay visible at low zoom and get a name
    /// label; platforms belong to a station and get a platform-code label.
    #[serde(default)]
    pub is_station: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_code: Option<String>,
    #[serde(default)]
    pub route_ids: Vec<String>,
}

impl Stop {
    pub fn has_platform_code(&self) -> bool {
        self.platform_code
            .as_deref()
            .is_some_and(|code| !code.is_empty())
    }
}
