//! Read/write capability descriptors for engine formats and devices.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Length of a capability code as printed by the engine feature listing.
pub const MODE_CODE_LEN: usize = 6;

/// Which of {waypoints, tracks, routes} x {read, write} a format or device supports.
///
/// Parsed from the engine's fixed-position code, e.g. `"rwrw--"`: positions
/// 0/2/4 hold `'r'` when readable, positions 1/3/5 hold `'w'` when writable.
/// Anything else in a position means the capability is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilityMode {
    pub waypoints_read: bool,
    pub waypoints_write: bool,
    pub tracks_read: bool,
    pub tracks_write: bool,
    pub routes_read: bool,
    pub routes_write: bool,
}

impl CapabilityMode {
    /// Every capability set.
    pub const ALL: Self = Self {
        waypoints_read: true,
        waypoints_write: true,
        tracks_read: true,
        tracks_write: true,
        routes_read: true,
        routes_write: true,
    };

    /// No capability set. Matches every candidate when used as a requirement.
    pub const NONE: Self = Self {
        waypoints_read: false,
        waypoints_write: false,
        tracks_read: false,
        tracks_write: false,
        routes_read: false,
        routes_write: false,
    };

    /// Parses a capability code. Missing trailing positions are absent capabilities.
    pub fn parse(code: &str) -> Self {
        let bytes = code.as_bytes();
        let at = |i: usize, expected: u8| bytes.get(i) == Some(&expected);
        Self {
            waypoints_read: at(0, b'r'),
            waypoints_write: at(1, b'w'),
            tracks_read: at(2, b'r'),
            tracks_write: at(3, b'w'),
            routes_read: at(4, b'r'),
            routes_write: at(5, b'w'),
        }
    }

    /// Renders the canonical code, `-` marking absent capabilities.
    pub fn code(&self) -> String {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        [
            flag(self.waypoints_read, 'r'),
            flag(self.waypoints_write, 'w'),
            flag(self.tracks_read, 'r'),
            flag(self.tracks_write, 'w'),
            flag(self.routes_read, 'r'),
            flag(self.routes_write, 'w'),
        ]
        .iter()
        .collect()
    }

    /// Whether `self` offers at least every capability `required` asks for.
    ///
    /// This is a one-directional test: a candidate capable of more than
    /// requested still matches.
    pub fn matches(&self, required: &CapabilityMode) -> bool {
        (!required.waypoints_read || self.waypoints_read)
            && (!required.waypoints_write || self.waypoints_write)
            && (!required.tracks_read || self.tracks_read)
            && (!required.tracks_write || self.tracks_write)
            && (!required.routes_read || self.routes_read)
            && (!required.routes_write || self.routes_write)
    }

    /// True when any of waypoints/tracks/routes can be read.
    pub fn has_any_read(&self) -> bool {
        self.waypoints_read || self.tracks_read || self.routes_read
    }

    /// True when any of waypoints/tracks/routes can be written.
    pub fn has_any_write(&self) -> bool {
        self.waypoints_write || self.tracks_write || self.routes_write
    }
}

impl FromStr for CapabilityMode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for CapabilityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl Serialize for CapabilityMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for CapabilityMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(Self::parse(&code))
    }
}

/// Anything tagged with a capability mode.
pub trait Capable {
    fn mode(&self) -> CapabilityMode;
}

/// Iterates over `items`, in order, whose mode satisfies `required`.
pub fn compatible<'a, T: Capable>(
    items: &'a [T],
    required: &'a CapabilityMode,
) -> impl Iterator<Item = &'a T> + 'a {
    items.iter().filter(move |item| item.mode().matches(required))
}

/// Iterates over `items`, in order, that can read at least one kind of data.
pub fn readable<T: Capable>(items: &[T]) -> impl Iterator<Item = &T> {
    items.iter().filter(|item| item.mode().has_any_read())
}
