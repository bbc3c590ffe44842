//! Geographic point value type and its reference systems.

use serde::{Deserialize, Serialize};

use crate::geodesy;

/// Coordinate reference system a point's latitude/longitude are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceSystem {
    /// The GPS standard.
    Wgs84,
    /// China's obfuscated public system ("Mars coordinates").
    Gcj02,
    /// Baidu's Mercator-projected variant, in projected meters.
    Bd09Mc,
}

impl std::fmt::Display for ReferenceSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceSystem::Wgs84 => write!(f, "WGS84"),
            ReferenceSystem::Gcj02 => write!(f, "GCJ02"),
            ReferenceSystem::Bd09Mc => write!(f, "BD09MC"),
        }
    }
}

/// A single coordinate pair with an optional display name.
///
/// Immutable: all transformations return a new `Point`. Either coordinate
/// may be absent (a name-only point is valid and renders as a search term).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub system: ReferenceSystem,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub name: Option<String>,
}

impl Point {
    #[must_use]
    pub fn new(system: ReferenceSystem, lat: f64, lon: f64) -> Self {
        Self {
            system,
            lat: Some(lat),
            lon: Some(lon),
            name: None,
        }
    }

    #[must_use]
    pub fn named(system: ReferenceSystem, lat: f64, lon: f64, name: impl Into<String>) -> Self {
        Self {
            system,
            lat: Some(lat),
            lon: Some(lon),
            name: Some(name.into()),
        }
    }

    /// A point with no coordinates, only a display name.
    #[must_use]
    pub fn name_only(name: impl Into<String>) -> Self {
        Self {
            system: ReferenceSystem::Wgs84,
            lat: None,
            lon: None,
            name: Some(name.into()),
        }
    }

    /// Returns this point with `name` attached, keeping an existing name.
    #[must_use]
    pub fn with_name_if_missing(mut self, name: &str) -> Self {
        if self.name.is_none() {
            self.name = Some(name.to_owned());
        }
        self
    }

    #[must_use]
    pub fn has_coordinates(&self) -> bool {
        self.lat.is_some() && self.lon.is_some()
    }

    /// Converts the point into `target`'s reference system.
    ///
    /// Idempotent: converting into the system the point is already in
    /// returns the point unchanged. Points without coordinates only have
    /// their `system` tag rewritten.
    #[must_use]
    pub fn to_system(&self, target: ReferenceSystem) -> Self {
        if self.system == target {
            return self.clone();
        }
        let (Some(lat), Some(lon)) = (self.lat, self.lon) else {
            return Self {
                system: target,
                ..self.clone()
            };
        };
        let (lat, lon) = geodesy::convert(self.system, target, lat, lon);
        Self {
            system: target,
            lat: Some(lat),
            lon: Some(lon),
            name: self.name.clone(),
        }
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.lat, self.lon, &self.name) {
            (Some(lat), Some(lon), Some(name)) => {
                write!(f, "{},{} ({name})", format_coord(lat), format_coord(lon))
            }
            (Some(lat), Some(lon), None) => {
                write!(f, "{},{}", format_coord(lat), format_coord(lon))
            }
            (_, _, Some(name)) => write!(f, "{name}"),
            _ => write!(f, ""),
        }
    }
}

/// Formats a coordinate with up to seven decimal places, trimming
/// trailing zeros (and a trailing dot).
///
/// `50.1200000` renders as `"50.12"`, `7.0` as `"7"`. Seven decimals keep
/// roughly centimeter precision, which is beyond any provider's accuracy.
#[must_use]
pub fn format_coord(value: f64) -> String {
    let mut s = format!("{value:.7}");
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_trims_trailing_zeros() {
        assert_eq!(format_coord(50.12), "50.12");
        assert_eq!(format_coord(7.0), "7");
        assert_eq!(format_coord(-11.123456), "-11.123456");
        assert_eq!(format_coord(0.0), "0");
    }

    #[test]
    fn to_same_system_is_identity() {
        let p = Point::new(ReferenceSystem::Wgs84, 52.5, 13.4);
        assert_eq!(p.to_system(ReferenceSystem::Wgs84), p);
    }

    #[test]
    fn conversion_preserves_name() {
        let p = Point::named(ReferenceSystem::Gcj02, 39.9, 116.4, "somewhere");
        let converted = p.to_system(ReferenceSystem::Wgs84);
        assert_eq!(converted.system, ReferenceSystem::Wgs84);
        assert_eq!(converted.name.as_deref(), Some("somewhere"));
    }

    #[test]
    fn coordinate_free_point_only_switches_tag() {
        let p = Point::name_only("Alexanderplatz");
        let converted = p.to_system(ReferenceSystem::Gcj02);
        assert_eq!(converted.system, ReferenceSystem::Gcj02);
        assert!(converted.lat.is_none());
        assert!(converted.lon.is_none());
    }

    #[test]
    fn display_renders_coordinates_and_name() {
        let p = Point::named(ReferenceSystem::Wgs84, 50.5, -11.25, "spot");
        assert_eq!(p.to_string(), "50.5,-11.25 (spot)");
        let q = Point::new(ReferenceSystem::Wgs84, 1.0, 2.0);
        assert_eq!(q.to_string(), "1,2");
    }
}
