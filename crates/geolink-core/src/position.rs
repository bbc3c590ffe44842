//! Parse result model: a position and the accumulator that builds one.

use serde::{Deserialize, Serialize};

use crate::point::Point;

/// Lowest zoom a finalized position may carry.
pub const MIN_ZOOM: f64 = 1.0;
/// Highest zoom a finalized position may carry.
pub const MAX_ZOOM: f64 = 21.0;

/// The overall result of parsing one shared input: zero or more points,
/// an optional free-text query, and an optional zoom level.
///
/// When `points` is non-empty the *last* point is the main destination;
/// earlier points are intermediate stops of a route.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub points: Vec<Point>,
    pub query: Option<String>,
    pub zoom: Option<f64>,
}

impl Position {
    /// The point consumers render by default.
    #[must_use]
    pub fn main_point(&self) -> Option<&Point> {
        self.points.last()
    }

    /// True when at least one point carries coordinates or a name.
    #[must_use]
    pub fn has_coordinates_or_name(&self) -> bool {
        self.points
            .iter()
            .any(|p| p.has_coordinates() || p.name.is_some())
    }

    /// True when nothing at all was extracted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty() && self.query.is_none() && self.zoom.is_none()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(main) = self.main_point() {
            write!(f, "{main}")?;
        } else if let Some(query) = &self.query {
            write!(f, "{query}")?;
        }
        Ok(())
    }
}

/// Mutable accumulator used while parsing a single input.
///
/// Every setter is set-once: the first extraction rule to populate a field
/// wins and later rules are no-ops. This is what gives the declarative
/// pattern lists their priority order without an explicit ranking.
///
/// Create one per parse attempt and consume it with [`Self::into_position`].
#[derive(Debug, Default)]
pub struct PositionBuilder {
    points: Vec<Point>,
    default_point: Option<Point>,
    query: Option<String>,
    zoom: Option<f64>,
    name: Option<String>,
}

impl PositionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the single confirmed point, unless one is already present.
    pub fn set_point_if_none(&mut self, point: Point) {
        if self.points.is_empty() {
            self.points.push(point);
        }
    }

    /// Sets a whole route, unless confirmed points are already present.
    pub fn set_points_if_empty(&mut self, points: Vec<Point>) {
        if self.points.is_empty() {
            self.points = points;
        }
    }

    /// Sets the fallback point used only when no confirmed point exists,
    /// e.g. a map-center coordinate as opposed to a dropped pin.
    pub fn set_default_point_if_none(&mut self, point: Point) {
        if self.default_point.is_none() {
            self.default_point = Some(point);
        }
    }

    pub fn set_query_if_none(&mut self, query: impl Into<String>) {
        if self.query.is_none() {
            let query = query.into();
            if !query.is_empty() {
                self.query = Some(query);
            }
        }
    }

    pub fn set_zoom_if_none(&mut self, zoom: f64) {
        if self.zoom.is_none() {
            self.zoom = Some(zoom);
        }
    }

    pub fn set_name_if_none(&mut self, name: impl Into<String>) {
        if self.name.is_none() {
            let name = name.into();
            if !name.is_empty() {
                self.name = Some(name);
            }
        }
    }

    /// True once every field a pattern could fill has been set. Used by
    /// line-oriented HTML parsing to stop reading early.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        !self.points.is_empty() && self.zoom.is_some() && self.name.is_some()
    }

    /// True when any extraction rule has produced something.
    #[must_use]
    pub fn has_any(&self) -> bool {
        !self.points.is_empty()
            || self.default_point.is_some()
            || self.query.is_some()
            || self.zoom.is_some()
            || self.name.is_some()
    }

    /// Finalizes the accumulated fields into an immutable [`Position`].
    ///
    /// Confirmed points win over the default point; the pending name is
    /// attached to the last point if that point has none; zoom is clamped
    /// to [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    #[must_use]
    pub fn into_position(self) -> Position {
        let mut points = if self.points.is_empty() {
            self.default_point.into_iter().collect()
        } else {
            self.points
        };
        if let Some(name) = self.name {
            if let Some(last) = points.pop() {
                points.push(last.with_name_if_missing(&name));
            } else {
                points.push(Point::name_only(name));
            }
        }
        Position {
            points,
            query: self.query,
            zoom: self.zoom.map(|z| z.clamp(MIN_ZOOM, MAX_ZOOM)),
        }
    }
}

#[cfg(test)]
#[path = "position_test.rs"]
mod tests;
