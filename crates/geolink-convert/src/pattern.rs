//! Declarative extraction grammar evaluated against URIs and HTML bodies.
//!
//! A provider's grammar is pure data: an ordered list of [`Rule`]s, each
//! binding a regex to one URI component and one extraction shape. Rules
//! feed a [`PositionBuilder`] whose set-once fields make declaration order
//! the priority order; the engine itself never ranks rules.
//!
//! Named capture groups carry the payload: `lat`, `lon`, `zoom`, `name`,
//! `q`, `url`, `hash`, plus `ns`/`ew` hemisphere letters for plain
//! coordinate text.

use regex::{Captures, Regex};

use geolink_core::point::{Point, ReferenceSystem};
use geolink_core::position::{Position, PositionBuilder};

use crate::hash;
use crate::uri::Uri;

/// Latitude sub-pattern: up to two integer digits, up to 17 decimals.
pub const LAT: &str = r"-?\d{1,2}(?:\.\d{1,17})?";
/// Longitude sub-pattern: up to three integer digits, up to 17 decimals.
pub const LON: &str = r"-?\d{1,3}(?:\.\d{1,17})?";
/// Zoom sub-pattern.
pub const ZOOM: &str = r"\d{1,2}(?:\.\d{1,17})?";
/// Projected-meter sub-pattern for Mercator systems (BD09MC).
pub const MERCATOR: &str = r"-?\d{1,9}(?:\.\d{1,8})?";

/// The URI component a rule's regex runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriPart {
    /// The whole raw input string.
    Full,
    Host,
    Path,
    /// A single zero-based path segment.
    PathSegment(usize),
    /// One query parameter's decoded value.
    Query(&'static str),
    /// Several query parameters' values joined with `,` so one regex can
    /// capture a coordinate split across parameters (`mlat`/`mlon` style).
    /// Absent parameters make the whole part absent.
    JoinedParams(&'static [&'static str]),
    Fragment,
}

/// What a matching rule writes into the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extract {
    /// A confirmed destination point (`lat`/`lon`, optional `zoom`, `name`).
    Point,
    /// A map-center point, used only when nothing confirmed turns up.
    CenterPoint,
    /// Every non-overlapping match appends one route point.
    Points,
    /// Free-text query (`q` or the whole match); an embedded
    /// `lat`/`lon` capture promotes it to a confirmed point instead.
    Query,
    Zoom,
    Name,
    /// An absolute URL worth fetching (HTML enrichment or redirect).
    Url,
    WazeGeoHash,
    OsmShortLink,
    Ge0Hash,
}

#[derive(Debug)]
pub struct Rule {
    pub part: UriPart,
    pub regex: Regex,
    pub extract: Extract,
    /// Skip point extraction when it captures exactly `0,0` — the
    /// conventional "no coordinates" marker in `geo:` URIs.
    pub skip_origin: bool,
}

impl Rule {
    /// Compiles a rule; panics on an invalid pattern, which is a defect in
    /// the registry itself.
    #[must_use]
    pub fn new(part: UriPart, pattern: &str, extract: Extract) -> Self {
        Self {
            part,
            regex: Regex::new(pattern).expect("valid regex"),
            extract,
            skip_origin: false,
        }
    }

    #[must_use]
    pub fn skip_origin(mut self) -> Self {
        self.skip_origin = true;
        self
    }

    fn apply(
        &self,
        text: &str,
        system: ReferenceSystem,
        builder: &mut PositionBuilder,
        captured_url: &mut Option<String>,
    ) {
        match self.extract {
            Extract::Points => {
                let points: Vec<Point> = self
                    .regex
                    .captures_iter(text)
                    .filter_map(|caps| point_from_captures(&caps, system, self.skip_origin))
                    .collect();
                if !points.is_empty() {
                    builder.set_points_if_empty(points);
                }
            }
            Extract::Point | Extract::CenterPoint => {
                if let Some(caps) = self.regex.captures(text) {
                    if let Some(point) = point_from_captures(&caps, system, self.skip_origin) {
                        if self.extract == Extract::Point {
                            builder.set_point_if_none(point);
                        } else {
                            builder.set_default_point_if_none(point);
                        }
                    }
                    if let Some(zoom) = f64_capture(&caps, "zoom") {
                        builder.set_zoom_if_none(zoom);
                    }
                }
            }
            Extract::Query => {
                if let Some(caps) = self.regex.captures(text) {
                    if let Some(point) = point_from_captures(&caps, system, self.skip_origin) {
                        builder.set_point_if_none(point);
                    } else {
                        let q = caps
                            .name("q")
                            .map_or_else(|| caps[0].to_owned(), |m| m.as_str().to_owned());
                        builder.set_query_if_none(q.trim());
                    }
                }
            }
            Extract::Zoom => {
                if let Some(caps) = self.regex.captures(text) {
                    let value = caps
                        .name("zoom")
                        .map_or_else(|| caps[0].to_owned(), |m| m.as_str().to_owned());
                    if let Ok(zoom) = value.parse::<f64>() {
                        builder.set_zoom_if_none(zoom);
                    }
                }
            }
            Extract::Name => {
                if let Some(caps) = self.regex.captures(text) {
                    let value = caps
                        .name("name")
                        .map_or_else(|| caps[0].to_owned(), |m| m.as_str().to_owned());
                    builder.set_name_if_none(clean_name(&value));
                }
            }
            Extract::Url => {
                if captured_url.is_none() {
                    if let Some(caps) = self.regex.captures(text) {
                        let value = caps
                            .name("url")
                            .map_or_else(|| caps[0].to_owned(), |m| m.as_str().to_owned());
                        *captured_url = Some(value);
                    }
                }
            }
            Extract::WazeGeoHash | Extract::OsmShortLink | Extract::Ge0Hash => {
                if let Some(caps) = self.regex.captures(text) {
                    let Some(code) = caps.name("hash").map(|m| m.as_str()) else {
                        return;
                    };
                    let decoded = match self.extract {
                        Extract::WazeGeoHash => hash::decode_waze_geohash(code),
                        Extract::OsmShortLink => hash::decode_osm_shortlink(code),
                        _ => hash::decode_ge0(code),
                    };
                    if let Some((lat, lon, zoom)) = decoded {
                        builder.set_point_if_none(Point::new(system, lat, lon));
                        builder.set_zoom_if_none(zoom);
                    }
                }
            }
        }
    }
}

fn f64_capture(caps: &Captures<'_>, group: &str) -> Option<f64> {
    caps.name(group)?.as_str().parse::<f64>().ok()
}

/// Builds a point from `lat`/`lon` captures, honoring hemisphere letters
/// and an optional `name` capture.
fn point_from_captures(
    caps: &Captures<'_>,
    system: ReferenceSystem,
    skip_origin: bool,
) -> Option<Point> {
    let mut lat = f64_capture(caps, "lat")?;
    let mut lon = f64_capture(caps, "lon")?;
    if skip_origin && lat == 0.0 && lon == 0.0 {
        return None;
    }
    if let Some(ns) = caps.name("ns") {
        if ns.as_str().eq_ignore_ascii_case("s") && lat > 0.0 {
            lat = -lat;
        }
    }
    if let Some(ew) = caps.name("ew") {
        if ew.as_str().eq_ignore_ascii_case("w") && lon > 0.0 {
            lon = -lon;
        }
    }
    let mut point = Point::new(system, lat, lon);
    if let Some(name) = caps.name("name") {
        point.name = Some(clean_name(name.as_str()));
    }
    Some(point)
}

/// Display names from path segments use `+` or `_` for spaces.
fn clean_name(raw: &str) -> String {
    raw.replace(['+', '_'], " ").trim().to_owned()
}

/// Everything a URI-pattern evaluation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct UriParse {
    pub matched: bool,
    pub position: Position,
    /// URL a rule captured for HTML enrichment, when different from the
    /// shared link itself.
    pub html_url: Option<String>,
}

/// A provider's URI grammar: a guard regex selecting the provider plus the
/// ordered extraction rules.
#[derive(Debug)]
pub struct UriPattern {
    pub guard: Regex,
    pub rules: Vec<Rule>,
}

impl UriPattern {
    #[must_use]
    pub fn new(guard: &str, rules: Vec<Rule>) -> Self {
        Self {
            guard: Regex::new(guard).expect("valid regex"),
            rules,
        }
    }

    /// Whether this provider claims the shared text at all.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.guard.is_match(text)
    }

    /// Runs every rule against its component; set-once builder fields keep
    /// the first match per field.
    #[must_use]
    pub fn parse(&self, uri: &Uri, system: ReferenceSystem) -> UriParse {
        let mut builder = PositionBuilder::new();
        let mut captured_url = None;
        let segments = uri.path_segments();
        for rule in &self.rules {
            let joined;
            let text: Option<&str> = match rule.part {
                UriPart::Full => Some(uri.full()),
                UriPart::Host => Some(&uri.host),
                UriPart::Path => Some(&uri.path),
                UriPart::PathSegment(i) => segments.get(i).copied(),
                UriPart::Query(key) => uri.query_param(key),
                UriPart::JoinedParams(keys) => {
                    let values: Option<Vec<&str>> =
                        keys.iter().map(|k| uri.query_param(k)).collect();
                    match values {
                        Some(values) => {
                            joined = values.join(",");
                            Some(joined.as_str())
                        }
                        None => None,
                    }
                }
                UriPart::Fragment => Some(&uri.fragment),
            };
            if let Some(text) = text {
                rule.apply(text, system, &mut builder, &mut captured_url);
            }
        }
        let matched = builder.has_any() || captured_url.is_some();
        UriParse {
            matched,
            position: builder.into_position(),
            html_url: captured_url,
        }
    }
}

/// Outcome of running an HTML grammar over a downloaded page.
#[derive(Debug, Clone, PartialEq)]
pub enum HtmlOutcome {
    Parsed(Position),
    /// The page embeds another URL the conversion should follow.
    Redirect(String),
    NoMatch,
}

/// Line-oriented variant of the grammar for downloaded page bodies.
///
/// Rules reuse [`Rule`] with the `part` ignored; each rule sees each line.
/// Scanning stops early once the builder has everything a rule could add.
#[derive(Debug)]
pub struct HtmlPattern {
    pub rules: Vec<Rule>,
}

impl HtmlPattern {
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn parse(&self, body: &str) -> HtmlOutcome {
        let mut builder = PositionBuilder::new();
        let mut captured_url = None;
        for line in body.lines() {
            for rule in &self.rules {
                rule.apply(line, ReferenceSystem::Wgs84, &mut builder, &mut captured_url);
            }
            if builder.is_satisfied() {
                break;
            }
        }
        let position = builder.into_position();
        if position.has_coordinates_or_name() {
            HtmlOutcome::Parsed(position)
        } else if let Some(url) = captured_url {
            HtmlOutcome::Redirect(url)
        } else {
            HtmlOutcome::NoMatch
        }
    }
}
