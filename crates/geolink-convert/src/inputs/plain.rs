//! Scheme-less coordinate text and the `geo:` URI scheme.

use geolink_core::point::ReferenceSystem;

use crate::pattern::{Extract, Rule, UriPart, UriPattern, LAT, LON, ZOOM};

use super::Input;

/// Bare coordinate pairs like `50.1,-11.2`, `N 52.5, E 13.4` or
/// `N-68.648556,E-152.775879`. Hemisphere letters flip the sign of
/// positive values; an explicit minus always wins.
pub(super) fn coordinates() -> Input {
    let point = format!(
        r"(?i)^\s*(?P<ns>[ns])?\s*(?P<lat>{LAT})°?\s*[,;]\s*(?P<ew>[ew])?\s*(?P<lon>{LON})°?\s*$"
    );
    let uri_pattern = UriPattern::new(
        &point,
        vec![Rule::new(UriPart::Full, &point, Extract::Point)],
    );
    Input::new(
        "coordinates",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Convert these coordinates?",
        "Reading coordinates",
    )
}

/// RFC 5870 style `geo:` URIs, including the Android `geo:0,0?q=` form
/// where the zero pair is a placeholder rather than a location.
pub(super) fn geo() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^geo:",
        vec![
            Rule::new(
                UriPart::Query("q"),
                &format!(
                    r"^(?P<lat>{LAT}),\s*(?P<lon>{LON})(?:\s*\((?P<name>[^)]+)\))?$|^(?P<q>.+)$"
                ),
                Extract::Query,
            ),
            Rule::new(
                UriPart::Path,
                &format!(r"^(?P<lat>{LAT}),(?P<lon>{LON})"),
                Extract::CenterPoint,
            )
            .skip_origin(),
            Rule::new(
                UriPart::Query("z"),
                &format!(r"^(?P<zoom>{ZOOM})$"),
                Extract::Zoom,
            ),
        ],
    );
    Input::new(
        "geo",
        ReferenceSystem::Wgs84,
        uri_pattern,
        "Convert this geo link?",
        "Reading geo link",
    )
}
