//! Amap (Gaode) links. Coordinates are GCJ02, longitude first in
//! `position`.

use geolink_core::point::ReferenceSystem;

use crate::pattern::{Extract, Rule, UriPart, UriPattern, LAT, LON, ZOOM};

use super::{Input, ShortUriMethod};

pub(super) fn input() -> Input {
    let uri_pattern = UriPattern::new(
        r"(?i)^(?:https?://)?(?:www\.|m\.|wb\.|uri\.|surl\.)?amap\.com/",
        vec![
            Rule::new(
                UriPart::Query("position"),
                &format!(r"^(?P<lon>{LON}),(?P<lat>{LAT})$"),
                Extract::Point,
            ),
            Rule::new(
                UriPart::JoinedParams(&["lat", "lon"]),
                &format!(r"^(?P<lat>{LAT}),(?P<lon>{LON})$"),
                Extract::Point,
            ),
            Rule::new(UriPart::Query("name"), r"^(?P<name>.+)$", Extract::Name),
            Rule::new(
                UriPart::Query("zoom"),
                &format!(r"^(?P<zoom>{ZOOM})$"),
                Extract::Zoom,
            ),
            Rule::new(UriPart::Query("keywords"), r"^(?P<q>.+)$", Extract::Query),
        ],
    );
    Input::new(
        "amap",
        ReferenceSystem::Gcj02,
        uri_pattern,
        "Connect to Amap to resolve this link?",
        "Resolving Amap link",
    )
    .with_short(r"(?i)^(?:https?://)?surl\.amap\.com/", ShortUriMethod::Get)
}
